//! Climatech Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every Climatech
//! component:
//! - `storefront` - Public catalog, cart and checkout
//! - `admin` - Back-office panel
//! - `cli` - Command-line tools for migrations and diagnostics
//!
//! # Architecture
//!
//! The core crate contains only types and in-memory transformations - no I/O,
//! no HTTP clients, no database access. Every record here is a view model of
//! data owned by the external business API.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails and statuses
//! - [`content`] - CMS-style content records (slides, products, services...)
//! - [`records`] - Orders, customers, users, appointments, technicians, settings
//! - [`cart`] - Shopping cart keyed by product id
//! - [`catalog`] - Product filter predicates
//! - [`reorder`] - Drag-and-drop reordering with contiguous positions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod content;
pub mod records;
pub mod reorder;
pub mod types;

pub use cart::{Cart, CartItem};
pub use catalog::{FilterOptions, PriceBounds, ProductFilters};
pub use content::{Content, ContentInput, ContentType};
pub use reorder::{Ordered, ReorderError, move_item, reorder_by_ids};
pub use types::*;

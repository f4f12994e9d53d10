//! Climatech storefront library.
//!
//! Public site for the HVAC catalog: browsing with filters, a session cart,
//! Wompi checkout, order tracking and appointment requests. Every business
//! record is read from or written to the backend REST API.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod state;

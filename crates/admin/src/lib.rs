//! Climatech admin library.
//!
//! Back-office panel for staff: content (slides, products, services, FAQs,
//! advantages), orders, customers, appointments, technicians, catalog
//! options, store settings and back-office users. Every record is owned by
//! the business REST API; staff act on it with their own backend session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

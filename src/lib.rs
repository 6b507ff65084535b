//! Log-entry ingestion and retrieval service.
//!
//! `POST /logs` validates and stores one entry, `GET /logs/recent` returns
//! the 100 newest entries. Handlers work on an injected [`LogTable`].
//!
//! [`LogTable`]: state::log_table::LogTable

pub mod app;
pub mod config;
pub mod errors;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;

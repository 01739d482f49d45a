//! # Clinic Search
//!
//! HTTP service over the clinic search layer: mirrors pets, appointments, users,
//! clinics, health records and FAQs into OpenSearch and serves full-text search,
//! global search and suggestions on top of it.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and dependency initialization
//! - [`server`]: Axum router, handlers and the JSON response envelope
//! - [`errors`]: Startup and HTTP error types

pub mod config;
pub mod errors;
pub mod server;

pub use config::{AppConfig, Dependencies};
pub use errors::{ApiError, AppError};
pub use server::{create_app, run_server, state::AppState};

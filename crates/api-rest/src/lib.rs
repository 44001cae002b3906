//! # API REST
//!
//! REST API implementation for the referral system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Principal extraction from gateway identity headers
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error mapping)
//!
//! Business rules live in `referral-core`; nothing here re-implements
//! authorization or state checks.

#![warn(rust_2018_idioms)]

pub mod extract;
pub mod handlers;
pub mod wire;

pub use handlers::{app, AppState};

//! Shared types, errors, and configuration for Puente.
//!
//! This crate provides common types used across all other crates:
//! - Session ingestion with canonical actor identity
//! - Register status (soft delete) and lenient wire helpers
//! - Pagination and list filter types
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod session;
pub mod types;

#[cfg(test)]
mod config_tests;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use session::Session;

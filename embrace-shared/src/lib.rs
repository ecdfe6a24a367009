//! # Embrace Shared Library
//!
//! Tenant provisioning and quota accounting for the Embrace workforce
//! tracking platform.
//!
//! ## Module Organization
//!
//! - `models`: Database records and their sqlx operations
//! - `db`: Persistence gateway (PostgreSQL and in-memory), pool, migrations
//! - `auth`: Argon2id credential hashing
//! - `quota`: Reset periods and quota consumption
//! - `services`: Provisioning, tenant administration, time entry recording
//! - `config`: Environment-driven configuration
//! - `error`: `ServiceError` and its stable codes

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod quota;
pub mod services;

pub use error::ServiceError;

/// Current version of the Embrace shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

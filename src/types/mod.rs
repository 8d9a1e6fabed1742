//! Shared types for the service

pub mod error;

pub use error::{Result, ServiceError};

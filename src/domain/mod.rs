//! Domain layer for the image comparison service
//!
//! This module contains the pairing and aggregation models, the port traits
//! the services depend on, and the domain error type.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};

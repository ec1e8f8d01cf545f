//! HTTP adapter for the comparison UI.

pub mod server;

pub use server::{AppState, ErrorResponse, ExperimentHttpServer, HttpConfig};

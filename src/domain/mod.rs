//! Domain layer - transport-agnostic error taxonomy
//!
//! This layer contains NO framework dependencies (no Axum, no tonic).
//! The transports translate these errors in `api::error` and `rpc::status`.

pub mod errors;

pub use errors::{is, Error, Fields, Kind};

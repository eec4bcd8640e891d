//! RPC transport helpers

pub mod status;

pub use status::{from_error, from_status, from_status_with_details, to_status};

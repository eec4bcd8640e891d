pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod rpc;

pub use domain::{Error, Kind};
pub use infrastructure::{config, db, server};

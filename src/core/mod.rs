//! Core types: identifiers, status codes, configuration, errors and the
//! retrieval data model.
//!
//! Nothing in here touches the network.

mod config;
mod error;
mod ids;
mod status;
mod types;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use status::*;
pub use types::*;

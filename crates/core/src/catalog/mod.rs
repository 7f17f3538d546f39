//! Catalog data model: the items and contributors returned by the remote
//! catalog API.

mod ids;
mod types;

pub use types::*;

//! Data models shared by the store, the wire and the client state model.
//!
//! Field names serialize in camelCase to match the original frontend contract.

mod ids;
mod memo;
mod tag;
mod topic;

pub use ids::*;
pub use memo::*;
pub use tag::*;
pub use topic::*;

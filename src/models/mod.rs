//! Core data models for roster ingestion.

mod army_list;
mod confidence;
mod format;
mod ids;

pub use army_list::*;
pub use confidence::*;
pub use format::*;
pub use ids::*;

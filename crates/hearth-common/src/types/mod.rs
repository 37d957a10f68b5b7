//! Type definitions for HearthDB.

mod ids;

pub use ids::PageId;

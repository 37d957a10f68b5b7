//! # hearth-common
//!
//! Common types and constants for HearthDB.
//!
//! This crate provides the foundational types shared across all HearthDB
//! components:
//!
//! - **Types**: the [`PageId`](types::PageId) identifier newtype
//! - **Constants**: page geometry and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use hearth_common::types::PageId;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert!(!PageId::INVALID.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::PageId;

//! # hearth-storage
//!
//! Storage engine for HearthDB.
//!
//! This crate implements the paged storage core:
//!
//! - [`disk`]: synchronous page-granular file I/O
//! - [`buffer`]: the buffer pool manager with LRU-K replacement
//! - [`index`]: B+tree page layout and in-page operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod disk;
pub mod index;

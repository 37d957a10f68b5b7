//! B+tree page layout and in-page operations.
//!
//! The buffer pool serves raw page bytes; this module lays the B+tree node
//! structure over them:
//!
//! - [`key`]: fixed-width keys and their byte codec
//! - [`tree_page`]: the 24-byte header every tree page starts with
//! - [`internal`]: slot-array operations on internal (non-leaf) pages
//!
//! The in-page operations never take pool locks. Callers pin the pages
//! involved, run the mutation, and unpin with the dirty flag set; the
//! structural moves are the one place that calls back into the pool, to
//! re-parent children that changed owner.

pub mod internal;
pub mod key;
pub mod tree_page;

pub use internal::InternalPage;
pub use key::{GenericKey, Key16, Key32, Key4, Key64, Key8, KeyCodec};
pub use tree_page::{TreePageHeader, TreePageType};

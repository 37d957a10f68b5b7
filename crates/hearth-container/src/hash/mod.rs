//! Dynamic hashing containers.

mod extendible;

pub use extendible::ExtendibleHashTable;

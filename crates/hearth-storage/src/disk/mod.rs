//! Disk I/O layer for HearthDB.
//!
//! This module provides synchronous, page-granular access to the database
//! file. The buffer pool performs its reads and writes inside its critical
//! section, so the disk layer deliberately exposes blocking calls; there is
//! no request queue or I/O scheduler at this layer.

mod manager;

pub use manager::{DiskError, DiskManager, DiskResult};

//! Buffer pool errors.

use hearth_common::types::PageId;
use thiserror::Error;

use crate::disk::DiskError;

use super::frame::FrameId;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool and replacer operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame is pinned; neither the free list nor the replacer can
    /// supply a frame.
    #[error("buffer pool exhausted, all frames are pinned")]
    PoolExhausted,

    /// The page is not resident in the buffer pool.
    #[error("page {page_id} not found in buffer pool")]
    PageNotFound {
        /// The requested page.
        page_id: PageId,
    },

    /// Unpin was called on a page whose pin count is already zero.
    #[error("page {page_id} is not pinned")]
    UnpinUnderflow {
        /// The page whose pin count was already zero.
        page_id: PageId,
    },

    /// The page is pinned and the operation requires it unpinned.
    #[error("page {page_id} is pinned")]
    PagePinned {
        /// The pinned page.
        page_id: PageId,
    },

    /// A frame id outside `[0, replacer_size)` was passed to the replacer.
    #[error("invalid frame id: {frame_id}")]
    InvalidFrameId {
        /// The out-of-range frame id.
        frame_id: FrameId,
    },

    /// Remove was called on a frame that is not evictable.
    #[error("frame {frame_id} is not evictable")]
    FramePinned {
        /// The non-evictable frame.
        frame_id: FrameId,
    },

    /// Disk I/O failed.
    #[error("disk I/O error: {0}")]
    Disk(#[from] DiskError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a page not found error.
    pub fn page_not_found(page_id: PageId) -> Self {
        Self::PageNotFound { page_id }
    }

    /// Creates an invalid frame id error.
    pub fn invalid_frame(frame_id: FrameId) -> Self {
        Self::InvalidFrameId { frame_id }
    }

    /// Returns true if this is a transient error that can be retried once
    /// some caller unpins a page.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }

    /// Returns true if the error indicates misuse of the replacer rather
    /// than a recoverable condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidFrameId { .. } | Self::FramePinned { .. })
    }
}

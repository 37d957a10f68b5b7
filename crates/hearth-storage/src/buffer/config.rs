//! Buffer pool configuration.

use hearth_common::constants::{DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, PAGE_SIZE};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the buffer pool.
    pub num_frames: usize,
    /// Page size in bytes.
    pub page_size: usize,
    /// `k` for the LRU-K replacement policy.
    pub replacer_k: usize,
}

impl BufferPoolConfig {
    /// Creates a new configuration with the specified number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            page_size: PAGE_SIZE,
            replacer_k: DEFAULT_REPLACER_K,
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the replacement policy's `k`.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Returns the total memory used by the frame array.
    pub fn memory_usage(&self) -> usize {
        self.num_frames * self.page_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        if !self.page_size.is_power_of_two() {
            return Err("page_size must be a power of 2");
        }
        if self.page_size < 512 {
            return Err("page_size must be >= 512");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = BufferPoolConfig::new(64);
        assert_eq!(config.num_frames, 64);
        assert_eq!(config.page_size, PAGE_SIZE);
        assert_eq!(config.replacer_k, DEFAULT_REPLACER_K);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BufferPoolConfig::new(16)
            .with_page_size(8192)
            .with_replacer_k(3);
        assert_eq!(config.page_size, 8192);
        assert_eq!(config.replacer_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_usage() {
        let config = BufferPoolConfig::new(100);
        assert_eq!(config.memory_usage(), 100 * PAGE_SIZE);
    }

    #[test]
    fn test_validation() {
        assert!(BufferPoolConfig::new(0).validate().is_err());
        assert!(BufferPoolConfig::new(4)
            .with_page_size(1000)
            .validate()
            .is_err());
        assert!(BufferPoolConfig::new(4)
            .with_replacer_k(0)
            .validate()
            .is_err());
    }
}

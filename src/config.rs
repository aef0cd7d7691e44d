//! Tree and loader configuration.
//!
//! # Example
//!
//! ```
//! use bin_range_tree::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.backtrack_limit, 4);
//! assert_eq!(config.sampling_stride, 10);
//!
//! let config = Config {
//!     sampling_stride: 1_000,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::range;

/// Configuration shared by the search trees and the loader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Maximum number of ancestors a lookup re-examines after direct descent
    /// misses (default: 4).
    #[serde(default = "default_backtrack_limit")]
    pub backtrack_limit: usize,

    /// Distance between sampled keys when a range is bulk-inserted
    /// (default: 10). Must be a power of ten. A range of width `w` costs
    /// roughly `w / sampling_stride` tree entries.
    #[serde(default = "default_sampling_stride")]
    pub sampling_stride: u64,
}

fn default_backtrack_limit() -> usize {
    4
}

fn default_sampling_stride() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backtrack_limit: default_backtrack_limit(),
            sampling_stride: default_sampling_stride(),
        }
    }
}

impl Config {
    /// Reject settings no tree can run with.
    pub fn validate(&self) -> Result<()> {
        if !range::is_valid_stride(self.sampling_stride) {
            return Err(Error::InvalidStride);
        }
        Ok(())
    }
}

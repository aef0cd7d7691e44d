//! # bin-range-tree
//!
//! A range index for card BINs (Bank Identification Numbers).
//!
//! Given a numeric card prefix, the index returns the range record whose
//! boundaries contain it or, failing that, whose boundary starts with it.
//! Keys are decimal digit strings indexed by one of two tree shapes:
//!
//! - [`DigitTrie`]: one node per digit.
//! - [`RadixTree`]: path-compressed, one node per branching point.
//!
//! A range is stored at its low boundary plus every `sampling_stride`-th
//! value inside it, so memory grows with `width / stride` rather than the
//! width of the range. Keys that were never inserted are recovered by a
//! bounded backtrack to the nearest sampled neighbour.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bin_range_tree::{BinRange, RadixTree, RangeRecord, SearchTree};
//!
//! let mut tree = RadixTree::new();
//! let visa = Arc::new(BinRange::new("401319301", "401319999")?);
//! tree.insert_bin_range(10, visa.clone())?;
//!
//! assert_eq!(tree.find("401319601").map(|r| r.low_bin()), Some("401319301"));
//! assert!(tree.find("401319300").is_none());
//! # Ok::<(), bin_range_tree::Error>(())
//! ```
//!
//! Loading a fixed-width BIN file:
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use bin_range_tree::{DigitTrie, FixedWidthParser, SearchTree, TreeLoader};
//!
//! let file = "H20240101\nD305992          305999          840\nT00000001\n";
//! let loader = TreeLoader::new(FixedWidthParser);
//! let mut trie = DigitTrie::new();
//! let summary = loader.load_from_stream(&mut trie, Cursor::new(file))?;
//!
//! assert_eq!(summary.loaded, 1);
//! assert!(trie.contains("305997"));
//! assert!(loader.ever_loaded());
//! # Ok::<(), bin_range_tree::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
mod node;
pub mod radix;
pub mod range;
pub mod record;
pub mod tree;
pub mod trie;

pub use config::Config;
pub use error::{Error, ParseError, Result};
pub use loader::{LoadSummary, TreeLoader};
pub use radix::RadixTree;
pub use range::{is_in_range, is_prefix, is_valid_key, left_pad};
pub use record::{BinRange, FixedWidthParser, RangeRecord, RecordParser, RecordType};
pub use tree::{SearchTree, SharedTree};
pub use trie::DigitTrie;

#[cfg(test)]
mod proptests;

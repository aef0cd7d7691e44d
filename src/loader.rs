//! Bulk loading of BIN files into a search tree.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{RecordParser, RecordType};
use crate::tree::SearchTree;

/// Outcome of one completed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Lines read from the stream, of any record type.
    pub lines: usize,
    /// Detail records inserted.
    pub loaded: usize,
    /// Detail records the tree refused (duplicate or overlapping range).
    pub rejected: usize,
    /// Tree size after the load.
    pub tree_size: usize,
    pub elapsed: Duration,
}

/// Feeds the detail records of a line-oriented BIN file into a tree.
///
/// Header, trailer and unrecognised lines are skipped. A line that fails to
/// parse aborts the load; records inserted before it stay in the tree. A
/// range the tree refuses is logged and counted, and loading continues.
///
/// Loads through the same loader run one at a time. Progress and state can
/// be polled from other threads while a load runs.
pub struct TreeLoader<P> {
    parser: P,
    config: Config,
    load_lock: Mutex<()>,
    loading: AtomicBool,
    ever_loaded: AtomicBool,
    progress: AtomicU8,
}

/// Marks the end of a load however it exits.
struct LoadingGuard<'a> {
    loading: &'a AtomicBool,
    progress: &'a AtomicU8,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.progress.store(100, Ordering::Release);
        self.loading.store(false, Ordering::Release);
    }
}

impl<P: RecordParser> TreeLoader<P> {
    pub fn new(parser: P) -> Self {
        Self::from_parts(parser, Config::default())
    }

    /// # Errors
    ///
    /// [`Error::InvalidStride`] unless the sampling stride is a power of ten.
    pub fn with_config(parser: P, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(parser, config))
    }

    fn from_parts(parser: P, config: Config) -> Self {
        Self {
            parser,
            config,
            load_lock: Mutex::new(()),
            loading: AtomicBool::new(false),
            ever_loaded: AtomicBool::new(false),
            progress: AtomicU8::new(0),
        }
    }

    pub fn sampling_stride(&self) -> u64 {
        self.config.sampling_stride
    }

    /// Whether any load through this loader has completed successfully.
    pub fn ever_loaded(&self) -> bool {
        self.ever_loaded.load(Ordering::Acquire)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Share of the current (or last) load's detail records processed,
    /// 0 to 100. Never decreases during a load.
    pub fn progress_ratio(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Load every detail record of `stream` into `tree`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the stream cannot be read, [`Error::Parse`] for the
    /// first detail line the parser rejects, and any error
    /// [`SearchTree::insert_bin_range`] returns.
    pub fn load_from_stream<T, B>(&self, tree: &mut T, stream: B) -> Result<LoadSummary>
    where
        T: SearchTree<Record = P::Record>,
        B: BufRead,
    {
        let _serial = self.load_lock.lock();
        self.progress.store(0, Ordering::Release);
        self.loading.store(true, Ordering::Release);
        let _guard = LoadingGuard {
            loading: &self.loading,
            progress: &self.progress,
        };

        let started = Instant::now();
        let stride = self.config.sampling_stride;
        info!(stride, "loading BIN ranges from stream");

        let lines = stream.lines().collect::<std::io::Result<Vec<_>>>()?;
        let total = lines
            .iter()
            .filter(|line| self.parser.classify(line) == RecordType::Detail)
            .count();

        let mut processed = 0;
        let mut loaded = 0;
        let mut rejected = 0;
        for (index, line) in lines.iter().enumerate() {
            if self.parser.classify(line) != RecordType::Detail {
                continue;
            }
            let line_no = index + 1;
            let record = match self.parser.parse(line) {
                Ok(record) => Arc::new(record),
                Err(source) => {
                    error!(line = line_no, loaded, error = %source, "aborted loading BIN ranges");
                    return Err(Error::Parse {
                        line: line_no,
                        source,
                    });
                }
            };

            match tree.insert_bin_range(stride, record) {
                Ok(true) => loaded += 1,
                Ok(false) => {
                    warn!(line = line_no, "failed to insert BIN range into search tree");
                    rejected += 1;
                }
                Err(err) => {
                    error!(line = line_no, loaded, error = %err, "aborted loading BIN ranges");
                    return Err(err);
                }
            }

            processed += 1;
            self.advance(processed, total);
        }

        let summary = LoadSummary {
            lines: lines.len(),
            loaded,
            rejected,
            tree_size: tree.size(),
            elapsed: started.elapsed(),
        };
        info!(
            loaded,
            rejected,
            tree_size = summary.tree_size,
            elapsed = ?summary.elapsed,
            "loaded BIN ranges from stream"
        );
        self.ever_loaded.store(true, Ordering::Release);
        Ok(summary)
    }

    /// [`load_from_stream`](Self::load_from_stream) over a file.
    pub fn load_from_path<T>(&self, tree: &mut T, path: impl AsRef<Path>) -> Result<LoadSummary>
    where
        T: SearchTree<Record = P::Record>,
    {
        let file = File::open(path.as_ref())?;
        self.load_from_stream(tree, BufReader::new(file))
    }

    fn advance(&self, processed: usize, total: usize) {
        let ratio = (processed.saturating_mul(100) / total.max(1)).min(100) as u8;
        self.progress.fetch_max(ratio, Ordering::AcqRel);
    }
}

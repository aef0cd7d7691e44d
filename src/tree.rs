//! The search-tree contract and the algorithms both tree shapes share.
//!
//! A lookup runs in two phases. Direct descent follows the key as far as the
//! tree allows and picks a candidate leaf. When that leaf's range does not
//! contain the key, a bounded backtrack re-examines the nearest
//! lower-ordered siblings of the visited ancestors. Bulk range insertion only
//! stores every `stride`-th value of a range, so most keys inside a large
//! range are found through their sampled left neighbour.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::node::{digit, TreeNode};
use crate::range::{self, is_in_range, is_prefix};
use crate::record::RangeRecord;

/// Bulk range insertions above this many entries are logged.
const LARGE_RANGE_ENTRIES: u64 = 1000;

/// A digit-radix index from BIN prefixes to range records.
///
/// Mutation takes `&mut self`: one insert or delete runs at a time per tree.
/// Wrap a tree in [`SharedTree`] to share it between threads.
pub trait SearchTree {
    type Record: RangeRecord;

    /// Number of nodes, including the root.
    fn size(&self) -> usize;

    /// Whether the root has no children.
    fn is_empty(&self) -> bool;

    /// Store `record` under `key`.
    ///
    /// Returns false, leaving the tree untouched, when `key` is not a
    /// non-empty digit string or is already stored.
    fn insert(&mut self, key: &str, record: Arc<Self::Record>) -> bool;

    /// Remove the entry stored under `key`.
    ///
    /// Returns false when `key` is absent or does not end on a deletable node.
    fn delete(&mut self, key: &str) -> bool;

    /// The range record that best matches `key`: one whose range contains
    /// it, or failing that one whose boundary starts with it.
    fn find(&self, key: &str) -> Option<&Arc<Self::Record>>;

    fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Store `record` at its low boundary and at every multiple of `stride`
    /// inside `(low, high]`, each key zero-padded to the boundary width.
    /// Sampling only happens when the range is wider than `stride`.
    ///
    /// Returns `Ok(false)` when a key is already taken; entries inserted
    /// before the conflict stay in the tree. Overlapping ranges must not be
    /// loaded into the same tree.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStride`] for a stride that is not a power of ten and
    /// [`Error::MalformedRange`] for boundaries that are not an ordered pair
    /// of equal-width digit strings. Nothing is inserted in either case.
    fn insert_bin_range(&mut self, stride: u64, record: Arc<Self::Record>) -> Result<bool> {
        if !range::is_valid_stride(stride) {
            return Err(Error::InvalidStride);
        }
        let (low, high) = range::parse_bounds(record.low_bin(), record.high_bin())?;
        let width = record.low_bin().len();

        if !self.insert(record.low_bin(), Arc::clone(&record)) {
            warn!(low_bin = record.low_bin(), "BIN range with this low BIN already exists");
            return Ok(false);
        }

        let mut entries = 1u64;
        if high - low > stride {
            // high - low > stride, so this cannot overflow.
            let mut bin = low - low % stride + stride;
            while bin <= high {
                let key = range::left_pad(bin, width);
                if !self.insert(&key, Arc::clone(&record)) {
                    warn!(
                        key = %key,
                        low_bin = record.low_bin(),
                        high_bin = record.high_bin(),
                        "duplicate sampled BIN"
                    );
                    return Ok(false);
                }
                entries += 1;
                match bin.checked_add(stride) {
                    Some(next) => bin = next,
                    None => break,
                }
            }
        }

        if entries > LARGE_RANGE_ENTRIES {
            info!(entries, low, high, "sampled BIN range into search tree");
        }
        Ok(true)
    }
}

/// Second lookup phase: settle on the candidate leaf reached by descent or
/// on what backtracking recovers.
///
/// `path` holds the visited ancestors, root first. `index` is the position
/// of the key digit that selected the edge out of the last node on `path`.
/// Range containment wins over prefix matches, and the descent candidate
/// wins ties.
pub(crate) fn resolve<'a, R, N>(
    key: &str,
    path: Vec<&'a N>,
    index: usize,
    leaf: Option<&'a N>,
    limit: usize,
) -> Option<&'a Arc<R>>
where
    R: RangeRecord + 'a,
    N: TreeNode<R>,
{
    let candidate = leaf.and_then(|leaf| leaf.record());
    if let Some(record) = candidate {
        if is_in_range(key, &**record) {
            return Some(record);
        }
    }

    // The previous entry can be the better match: searching 222899 lands on
    // [2228995, 2228999] while [2228980, 2228994] contains the key.
    let recovered = backtrack(key, path, index, limit);
    if let Some(record) = recovered {
        if is_in_range(key, &**record) {
            return Some(record);
        }
    }

    candidate
        .filter(|record| is_prefix(key, &***record))
        .or_else(|| recovered.filter(|record| is_prefix(key, &***record)))
}

/// Bounded backtrack over the explicit ancestor stack.
///
/// Pops at most `min(index - 1, limit)` ancestors. Each popped node answers
/// with its own record when that range contains the key; a popped leaf ends
/// the search. Otherwise the nearest occupied slot below the digit taken at
/// that ancestor is checked, first its own record, then its greatest leaf.
pub(crate) fn backtrack<'a, R, N>(
    key: &str,
    mut path: Vec<&'a N>,
    index: usize,
    limit: usize,
) -> Option<&'a Arc<R>>
where
    R: RangeRecord + 'a,
    N: TreeNode<R>,
{
    let digits = key.as_bytes();
    let matches = |record: &Arc<R>| is_in_range(key, &**record) || is_prefix(key, &**record);

    let mut tries = index.saturating_sub(1).min(limit);
    let mut i = index;
    while tries > 0 {
        let node = path.pop()?;
        if let Some(record) = node.terminal_record() {
            if is_in_range(key, &**record) {
                return Some(record);
            }
        }
        if node.is_leaf() {
            return None;
        }

        tries -= 1;
        let taken = digit(*digits.get(i)?);
        i = i.saturating_sub(node.edge_len());

        if let Some(sibling) = node.slots().below(taken) {
            if let Some(record) = sibling.terminal_record().filter(|&r| matches(r)) {
                return Some(record);
            }
            let greatest = sibling.greatest_leaf().and_then(|leaf| leaf.record());
            if let Some(record) = greatest.filter(|&r| matches(r)) {
                return Some(record);
            }
        }
    }
    None
}

/// A search tree behind a reader-writer lock.
///
/// Every mutation holds the write lock for its whole duration, so
/// concurrent inserts, deletes and bulk loads serialize and readers never
/// observe a half-applied change.
pub struct SharedTree<T> {
    inner: RwLock<T>,
}

impl<T: SearchTree> SharedTree<T> {
    pub fn new(tree: T) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    pub fn insert(&self, key: &str, record: Arc<T::Record>) -> bool {
        self.inner.write().insert(key, record)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().delete(key)
    }

    pub fn insert_bin_range(&self, stride: u64, record: Arc<T::Record>) -> Result<bool> {
        self.inner.write().insert_bin_range(stride, record)
    }

    pub fn find(&self, key: &str) -> Option<Arc<T::Record>> {
        self.inner.read().find(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains(key)
    }

    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Shared access for a batch of lookups.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Exclusive access, e.g. for `TreeLoader::load_from_stream`.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

//! Uncompressed decimal trie: one node per key digit.
//!
//! Records live on the terminal node of their key. A record left on an
//! interior node (because a longer key was inserted through it later) still
//! answers a lookup of that exact key, but backtracking skips it.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::node::{digit, TreeNode, TrieNode};
use crate::range::{is_in_range, is_valid_key};
use crate::record::RangeRecord;
use crate::tree::{self, SearchTree};

pub struct DigitTrie<R> {
    root: TrieNode<R>,
    node_count: usize,
    backtrack_limit: usize,
}

impl<R: RangeRecord> DigitTrie<R> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            root: TrieNode::default(),
            node_count: 1,
            backtrack_limit: config.backtrack_limit,
        }
    }

    pub fn backtrack_limit(&self) -> usize {
        self.backtrack_limit
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &TrieNode<R> {
        &self.root
    }
}

impl<R: RangeRecord> Default for DigitTrie<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RangeRecord> SearchTree for DigitTrie<R> {
    type Record = R;

    fn size(&self) -> usize {
        self.node_count
    }

    fn is_empty(&self) -> bool {
        self.root.is_leaf()
    }

    fn insert(&mut self, key: &str, record: Arc<R>) -> bool {
        if !is_valid_key(key) {
            error!(key, "invalid key ignored");
            return false;
        }
        let digits = key.as_bytes();
        let last = digits.len() - 1;
        let mut node = &mut self.root;
        for (i, &b) in digits.iter().enumerate() {
            let d = digit(b);
            if !node.has_child(d) {
                self.node_count += 1;
                if i == last {
                    node.add_child_with(d, record);
                    return true;
                }
            }
            node = node.children.get_or_insert_with(d, TrieNode::default);
        }
        warn!(key, "duplicate key rejected");
        false
    }

    fn delete(&mut self, key: &str) -> bool {
        if !is_valid_key(key) {
            return false;
        }
        let digits = key.as_bytes();

        // Depth of the deepest node on the path that outlives the removal:
        // the root, a branching node, or one that still carries a record.
        let mut keep = 0;
        let mut node = &self.root;
        for (depth, &b) in digits.iter().enumerate() {
            if node.children.len() > 1 || node.record.is_some() {
                keep = depth;
            }
            match node.child(digit(b)) {
                Some(child) => node = child,
                None => {
                    warn!(key, "BIN does not exist in search tree");
                    return false;
                }
            }
        }
        if !node.is_leaf() {
            warn!(key, "BIN points to a non-leaf node; only leaves can be deleted");
            return false;
        }

        let mut parent = &mut self.root;
        for &b in &digits[..keep] {
            let Some(next) = parent.children.get_mut(digit(b)) else {
                return false;
            };
            parent = next;
        }
        parent.children.take(digit(digits[keep]));
        self.node_count -= digits.len() - keep;
        debug!(key, removed = digits.len() - keep, "deleted key");
        true
    }

    fn find(&self, key: &str) -> Option<&Arc<R>> {
        if !is_valid_key(key) {
            return None;
        }
        let digits = key.as_bytes();
        let mut path = Vec::with_capacity(digits.len());
        let mut node = &self.root;
        for (i, &b) in digits.iter().enumerate() {
            path.push(node);
            match node.child(digit(b)) {
                Some(child) => node = child,
                None => return tree::backtrack(key, path, i, self.backtrack_limit),
            }
        }

        // The key's own record answers before any leaf below it.
        if let Some(record) = node.record.as_ref().filter(|r| is_in_range(key, &***r)) {
            return Some(record);
        }
        let leaf = if node.is_leaf() {
            Some(node)
        } else {
            node.least_leaf()
        };
        tree::resolve(key, path, digits.len() - 1, leaf, self.backtrack_limit)
    }
}

//! Path-compressed radix tree.
//!
//! Each edge carries a label of one or more digits, so a chain of
//! single-child nodes collapses into one node. Inserting a key that leaves
//! an edge part-way through splits that edge; deleting a key merges
//! pass-through nodes back into their only child. Node count tracks the
//! number of branching points rather than the number of digits stored.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::node::{digit, RadixNode, TreeNode};
use crate::range::{is_in_range, is_valid_key};
use crate::record::RangeRecord;
use crate::tree::{self, SearchTree};

pub struct RadixTree<R> {
    root: RadixNode<R>,
    node_count: usize,
    backtrack_limit: usize,
}

impl<R: RangeRecord> RadixTree<R> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            root: RadixNode::new(b""),
            node_count: 1,
            backtrack_limit: config.backtrack_limit,
        }
    }

    pub fn backtrack_limit(&self) -> usize {
        self.backtrack_limit
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &RadixNode<R> {
        &self.root
    }
}

impl<R: RangeRecord> Default for RadixTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl<R: RangeRecord> SearchTree for RadixTree<R> {
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
        let mut node = &mut self.root;
        let mut i = 0;
        while i < digits.len() {
            let rest = &digits[i..];
            let d = digit(rest[0]);
            let shared = node
                .children
                .get(d)
                .map(|child| (common_prefix_len(&child.label, rest), child.label.len()));

            match shared {
                None => {
                    node.add_leaf(rest, record);
                    self.node_count += 1;
                    return true;
                }
                Some((common, label_len)) if common == label_len => {
                    i += label_len;
                    let Some(next) = node.children.get_mut(d) else {
                        return false;
                    };
                    node = next;
                }
                Some((common, _)) => {
                    // The key leaves the edge part-way: split it at `common`.
                    let Some(mut old) = node.children.take(d) else {
                        return false;
                    };
                    let mut inner = Box::new(RadixNode::new(&old.label[..common]));
                    old.label.drain(..common);
                    inner.add_child(old);
                    self.node_count += 1;

                    let tail = &rest[common..];
                    if tail.is_empty() {
                        inner.record = Some(record);
                    } else {
                        inner.add_leaf(tail, record);
                        self.node_count += 1;
                    }
                    node.add_child(inner);
                    return true;
                }
            }
        }

        if node.record.is_some() {
            warn!(key, "duplicate key rejected");
            return false;
        }
        node.record = Some(record);
        true
    }

    fn delete(&mut self, key: &str) -> bool {
        if !is_valid_key(key) {
            return false;
        }
        let digits = key.as_bytes();

        // Slot digits from the root down to the target.
        let mut path: SmallVec<[usize; 16]> = SmallVec::new();
        let mut node = &self.root;
        let mut i = 0;
        while i < digits.len() {
            let d = digit(digits[i]);
            match node.child(d) {
                Some(child) if digits[i..].starts_with(&child.label) => {
                    i += child.label.len();
                    path.push(d);
                    node = child;
                }
                _ => {
                    warn!(key, "BIN does not exist in search tree");
                    return false;
                }
            }
        }
        if node.record.is_none() {
            warn!(key, "BIN points to a non-leaf node; only leaves can be deleted");
            return false;
        }

        let Some((&slot, ancestors)) = path.split_last() else {
            return false;
        };
        let mut parent = &mut self.root;
        for &d in ancestors {
            let Some(next) = parent.children.get_mut(d) else {
                return false;
            };
            parent = next;
        }
        let Some(target) = parent.children.get_mut(slot) else {
            return false;
        };

        if target.is_leaf() {
            let label = target.label.clone();
            parent.remove_child(&label);
            self.node_count -= 1;
            if !ancestors.is_empty() && parent.combine() {
                self.node_count -= 1;
            }
        } else {
            target.record = None;
            if target.combine() {
                self.node_count -= 1;
            }
        }
        debug!(key, size = self.node_count, "deleted key");
        true
    }

    fn find(&self, key: &str) -> Option<&Arc<R>> {
        if !is_valid_key(key) {
            return None;
        }
        let digits = key.as_bytes();
        let mut path = Vec::new();
        let mut node = &self.root;
        let mut index = 0;
        let mut start;
        let mut rest;
        loop {
            path.push(node);
            rest = &digits[index..];
            let Some(child) = node.child(digit(rest[0])) else {
                return tree::backtrack(key, path, index, self.backtrack_limit);
            };
            node = child;
            start = index;
            if rest.starts_with(&child.label) {
                index += child.label.len();
                if index < digits.len() {
                    continue;
                }
            }
            break;
        }

        if index == digits.len() {
            if let Some(record) = node.record.as_ref().filter(|r| is_in_range(key, &***r)) {
                return Some(record);
            }
        }

        // Descent stopped on `node`, either with the key consumed or inside
        // its label. Lexicographic order picks the side of its subtree.
        let leaf = if node.is_leaf() {
            Some(node)
        } else if rest <= node.label.as_slice() {
            node.least_leaf()
        } else {
            node.greatest_leaf()
        };
        tree::resolve(key, path, start, leaf, self.backtrack_limit)
    }
}

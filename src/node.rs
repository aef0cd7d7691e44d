//! Digit-indexed node types.
//!
//! Both tree shapes branch ten ways, one slot per decimal digit. The slot
//! array is allocated on the first child so leaves, the bulk of any loaded
//! tree, cost a single pointer for their children.
//!
//! - [`TrieNode`]: one digit per edge.
//! - [`RadixNode`]: the incoming edge carries a label of one or more digits.

use std::sync::Arc;

use smallvec::SmallVec;

pub(crate) const RADIX: usize = 10;

/// Slot index of an ASCII digit. Callers validate keys first.
#[inline]
pub(crate) fn digit(b: u8) -> usize {
    debug_assert!(b.is_ascii_digit());
    (b - b'0') as usize
}

/// Ten optional owning child slots, indexed by digit value.
pub(crate) struct Slots<N> {
    slots: Option<Box<[Option<Box<N>>; RADIX]>>,
}

impl<N> Default for Slots<N> {
    fn default() -> Self {
        Self { slots: None }
    }
}

impl<N> Slots<N> {
    #[inline]
    pub(crate) fn get(&self, d: usize) -> Option<&N> {
        self.slots.as_ref()?[d].as_deref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, d: usize) -> Option<&mut N> {
        self.slots.as_mut()?[d].as_deref_mut()
    }

    #[inline]
    pub(crate) fn contains(&self, d: usize) -> bool {
        self.get(d).is_some()
    }

    /// Fill an empty slot. Returns false (and drops nothing) when occupied.
    pub(crate) fn insert(&mut self, d: usize, node: Box<N>) -> bool {
        let slots = self.slots.get_or_insert_with(Default::default);
        if slots[d].is_some() {
            return false;
        }
        slots[d] = Some(node);
        true
    }

    pub(crate) fn get_or_insert_with(&mut self, d: usize, f: impl FnOnce() -> N) -> &mut N {
        let slots = self.slots.get_or_insert_with(Default::default);
        &mut **slots[d].get_or_insert_with(|| Box::new(f()))
    }

    /// Detach a child; the slot array is released once the last child goes.
    pub(crate) fn take(&mut self, d: usize) -> Option<Box<N>> {
        let slots = self.slots.as_mut()?;
        let node = slots[d].take();
        let emptied = slots.iter().all(Option::is_none);
        if emptied {
            self.slots = None;
        }
        node
    }

    /// Detach the child if it is the only one.
    pub(crate) fn take_only(&mut self) -> Option<Box<N>> {
        let d = {
            let mut occupied = self.iter().map(|(d, _)| d);
            let d = occupied.next()?;
            if occupied.next().is_some() {
                return None;
            }
            d
        };
        self.take(d)
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &N)> + '_ {
        self.slots.iter().flat_map(|slots| {
            slots
                .iter()
                .enumerate()
                .filter_map(|(d, child)| child.as_deref().map(|child| (d, child)))
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.iter().count()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    /// Child in the lowest occupied slot.
    pub(crate) fn first(&self) -> Option<&N> {
        self.slots.as_ref()?.iter().find_map(|child| child.as_deref())
    }

    /// Child in the highest occupied slot.
    pub(crate) fn last(&self) -> Option<&N> {
        self.slots.as_ref()?.iter().rev().find_map(|child| child.as_deref())
    }

    /// Child in the nearest occupied slot strictly below `d`.
    pub(crate) fn below(&self, d: usize) -> Option<&N> {
        self.slots.as_ref()?[..d].iter().rev().find_map(|child| child.as_deref())
    }
}

/// Contract shared by both node shapes; the lookup scaffold in
/// [`crate::tree`] is written against it.
pub(crate) trait TreeNode<R>: Sized {
    /// Whether a record on a node that still has children answers lookups.
    const INTERIOR_RECORDS: bool;

    fn slots(&self) -> &Slots<Self>;

    fn record(&self) -> Option<&Arc<R>>;

    /// Key digits consumed by the edge into this node.
    fn edge_len(&self) -> usize;

    #[inline]
    fn child(&self, d: usize) -> Option<&Self> {
        self.slots().get(d)
    }

    #[inline]
    fn has_child(&self, d: usize) -> bool {
        self.slots().contains(d)
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.slots().is_empty()
    }

    /// Leaf reached by always following the lowest digit. `None` if this
    /// node has no children.
    fn least_leaf(&self) -> Option<&Self> {
        let mut node = self.slots().first()?;
        while let Some(next) = node.slots().first() {
            node = next;
        }
        Some(node)
    }

    /// Leaf reached by always following the highest digit. `None` if this
    /// node has no children.
    fn greatest_leaf(&self) -> Option<&Self> {
        let mut node = self.slots().last()?;
        while let Some(next) = node.slots().last() {
            node = next;
        }
        Some(node)
    }

    /// The record this node answers a lookup with.
    fn terminal_record(&self) -> Option<&Arc<R>> {
        if Self::INTERIOR_RECORDS || self.is_leaf() {
            self.record()
        } else {
            None
        }
    }
}

pub(crate) struct TrieNode<R> {
    pub(crate) children: Slots<TrieNode<R>>,
    pub(crate) record: Option<Arc<R>>,
}

impl<R> Default for TrieNode<R> {
    fn default() -> Self {
        Self {
            children: Slots::default(),
            record: None,
        }
    }
}

impl<R> TrieNode<R> {
    pub(crate) fn with_record(record: Arc<R>) -> Self {
        Self {
            children: Slots::default(),
            record: Some(record),
        }
    }

    pub(crate) fn add_child_with(&mut self, d: usize, record: Arc<R>) -> bool {
        self.children.insert(d, Box::new(Self::with_record(record)))
    }
}

impl<R> TreeNode<R> for TrieNode<R> {
    const INTERIOR_RECORDS: bool = false;

    #[inline]
    fn slots(&self) -> &Slots<Self> {
        &self.children
    }

    #[inline]
    fn record(&self) -> Option<&Arc<R>> {
        self.record.as_ref()
    }

    #[inline]
    fn edge_len(&self) -> usize {
        1
    }
}

/// Edge label: the ASCII digits consumed on the way into a radix node.
pub(crate) type Label = SmallVec<[u8; 16]>;

pub(crate) struct RadixNode<R> {
    pub(crate) label: Label,
    pub(crate) children: Slots<RadixNode<R>>,
    pub(crate) record: Option<Arc<R>>,
}

impl<R> RadixNode<R> {
    pub(crate) fn new(label: &[u8]) -> Self {
        Self {
            label: Label::from_slice(label),
            children: Slots::default(),
            record: None,
        }
    }

    pub(crate) fn leaf(label: &[u8], record: Arc<R>) -> Self {
        Self {
            record: Some(record),
            ..Self::new(label)
        }
    }

    #[inline]
    pub(crate) fn first_digit(&self) -> Option<usize> {
        self.label.first().map(|&b| digit(b))
    }

    /// Attach `child` under the slot of its label's first digit. False when
    /// that slot is taken or the label is empty.
    pub(crate) fn add_child(&mut self, child: Box<Self>) -> bool {
        match child.first_digit() {
            Some(d) => self.children.insert(d, child),
            None => false,
        }
    }

    pub(crate) fn add_leaf(&mut self, label: &[u8], record: Arc<R>) -> bool {
        self.add_child(Box::new(Self::leaf(label, record)))
    }

    /// Detach the child whose label is exactly `label`.
    pub(crate) fn remove_child(&mut self, label: &[u8]) -> Option<Box<Self>> {
        let d = digit(*label.first()?);
        if self.children.get(d)?.label.as_slice() != label {
            return None;
        }
        self.children.take(d)
    }

    pub(crate) fn number_of_children(&self) -> usize {
        self.children.len()
    }

    #[cfg(test)]
    pub(crate) fn children(&self) -> impl Iterator<Item = &Self> + '_ {
        self.children.iter().map(|(_, child)| child)
    }

    /// Absorb the single child of a record-less node: labels concatenate and
    /// the child's record and children move up. Returns false (no change)
    /// when the node carries a record or does not have exactly one child.
    pub(crate) fn combine(&mut self) -> bool {
        if self.record.is_some() || self.number_of_children() != 1 {
            return false;
        }
        let Some(child) = self.children.take_only() else {
            return false;
        };
        let RadixNode {
            label,
            children,
            record,
        } = *child;
        self.label.extend_from_slice(&label);
        self.children = children;
        self.record = record;
        true
    }
}

impl<R> TreeNode<R> for RadixNode<R> {
    const INTERIOR_RECORDS: bool = true;

    #[inline]
    fn slots(&self) -> &Slots<Self> {
        &self.children
    }

    #[inline]
    fn record(&self) -> Option<&Arc<R>> {
        self.record.as_ref()
    }

    #[inline]
    fn edge_len(&self) -> usize {
        self.label.len()
    }
}

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Ordered set with O(1) membership, insert, swap-remove and indexed access.
///
/// `sequence` defines the enumeration order; `position` maps each item back
/// to its slot. Invariant: `position[sequence[i]] == i` for every valid `i`.
/// Removal relocates the last element into the freed slot, so order is
/// stable except for that one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerableSet<T: Eq + Hash + Clone> {
    sequence: Vec<T>,
    position: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> EnumerableSet<T> {
    pub fn new() -> Self {
        EnumerableSet {
            sequence: Vec::new(),
            position: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position.contains_key(item)
    }

    /// Inserts if absent. Returns whether the item was newly inserted;
    /// re-adding is idempotent, not an error.
    pub fn add(&mut self, item: T) -> bool {
        if self.position.contains_key(&item) {
            return false;
        }
        self.position.insert(item.clone(), self.sequence.len());
        self.sequence.push(item);
        true
    }

    /// Removes if present by moving the last element into the freed slot.
    pub fn remove<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = match self.position.remove(item) {
            Some(index) => index,
            None => return false,
        };
        self.sequence.swap_remove(index);
        if index < self.sequence.len() {
            // the relocated element needs its position re-pointed
            self.position.insert(self.sequence[index].clone(), index);
        }
        true
    }

    pub fn at(&self, index: usize) -> Result<&T> {
        self.sequence.get(index).ok_or_else(|| {
            Error::new(
                ErrorKind::OutOfRange,
                format!("index {} out of range for set of size {}", index, self.sequence.len()),
            )
        })
    }

    /// Clamped windowed read: up to `count` items starting at `start`.
    ///
    /// `start` past the end of a non-empty set is a range error; `count`
    /// running past the end is clamped. `start == 0` on an empty set reads
    /// as an empty window.
    pub fn window(&self, start: usize, count: usize) -> Result<&[T]> {
        if start > 0 && start >= self.sequence.len() {
            return Err(Error::new(
                ErrorKind::OutOfRange,
                format!("window start {} out of range for set of size {}", start, self.sequence.len()),
            ));
        }
        let end = start.saturating_add(count).min(self.sequence.len());
        Ok(&self.sequence[start..end])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.sequence.iter()
    }
}

impl<T: Eq + Hash + Clone> Default for EnumerableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

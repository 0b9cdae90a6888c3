use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::gas::{GasMeter, attach_cost, index_cost, window_cost};
use crate::core::types::{BoxId, Tag};
use crate::set::EnumerableSet;

/// The three logical tables of the tag index.
///
/// `forward` is written directly by `tag_box` and is always current.
/// `registry` and `reverse` are written only by `index_box`, so they lag
/// the forward table until a box is (re-)indexed.
///
/// Pure in-memory state machine: durability and locking live in
/// `core::database`. Every mutation charges the caller's meter in full
/// before touching state, so a failed call changes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagDb {
    forward: HashMap<BoxId, EnumerableSet<Tag>>,
    registry: EnumerableSet<Tag>,
    reverse: HashMap<Tag, EnumerableSet<BoxId>>,
}

impl TagDb {
    pub fn new() -> Self {
        TagDb::default()
    }

    /// Pre-flight for `tag_box`: charges the meter and checks the cap
    /// without mutating. Returns whether the tag would be newly added.
    pub fn check_tag_box(
        &self,
        box_id: &BoxId,
        tag: &Tag,
        gas: &mut GasMeter,
        max_tags_per_box: usize,
    ) -> Result<bool> {
        gas.charge(attach_cost())?;

        let current = self.forward.get(box_id);
        if let Some(set) = current {
            if set.contains(tag) {
                return Ok(false);
            }
        }
        let size = current.map_or(0, |set| set.size());
        if size >= max_tags_per_box {
            return Err(Error::new(
                ErrorKind::Capacity,
                format!("box {} already carries {} tags (cap {})", box_id, size, max_tags_per_box),
            ));
        }
        Ok(true)
    }

    /// Infallible second half of `tag_box`; the caller must have passed
    /// `check_tag_box` against the same state.
    pub fn apply_tag_box(&mut self, box_id: BoxId, tag: Tag) {
        self.forward.entry(box_id).or_default().add(tag);
    }

    /// Adds `tag` to the box's forward set. Returns whether it was newly
    /// added; re-attaching is idempotent. Never touches registry/reverse.
    pub fn tag_box(
        &mut self,
        box_id: BoxId,
        tag: Tag,
        gas: &mut GasMeter,
        max_tags_per_box: usize,
    ) -> Result<bool> {
        let newly = self.check_tag_box(&box_id, &tag, gas, max_tags_per_box)?;
        if newly {
            self.apply_tag_box(box_id, tag);
        }
        Ok(newly)
    }

    /// Pre-flight for `index_box`: checks the cap, then charges the full
    /// O(k) pass up front. Returns k, the current forward-set size.
    pub fn check_index_box(
        &self,
        box_id: &BoxId,
        gas: &mut GasMeter,
        max_tags_per_box: usize,
    ) -> Result<usize> {
        let size = self.forward.get(box_id).map_or(0, |set| set.size());
        if size > max_tags_per_box {
            return Err(Error::new(
                ErrorKind::Capacity,
                format!("box {} carries {} tags (cap {})", box_id, size, max_tags_per_box),
            ));
        }
        gas.charge(index_cost(size))?;
        Ok(size)
    }

    /// Infallible second half of `index_box`: folds the box's forward set
    /// into the global registry and the per-tag reverse sets.
    pub fn apply_index_box(&mut self, box_id: &BoxId) {
        let forward = match self.forward.get(box_id) {
            Some(set) => set,
            None => return,
        };
        for tag in forward.iter() {
            self.registry.add(tag.clone());
            self.reverse.entry(tag.clone()).or_default().add(*box_id);
        }
    }

    /// Reconciles the box's current forward set into the global registry
    /// and the per-tag reverse sets. Single pass, O(k) with k = current
    /// forward-set size, charged in full up front.
    ///
    /// There is deliberately no "already indexed" short-circuit: re-running
    /// always re-scans the full forward set, which is what lets a second
    /// call pick up tags attached after the first. Returns k.
    pub fn index_box(
        &mut self,
        box_id: BoxId,
        gas: &mut GasMeter,
        max_tags_per_box: usize,
    ) -> Result<usize> {
        let size = self.check_index_box(&box_id, gas, max_tags_per_box)?;
        self.apply_index_box(&box_id);
        Ok(size)
    }

    /// Registry membership only: false for a tag that has been attached
    /// but never picked up by an `index_box` pass.
    pub fn tag_exists(&self, tag: &str) -> bool {
        self.registry.contains(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.registry.size()
    }

    pub fn tag_at(&self, index: usize) -> Result<&Tag> {
        self.registry.at(index)
    }

    pub fn tags(&self, start: usize, count: usize, gas: &mut GasMeter) -> Result<&[Tag]> {
        windowed(Some(&self.registry), start, count, gas)
    }

    pub fn tag_count_for_box(&self, box_id: &BoxId) -> usize {
        self.forward.get(box_id).map_or(0, |set| set.size())
    }

    pub fn tag_at_for_box(&self, box_id: &BoxId, index: usize) -> Result<&Tag> {
        match self.forward.get(box_id) {
            Some(set) => set.at(index),
            None => Err(Error::new(
                ErrorKind::OutOfRange,
                format!("index {} out of range for box {} with no tags", index, box_id),
            )),
        }
    }

    pub fn tags_for_box(
        &self,
        box_id: &BoxId,
        start: usize,
        count: usize,
        gas: &mut GasMeter,
    ) -> Result<&[Tag]> {
        windowed(self.forward.get(box_id), start, count, gas)
    }

    pub fn box_count_for_tag(&self, tag: &str) -> usize {
        self.reverse.get(tag).map_or(0, |set| set.size())
    }

    pub fn box_at_for_tag(&self, tag: &str, index: usize) -> Result<&BoxId> {
        match self.reverse.get(tag) {
            Some(set) => set.at(index),
            None => Err(Error::new(
                ErrorKind::OutOfRange,
                format!("index {} out of range for tag `{}` with no boxes", index, tag),
            )),
        }
    }

    pub fn boxes_for_tag(
        &self,
        tag: &str,
        start: usize,
        count: usize,
        gas: &mut GasMeter,
    ) -> Result<&[BoxId]> {
        windowed(self.reverse.get(tag), start, count, gas)
    }

    pub fn box_count(&self) -> usize {
        self.forward.len()
    }
}

/// Shared window policy for all three tables: an absent owner reads as an
/// empty set, and the clamped item count is what gets metered.
fn windowed<'a, T: Eq + std::hash::Hash + Clone>(
    set: Option<&'a EnumerableSet<T>>,
    start: usize,
    count: usize,
    gas: &mut GasMeter,
) -> Result<&'a [T]> {
    let items: &[T] = match set {
        Some(set) => set.window(start, count)?,
        None if start == 0 => &[],
        None => {
            return Err(Error::new(
                ErrorKind::OutOfRange,
                format!("window start {} out of range for empty set", start),
            ));
        }
    };
    gas.charge(window_cost(items.len()))?;
    Ok(items)
}

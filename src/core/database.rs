use std::time::Instant;
use chrono::Utc;
use log::debug;
use parking_lot::RwLock;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::gas::GasMeter;
use crate::core::stats::DatabaseStats;
use crate::core::types::{BoxId, IndexReceipt, Tag};
use crate::index::{TagDb, TagIndex};
use crate::storage::checkpoint::{self, Checkpoint, RecoveryManager};
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::wal::{Operation, WAL};

/// The deployable unit: durable, single-writer tag index.
///
/// Every mutating call runs against a fresh per-call meter built from
/// `Config::call_budget` and is ordered validate → charge → WAL append →
/// apply, so a failed call leaves neither memory nor disk changed.
#[derive(Debug)]
pub struct Database {
    config: Config,
    storage: StorageLayout,
    inner: RwLock<Inner>,
    start_time: Instant,
    _lock: FileLock,
}

#[derive(Debug)]
struct Inner {
    db: TagDb,
    wal: WAL,
    ops_since_checkpoint: u64,
}

impl Database {
    /// Open (or create) the store at `config.storage_path`, recovering
    /// state from the latest checkpoint plus the WAL tail.
    pub fn open(config: Config) -> Result<Self> {
        let storage = StorageLayout::new(config.storage_path.clone())?;
        let lock = FileLock::acquire(&storage)?;

        let recovery = RecoveryManager::new(&storage)?;
        let (db, wal) = recovery.recover(&storage, config.sync_mode)?;

        Ok(Database {
            config,
            storage,
            inner: RwLock::new(Inner {
                db,
                wal,
                ops_since_checkpoint: 0,
            }),
            start_time: Instant::now(),
            _lock: lock,
        })
    }

    /// Attach a tag to a box's forward set. True iff newly added; the
    /// reverse index and registry are untouched until `index_box`.
    pub fn tag_box(&self, box_id: BoxId, tag: &str) -> Result<bool> {
        let tag = Tag::new(tag)?;
        let mut gas = GasMeter::new(self.config.call_budget);

        let mut inner = self.inner.write();
        let newly = inner
            .db
            .check_tag_box(&box_id, &tag, &mut gas, self.config.max_tags_per_box)?;
        if !newly {
            return Ok(false);
        }

        inner.wal.append(Operation::TagBox {
            box_id,
            tag: tag.clone(),
        })?;
        inner.db.apply_tag_box(box_id, tag);
        self.after_mutation(&mut inner)?;
        Ok(true)
    }

    /// Reconcile the box's current forward set into the global registry
    /// and per-tag reverse sets. O(k), charged up front; a box past the
    /// cap or a budget miss fails before anything is written.
    pub fn index_box(&self, box_id: BoxId) -> Result<IndexReceipt> {
        let mut gas = GasMeter::new(self.config.call_budget);

        let mut inner = self.inner.write();
        let tags_indexed =
            inner
                .db
                .check_index_box(&box_id, &mut gas, self.config.max_tags_per_box)?;

        inner.wal.append(Operation::IndexBox { box_id })?;
        inner.db.apply_index_box(&box_id);
        self.after_mutation(&mut inner)?;
        Ok(IndexReceipt {
            tags_indexed,
            gas_used: gas.used(),
        })
    }

    pub fn tag_exists(&self, tag: &str) -> bool {
        self.inner.read().db.tag_exists(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.inner.read().db.tag_count()
    }

    pub fn tag_at(&self, index: usize) -> Result<Tag> {
        self.inner.read().db.tag_at(index).map(Tag::clone)
    }

    pub fn tags(&self, start: usize, count: usize) -> Result<Vec<Tag>> {
        let mut gas = GasMeter::new(self.config.call_budget);
        let inner = self.inner.read();
        Ok(inner.db.tags(start, count, &mut gas)?.to_vec())
    }

    pub fn tag_count_for_box(&self, box_id: BoxId) -> usize {
        self.inner.read().db.tag_count_for_box(&box_id)
    }

    pub fn tag_at_for_box(&self, box_id: BoxId, index: usize) -> Result<Tag> {
        self.inner.read().db.tag_at_for_box(&box_id, index).map(Tag::clone)
    }

    pub fn tags_for_box(&self, box_id: BoxId, start: usize, count: usize) -> Result<Vec<Tag>> {
        let mut gas = GasMeter::new(self.config.call_budget);
        let inner = self.inner.read();
        Ok(inner.db.tags_for_box(&box_id, start, count, &mut gas)?.to_vec())
    }

    pub fn box_count_for_tag(&self, tag: &str) -> usize {
        self.inner.read().db.box_count_for_tag(tag)
    }

    pub fn box_at_for_tag(&self, tag: &str, index: usize) -> Result<BoxId> {
        self.inner.read().db.box_at_for_tag(tag, index).map(|id| *id)
    }

    pub fn boxes_for_tag(&self, tag: &str, start: usize, count: usize) -> Result<Vec<BoxId>> {
        let mut gas = GasMeter::new(self.config.call_budget);
        let inner = self.inner.read();
        Ok(inner.db.boxes_for_tag(tag, start, count, &mut gas)?.to_vec())
    }

    /// Registry tags `[start, start+count)` joined with `,`.
    pub fn format_tags(&self, start: usize, count: usize) -> Result<String> {
        Ok(join_csv(self.tags(start, count)?.iter()))
    }

    /// Forward-set tags of one box, joined with `,`.
    pub fn format_box_tags(&self, box_id: BoxId, start: usize, count: usize) -> Result<String> {
        Ok(join_csv(self.tags_for_box(box_id, start, count)?.iter()))
    }

    /// Boxes carrying one tag, as hex ids joined with `,`.
    pub fn format_tag_boxes(&self, tag: &str, start: usize, count: usize) -> Result<String> {
        Ok(join_csv(self.boxes_for_tag(tag, start, count)?.iter()))
    }

    /// Force WAL contents to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.write().wal.sync()
    }

    /// Snapshot the full table state and rotate the WAL.
    pub fn checkpoint(&self) -> Result<()> {
        self.checkpoint_inner(&mut self.inner.write())
    }

    pub fn stats(&self) -> DatabaseStats {
        let inner = self.inner.read();
        DatabaseStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            boxes_tracked: inner.db.box_count(),
            tags_registered: inner.db.tag_count(),
            wal_sequence: inner.wal.sequence,
            wal_size_bytes: inner.wal.position,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn after_mutation(&self, inner: &mut Inner) -> Result<()> {
        inner.ops_since_checkpoint += 1;
        if inner.ops_since_checkpoint >= self.config.checkpoint_interval_ops {
            self.checkpoint_inner(inner)?;
        }
        Ok(())
    }

    fn checkpoint_inner(&self, inner: &mut Inner) -> Result<()> {
        inner.wal.sync()?;
        checkpoint::save_state(&self.storage, &inner.db)?;
        Checkpoint {
            wal_sequence: inner.wal.sequence,
            timestamp: Utc::now(),
            box_count: inner.db.box_count(),
            tag_count: inner.db.tag_count(),
        }
        .save(&self.storage)?;
        inner.wal.rotate(&self.storage)?;
        inner.ops_since_checkpoint = 0;
        debug!("checkpoint at wal sequence {}", inner.wal.sequence);
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let _ = self.inner.write().wal.sync();
    }
}

impl TagIndex for Database {
    fn tag_box(&self, box_id: BoxId, tag: &str) -> Result<bool> {
        Database::tag_box(self, box_id, tag)
    }

    fn index_box(&self, box_id: BoxId) -> Result<IndexReceipt> {
        Database::index_box(self, box_id)
    }

    fn tag_exists(&self, tag: &str) -> bool {
        Database::tag_exists(self, tag)
    }

    fn tag_count(&self) -> usize {
        Database::tag_count(self)
    }

    fn tag_at(&self, index: usize) -> Result<Tag> {
        Database::tag_at(self, index)
    }

    fn tags(&self, start: usize, count: usize) -> Result<Vec<Tag>> {
        Database::tags(self, start, count)
    }

    fn tag_count_for_box(&self, box_id: BoxId) -> usize {
        Database::tag_count_for_box(self, box_id)
    }

    fn tag_at_for_box(&self, box_id: BoxId, index: usize) -> Result<Tag> {
        Database::tag_at_for_box(self, box_id, index)
    }

    fn tags_for_box(&self, box_id: BoxId, start: usize, count: usize) -> Result<Vec<Tag>> {
        Database::tags_for_box(self, box_id, start, count)
    }

    fn box_count_for_tag(&self, tag: &str) -> usize {
        Database::box_count_for_tag(self, tag)
    }

    fn box_at_for_tag(&self, tag: &str, index: usize) -> Result<BoxId> {
        Database::box_at_for_tag(self, tag, index)
    }

    fn boxes_for_tag(&self, tag: &str, start: usize, count: usize) -> Result<Vec<BoxId>> {
        Database::boxes_for_tag(self, tag, start, count)
    }
}

fn join_csv<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

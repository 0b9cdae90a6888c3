use std::fs;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::core::gas::GasMeter;
use crate::index::TagDb;
use crate::storage::layout::StorageLayout;
use crate::storage::wal::{Operation, SyncMode, WAL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub wal_sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub box_count: usize,
    pub tag_count: usize,
}

impl Checkpoint {
    /// Load checkpoint from disk
    pub fn load(storage: &StorageLayout) -> Result<Option<Self>> {
        let path = storage.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(path)?;
        let checkpoint = bincode::deserialize(&data)?;
        Ok(Some(checkpoint))
    }

    /// Save checkpoint to disk
    pub fn save(&self, storage: &StorageLayout) -> Result<()> {
        let data = bincode::serialize(self)?;
        fs::write(storage.checkpoint_path(), data)?;
        Ok(())
    }
}

/// Snapshot of the full table state, written alongside the checkpoint.
pub fn save_state(storage: &StorageLayout, db: &TagDb) -> Result<()> {
    let data = bincode::serialize(db)?;
    fs::write(storage.state_path(), data)?;
    Ok(())
}

pub fn load_state(storage: &StorageLayout) -> Result<Option<TagDb>> {
    let path = storage.state_path();
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read(path)?;
    let db = bincode::deserialize(&data)?;
    Ok(Some(db))
}

pub struct RecoveryManager {
    pub checkpoint: Option<Checkpoint>,
}

impl RecoveryManager {
    pub fn new(storage: &StorageLayout) -> Result<Self> {
        let checkpoint = Checkpoint::load(storage)?;
        Ok(RecoveryManager { checkpoint })
    }

    /// Restore the table state: snapshot first, then the WAL tail.
    ///
    /// Replay runs under an unlimited meter and an unbounded cap — every
    /// replayed operation was validated and admitted when first appended.
    /// Returns the recovered state and the WAL positioned for appends.
    pub fn recover(&self, storage: &StorageLayout, sync_mode: SyncMode) -> Result<(TagDb, WAL)> {
        let wal_sequence = self
            .checkpoint
            .as_ref()
            .map(|c| c.wal_sequence)
            .unwrap_or(0);

        let mut db = match load_state(storage)? {
            Some(db) => {
                if let Some(checkpoint) = &self.checkpoint {
                    info!("loaded checkpoint from {}", checkpoint.timestamp);
                }
                db
            }
            None => TagDb::new(),
        };

        let mut wal = WAL::open(storage, wal_sequence, sync_mode)?;
        let entries = wal.read_entries()?;
        let replayed = entries.len();

        let mut gas = GasMeter::unlimited();
        for entry in entries {
            match entry.operation {
                Operation::TagBox { box_id, tag } => {
                    db.tag_box(box_id, tag, &mut gas, usize::MAX)?;
                }
                Operation::IndexBox { box_id } => {
                    db.index_box(box_id, &mut gas, usize::MAX)?;
                }
            }
        }
        wal.sequence = wal_sequence + replayed as u64;

        if replayed > 0 {
            info!("replayed {} WAL operations", replayed);
        }

        Ok((db, wal))
    }
}

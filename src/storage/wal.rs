use std::fs::{File, OpenOptions};
use std::io::{Write, Read, Seek, SeekFrom};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{BoxId, Tag};
use crate::storage::layout::StorageLayout;

const MAX_ENTRY_BYTES: usize = 1024;
const BATCH_SYNC_INTERVAL: u64 = 64;

/// Write-ahead log for durability
#[derive(Debug)]
pub struct WAL {
    pub file: File,
    pub position: u64,
    pub sync_mode: SyncMode,
    pub sequence: u64,
    appends_since_sync: u64,
}

#[derive(Debug, Clone, Copy)]
pub enum SyncMode {
    Immediate,  // fsync after every append
    Batch,      // fsync every BATCH_SYNC_INTERVAL appends
    None,       // Let OS handle it
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WALEntry {
    pub sequence: u64,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    TagBox { box_id: BoxId, tag: Tag },
    IndexBox { box_id: BoxId },
}

impl WAL {
    pub fn open(storage: &StorageLayout, sequence: u64, sync_mode: SyncMode) -> Result<Self> {
        let path = storage.wal_path(sequence);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let position = file.metadata()?.len();

        Ok(WAL {
            file,
            position,
            sync_mode,
            sequence,
            appends_since_sync: 0,
        })
    }

    /// Appends one record: `[len u32][crc32 u32][bincode entry]`.
    pub fn append(&mut self, operation: Operation) -> Result<()> {
        let entry = WALEntry {
            sequence: self.sequence,
            operation,
            timestamp: Utc::now(),
        };

        let data = bincode::serialize(&entry)?;
        let len = data.len() as u32;
        let crc = crc32fast::hash(&data);

        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.write_all(&data)?;

        self.sequence += 1;
        self.position += 8 + data.len() as u64;
        self.appends_since_sync += 1;

        match self.sync_mode {
            SyncMode::Immediate => self.sync()?,
            SyncMode::Batch if self.appends_since_sync >= BATCH_SYNC_INTERVAL => {
                self.sync()?
            }
            _ => {}
        }

        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.appends_since_sync = 0;
        Ok(())
    }

    /// Starts a fresh WAL file at the current sequence; the old file's
    /// entries are covered by the checkpoint taken just before rotation.
    pub fn rotate(&mut self, storage: &StorageLayout) -> Result<()> {
        self.sync()?;
        let new_wal = WAL::open(storage, self.sequence, self.sync_mode)?;
        *self = new_wal;
        Ok(())
    }

    /// Read all entries back for recovery. A torn record at the tail is
    /// treated as an interrupted append and dropped; a checksum mismatch
    /// anywhere else is corruption and fails the open.
    pub fn read_entries(&mut self) -> Result<Vec<WALEntry>> {
        let mut entries = Vec::new();

        self.file.seek(SeekFrom::Start(0))?;

        loop {
            let mut header = [0u8; 8];
            match self.file.read_exact(&mut header) {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(Error::new(ErrorKind::Io, format!("failed to read WAL: {}", e))),
            }

            let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if len > MAX_ENTRY_BYTES {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("WAL entry of {} bytes exceeds the {} byte record limit", len, MAX_ENTRY_BYTES),
                ));
            }

            let mut data = vec![0u8; len];
            match self.file.read_exact(&mut data) {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    warn!("dropping torn WAL record at entry {}", entries.len());
                    break;
                }
                Err(e) => return Err(Error::new(ErrorKind::Io, format!("failed to read WAL: {}", e))),
            }

            if crc32fast::hash(&data) != crc {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("WAL checksum mismatch at entry {}", entries.len()),
                ));
            }

            entries.push(bincode::deserialize(&data)?);
        }

        self.file.seek(SeekFrom::End(0))?;
        Ok(entries)
    }
}

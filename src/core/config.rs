use std::path::PathBuf;
use crate::storage::wal::SyncMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,

    /// Hard per-call computation budget, in gas units.
    pub call_budget: u64,

    /// Hard cap on tags per box. Keeps `index_box` boundable: the worst
    /// admissible pass must fit inside `call_budget`.
    pub max_tags_per_box: usize,

    pub sync_mode: SyncMode,

    /// Checkpoint after this many committed mutations.
    pub checkpoint_interval_ops: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            call_budget: 3_000_000,            // index_cost(128) == 1_352_200
            max_tags_per_box: 128,
            sync_mode: SyncMode::Batch,
            checkpoint_interval_ops: 10_000,   // WAL rotation cadence
        }
    }
}

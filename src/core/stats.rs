use serde::{Serialize, Deserialize};

/// Store statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub uptime_secs: u64,

    /// Boxes with at least one forward-set entry.
    pub boxes_tracked: usize,
    /// Tags known to the global registry (seen by at least one index pass).
    pub tags_registered: usize,

    pub wal_sequence: u64,
    pub wal_size_bytes: u64,
}

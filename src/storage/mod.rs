pub mod layout;
pub mod wal;
pub mod checkpoint;
pub mod file_lock;

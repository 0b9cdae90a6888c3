pub mod core;
pub mod set;
pub mod index;
pub mod storage;

pub use crate::core::config::Config;
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{BoxId, IndexReceipt, Tag, MAX_TAG_BYTES};
pub use crate::index::{TagDb, TagIndex};

/*
┌──────────────────────────────────────────────────────────────────────┐
│                        TAGDEX STRUCT ARCHITECTURE                    │
└──────────────────────────────────────────────────────────────────────┘

┌────────────────────────────── CORE LAYER ────────────────────────────┐
│  struct Database                                                     │
│    config: Config                 // call budget, caps, sync mode    │
│    storage: StorageLayout         // wal/ + meta/ directories        │
│    inner: RwLock<Inner>           // TagDb + WAL, single writer      │
│    _lock: FileLock                // one process per store           │
│                                                                      │
│  Call path (mutations):                                              │
│    1. validate input (Tag::new)                                      │
│    2. GasMeter::new(call_budget), charge worst case                  │
│    3. WAL.append(Operation)       // write-ahead                     │
│    4. TagDb::apply_*              // infallible after 1-3            │
└──────────────────────────────────────────────────────────────────────┘

┌───────────────────────────── INDEX LAYER ────────────────────────────┐
│  struct TagDb                                                        │
│    forward:  HashMap<BoxId, EnumerableSet<Tag>>  // always current   │
│    registry: EnumerableSet<Tag>                  // via index_box    │
│    reverse:  HashMap<Tag, EnumerableSet<BoxId>>  // via index_box    │
│                                                                      │
│  struct EnumerableSet<T>                                             │
│    sequence: Vec<T>               // enumeration order               │
│    position: HashMap<T, usize>    // position[sequence[i]] == i      │
└──────────────────────────────────────────────────────────────────────┘

┌──────────────────────────── STORAGE LAYER ───────────────────────────┐
│  WAL        // [len][crc32][bincode entry] records, sync modes       │
│  Checkpoint // TagDb snapshot + WAL cursor, rotation boundary        │
│  FileLock   // flock, exclusive                                      │
└──────────────────────────────────────────────────────────────────────┘
*/

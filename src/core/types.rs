use std::borrow::Borrow;
use std::fmt;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Maximum tag length in bytes, enforced by `Tag::new`.
pub const MAX_TAG_BYTES: usize = 64;

/// Opaque 32-byte box identifier, produced and owned by the box store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoxId(pub [u8; 32]);

impl BoxId {
    pub fn new(bytes: [u8; 32]) -> Self {
        BoxId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in &self.0 {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }
}

impl From<[u8; 32]> for BoxId {
    fn from(bytes: [u8; 32]) -> Self {
        BoxId(bytes)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Validated tag value: non-empty, at most `MAX_TAG_BYTES` bytes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "tag must not be empty".to_string(),
            ));
        }
        if value.len() > MAX_TAG_BYTES {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("tag exceeds {} bytes: {} bytes", MAX_TAG_BYTES, value.len()),
            ));
        }
        Ok(Tag(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returned by `index_box` so callers can track budget headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReceipt {
    pub tags_indexed: usize,
    pub gas_used: u64,
}

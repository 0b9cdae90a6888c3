use crate::core::error::{Error, ErrorKind, Result};

/// Flat charge for entering any metered call.
pub const CALL_BASE: u64 = 21_000;
/// Hash probe into a set's position map.
pub const SET_LOOKUP: u64 = 200;
/// Appending a new slot to a set (sequence push + position write).
pub const SET_INSERT: u64 = 5_000;
/// Copying one item out of a windowed read.
pub const WINDOW_ITEM: u64 = 200;

/// Worst-case charge for attaching one tag to a box.
pub fn attach_cost() -> u64 {
    CALL_BASE + SET_LOOKUP + SET_INSERT
}

/// Worst-case charge for indexing a box carrying `tag_count` tags.
///
/// Per tag: one registry probe + insert, one reverse-set probe + insert.
pub fn index_cost(tag_count: usize) -> u64 {
    CALL_BASE + (tag_count as u64) * 2 * (SET_LOOKUP + SET_INSERT)
}

/// Charge for a windowed read returning `item_count` items.
pub fn window_cost(item_count: usize) -> u64 {
    CALL_BASE + (item_count as u64) * WINDOW_ITEM
}

/// Per-call computation budget meter.
///
/// Charges are taken in full before the operation mutates anything, so a
/// failed charge leaves no observable state change.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: Option<u64>,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter {
            limit: Some(limit),
            used: 0,
        }
    }

    /// Meter with no ceiling. WAL replay runs under this: recorded
    /// operations were admitted once and recovery must not re-ration them.
    pub fn unlimited() -> Self {
        GasMeter {
            limit: None,
            used: 0,
        }
    }

    pub fn charge(&mut self, amount: u64) -> Result<()> {
        let next = self.used.saturating_add(amount);
        if let Some(limit) = self.limit {
            if next > limit {
                return Err(Error::new(
                    ErrorKind::OutOfGas,
                    format!("charge of {} exceeds budget {} (used {})", amount, limit, self.used),
                ));
            }
        }
        self.used = next;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_accumulates_until_limit() {
        let mut meter = GasMeter::new(100);
        assert!(meter.charge(60).is_ok());
        assert!(meter.charge(40).is_ok());
        assert_eq!(meter.used(), 100);
        assert_eq!(meter.charge(1).unwrap_err().kind, ErrorKind::OutOfGas);
        // failed charge does not count
        assert_eq!(meter.used(), 100);
    }

    #[test]
    fn unlimited_never_fails() {
        let mut meter = GasMeter::unlimited();
        assert!(meter.charge(u64::MAX).is_ok());
        assert!(meter.charge(u64::MAX).is_ok());
    }

    #[test]
    fn cap_worth_of_indexing_fits_default_budget() {
        // a box at the default 128-tag cap must stay well inside the
        // default 3M budget, or it could become permanently un-indexable
        assert!(index_cost(128) < 3_000_000 / 2);
    }
}

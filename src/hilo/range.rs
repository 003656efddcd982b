//! A reserved hilo id range
//!
//! Invariant: `low <= current <= high + 1`. The range is owned by
//! exactly one generator and only touched under its per-tag lock, so
//! plain fields suffice.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiLoRange {
    pub low: i64,
    pub high: i64,
    /// Next value to hand out
    pub current: i64,
}

impl HiLoRange {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            low,
            high,
            current: low,
        }
    }

    /// Hand out the next id, or `None` once the range is exhausted.
    pub fn try_next(&mut self) -> Option<i64> {
        if self.current > self.high {
            return None;
        }
        let id = self.current;
        self.current += 1;
        Some(id)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current > self.high
    }

    /// Unused tail `[current, high]`, `None` when fully consumed.
    pub fn unused(&self) -> Option<(i64, i64)> {
        if self.is_exhausted() {
            None
        } else {
            Some((self.current, self.high))
        }
    }
}

//! Batch accumulator
//!
//! Pure partitioning of parsed rows into fixed-size batches, in insertion
//! order. No row is ever lost or duplicated between batches, and there is
//! no I/O here, so this is testable without a store connection.

use crate::models::Record;

/// One batch of parsed rows
pub type Batch = Vec<Record>;

/// Buffers parsed rows and yields full batches of the configured size
#[derive(Debug)]
pub struct BatchAccumulator {
    capacity: usize,
    rows: Vec<Record>,
}

impl BatchAccumulator {
    /// Create an accumulator yielding batches of `capacity` rows.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be positive");
        Self {
            capacity,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row; returns the full batch once `capacity` is reached
    pub fn push(&mut self, row: Record) -> Option<Batch> {
        self.rows.push(row);

        if self.rows.len() == self.capacity {
            let full = std::mem::replace(&mut self.rows, Vec::with_capacity(self.capacity));
            Some(full)
        } else {
            None
        }
    }

    /// Yield the remaining rows as a final, possibly undersized batch
    pub fn finish(&mut self) -> Option<Batch> {
        if self.rows.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.rows))
        }
    }

    /// Rows currently buffered
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

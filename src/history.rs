//! Bounded history of executed queries.
//!
//! Records are appended only after successful execution, in insertion order.
//! Immediately before an insert, a full history (at least `threshold`
//! records) is truncated to the newest `threshold - remove_amount` records.
//! The agent path reads `latest()` after the tool loop to recover the
//! structured outcome of whatever the agent executed last.

use crate::db::TabularResult;
use crate::safety::QueryClass;
use serde::{Deserialize, Serialize};

/// Default maximum number of records retained.
pub const DEFAULT_THRESHOLD: usize = 20;

/// Default number of records pruned when the threshold is reached.
pub const DEFAULT_REMOVE_AMOUNT: usize = 10;

/// A successfully executed query and its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Whether this was a read or a write.
    pub class: QueryClass,

    /// The executed query text.
    pub query: String,

    /// The result set; always absent for writes.
    pub result: Option<TabularResult>,
}

/// Insertion-ordered, bounded cache of query records.
#[derive(Debug)]
pub struct ResultHistory {
    records: Vec<QueryRecord>,
    threshold: usize,
    remove_amount: usize,
    insertions: u64,
}

impl Default for ResultHistory {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_REMOVE_AMOUNT)
    }
}

impl ResultHistory {
    /// Creates a history bounded by `threshold`, pruning down to
    /// `threshold - remove_amount` records once the bound is reached.
    pub fn new(threshold: usize, remove_amount: usize) -> Self {
        debug_assert!(remove_amount <= threshold);
        Self {
            records: Vec::new(),
            threshold,
            remove_amount,
            insertions: 0,
        }
    }

    /// Records a successfully executed read query with its result.
    ///
    /// Returns the position of the new record in the current sequence.
    pub fn record_read(&mut self, query: impl Into<String>, result: TabularResult) -> usize {
        self.evict_if_needed();
        self.insertions += 1;
        self.records.push(QueryRecord {
            class: QueryClass::Read,
            query: query.into(),
            result: Some(result),
        });
        self.records.len() - 1
    }

    /// Records a successfully executed write query.
    ///
    /// Returns the position of the new record in the current sequence.
    pub fn record_write(&mut self, query: impl Into<String>) -> usize {
        self.evict_if_needed();
        self.insertions += 1;
        self.records.push(QueryRecord {
            class: QueryClass::Write,
            query: query.into(),
            result: None,
        });
        self.records.len() - 1
    }

    /// Returns the most recently appended record, if any.
    pub fn latest(&self) -> Option<&QueryRecord> {
        self.records.last()
    }

    /// Returns the record at position `index` in the current sequence.
    ///
    /// Positions are not stable identities: an index handed to a caller
    /// becomes invalid once eviction shifts the sequence. This is a
    /// documented limitation of the positional access model.
    pub fn by_index(&self, index: usize) -> Option<&QueryRecord> {
        self.records.get(index)
    }

    /// Returns the number of records currently retained.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns the total number of records ever inserted.
    ///
    /// Monotonic and unaffected by eviction, unlike `len()`, so callers can
    /// compare snapshots to tell whether anything was recorded in between.
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    /// Returns true if no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prunes old records when the history has reached its threshold.
    ///
    /// Retains only the newest `threshold - remove_amount` records, in their
    /// original relative order. Runs immediately before each insert, so the
    /// retained count after an insert never exceeds the threshold.
    fn evict_if_needed(&mut self) {
        if self.records.len() >= self.threshold {
            let keep = self.threshold.saturating_sub(self.remove_amount);
            let drop_count = self.records.len() - keep;
            self.records.drain(..drop_count);
        }
    }
}

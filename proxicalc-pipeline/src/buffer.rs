//! Shared, language-partitioned record buffer
//!
//! Concurrent extraction tasks append under an exclusive lock; the size probe
//! takes the shared lock. Snapshots and drains are only called by the
//! orchestrator after every producer task has been joined, so the lock alone
//! is enough synchronization.

use crate::record::ProximityRecord;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Accumulator mapping a language code to its buffered records.
#[derive(Debug, Default)]
pub struct ProximityBuffer {
    inner: RwLock<HashMap<String, Vec<ProximityRecord>>>,
}

impl ProximityBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under `language`. Safe under concurrent callers.
    pub fn add(&self, language: &str, record: ProximityRecord) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        inner.entry(language.to_string()).or_default().push(record);
    }

    /// Total record count across all languages.
    pub fn total_len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.values().map(Vec::len).sum()
    }

    /// The sole backpressure signal: has the buffered total reached
    /// `threshold`?
    pub fn reached(&self, threshold: usize) -> bool {
        self.total_len() >= threshold
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Languages that currently hold records. Call only while no producer
    /// task is in flight.
    pub fn languages(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.keys().cloned().collect()
    }

    /// Hand over and clear all records buffered for `language`. Call only
    /// while no producer task is in flight.
    pub fn take(&self, language: &str) -> Vec<ProximityRecord> {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        inner.remove(language).unwrap_or_default()
    }
}

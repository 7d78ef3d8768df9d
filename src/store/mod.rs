pub mod csv_io;
pub mod dedup;
pub mod query;
pub mod record;

pub use csv_io::{load_csv, save_csv};
pub use dedup::{dedupe, find_duplicates, DedupReport};
pub use query::LeadFilter;
pub use record::PhysicianRecord;

use std::collections::HashMap;

use crate::errors::LeadError;

/// Outcome of an upsert: whether the identifier was new to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// The live, exclusively-owned record set for one session.
///
/// Records keep their insertion order; an NPI index enforces identifier
/// uniqueness. Replacing a record keeps its original position so repeated
/// loads and saves are stable.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<PhysicianRecord>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-validated records, e.g. a flagged subset.
    pub fn from_records(
        records: impl IntoIterator<Item = PhysicianRecord>,
    ) -> Result<Self, LeadError> {
        let mut store = Self::new();
        for record in records {
            store.upsert(record)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, npi: &str) -> Option<&PhysicianRecord> {
        self.index.get(npi).map(|&i| &self.records[i])
    }

    pub fn contains(&self, npi: &str) -> bool {
        self.index.contains_key(npi)
    }

    /// Insert or replace by NPI. Replacement keeps the record's original
    /// insertion position. Fails validation without touching the store.
    pub fn upsert(&mut self, record: PhysicianRecord) -> Result<Upsert, LeadError> {
        record.validate()?;
        match self.index.get(&record.npi) {
            Some(&i) => {
                self.records[i] = record;
                Ok(Upsert::Replaced)
            }
            None => {
                self.index.insert(record.npi.clone(), self.records.len());
                self.records.push(record);
                Ok(Upsert::Inserted)
            }
        }
    }

    /// Remove a record by NPI, preserving the order of the rest.
    pub fn remove(&mut self, npi: &str) -> Option<PhysicianRecord> {
        let i = self.index.remove(npi)?;
        let record = self.records.remove(i);
        for (j, r) in self.records.iter().enumerate().skip(i) {
            self.index.insert(r.npi.clone(), j);
        }
        Some(record)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PhysicianRecord> {
        self.records.iter()
    }

    /// Lazy, restartable query: each call walks the store afresh in
    /// insertion order, yielding records the predicate accepts.
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a PhysicianRecord>
    where
        P: Fn(&PhysicianRecord) -> bool + 'a,
    {
        self.records.iter().filter(move |r| predicate(r))
    }

    /// Query through a [`LeadFilter`], the composed recruiter-facing filter.
    pub fn filtered<'a>(
        &'a self,
        filter: &'a LeadFilter,
    ) -> impl Iterator<Item = &'a PhysicianRecord> {
        self.query(move |r| filter.matches(r))
    }

    /// All records sorted by priority score descending, NPI ascending on ties.
    pub fn sorted_by_score(&self) -> Vec<&PhysicianRecord> {
        let mut leads: Vec<&PhysicianRecord> = self.records.iter().collect();
        leads.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.npi.cmp(&b.npi))
        });
        leads
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut PhysicianRecord> {
        self.records.iter_mut()
    }
}

use std::path::Path;

use super::types::FlagState;
use crate::errors::LeadError;
use crate::store::{save_csv, PhysicianRecord, RecordStore};

/// The flagged subset of the store, in insertion order.
pub fn filter_flagged<'a>(store: &'a RecordStore, state: &'a FlagState) -> Vec<&'a PhysicianRecord> {
    store.query(|r| state.is_flagged(&r.npi)).collect()
}

/// Write the flagged subset to its own CSV, with each recruiter note in a
/// `flag_note` column. Returns the number of records exported.
pub fn export_flagged(
    store: &RecordStore,
    state: &FlagState,
    path: &Path,
) -> Result<usize, LeadError> {
    let mut subset = RecordStore::new();
    for record in filter_flagged(store, state) {
        let mut record = record.clone();
        if let Some(note) = state.note(&record.npi) {
            record.extra.insert("flag_note".to_string(), note.to_string());
        }
        subset.upsert(record)?;
    }

    let count = subset.len();
    save_csv(&subset, path)?;
    Ok(count)
}

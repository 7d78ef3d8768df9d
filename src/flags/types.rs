use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Recruiter flags, keyed by NPI. Persisted as a small versioned JSON
/// document next to the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagState {
    pub version: u32,
    #[serde(default)]
    pub flagged: HashMap<String, FlagEntry>,
}

/// One flagged candidate: the recruiter's note and when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagEntry {
    pub note: String,
    pub flagged_at: DateTime<Utc>,
}

impl Default for FlagState {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagState {
    pub fn new() -> Self {
        Self {
            version: 1,
            flagged: HashMap::new(),
        }
    }

    pub fn is_flagged(&self, npi: &str) -> bool {
        self.flagged.contains_key(npi)
    }

    /// Flag a candidate. Re-flagging replaces the note and timestamp.
    pub fn flag(&mut self, npi: String, note: String) {
        self.flagged.insert(
            npi,
            FlagEntry {
                note,
                flagged_at: Utc::now(),
            },
        );
    }

    /// Remove a flag. Returns true if the candidate was flagged.
    pub fn unflag(&mut self, npi: &str) -> bool {
        self.flagged.remove(npi).is_some()
    }

    pub fn note(&self, npi: &str) -> Option<&str> {
        self.flagged.get(npi).map(|e| e.note.as_str())
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    pub fn entries(&self) -> &HashMap<String, FlagEntry> {
        &self.flagged
    }
}

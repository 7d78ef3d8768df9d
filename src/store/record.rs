use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::LeadError;

/// A physician lead under consideration for recruitment.
///
/// `priority_score` is derived by the scoring engine and never hand-edited;
/// `last_updated` is bumped whenever a recompute changes the score. Columns
/// the loader does not recognize are carried in `extra` so they survive a
/// save, but scoring never looks at them.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicianRecord {
    /// National Provider Identifier. Unique key across the store.
    pub npi: String,
    pub full_name: String,
    /// State codes the physician is licensed in, normalized to uppercase.
    pub license_states: BTreeSet<String>,
    pub primary_specialty: String,
    /// Lead status as recorded upstream, e.g. "ACTIVE".
    pub status: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub practice_address: Option<String>,
    pub years_experience: Option<u32>,
    pub lead_source: Option<String>,
    pub last_contact: Option<NaiveDate>,
    pub locum_candidate: bool,
    pub priority_score: f64,
    pub last_updated: DateTime<Utc>,
    /// Unrecognized columns, preserved verbatim through save.
    pub extra: BTreeMap<String, String>,
}

impl PhysicianRecord {
    /// A blank record with the given identity; callers fill in the rest.
    pub fn new(npi: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            npi: npi.into(),
            full_name: full_name.into(),
            license_states: BTreeSet::new(),
            primary_specialty: String::new(),
            status: "ACTIVE".to_string(),
            email: None,
            phone: None,
            practice_address: None,
            years_experience: None,
            lead_source: None,
            last_contact: None,
            locum_candidate: false,
            priority_score: 0.0,
            last_updated: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    /// Licensed in two or more states.
    pub fn multi_state(&self) -> bool {
        self.license_states.len() >= 2
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// Whole days since the last recorded contact, or None if never contacted.
    pub fn days_since_contact(&self) -> Option<i64> {
        self.days_since_contact_at(Utc::now().date_naive())
    }

    pub(crate) fn days_since_contact_at(&self, today: NaiveDate) -> Option<i64> {
        self.last_contact.map(|d| (today - d).num_days())
    }

    /// Write-time validation. Rejects this record only; the store is untouched.
    pub fn validate(&self) -> Result<(), LeadError> {
        if self.npi.trim().is_empty() {
            return Err(LeadError::validation("npi must not be empty"));
        }
        if self.full_name.trim().is_empty() {
            return Err(LeadError::validation(format!(
                "record {}: full_name must not be empty",
                self.npi
            )));
        }
        if self.license_states.is_empty() {
            return Err(LeadError::validation(format!(
                "record {}: license_states must not be empty",
                self.npi
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn licensed(npi: &str, states: &[&str]) -> PhysicianRecord {
        let mut record = PhysicianRecord::new(npi, "Dr. Test");
        record.license_states = states.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn test_multi_state_thresholds() {
        // Flag is true iff the license set has at least two states.
        assert!(!licensed("1", &[]).multi_state());
        assert!(!licensed("2", &["TX"]).multi_state());
        assert!(licensed("3", &["TX", "OK"]).multi_state());
        assert!(licensed("4", &["TX", "OK", "NM", "LA", "AR"]).multi_state());
    }

    #[test]
    fn test_validate_rejects_empty_npi() {
        let record = licensed("  ", &["TX"]);
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_states() {
        let record = licensed("1234567890", &[]);
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains("license_states"));
    }

    #[test]
    fn test_validate_accepts_complete_record() {
        let record = licensed("1234567890", &["TX"]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_days_since_contact() {
        let mut record = licensed("1234567890", &["TX"]);
        assert_eq!(record.days_since_contact(), None);

        record.last_contact = NaiveDate::from_ymd_opt(2024, 1, 1);
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(record.days_since_contact_at(today), Some(30));
    }

    #[test]
    fn test_is_active_case_insensitive() {
        let mut record = licensed("1234567890", &["TX"]);
        record.status = "Active".to_string();
        assert!(record.is_active());
        record.status = "RETIRED".to_string();
        assert!(!record.is_active());
    }
}

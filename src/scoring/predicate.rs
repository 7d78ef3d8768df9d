use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::store::PhysicianRecord;

/// Integer comparison parsed from a range expression:
/// `<N`, `<=N`, `>N`, `>=N`, `N`, or the inclusive `N-M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOp {
    LessThan(u64),
    LessEqual(u64),
    GreaterThan(u64),
    GreaterEqual(u64),
    Equal(u64),
    Between(u64, u64),
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix(">=") {
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(RangeOp::LessEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(RangeOp::GreaterThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(RangeOp::LessThan(val.trim().parse()?))
        } else if let Some((low, high)) = s.split_once('-') {
            let low: u64 = low.trim().parse()?;
            let high: u64 = high.trim().parse()?;
            if low > high {
                bail!("range low exceeds high: {}", s);
            }
            Ok(RangeOp::Between(low, high))
        } else if s.is_empty() {
            bail!("empty range expression")
        } else {
            Ok(RangeOp::Equal(s.parse()?))
        }
    }

    pub fn matches(&self, value: u64) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }
}

/// The attribute test a scoring rule applies to a record.
///
/// Predicates over an attribute the record does not carry (an unknown
/// contact date, say) simply fail to match; that is never an error.
/// Range and duration strings are validated up front by
/// [`validate_scoring`](crate::scoring::validate_scoring), so a parse
/// failure at match time quietly counts as no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePredicate {
    /// Licensed in two or more states.
    MultiState,
    /// License-state count falls in `range`, e.g. ">=3".
    LicenseCount { range: String },
    /// Licensed in one specific state.
    LicensedIn { state: String },
    Specialty { equals: String },
    Status { equals: String },
    LocumCandidate,
    /// Years of experience falls in `range`.
    YearsExperience { range: String },
    LeadSource { equals: String },
    /// Last contact no older than `within` (humantime, e.g. "90d").
    ContactedWithin { within: String },
    /// Last contact older than `over`. Never-contacted records do not match.
    StaleContact { over: String },
}

impl RulePredicate {
    pub fn matches(&self, record: &PhysicianRecord) -> bool {
        self.matches_at(record, chrono::Utc::now().date_naive())
    }

    pub(crate) fn matches_at(&self, record: &PhysicianRecord, today: NaiveDate) -> bool {
        match self {
            RulePredicate::MultiState => record.multi_state(),
            RulePredicate::LicenseCount { range } => RangeOp::parse(range)
                .map(|op| op.matches(record.license_states.len() as u64))
                .unwrap_or(false),
            RulePredicate::LicensedIn { state } => {
                record.license_states.contains(&state.to_ascii_uppercase())
            }
            RulePredicate::Specialty { equals } => {
                record.primary_specialty.eq_ignore_ascii_case(equals)
            }
            RulePredicate::Status { equals } => record.status.eq_ignore_ascii_case(equals),
            RulePredicate::LocumCandidate => record.locum_candidate,
            RulePredicate::YearsExperience { range } => match record.years_experience {
                Some(years) => RangeOp::parse(range)
                    .map(|op| op.matches(u64::from(years)))
                    .unwrap_or(false),
                None => false,
            },
            RulePredicate::LeadSource { equals } => match record.lead_source.as_deref() {
                Some(source) => source.eq_ignore_ascii_case(equals),
                None => false,
            },
            RulePredicate::ContactedWithin { within } => {
                match (record.days_since_contact_at(today), parse_days(within)) {
                    (Some(days), Ok(limit)) => days >= 0 && days <= limit,
                    _ => false,
                }
            }
            RulePredicate::StaleContact { over } => {
                match (record.days_since_contact_at(today), parse_days(over)) {
                    (Some(days), Ok(limit)) => days > limit,
                    _ => false,
                }
            }
        }
    }
}

/// Parse a humantime duration and round it down to whole days.
pub(crate) fn parse_days(s: &str) -> Result<i64> {
    let duration: Duration = humantime::parse_duration(s.trim())?;
    Ok((duration.as_secs() / 86_400) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(states: &[&str]) -> PhysicianRecord {
        let mut record = PhysicianRecord::new("1234567890", "Dr. Test");
        record.license_states = states.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn test_parse_range_operators() {
        assert!(RangeOp::parse("<3").unwrap().matches(2));
        assert!(!RangeOp::parse("<3").unwrap().matches(3));
        assert!(RangeOp::parse("<=3").unwrap().matches(3));
        assert!(RangeOp::parse(">3").unwrap().matches(4));
        assert!(RangeOp::parse(">=3").unwrap().matches(3));
        assert!(RangeOp::parse("3").unwrap().matches(3));
        assert!(RangeOp::parse("2-5").unwrap().matches(5));
        assert!(!RangeOp::parse("2-5").unwrap().matches(6));
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(RangeOp::parse("").is_err());
        assert!(RangeOp::parse("lots").is_err());
        assert!(RangeOp::parse("5-2").is_err());
    }

    #[test]
    fn test_multi_state_predicate() {
        assert!(!RulePredicate::MultiState.matches(&lead(&["TX"])));
        assert!(RulePredicate::MultiState.matches(&lead(&["TX", "OK"])));
    }

    #[test]
    fn test_license_count_predicate() {
        let pred = RulePredicate::LicenseCount {
            range: ">=3".to_string(),
        };
        assert!(!pred.matches(&lead(&["TX", "OK"])));
        assert!(pred.matches(&lead(&["TX", "OK", "NM"])));
    }

    #[test]
    fn test_licensed_in_normalizes_case() {
        let pred = RulePredicate::LicensedIn {
            state: "tx".to_string(),
        };
        assert!(pred.matches(&lead(&["TX"])));
        assert!(!pred.matches(&lead(&["OK"])));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        // No experience figure, no lead source, never contacted: each
        // referencing rule just contributes nothing.
        let record = lead(&["TX"]);
        assert!(!RulePredicate::YearsExperience {
            range: ">=0".to_string()
        }
        .matches(&record));
        assert!(!RulePredicate::LeadSource {
            equals: "referral".to_string()
        }
        .matches(&record));
        assert!(!RulePredicate::ContactedWithin {
            within: "365d".to_string()
        }
        .matches(&record));
        assert!(!RulePredicate::StaleContact {
            over: "1d".to_string()
        }
        .matches(&record));
    }

    #[test]
    fn test_contacted_within_boundary() {
        let mut record = lead(&["TX"]);
        record.last_contact = NaiveDate::from_ymd_opt(2024, 1, 1);
        let pred = RulePredicate::ContactedWithin {
            within: "30d".to_string(),
        };
        let on_boundary = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let past_boundary = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(pred.matches_at(&record, on_boundary));
        assert!(!pred.matches_at(&record, past_boundary));
    }

    #[test]
    fn test_stale_contact() {
        let mut record = lead(&["TX"]);
        record.last_contact = NaiveDate::from_ymd_opt(2024, 1, 1);
        let pred = RulePredicate::StaleContact {
            over: "90d".to_string(),
        };
        assert!(!pred.matches_at(&record, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(pred.matches_at(&record, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[test]
    fn test_predicate_yaml_round_trip() {
        let yaml = r#"
kind: license_count
range: ">=3"
"#;
        let pred: RulePredicate = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            pred,
            RulePredicate::LicenseCount {
                range: ">=3".to_string()
            }
        );
    }
}

use serde::{Deserialize, Serialize};

use super::predicate::RulePredicate;

/// Scoring rule set.
///
/// Each rule is a named weight applied when its predicate matches; a
/// record's score is the order-independent sum of matching weights. Rule
/// order only affects how a breakdown is displayed.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   rules:
///     - name: multi-state
///       weight: 10
///       when: { kind: multi_state }
///     - name: recent-contact
///       weight: 15
///       when: { kind: contacted_within, within: 90d }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub rules: Vec<ScoringRule>,
}

/// One named, weighted predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringRule {
    pub name: String,
    /// Points added when the predicate matches. May be negative.
    pub weight: f64,
    pub when: RulePredicate,
}

impl ScoringRule {
    pub fn new(name: &str, weight: f64, when: RulePredicate) -> Self {
        Self {
            name: name.to_string(),
            weight,
            when,
        }
    }
}

impl Default for ScoringConfig {
    /// Placeholder weights scaled so a strong lead lands near 100, the
    /// score range recruiters already work with. All of this is
    /// configuration; the engine carries no weights of its own.
    fn default() -> Self {
        Self {
            rules: vec![
                ScoringRule::new(
                    "active",
                    25.0,
                    RulePredicate::Status {
                        equals: "ACTIVE".to_string(),
                    },
                ),
                ScoringRule::new("locum-ready", 20.0, RulePredicate::LocumCandidate),
                ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState),
                ScoringRule::new(
                    "broad-license",
                    15.0,
                    RulePredicate::LicenseCount {
                        range: ">=3".to_string(),
                    },
                ),
                ScoringRule::new(
                    "seasoned",
                    10.0,
                    RulePredicate::YearsExperience {
                        range: ">=10".to_string(),
                    },
                ),
                ScoringRule::new(
                    "recent-contact",
                    15.0,
                    RulePredicate::ContactedWithin {
                        within: "90d".to_string(),
                    },
                ),
                ScoringRule::new(
                    "referral",
                    5.0,
                    RulePredicate::LeadSource {
                        equals: "referral".to_string(),
                    },
                ),
            ],
        }
    }
}

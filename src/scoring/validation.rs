use std::collections::HashSet;

use super::config::ScoringConfig;
use super::predicate::{parse_days, RangeOp, RulePredicate};

/// Validate a scoring rule set at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    for (i, rule) in config.rules.iter().enumerate() {
        let at = |field: &str| format!("scoring.rules[{}].{}", i, field);

        if rule.name.trim().is_empty() {
            errors.push(format!("{}: must not be empty", at("name")));
        } else if !seen_names.insert(rule.name.as_str()) {
            errors.push(format!("{}: duplicate rule name '{}'", at("name"), rule.name));
        }

        if !rule.weight.is_finite() {
            errors.push(format!("{}: must be a finite number", at("weight")));
        }

        match &rule.when {
            RulePredicate::LicenseCount { range } | RulePredicate::YearsExperience { range } => {
                if let Err(e) = RangeOp::parse(range) {
                    errors.push(format!("{}: invalid range '{}' - {}", at("when"), range, e));
                }
            }
            RulePredicate::ContactedWithin { within: duration }
            | RulePredicate::StaleContact { over: duration } => {
                if let Err(e) = parse_days(duration) {
                    errors.push(format!(
                        "{}: invalid duration '{}' - {}",
                        at("when"),
                        duration,
                        e
                    ));
                }
            }
            RulePredicate::LicensedIn { state: value }
            | RulePredicate::Specialty { equals: value }
            | RulePredicate::Status { equals: value }
            | RulePredicate::LeadSource { equals: value } => {
                if value.trim().is_empty() {
                    errors.push(format!("{}: match value must not be empty", at("when")));
                }
            }
            RulePredicate::MultiState | RulePredicate::LocumCandidate => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

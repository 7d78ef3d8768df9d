use chrono::{NaiveDate, Utc};

use super::config::ScoringConfig;
use crate::store::{PhysicianRecord, RecordStore};

/// One rule that matched a record, for breakdown display.
#[derive(Debug, Clone)]
pub struct RuleHit {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub score: f64,
    /// Matching rules in config order.
    pub hits: Vec<RuleHit>,
}

/// Score one record against the rule set.
///
/// Pure: sums the weight of every rule whose predicate the record
/// satisfies. An empty rule set scores 0; a rule over a missing attribute
/// contributes 0. Deterministic and order-independent.
pub fn score_record(record: &PhysicianRecord, config: &ScoringConfig) -> ScoreResult {
    score_record_at(record, config, Utc::now().date_naive())
}

pub(crate) fn score_record_at(
    record: &PhysicianRecord,
    config: &ScoringConfig,
    today: NaiveDate,
) -> ScoreResult {
    let mut score = 0.0;
    let mut hits = Vec::new();

    for rule in &config.rules {
        if rule.when.matches_at(record, today) {
            score += rule.weight;
            hits.push(RuleHit {
                name: rule.name.clone(),
                weight: rule.weight,
            });
        }
    }

    ScoreResult { score, hits }
}

/// Re-score every record in the store.
///
/// Writes `priority_score` and bumps `last_updated` only where the score
/// actually changed, and returns that count. Running twice with the same
/// rule set changes zero records the second time.
pub fn recompute(store: &mut RecordStore, config: &ScoringConfig) -> usize {
    let today = Utc::now().date_naive();
    let mut changed = 0;

    for record in store.records_mut() {
        let new_score = score_record_at(record, config, today).score;
        if new_score != record.priority_score {
            record.priority_score = new_score;
            record.last_updated = Utc::now();
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::config::ScoringRule;
    use crate::scoring::predicate::RulePredicate;

    fn lead(npi: &str, states: &[&str]) -> PhysicianRecord {
        let mut record = PhysicianRecord::new(npi, "Dr. Test");
        record.license_states = states.iter().map(|s| s.to_string()).collect();
        record
    }

    fn rules(rules: Vec<ScoringRule>) -> ScoringConfig {
        ScoringConfig { rules }
    }

    #[test]
    fn test_empty_ruleset_scores_zero() {
        let result = score_record(&lead("1", &["TX", "OK"]), &rules(vec![]));
        assert_eq!(result.score, 0.0);
        assert!(result.hits.is_empty());
    }

    #[test]
    fn test_score_is_sum_of_matching_weights() {
        let config = rules(vec![
            ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState),
            ScoringRule::new(
                "active",
                25.0,
                RulePredicate::Status {
                    equals: "ACTIVE".to_string(),
                },
            ),
            ScoringRule::new("locum", 20.0, RulePredicate::LocumCandidate),
        ]);

        let result = score_record(&lead("1", &["TX", "OK"]), &config);
        assert_eq!(result.score, 35.0);
        let names: Vec<&str> = result.hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["multi-state", "active"]);
    }

    #[test]
    fn test_missing_attribute_contributes_zero() {
        let config = rules(vec![ScoringRule::new(
            "seasoned",
            10.0,
            RulePredicate::YearsExperience {
                range: ">=10".to_string(),
            },
        )]);
        // No experience figure recorded at all.
        assert_eq!(score_record(&lead("1", &["TX"]), &config).score, 0.0);
    }

    #[test]
    fn test_adding_matching_positive_rule_never_decreases_score() {
        let mut config = rules(vec![ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState)]);
        let record = lead("1", &["TX", "OK"]);
        let before = score_record(&record, &config).score;

        config
            .rules
            .push(ScoringRule::new("licensed-tx", 5.0, RulePredicate::LicensedIn {
                state: "TX".to_string(),
            }));
        let after = score_record(&record, &config).score;
        assert!(after >= before);
    }

    #[test]
    fn test_negative_weight_subtracts() {
        let config = rules(vec![
            ScoringRule::new(
                "active",
                25.0,
                RulePredicate::Status {
                    equals: "ACTIVE".to_string(),
                },
            ),
            ScoringRule::new(
                "gone-cold",
                -15.0,
                RulePredicate::StaleContact {
                    over: "90d".to_string(),
                },
            ),
        ]);
        let mut record = lead("1", &["TX"]);
        record.last_contact = chrono::NaiveDate::from_ymd_opt(2023, 1, 1);

        let result = score_record_at(
            &record,
            &config,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_recompute_reports_changed_count() {
        let mut store = RecordStore::new();
        store.upsert(lead("1", &["TX", "OK"])).unwrap();
        store.upsert(lead("2", &["NM"])).unwrap();

        let config = rules(vec![ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState)]);
        // Both records start at 0.0; only the multi-state one changes.
        assert_eq!(recompute(&mut store, &config), 1);
        assert_eq!(store.get("1").unwrap().priority_score, 10.0);
        assert_eq!(store.get("2").unwrap().priority_score, 0.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut store = RecordStore::new();
        store.upsert(lead("1", &["TX", "OK"])).unwrap();

        let config = rules(vec![ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState)]);
        assert_eq!(recompute(&mut store, &config), 1);
        let stamp = store.get("1").unwrap().last_updated;

        assert_eq!(recompute(&mut store, &config), 0);
        // Unchanged records keep their timestamp.
        assert_eq!(store.get("1").unwrap().last_updated, stamp);
    }

    #[test]
    fn test_recompute_after_rule_change() {
        let mut store = RecordStore::new();
        store.upsert(lead("1", &["TX", "OK"])).unwrap();

        let first = rules(vec![ScoringRule::new("multi-state", 10.0, RulePredicate::MultiState)]);
        recompute(&mut store, &first);

        let second = rules(vec![ScoringRule::new("multi-state", 30.0, RulePredicate::MultiState)]);
        assert_eq!(recompute(&mut store, &second), 1);
        assert_eq!(store.get("1").unwrap().priority_score, 30.0);
    }
}

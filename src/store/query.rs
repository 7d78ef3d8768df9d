use super::PhysicianRecord;

/// The recruiter-facing filter set, composed into one predicate.
///
/// Every field is optional; an unset field constrains nothing. These mirror
/// the filters a recruiter actually works with: license states, practice
/// area, active status, multi-state licensure, locum availability, and a
/// minimum priority score.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    /// Match records licensed in any of these states (uppercase codes).
    pub states: Vec<String>,
    pub specialty: Option<String>,
    pub active_only: bool,
    pub multi_state_only: bool,
    pub locum_only: bool,
    pub min_score: Option<f64>,
}

impl LeadFilter {
    pub fn matches(&self, record: &PhysicianRecord) -> bool {
        if !self.states.is_empty()
            && !self
                .states
                .iter()
                .any(|s| record.license_states.contains(&s.to_ascii_uppercase()))
        {
            return false;
        }
        if let Some(ref specialty) = self.specialty {
            if !record.primary_specialty.eq_ignore_ascii_case(specialty) {
                return false;
            }
        }
        if self.active_only && !record.is_active() {
            return false;
        }
        if self.multi_state_only && !record.multi_state() {
            return false;
        }
        if self.locum_only && !record.locum_candidate {
            return false;
        }
        if let Some(min) = self.min_score {
            if record.priority_score < min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(npi: &str, states: &[&str], specialty: &str, score: f64) -> PhysicianRecord {
        let mut record = PhysicianRecord::new(npi, "Dr. Test");
        record.license_states = states.iter().map(|s| s.to_string()).collect();
        record.primary_specialty = specialty.to_string();
        record.priority_score = score;
        record
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = LeadFilter::default();
        assert!(filter.matches(&lead("1", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_state_filter_matches_any_listed_state() {
        let filter = LeadFilter {
            states: vec!["OK".to_string(), "NM".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX", "NM"], "Cardiology", 0.0)));
        assert!(!filter.matches(&lead("2", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_state_filter_case_insensitive_input() {
        let filter = LeadFilter {
            states: vec!["tx".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_specialty_filter() {
        let filter = LeadFilter {
            specialty: Some("emergency medicine".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX"], "Emergency Medicine", 0.0)));
        assert!(!filter.matches(&lead("2", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_active_only_filter() {
        let filter = LeadFilter {
            active_only: true,
            ..Default::default()
        };
        let mut inactive = lead("1", &["TX"], "Cardiology", 0.0);
        inactive.status = "RETIRED".to_string();
        assert!(!filter.matches(&inactive));
        assert!(filter.matches(&lead("2", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_multi_state_only_filter() {
        let filter = LeadFilter {
            multi_state_only: true,
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX", "OK"], "Cardiology", 0.0)));
        assert!(!filter.matches(&lead("2", &["TX"], "Cardiology", 0.0)));
    }

    #[test]
    fn test_min_score_filter_is_inclusive() {
        let filter = LeadFilter {
            min_score: Some(20.0),
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX"], "Cardiology", 20.0)));
        assert!(!filter.matches(&lead("2", &["TX"], "Cardiology", 19.9)));
    }

    #[test]
    fn test_filters_compose() {
        let filter = LeadFilter {
            states: vec!["TX".to_string()],
            multi_state_only: true,
            min_score: Some(10.0),
            ..Default::default()
        };
        assert!(filter.matches(&lead("1", &["TX", "OK"], "Cardiology", 15.0)));
        assert!(!filter.matches(&lead("2", &["TX", "OK"], "Cardiology", 5.0)));
        assert!(!filter.matches(&lead("3", &["OK", "NM"], "Cardiology", 15.0)));
    }
}

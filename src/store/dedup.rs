use chrono::Utc;
use log::debug;
use std::collections::HashSet;

use super::{PhysicianRecord, RecordStore};

/// Outcome of a dedupe pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    /// Duplicate groups found.
    pub groups: usize,
    /// Records merged away (removed from the store).
    pub merged: usize,
}

/// Find probable duplicate groups.
///
/// Exact NPI collisions cannot exist in the store, so duplicates here means
/// the same person entered under different identifiers: a matching
/// normalized name plus a shared phone number or email address. Returns
/// groups of NPIs in insertion order, each group len >= 2.
pub fn find_duplicates(store: &RecordStore) -> Vec<Vec<String>> {
    let records: Vec<&PhysicianRecord> = store.iter().collect();
    let mut grouped: HashSet<usize> = HashSet::new();
    let mut groups = Vec::new();

    for (i, primary) in records.iter().enumerate() {
        if grouped.contains(&i) {
            continue;
        }
        let mut group = vec![primary.npi.clone()];
        for (j, candidate) in records.iter().enumerate().skip(i + 1) {
            if grouped.contains(&j) {
                continue;
            }
            if is_probable_duplicate(primary, candidate) {
                group.push(candidate.npi.clone());
                grouped.insert(j);
            }
        }
        if group.len() > 1 {
            grouped.insert(i);
            groups.push(group);
        }
    }
    groups
}

/// Merge every duplicate group into its earliest record and drop the rest.
///
/// The surviving record takes the union of license states, the first
/// non-empty contact field, the larger experience figure, and the most
/// recent contact date. Scores are left stale on purpose; the caller is
/// expected to recompute after a merge.
pub fn dedupe(store: &mut RecordStore) -> DedupReport {
    let groups = find_duplicates(store);
    let mut merged = 0;

    for group in &groups {
        let mut survivor = match store.get(&group[0]) {
            Some(r) => r.clone(),
            None => continue,
        };
        for npi in &group[1..] {
            if let Some(duplicate) = store.remove(npi) {
                merge_into(&mut survivor, &duplicate);
                merged += 1;
            }
        }
        survivor.last_updated = Utc::now();
        // Survivor is a valid record already in the store; upsert replaces in place.
        if let Err(e) = store.upsert(survivor) {
            debug!("dedupe: failed to write back merged record: {e}");
        }
    }

    DedupReport {
        groups: groups.len(),
        merged,
    }
}

fn is_probable_duplicate(a: &PhysicianRecord, b: &PhysicianRecord) -> bool {
    if normalize_name(&a.full_name) != normalize_name(&b.full_name) {
        return false;
    }
    same_phone(a.phone.as_deref(), b.phone.as_deref())
        || same_email(a.email.as_deref(), b.email.as_deref())
}

fn merge_into(survivor: &mut PhysicianRecord, duplicate: &PhysicianRecord) {
    survivor
        .license_states
        .extend(duplicate.license_states.iter().cloned());
    if survivor.email.is_none() {
        survivor.email = duplicate.email.clone();
    }
    if survivor.phone.is_none() {
        survivor.phone = duplicate.phone.clone();
    }
    if survivor.practice_address.is_none() {
        survivor.practice_address = duplicate.practice_address.clone();
    }
    if survivor.lead_source.is_none() {
        survivor.lead_source = duplicate.lead_source.clone();
    }
    survivor.years_experience = survivor.years_experience.max(duplicate.years_experience);
    survivor.last_contact = survivor.last_contact.max(duplicate.last_contact);
    survivor.locum_candidate |= duplicate.locum_candidate;
    for (key, value) in &duplicate.extra {
        survivor
            .extra
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn same_phone(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
            let (a, b) = (digits(a), digits(b));
            !a.is_empty() && a == b
        }
        _ => false,
    }
}

fn same_email(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lead(npi: &str, name: &str, state: &str) -> PhysicianRecord {
        let mut record = PhysicianRecord::new(npi, name);
        record.license_states.insert(state.to_string());
        record
    }

    #[test]
    fn test_same_name_alone_is_not_a_duplicate() {
        let mut store = RecordStore::new();
        store.upsert(lead("1", "Jane Smith", "TX")).unwrap();
        store.upsert(lead("2", "Jane Smith", "OK")).unwrap();

        assert!(find_duplicates(&store).is_empty());
    }

    #[test]
    fn test_name_plus_phone_is_a_duplicate() {
        let mut store = RecordStore::new();
        let mut a = lead("1", "Jane Smith", "TX");
        a.phone = Some("(512) 555-0100".to_string());
        let mut b = lead("2", "jane  smith", "OK");
        b.phone = Some("512-555-0100".to_string());
        store.upsert(a).unwrap();
        store.upsert(b).unwrap();

        let groups = find_duplicates(&store);
        assert_eq!(groups, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_name_plus_email_is_a_duplicate() {
        let mut store = RecordStore::new();
        let mut a = lead("1", "Jane Smith", "TX");
        a.email = Some("JSmith@example.com".to_string());
        let mut b = lead("2", "Jane Smith", "OK");
        b.email = Some("jsmith@example.com".to_string());
        store.upsert(a).unwrap();
        store.upsert(b).unwrap();

        assert_eq!(find_duplicates(&store).len(), 1);
    }

    #[test]
    fn test_dedupe_merges_into_earliest_record() {
        let mut store = RecordStore::new();
        let mut a = lead("1", "Jane Smith", "TX");
        a.phone = Some("5125550100".to_string());
        a.years_experience = Some(5);
        a.last_contact = NaiveDate::from_ymd_opt(2024, 1, 1);
        let mut b = lead("2", "Jane Smith", "OK");
        b.phone = Some("5125550100".to_string());
        b.email = Some("jsmith@example.com".to_string());
        b.years_experience = Some(12);
        b.last_contact = NaiveDate::from_ymd_opt(2024, 6, 1);
        b.locum_candidate = true;
        store.upsert(a).unwrap();
        store.upsert(b).unwrap();

        let report = dedupe(&mut store);
        assert_eq!(report, DedupReport { groups: 1, merged: 1 });
        assert_eq!(store.len(), 1);

        let survivor = store.get("1").unwrap();
        assert!(survivor.license_states.contains("TX"));
        assert!(survivor.license_states.contains("OK"));
        assert_eq!(survivor.email.as_deref(), Some("jsmith@example.com"));
        assert_eq!(survivor.years_experience, Some(12));
        assert_eq!(survivor.last_contact, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(survivor.locum_candidate);
    }

    #[test]
    fn test_dedupe_on_clean_store_is_a_no_op() {
        let mut store = RecordStore::new();
        store.upsert(lead("1", "Jane Smith", "TX")).unwrap();
        store.upsert(lead("2", "John Doe", "OK")).unwrap();

        let report = dedupe(&mut store);
        assert_eq!(report, DedupReport { groups: 0, merged: 0 });
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_three_way_group_merges_to_one() {
        let mut store = RecordStore::new();
        for (npi, state) in [("1", "TX"), ("2", "OK"), ("3", "NM")] {
            let mut r = lead(npi, "Jane Smith", state);
            r.phone = Some("5125550100".to_string());
            store.upsert(r).unwrap();
        }

        let report = dedupe(&mut store);
        assert_eq!(report.merged, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().license_states.len(), 3);
    }
}

use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use super::{PhysicianRecord, RecordStore};
use crate::errors::{LeadError, RowIssue};

/// Columns that must be present for a load to proceed at all.
const REQUIRED_COLUMNS: [&str; 4] = ["npi", "full_name", "license_states", "primary_specialty"];

/// Columns the loader understands. Anything else is preserved as an extra.
/// `multi_state_licensed` is derived and recomputed on save, never read.
const KNOWN_COLUMNS: [&str; 15] = [
    "npi",
    "full_name",
    "license_states",
    "primary_specialty",
    "status",
    "email",
    "phone",
    "practice_address",
    "years_experience",
    "lead_source",
    "last_contact",
    "locum_candidate_flag",
    "recruiter_priority_score",
    "multi_state_licensed",
    "last_updated",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a lead CSV into a fresh store.
///
/// Missing required columns fail the whole load with a single error naming
/// every absent column. Malformed rows are rejected individually and
/// reported as [`RowIssue`]s; the load only fails outright when zero valid
/// rows remain. Header lookup is case-insensitive (upstream exports are not
/// consistent about casing).
pub fn load_csv(path: &Path) -> Result<(RecordStore, Vec<RowIssue>), LeadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        columns.entry(name.to_ascii_lowercase()).or_insert(i);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LeadError::Schema { missing });
    }

    let known: BTreeSet<&str> = KNOWN_COLUMNS.iter().copied().collect();
    let mut store = RecordStore::new();
    let mut issues = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                issues.push(RowIssue::new(row_no, e.to_string()));
                continue;
            }
        };

        match parse_row(&row, &headers, &columns, &known) {
            Ok(record) => {
                if store.contains(&record.npi) {
                    issues.push(RowIssue::new(
                        row_no,
                        format!("duplicate npi {}, earlier row replaced", record.npi),
                    ));
                }
                if let Err(e) = store.upsert(record) {
                    issues.push(RowIssue::new(row_no, e.to_string()));
                }
            }
            Err(message) => issues.push(RowIssue::new(row_no, message)),
        }
    }

    if store.is_empty() {
        return Err(LeadError::EmptyLoad {
            path: path.to_path_buf(),
            failed: issues.len(),
        });
    }

    debug!(
        "loaded {} records from {} ({} rows rejected)",
        store.len(),
        path.display(),
        issues.len()
    );
    Ok((store, issues))
}

fn parse_row(
    row: &csv::StringRecord,
    headers: &csv::StringRecord,
    columns: &HashMap<String, usize>,
    known: &BTreeSet<&str>,
) -> Result<PhysicianRecord, String> {
    let field = |name: &str| {
        columns
            .get(name)
            .and_then(|&i| row.get(i))
            .filter(|v| !v.is_empty())
    };

    let npi = field("npi").ok_or("missing npi")?.to_string();
    let full_name = field("full_name")
        .ok_or_else(|| format!("record {npi}: missing full_name"))?
        .to_string();

    let license_states: BTreeSet<String> = field("license_states")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if license_states.is_empty() {
        return Err(format!("record {npi}: no license states"));
    }

    let years_experience = field("years_experience")
        .map(|v| v.parse::<u32>())
        .transpose()
        .map_err(|e| format!("record {npi}: bad years_experience: {e}"))?;

    let last_contact = field("last_contact")
        .map(|v| NaiveDate::parse_from_str(v, DATE_FORMAT))
        .transpose()
        .map_err(|e| format!("record {npi}: bad last_contact: {e}"))?;

    let locum_candidate = match field("locum_candidate_flag") {
        Some(v) => parse_bool(v).ok_or_else(|| format!("record {npi}: bad locum_candidate_flag '{v}'"))?,
        None => false,
    };

    let priority_score = field("recruiter_priority_score")
        .map(|v| v.parse::<f64>())
        .transpose()
        .map_err(|e| format!("record {npi}: bad recruiter_priority_score: {e}"))?
        .unwrap_or(0.0);

    let last_updated = field("last_updated")
        .map(|v| DateTime::parse_from_rfc3339(v).map(|t| t.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| format!("record {npi}: bad last_updated: {e}"))?
        .unwrap_or_else(Utc::now);

    let mut extra = BTreeMap::new();
    for (i, name) in headers.iter().enumerate() {
        if !known.contains(name.to_ascii_lowercase().as_str()) {
            if let Some(value) = row.get(i) {
                if !value.is_empty() {
                    extra.insert(name.to_string(), value.to_string());
                }
            }
        }
    }

    Ok(PhysicianRecord {
        npi,
        full_name,
        license_states,
        primary_specialty: field("primary_specialty").unwrap_or_default().to_string(),
        status: field("status").unwrap_or("ACTIVE").to_string(),
        email: field("email").map(str::to_string),
        phone: field("phone").map(str::to_string),
        practice_address: field("practice_address").map(str::to_string),
        years_experience,
        lead_source: field("lead_source").map(str::to_string),
        last_contact,
        locum_candidate,
        priority_score,
        last_updated,
        extra,
    })
}

/// Write the full record set back to tabular form atomically.
///
/// The writer targets a temp file and renames it over the canonical path on
/// commit, so a crash or I/O failure never leaves a half-written file
/// visible. Extra columns observed on any record are written back as the
/// trailing columns.
pub fn save_csv(store: &RecordStore, path: &Path) -> Result<(), LeadError> {
    let extra_columns: BTreeSet<&str> = store
        .iter()
        .flat_map(|r| r.extra.keys())
        .map(String::as_str)
        .collect();

    let mut file = AtomicWriteFile::open(path)?;
    {
        let mut writer = csv::Writer::from_writer(&mut file);

        let mut header: Vec<&str> = KNOWN_COLUMNS.to_vec();
        header.extend(extra_columns.iter().copied());
        writer.write_record(&header)?;

        for record in store.iter() {
            let states: Vec<&str> = record.license_states.iter().map(String::as_str).collect();
            let mut row = vec![
                record.npi.clone(),
                record.full_name.clone(),
                states.join(", "),
                record.primary_specialty.clone(),
                record.status.clone(),
                record.email.clone().unwrap_or_default(),
                record.phone.clone().unwrap_or_default(),
                record.practice_address.clone().unwrap_or_default(),
                record
                    .years_experience
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
                record.lead_source.clone().unwrap_or_default(),
                record
                    .last_contact
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                format_bool(record.locum_candidate),
                record.priority_score.to_string(),
                format_bool(record.multi_state()),
                record.last_updated.to_rfc3339(),
            ];
            for column in &extra_columns {
                row.push(record.extra.get(*column).cloned().unwrap_or_default());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }
    file.commit()?;

    debug!("saved {} records to {}", store.len(), path.display());
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

fn format_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

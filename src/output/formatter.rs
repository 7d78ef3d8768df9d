use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::RuleHit;
use crate::store::PhysicianRecord;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score in compact notation (1.5k, 847). Scores are small in
/// practice but imported data can carry anything.
pub fn format_score(score: f64) -> String {
    let formatted = if score >= 1_000_000.0 {
        format!("{:.1}M", score / 1_000_000.0)
    } else if score >= 1_000.0 {
        format!("{:.1}k", score / 1_000.0)
    } else {
        format!("{:.0}", score)
    };
    formatted.replace(".0M", "M").replace(".0k", "k")
}

fn format_states(record: &PhysicianRecord) -> String {
    record
        .license_states
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn format_last_contact(record: &PhysicianRecord) -> String {
    match record.days_since_contact() {
        Some(days) if days <= 0 => "today".to_string(),
        Some(1) => "1d ago".to_string(),
        Some(days) => format!("{}d ago", days),
        None => "never".to_string(),
    }
}

/// Format a single lead as one line: "{name} | {specialty} | {states} | {score}"
pub fn format_lead_line(record: &PhysicianRecord, use_colors: bool) -> String {
    if use_colors {
        format!(
            "{} | {} | {} | {}",
            record.full_name.bold(),
            record.primary_specialty.cyan(),
            format_states(record).yellow(),
            format_score(record.priority_score)
        )
    } else {
        format!(
            "{} | {} | {} | {}",
            record.full_name,
            record.primary_specialty,
            format_states(record),
            format_score(record.priority_score)
        )
    }
}

/// Multi-line detail view for one lead (verbose mode).
pub fn format_lead_detail(record: &PhysicianRecord, use_colors: bool) -> String {
    let name = if use_colors {
        record.full_name.bold().to_string()
    } else {
        record.full_name.clone()
    };
    format!(
        "{}\n  NPI: {}\n  Specialty: {}\n  Status: {}\n  States: {}\n  Email: {}\n  Phone: {}\n  Last contact: {}\n  Source: {}\n  Score: {}",
        name,
        record.npi,
        record.primary_specialty,
        record.status,
        format_states(record),
        record.email.as_deref().unwrap_or("-"),
        record.phone.as_deref().unwrap_or("-"),
        format_last_contact(record),
        record.lead_source.as_deref().unwrap_or("-"),
        format_score(record.priority_score),
    )
}

/// Format the rules behind a score, one per line, for verbose output.
pub fn format_rule_hits(hits: &[RuleHit]) -> String {
    if hits.is_empty() {
        return "  (no rules matched)".to_string();
    }
    hits.iter()
        .map(|h| format!("  {:+} {}", h.weight, h.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line roll-up mirroring the metrics a recruiter scans first.
pub fn format_summary(leads: &[&PhysicianRecord]) -> String {
    let multi_state = leads.iter().filter(|r| r.multi_state()).count();
    let locum = leads.iter().filter(|r| r.locum_candidate).count();
    format!(
        "{} leads | {} multi-state | {} locum candidates",
        leads.len(),
        multi_state,
        locum
    )
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a field to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format leads as a scored table: Index, Score, Name, Specialty, States.
/// Index column fits "99.", score column fits "9999.9M"; the name column
/// absorbs whatever terminal width remains.
pub fn format_scored_table(leads: &[&PhysicianRecord], use_colors: bool) -> String {
    if leads.is_empty() {
        return "No leads found.".to_string();
    }

    let term_width = get_terminal_width();
    let name_width = leads
        .iter()
        .map(|r| r.full_name.chars().count())
        .max()
        .unwrap_or(0);
    // 3 index + 7 score + two 2-space separators ahead of the name column.
    let name_width = match term_width {
        Some(w) => name_width.min(w.saturating_sub(40).max(12)),
        None => name_width,
    };

    leads
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let index = format!("{:>2}.", idx + 1);
            let score = format!("{:>7}", format_score(record.priority_score));
            let name = format!("{:<width$}", truncate(&record.full_name, name_width), width = name_width);
            let states = format_states(record);
            if use_colors {
                format!(
                    "{}  {}  {}  {}  {}",
                    index,
                    score.green(),
                    name.bold(),
                    record.primary_specialty.cyan(),
                    states.yellow()
                )
            } else {
                format!(
                    "{}  {}  {}  {}  {}",
                    index, score, name, record.primary_specialty, states
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

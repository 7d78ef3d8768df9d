pub mod formatter;

pub use formatter::{
    format_lead_detail, format_lead_line, format_rule_hits, format_score, format_scored_table,
    format_summary, should_use_colors,
};

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use lead_desk::backup::BackupManager;
use lead_desk::errors::{LeadError, RowIssue};
use lead_desk::store::{LeadFilter, RecordStore};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 1;
const EXIT_IO: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List leads sorted by priority (default if no subcommand)
    List {
        /// Only leads licensed in any of these states (repeatable)
        #[arg(long = "state")]
        states: Vec<String>,
        /// Only leads in this practice area
        #[arg(long)]
        specialty: Option<String>,
        /// Only leads with ACTIVE status
        #[arg(long)]
        active_only: bool,
        /// Only multi-state licensed leads
        #[arg(long)]
        multi_state: bool,
        /// Only locum candidates
        #[arg(long)]
        locum: bool,
        /// Minimum priority score
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Re-score every lead against the configured rules and save
    Recompute,
    /// Merge probable duplicate leads, re-score, and save
    Dedupe,
    /// Capture a snapshot of the current lead file
    Snapshot,
    /// List available snapshots
    Snapshots,
    /// Replace the lead file with a named snapshot
    Restore {
        /// Snapshot id as shown by `snapshots`
        id: String,
    },
    /// Delete snapshots outside the retention window
    Prune,
    /// Flag a lead with a note
    Flag { npi: String, note: String },
    /// Remove a lead's flag
    Unflag { npi: String },
    /// List flagged leads, optionally exporting them as CSV
    Flagged {
        /// Write the flagged subset to this CSV path
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "lead-desk")]
#[command(about = "Physician lead scoring and backup CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/lead-desk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the lead CSV (overrides the configured data_file)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn exit_code_for(err: &LeadError) -> i32 {
    match err {
        LeadError::Io(_) | LeadError::Csv(_) => EXIT_IO,
        _ => EXIT_DATA,
    }
}

fn report_issues(issues: &[RowIssue], verbose: bool) {
    if issues.is_empty() {
        return;
    }
    eprintln!("{} rows rejected during load", issues.len());
    if verbose {
        for issue in issues {
            eprintln!("  - {}", issue);
        }
    }
}

fn load_store(path: &Path, verbose: bool) -> RecordStore {
    match lead_desk::store::load_csv(path) {
        Ok((store, issues)) => {
            report_issues(&issues, verbose);
            if verbose {
                eprintln!("Loaded {} leads from {}", store.len(), path.display());
            }
            store
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn save_store(store: &RecordStore, path: &Path, verbose: bool) {
    if let Err(e) = lead_desk::store::save_csv(store, path) {
        eprintln!("Failed to save {}: {}", path.display(), e);
        std::process::exit(exit_code_for(&e));
    }
    if verbose {
        eprintln!("Saved {} leads to {}", store.len(), path.display());
    }
}

/// Best-effort snapshot around a bulk edit. A failed capture is reported
/// and skipped; it never blocks the edit itself.
fn try_snapshot(manager: &BackupManager, store: &RecordStore, label: &str, verbose: bool) {
    match manager.snapshot(store) {
        Ok(id) => {
            if verbose {
                eprintln!("Snapshot {} ({})", id, label);
            }
        }
        Err(e) => eprintln!("Warning: {} snapshot failed: {}", label, e),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List {
        states: Vec::new(),
        specialty: None,
        active_only: false,
        multi_state: false,
        locum: false,
        min_score: None,
    });

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match lead_desk::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate scoring config at startup
    let scoring = config.scoring.clone().unwrap_or_default();
    if let Err(errors) = lead_desk::scoring::validate_scoring(&scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let backup_config = config.backup.clone().unwrap_or_default();
    let policy = match backup_config.policy() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Backup config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let manager = BackupManager::new(backup_config.directory());

    let data_path = cli.data.clone().unwrap_or_else(|| config.data_path());
    if cli.verbose {
        eprintln!("Data file: {}", data_path.display());
        eprintln!("Backup dir: {}", manager.dir().display());
        eprintln!("{} scoring rules configured", scoring.rules.len());
    }

    let use_colors = lead_desk::output::should_use_colors();

    match command {
        Commands::List {
            states,
            specialty,
            active_only,
            multi_state,
            locum,
            min_score,
        } => {
            let store = load_store(&data_path, cli.verbose);
            let filter = LeadFilter {
                states,
                specialty,
                active_only,
                multi_state_only: multi_state,
                locum_only: locum,
                min_score,
            };
            let leads: Vec<_> = store
                .sorted_by_score()
                .into_iter()
                .filter(|r| filter.matches(r))
                .collect();

            if cli.verbose {
                for lead in &leads {
                    println!("{}", lead_desk::output::format_lead_detail(lead, use_colors));
                    let result = lead_desk::scoring::score_record(lead, &scoring);
                    println!("{}", lead_desk::output::format_rule_hits(&result.hits));
                    println!();
                }
            } else {
                println!("{}", lead_desk::output::format_scored_table(&leads, use_colors));
            }
            println!("{}", lead_desk::output::format_summary(&leads));
        }
        Commands::Recompute => {
            let mut store = load_store(&data_path, cli.verbose);
            try_snapshot(&manager, &store, "pre-recompute", cli.verbose);

            let changed = lead_desk::scoring::recompute(&mut store, &scoring);
            save_store(&store, &data_path, cli.verbose);
            try_snapshot(&manager, &store, "post-recompute", cli.verbose);

            println!("Recomputed: {} of {} leads changed score", changed, store.len());
        }
        Commands::Dedupe => {
            let mut store = load_store(&data_path, cli.verbose);
            try_snapshot(&manager, &store, "pre-dedupe", cli.verbose);

            let report = lead_desk::store::dedupe(&mut store);
            let rescored = lead_desk::scoring::recompute(&mut store, &scoring);
            save_store(&store, &data_path, cli.verbose);
            try_snapshot(&manager, &store, "post-dedupe", cli.verbose);

            println!(
                "Merged {} duplicates across {} groups ({} leads re-scored, {} remain)",
                report.merged,
                report.groups,
                rescored,
                store.len()
            );
        }
        Commands::Snapshot => {
            let store = load_store(&data_path, cli.verbose);
            match manager.snapshot(&store) {
                Ok(id) => println!("Snapshot {}", id),
                Err(e) => {
                    eprintln!("Snapshot failed: {}", e);
                    std::process::exit(exit_code_for(&e));
                }
            }
        }
        Commands::Snapshots => match manager.list() {
            Ok(ids) => {
                if ids.is_empty() {
                    println!("No snapshots in {}", manager.dir().display());
                } else {
                    for id in ids {
                        println!("{}", id);
                    }
                }
            }
            Err(e) => {
                eprintln!("Failed to list snapshots: {}", e);
                std::process::exit(exit_code_for(&e));
            }
        },
        Commands::Restore { id } => {
            let restored = match manager.restore(&id) {
                Ok(store) => store,
                Err(e) => {
                    eprintln!("Restore failed: {}", e);
                    std::process::exit(exit_code_for(&e));
                }
            };

            // Preserve the current state before overwriting it.
            if let Ok((current, _)) = lead_desk::store::load_csv(&data_path) {
                try_snapshot(&manager, &current, "pre-restore", cli.verbose);
            }

            save_store(&restored, &data_path, cli.verbose);
            println!("Restored {} leads from {}", restored.len(), id);
        }
        Commands::Prune => match manager.prune(&policy) {
            Ok(deleted) => {
                if deleted.is_empty() {
                    println!("Nothing to prune");
                } else {
                    for id in &deleted {
                        println!("Deleted {}", id);
                    }
                    println!("Pruned {} snapshots", deleted.len());
                }
            }
            Err(e) => {
                eprintln!("Prune failed: {}", e);
                std::process::exit(exit_code_for(&e));
            }
        },
        Commands::Flag { npi, note } => {
            let store = load_store(&data_path, cli.verbose);
            if !store.contains(&npi) {
                eprintln!("No lead with NPI {}", npi);
                std::process::exit(EXIT_DATA);
            }

            let flags_path = lead_desk::flags::get_flags_path();
            let mut state = match lead_desk::flags::load_flag_state(&flags_path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Flag state error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };
            state.flag(npi.clone(), note);
            if let Err(e) = lead_desk::flags::save_flag_state(&flags_path, &state) {
                eprintln!("Failed to save flag state: {}", e);
                std::process::exit(EXIT_IO);
            }
            println!("Flagged {}", npi);
        }
        Commands::Unflag { npi } => {
            let flags_path = lead_desk::flags::get_flags_path();
            let mut state = match lead_desk::flags::load_flag_state(&flags_path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Flag state error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };
            let removed = state.unflag(&npi);
            if let Err(e) = lead_desk::flags::save_flag_state(&flags_path, &state) {
                eprintln!("Failed to save flag state: {}", e);
                std::process::exit(EXIT_IO);
            }
            if removed {
                println!("Unflagged {}", npi);
            } else {
                println!("{} was not flagged", npi);
            }
        }
        Commands::Flagged { export } => {
            let store = load_store(&data_path, cli.verbose);
            let flags_path = lead_desk::flags::get_flags_path();
            let state = match lead_desk::flags::load_flag_state(&flags_path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Flag state error: {}", e);
                    std::process::exit(EXIT_IO);
                }
            };

            let flagged = lead_desk::flags::filter_flagged(&store, &state);
            if flagged.is_empty() {
                println!("No flagged leads.");
            } else {
                println!("{}", lead_desk::output::format_scored_table(&flagged, use_colors));
                for lead in &flagged {
                    if let Some(note) = state.note(&lead.npi) {
                        println!("  {}: {}", lead.npi, note);
                    }
                }
            }

            if let Some(path) = export {
                match lead_desk::flags::export_flagged(&store, &state, &path) {
                    Ok(count) => println!("Exported {} flagged leads to {}", count, path.display()),
                    Err(e) => {
                        eprintln!("Export failed: {}", e);
                        std::process::exit(exit_code_for(&e));
                    }
                }
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

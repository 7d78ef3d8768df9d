use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::types::FlagState;

/// Default flag state file path (~/.config/lead-desk/flags.json)
pub fn get_flags_path() -> PathBuf {
    crate::config::get_config_dir().join("flags.json")
}

/// Load flag state from a JSON file.
///
/// A file that does not exist yet is an empty state. A file with an
/// unsupported version is an error.
pub fn load_flag_state(path: &Path) -> Result<FlagState> {
    if !path.exists() {
        return Ok(FlagState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open flag state file at {}", path.display()))?;

    let state: FlagState = serde_json::from_reader(file).context("Failed to load flag state")?;

    if state.version != 1 {
        anyhow::bail!("Unsupported flag state version: {}", state.version);
    }

    Ok(state)
}

/// Save flag state to a JSON file atomically.
///
/// Creates the config directory if it doesn't exist; the write lands in a
/// temp file that replaces the target on commit.
pub fn save_flag_state(path: &Path, state: &FlagState) -> Result<()> {
    crate::config::ensure_config_dir()?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, state).context("Failed to serialize flag state")?;

    file.commit().context("Failed to save flag state")?;

    Ok(())
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backup::RetentionPolicy;
use crate::scoring::ScoringConfig;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The canonical lead CSV. Overridable with --data on the command line.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub backup: Option<BackupConfig>,
}

impl Config {
    /// Effective data file path: config value or `scored_physicians.csv`
    /// in the working directory.
    pub fn data_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("scored_physicians.csv"))
    }
}

/// Where snapshots live and how long they are kept.
///
/// Retention numbers are deliberately configuration: `keep_last` wins when
/// set, otherwise `max_age`, otherwise keep the newest 14.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Keep the newest N snapshots.
    #[serde(default)]
    pub keep_last: Option<usize>,

    /// Keep snapshots younger than this humantime age, e.g. "30d".
    #[serde(default)]
    pub max_age: Option<String>,
}

const DEFAULT_KEEP_LAST: usize = 14;

impl BackupConfig {
    pub fn directory(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lead-desk")
                .join("backups")
        })
    }

    pub fn policy(&self) -> anyhow::Result<RetentionPolicy> {
        if let Some(count) = self.keep_last {
            return Ok(RetentionPolicy::KeepLast(count));
        }
        if let Some(ref age) = self.max_age {
            return RetentionPolicy::max_age(age);
        }
        Ok(RetentionPolicy::KeepLast(DEFAULT_KEEP_LAST))
    }
}

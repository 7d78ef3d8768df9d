use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use super::snapshot::SnapshotId;

/// How long snapshots are kept. Whatever the policy says, `prune` never
/// deletes the most recent snapshot; the floor is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep the newest N snapshots.
    KeepLast(usize),
    /// Keep snapshots younger than the given age.
    MaxAge(Duration),
}

impl RetentionPolicy {
    /// Build an age-based policy from a humantime string like "30d".
    pub fn max_age(s: &str) -> Result<Self> {
        let age = humantime::parse_duration(s.trim())
            .with_context(|| format!("invalid retention age '{}'", s))?;
        let age = Duration::from_std(age).context("retention age out of range")?;
        Ok(RetentionPolicy::MaxAge(age))
    }
}

/// Pure selection of the snapshots a prune would delete.
///
/// `snapshots` must be sorted ascending (as `BackupManager::list` returns
/// them). The newest snapshot is never selected.
pub fn select_expired(
    snapshots: &[SnapshotId],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<SnapshotId> {
    if snapshots.len() <= 1 {
        return Vec::new();
    }
    // The floor: the last (newest) entry is exempt from every policy.
    let candidates = &snapshots[..snapshots.len() - 1];

    match policy {
        RetentionPolicy::KeepLast(count) => {
            let keep = (*count).max(1);
            if snapshots.len() <= keep {
                Vec::new()
            } else {
                snapshots[..snapshots.len() - keep].to_vec()
            }
        }
        RetentionPolicy::MaxAge(age) => candidates
            .iter()
            .filter(|id| match id.timestamp() {
                Some(taken) => now - taken > *age,
                None => false,
            })
            .cloned()
            .collect(),
    }
}

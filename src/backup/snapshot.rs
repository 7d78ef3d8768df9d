use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::retention::{select_expired, RetentionPolicy};
use crate::errors::LeadError;
use crate::store::{load_csv, save_csv, RecordStore};

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SNAPSHOT_EXT: &str = "csv";

/// Identifier of one immutable snapshot: UTC timestamp plus a sequence
/// number that disambiguates captures within the same second. Lexicographic
/// order on the rendered id is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotId {
    stamp: String,
    sequence: u32,
}

impl SnapshotId {
    fn new(at: DateTime<Utc>, sequence: u32) -> Self {
        Self {
            stamp: at.format(STAMP_FORMAT).to_string(),
            sequence,
        }
    }

    /// Parse an id like `20240101T093000Z-000`, with or without the file
    /// extension. Returns None for anything that is not a snapshot id.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_suffix(".csv").unwrap_or(s);
        let (stamp, sequence) = s.rsplit_once('-')?;
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        let sequence: u32 = sequence.parse().ok()?;
        Some(Self {
            stamp: stamp.to_string(),
            sequence,
        })
    }

    /// The capture time encoded in the id.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.stamp, STAMP_FORMAT)
            .ok()
            .map(|t| t.and_utc())
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self, SNAPSHOT_EXT)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.stamp, self.sequence)
    }
}

/// Owns the snapshot directory. Never mutates the live record set.
///
/// Each capture runs one Capturing -> Written (or Failed) cycle: the
/// payload goes to a temp file that is renamed into place on success, so a
/// failed capture leaves nothing behind and the next trigger simply tries
/// again. Failures are reported, never retried in a loop.
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot ids present in the backup directory, oldest first.
    /// A directory that does not exist yet holds zero snapshots.
    pub fn list(&self) -> Result<Vec<SnapshotId>, LeadError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            match name.to_str().and_then(SnapshotId::parse) {
                Some(id) => ids.push(id),
                None => debug!("ignoring non-snapshot file {:?}", name),
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Serialize the full record set to a new immutable snapshot file.
    ///
    /// The new id is strictly greater than every existing one: captures in
    /// the same second bump the sequence, and a directory holding ids from
    /// a clock that ran ahead keeps the stamp of its latest entry.
    pub fn snapshot(&self, store: &RecordStore) -> Result<SnapshotId, LeadError> {
        fs::create_dir_all(&self.dir)?;

        let mut id = SnapshotId::new(Utc::now(), 0);
        if let Some(last) = self.list()?.into_iter().last() {
            if last.stamp >= id.stamp {
                id = SnapshotId {
                    stamp: last.stamp,
                    sequence: last.sequence + 1,
                };
            }
        }

        let path = self.dir.join(id.file_name());
        save_csv(store, &path)?;
        debug!("wrote snapshot {} ({} records)", id, store.len());
        Ok(id)
    }

    /// Deserialize a named snapshot into a fresh store.
    ///
    /// The caller's live store is untouched whatever happens here.
    pub fn restore(&self, id: &str) -> Result<RecordStore, LeadError> {
        let not_found = || LeadError::SnapshotNotFound { id: id.to_string() };
        let snapshot_id = SnapshotId::parse(id).ok_or_else(not_found)?;

        let path = self.dir.join(snapshot_id.file_name());
        if !path.exists() {
            return Err(not_found());
        }

        // Snapshots are machine-written; any row that fails to parse means
        // the file has been damaged since.
        match load_csv(&path) {
            Ok((store, issues)) if issues.is_empty() => Ok(store),
            Ok((_, issues)) => Err(LeadError::SnapshotCorrupt {
                id: id.to_string(),
                reason: format!("{} rows failed to parse ({})", issues.len(), issues[0]),
            }),
            Err(LeadError::Io(e)) => Err(e.into()),
            Err(e) => Err(LeadError::SnapshotCorrupt {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Delete snapshots outside the retention window, returning the deleted
    /// ids. The most recent snapshot is always kept, whatever the policy.
    pub fn prune(&self, policy: &RetentionPolicy) -> Result<Vec<SnapshotId>, LeadError> {
        let snapshots = self.list()?;
        let expired = select_expired(&snapshots, policy, Utc::now());

        for id in &expired {
            fs::remove_file(self.dir.join(id.file_name()))?;
            debug!("pruned snapshot {}", id);
        }
        if !expired.is_empty() {
            warn!("pruned {} snapshots from {}", expired.len(), self.dir.display());
        }
        Ok(expired)
    }
}

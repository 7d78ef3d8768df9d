pub mod retention;
pub mod snapshot;

pub use retention::{select_expired, RetentionPolicy};
pub use snapshot::{BackupManager, SnapshotId};

pub mod interfaces;
pub mod snapshot;

pub use interfaces::{GraphSource, SourceResult};
pub use snapshot::{IssueKind, Snapshot, SnapshotIssue, SnapshotSource};

//! Async stream adapters over a running session

mod snapshots;

pub use snapshots::SnapshotStream;

//! Infrastructure layer: configuration and snapshot persistence.

pub mod config;
pub mod persister;
pub mod snapshot;

pub use config::{ConfigError, PharmacyConfig};
pub use persister::DebouncedPersister;
pub use snapshot::{InMemorySnapshotStore, JsonFileSnapshotStore, Snapshot, SnapshotError, SnapshotStore};

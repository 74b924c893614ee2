//! Whole-state snapshots: the local fallback data store.
//!
//! The snapshot is read wholesale at startup and written wholesale after
//! mutations. Only `medications` and `movements` are required when reading;
//! the other collections default to empty so older files still load.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pharmastock_alerts::Alert;
use pharmastock_auth::User;
use pharmastock_inventory::{InventoryMovement, Medication};
use pharmastock_parties::{Client, Supplier};
use pharmastock_sales::Invoice;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub medications: Vec<Medication>,
    pub movements: Vec<InventoryMovement>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("snapshot {path} is malformed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot store lock poisoned")]
    Poisoned,
}

/// Load/save the whole application state.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}

impl<S> SnapshotStore for Arc<S>
where
    S: SnapshotStore + ?Sized,
{
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        (**self).save(snapshot)
    }
}

/// JSON file store. Writes go to a sibling temp file that is then renamed
/// over the target, so readers never observe a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io(err)),
        };
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|source| SnapshotError::Decode {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(
            path = %self.path.display(),
            medications = snapshot.medications.len(),
            movements = snapshot.movements.len(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(SnapshotError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io(e))?;
        }
        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|e| self.io(e))?;
        file.write_all(&bytes).map_err(|e| self.io(e))?;
        file.sync_all().map_err(|e| self.io(e))?;
        drop(file);
        fs::rename(&temp, &self.path).map_err(|e| self.io(e))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    current: RwLock<Option<Snapshot>>,
    saves: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed `save` calls.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let current = self.current.read().map_err(|_| SnapshotError::Poisoned)?;
        Ok(current.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let mut current = self.current.write().map_err(|_| SnapshotError::Poisoned)?;
        *current = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pharmastock_core::{Actor, FixedClock, UserId};
    use pharmastock_inventory::{InventoryStore, MovementType, NewMedication};

    fn populated() -> Snapshot {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let mut store = InventoryStore::new(clock);
        let id = store
            .register_medication(NewMedication {
                name: "Paracetamol 500mg".to_string(),
                batch: "P-500".to_string(),
                expiry_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                quantity: 150,
                min_stock: 50,
                supplier_id: None,
                category: "Analgésicos".to_string(),
                unit_price_cents: 25,
                active_ingredient: Some("Paracetamol".to_string()),
                location: Some("A-1".to_string()),
                image_url: None,
                controlled: false,
            })
            .unwrap()
            .id_typed();
        let actor = Actor::new(UserId::new(), "Ana Torres");
        store
            .record_movement(MovementType::Salida, &id, 40, "Venta", &actor)
            .unwrap();

        Snapshot {
            medications: store.medications().to_vec(),
            movements: store.movements().to_vec(),
            ..Snapshot::default()
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_round_trip_keeps_the_ledger_reconciled() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("nested").join("data.json"));
        let snapshot = populated();

        store.save(&snapshot).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!store.temp_path().exists());

        let restored = InventoryStore::from_snapshot(
            loaded.medications,
            loaded.movements,
            Arc::new(FixedClock::new(Utc::now())),
        );
        assert!(restored.reconcile().is_empty());
        assert_eq!(restored.medications()[0].quantity(), 110);
    }

    #[test]
    fn optional_collections_may_be_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{ "medications": [], "movements": [] }"#).unwrap();

        let loaded = JsonFileSnapshotStore::new(&path).load().unwrap().unwrap();
        assert!(loaded.suppliers.is_empty());
        assert!(loaded.invoices.is_empty());
        assert!(loaded.saved_at.is_none());
    }

    #[test]
    fn required_collections_must_be_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{ "medications": [] }"#).unwrap();

        let err = JsonFileSnapshotStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SnapshotError::Decode { .. }));
    }

    #[test]
    fn in_memory_store_counts_saves() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&Snapshot::default()).unwrap();
        store.save(&populated()).unwrap();
        assert_eq!(store.saves(), 2);
        assert_eq!(store.load().unwrap().unwrap().medications.len(), 1);
    }
}

//! Inventory domain module.
//!
//! Medications are aggregates whose stock only changes through immutable
//! ledger entries ([`InventoryMovement`]). The [`InventoryStore`] owns both
//! collections and is the Movement Recorder.

pub mod medication;
pub mod movement;
pub mod store;

pub use medication::{Medication, MedicationCommand, MedicationDetails, NewMedication, RecordMovement};
pub use movement::{AdjustmentDirection, InventoryMovement, MovementKind, MovementType};
pub use store::{InventoryStore, ReconciliationMismatch};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pharmastock_alerts::Alert;
use pharmastock_core::{AlertId, MedicationId};
use pharmastock_events::Event;
use pharmastock_inventory::InventoryMovement;
use pharmastock_sales::InvoiceNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryChange {
    Added,
    Updated,
    Removed,
}

/// What the UI layer is told after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PharmacyNotification {
    MedicationRegistered {
        medication_id: MedicationId,
        name: String,
        at: DateTime<Utc>,
    },
    MedicationUpdated {
        medication_id: MedicationId,
        at: DateTime<Utc>,
    },
    MovementRecorded(InventoryMovement),
    SaleRegistered {
        invoice: InvoiceNumber,
        total_cents: u64,
        at: DateTime<Utc>,
    },
    AlertRaised(Alert),
    AlertResolved {
        alert_id: AlertId,
        at: DateTime<Utc>,
    },
    DirectoryChanged {
        kind: &'static str,
        change: DirectoryChange,
        id: String,
        at: DateTime<Utc>,
    },
    SweepCompleted {
        returned: usize,
        failed: usize,
        skipped: usize,
        at: DateTime<Utc>,
    },
}

impl Event for PharmacyNotification {
    fn event_type(&self) -> &'static str {
        match self {
            PharmacyNotification::MedicationRegistered { .. } => "pharmacy.medication.registered",
            PharmacyNotification::MedicationUpdated { .. } => "pharmacy.medication.updated",
            PharmacyNotification::MovementRecorded(m) => m.event_type(),
            PharmacyNotification::SaleRegistered { .. } => "pharmacy.sale.registered",
            PharmacyNotification::AlertRaised(_) => "pharmacy.alert.raised",
            PharmacyNotification::AlertResolved { .. } => "pharmacy.alert.resolved",
            PharmacyNotification::DirectoryChanged { .. } => "pharmacy.directory.changed",
            PharmacyNotification::SweepCompleted { .. } => "pharmacy.returns.sweep_completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PharmacyNotification::MovementRecorded(m) => m.occurred_at,
            PharmacyNotification::AlertRaised(a) => a.date,
            PharmacyNotification::MedicationRegistered { at, .. }
            | PharmacyNotification::MedicationUpdated { at, .. }
            | PharmacyNotification::SaleRegistered { at, .. }
            | PharmacyNotification::AlertResolved { at, .. }
            | PharmacyNotification::DirectoryChanged { at, .. }
            | PharmacyNotification::SweepCompleted { at, .. } => *at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmastock_core::text::normalize_name;
use pharmastock_core::{AlertId, MedicationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    NearExpiry,
    Expired,
    SalesTrend,
    TechnicalTask,
}

impl AlertKind {
    /// Kinds produced by [`crate::derive_alerts`] (the rest are raised manually).
    pub fn is_derived(&self) -> bool {
        matches!(self, AlertKind::LowStock | AlertKind::NearExpiry | AlertKind::Expired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Identity of the condition an alert describes.
///
/// Medication alerts are keyed by (medication, kind); free-standing alerts
/// (e.g. technical tasks) by kind and normalized message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKey {
    Medication(MedicationId, AlertKind),
    Standalone(AlertKind, String),
}

/// An alert the deriver (or a caller) wants to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCandidate {
    pub kind: AlertKind,
    pub medication_id: Option<MedicationId>,
    pub medication_name: Option<String>,
    pub message: String,
    pub severity: Severity,
}

impl AlertCandidate {
    pub fn key(&self) -> AlertKey {
        key_of(self.kind, self.medication_id, &self.message)
    }
}

/// One alert instance. Resolution is recorded on the instance and kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    #[serde(default)]
    pub medication_id: Option<MedicationId>,
    #[serde(default)]
    pub medication_name: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub date: DateTime<Utc>,
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn from_candidate(candidate: AlertCandidate, now: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::new(),
            kind: candidate.kind,
            medication_id: candidate.medication_id,
            medication_name: candidate.medication_name,
            message: candidate.message,
            severity: candidate.severity,
            date: now,
            resolved: false,
            resolved_at: None,
        }
    }

    pub fn key(&self) -> AlertKey {
        key_of(self.kind, self.medication_id, &self.message)
    }
}

fn key_of(kind: AlertKind, medication_id: Option<MedicationId>, message: &str) -> AlertKey {
    match medication_id {
        Some(id) => AlertKey::Medication(id, kind),
        None => AlertKey::Standalone(kind, normalize_name(message)),
    }
}

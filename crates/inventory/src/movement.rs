use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmastock_core::{MedicationId, MovementId, UserId};
use pharmastock_events::Event;

/// Ledger movement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Inflow (purchase intake, customer return).
    Entrada,
    /// Outflow (sale, supplier return).
    Salida,
    /// Stock correction; direction carried alongside.
    Ajuste,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "entrada",
            MovementKind::Salida => "salida",
            MovementKind::Ajuste => "ajuste",
        }
    }
}

/// Direction of an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

/// What a caller asks the recorder to do: a kind, plus a direction for adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementType {
    Entrada,
    Salida,
    Ajuste(AdjustmentDirection),
}

impl MovementType {
    pub fn kind(&self) -> MovementKind {
        match self {
            MovementType::Entrada => MovementKind::Entrada,
            MovementType::Salida => MovementKind::Salida,
            MovementType::Ajuste(_) => MovementKind::Ajuste,
        }
    }

    pub fn direction(&self) -> Option<AdjustmentDirection> {
        match self {
            MovementType::Ajuste(d) => Some(*d),
            _ => None,
        }
    }

    /// +1 for stock-increasing movements, -1 for stock-decreasing ones.
    pub fn sign(&self) -> i64 {
        match self {
            MovementType::Entrada | MovementType::Ajuste(AdjustmentDirection::Increase) => 1,
            MovementType::Salida | MovementType::Ajuste(AdjustmentDirection::Decrease) => -1,
        }
    }
}

/// Immutable ledger entry: one accepted change of a medication's stock.
///
/// `quantity` is always a positive magnitude; the direction comes from `kind`
/// (and `direction` for adjustments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: MovementId,
    pub medication_id: MedicationId,
    pub medication_name: String,
    pub kind: MovementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<AdjustmentDirection>,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
    /// Document the entry belongs to, e.g. the invoice of a sale or customer return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub user_id: UserId,
    pub user_name: String,
}

impl InventoryMovement {
    pub fn movement_type(&self) -> MovementType {
        match (self.kind, self.direction) {
            (MovementKind::Entrada, _) => MovementType::Entrada,
            (MovementKind::Salida, _) => MovementType::Salida,
            (MovementKind::Ajuste, Some(d)) => MovementType::Ajuste(d),
            // Adjustments recorded without a direction are treated as increases.
            (MovementKind::Ajuste, None) => MovementType::Ajuste(AdjustmentDirection::Increase),
        }
    }

    /// Signed effect of this entry on stock.
    pub fn signed_delta(&self) -> i64 {
        self.movement_type().sign() * self.quantity
    }
}

impl Event for InventoryMovement {
    fn event_type(&self) -> &'static str {
        match self.kind {
            MovementKind::Entrada => "inventory.movement.entrada",
            MovementKind::Salida => "inventory.movement.salida",
            MovementKind::Ajuste => "inventory.movement.ajuste",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

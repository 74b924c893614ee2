use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::{Actor, DomainError, DomainResult, MedicationId};
use pharmastock_inventory::{InventoryMovement, InventoryStore, MovementType};

/// Why stock goes back to the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierReturnType {
    Expired,
    Defective,
    OrderError,
    Recall,
}

impl SupplierReturnType {
    /// Label written into the movement reason.
    pub fn label(&self) -> &'static str {
        match self {
            SupplierReturnType::Expired => "Producto vencido",
            SupplierReturnType::Defective => "Producto defectuoso",
            SupplierReturnType::OrderError => "Error en pedido",
            SupplierReturnType::Recall => "Retiro del mercado",
        }
    }
}

/// Manual supplier return form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SupplierReturn {
    pub medication_id: MedicationId,
    pub return_type: SupplierReturnType,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub notes: String,
}

impl SupplierReturn {
    pub fn reason(&self) -> String {
        let notes = self.notes.trim();
        if notes.is_empty() {
            self.return_type.label().to_string()
        } else {
            format!("{}: {}", self.return_type.label(), notes)
        }
    }
}

/// Return units to the supplier: one `salida` for the requested quantity.
///
/// The quantity is checked against live stock before the recorder is called;
/// returned units leave tracked inventory for good.
pub fn return_to_supplier(
    store: &mut InventoryStore,
    form: &SupplierReturn,
    actor: &Actor,
) -> DomainResult<InventoryMovement> {
    if form.quantity <= 0 {
        return Err(DomainError::InvalidQuantity(form.quantity));
    }
    form.validate()?;

    let available = store.available(&form.medication_id)?;
    if form.quantity > available {
        tracing::warn!(
            medication_id = %form.medication_id,
            available,
            requested = form.quantity,
            "supplier return rejected"
        );
        return Err(DomainError::InsufficientStock {
            available,
            requested: form.quantity,
        });
    }

    let movement = store.record_movement(
        MovementType::Salida,
        &form.medication_id,
        form.quantity,
        &form.reason(),
        actor,
    )?;
    tracing::info!(
        medication_id = %form.medication_id,
        return_type = ?form.return_type,
        quantity = form.quantity,
        "supplier return recorded"
    );
    Ok(movement)
}

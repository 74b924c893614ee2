use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::validation::not_blank;
use pharmastock_core::{Actor, DomainError, DomainResult, MedicationId};
use pharmastock_inventory::{InventoryMovement, InventoryStore, MovementKind, MovementType};
use pharmastock_sales::{InvoiceLookup, InvoiceNumber};

/// Customer return policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnPolicy {
    return_window_days: i64,
}

impl Default for ReturnPolicy {
    fn default() -> Self {
        Self {
            return_window_days: 7,
        }
    }
}

impl ReturnPolicy {
    pub fn with_return_window_days(mut self, days: i64) -> Self {
        self.return_window_days = days;
        self
    }

    pub fn return_window_days(&self) -> i64 {
        self.return_window_days
    }
}

/// Customer return form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerReturn {
    pub medication_id: MedicationId,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(custom(function = "not_blank"))]
    pub invoice_number: String,
    /// The operator certifies the product is sealed and resellable.
    pub sealed: bool,
    #[validate(length(max = 500), custom(function = "not_blank"))]
    pub reason: String,
}

/// Accept a customer return: one `entrada` restoring the quantity to stock.
///
/// All policy predicates are checked before the recorder is called:
/// - the invoice exists and sold at least this quantity of the medication
///   (counting earlier returns against the same invoice);
/// - the purchase is within the return window;
/// - the product is sealed;
/// - the medication is not a controlled substance.
pub fn accept_customer_return(
    store: &mut InventoryStore,
    invoices: &impl InvoiceLookup,
    policy: &ReturnPolicy,
    form: &CustomerReturn,
    actor: &Actor,
) -> DomainResult<InventoryMovement> {
    if let Err(err) = check(store, invoices, policy, form) {
        tracing::warn!(
            medication_id = %form.medication_id,
            invoice = %form.invoice_number,
            error = %err,
            "customer return rejected"
        );
        return Err(err);
    }

    let number = InvoiceNumber::parse(&form.invoice_number)
        .ok_or_else(|| DomainError::validation("invalid invoice number"))?;
    let reason = format!("Devolución de cliente (factura {number}): {}", form.reason.trim());
    let movement = store.record_referenced_movement(
        MovementType::Entrada,
        &form.medication_id,
        form.quantity,
        &reason,
        number.as_str(),
        actor,
    )?;
    tracing::info!(
        medication_id = %form.medication_id,
        invoice = %number,
        quantity = form.quantity,
        "customer return accepted"
    );
    Ok(movement)
}

fn check(
    store: &InventoryStore,
    invoices: &impl InvoiceLookup,
    policy: &ReturnPolicy,
    form: &CustomerReturn,
) -> DomainResult<()> {
    if form.quantity <= 0 {
        return Err(DomainError::InvalidQuantity(form.quantity));
    }
    form.validate()?;
    if !form.sealed {
        return Err(DomainError::validation("only sealed, resellable product can be returned"));
    }

    let medication = store
        .get(&form.medication_id)
        .ok_or_else(|| DomainError::medication_not_found(form.medication_id))?;
    if medication.is_controlled() {
        return Err(DomainError::validation("controlled substances cannot be returned"));
    }

    let number = InvoiceNumber::parse(&form.invoice_number)
        .ok_or_else(|| DomainError::validation(format!("invalid invoice number: {}", form.invoice_number)))?;
    let invoice = invoices
        .find_invoice(&number)
        .ok_or_else(|| DomainError::validation(format!("invoice {number} does not exist")))?;

    let age = store.today() - invoice.issued_at.date_naive();
    if age > Duration::days(policy.return_window_days) {
        return Err(DomainError::validation(format!(
            "invoice {number} is older than {} days",
            policy.return_window_days
        )));
    }

    let sold = invoice.quantity_of(&form.medication_id);
    let already_returned: i64 = store
        .movements_for(&form.medication_id)
        .filter(|m| m.kind == MovementKind::Entrada && m.reference.as_deref() == Some(number.as_str()))
        .map(|m| m.quantity)
        .sum();
    if form.quantity > sold - already_returned {
        return Err(DomainError::validation(format!(
            "invoice {number} has {} returnable unit(s) of this medication",
            (sold - already_returned).max(0)
        )));
    }
    Ok(())
}

use serde::{Deserialize, Serialize};

use pharmastock_core::{Actor, ClientId, DomainError, DomainResult, MedicationId};
use pharmastock_inventory::{InventoryStore, MovementType};

use crate::invoice::{Invoice, InvoiceLine, InvoiceLookup, InvoiceNumber};

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub medication_id: MedicationId,
    pub quantity: i64,
}

/// Sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
    pub lines: Vec<SaleLine>,
}

/// Issued invoices plus the invoice sequence.
#[derive(Debug, Clone)]
pub struct SalesLedger {
    invoices: Vec<Invoice>,
    next_seq: u64,
}

impl Default for SalesLedger {
    fn default() -> Self {
        Self {
            invoices: Vec::new(),
            next_seq: 1,
        }
    }
}

impl SalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted invoices; numbering continues after the highest one.
    pub fn from_invoices(invoices: Vec<Invoice>) -> Self {
        let next_seq = invoices
            .iter()
            .filter_map(|i| i.number.seq())
            .max()
            .map_or(1, |max| max + 1);
        Self { invoices, next_seq }
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Register a sale: every line is checked against live stock first, then
    /// one `salida` per line is recorded and the invoice is issued.
    ///
    /// If any line fails validation no stock moves and no invoice is issued.
    pub fn register_sale(
        &mut self,
        store: &mut InventoryStore,
        sale: NewSale,
        actor: &Actor,
    ) -> DomainResult<&Invoice> {
        if sale.lines.is_empty() {
            return Err(DomainError::validation("a sale needs at least one line"));
        }

        // Price every line and total requested units per medication, in
        // first-seen order, before anything moves.
        let mut priced: Vec<(u64, &SaleLine)> = Vec::with_capacity(sale.lines.len());
        let mut requested: Vec<(MedicationId, i64)> = Vec::new();
        let mut total_cents: u64 = 0;
        for line in &sale.lines {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidQuantity(line.quantity));
            }
            let unit_price_cents = store
                .get(&line.medication_id)
                .ok_or_else(|| DomainError::medication_not_found(line.medication_id))?
                .unit_price_cents();
            let line_total = unit_price_cents
                .checked_mul(line.quantity.unsigned_abs())
                .ok_or_else(|| DomainError::validation("sale line amount overflow"))?;
            total_cents = total_cents
                .checked_add(line_total)
                .ok_or_else(|| DomainError::validation("sale total overflow"))?;
            match requested.iter_mut().find(|(id, _)| *id == line.medication_id) {
                Some((_, units)) => {
                    *units = units
                        .checked_add(line.quantity)
                        .ok_or_else(|| DomainError::validation("sale quantity overflow"))?;
                }
                None => requested.push((line.medication_id, line.quantity)),
            }
            priced.push((unit_price_cents, line));
        }
        for (id, units) in &requested {
            let available = store.available(id)?;
            if *units > available {
                tracing::warn!(medication_id = %id, available, requested = *units, "sale rejected");
                return Err(DomainError::InsufficientStock {
                    available,
                    requested: *units,
                });
            }
        }

        let number = InvoiceNumber::sequential(self.next_seq);
        let reason = format!("Venta {number}");
        let mut lines = Vec::with_capacity(priced.len());

        for (line_no, (unit_price_cents, line)) in priced.into_iter().enumerate() {
            let movement = store.record_referenced_movement(
                MovementType::Salida,
                &line.medication_id,
                line.quantity,
                &reason,
                number.as_str(),
                actor,
            )?;
            lines.push(InvoiceLine {
                line_no: line_no as u32 + 1,
                medication_id: line.medication_id,
                medication_name: movement.medication_name,
                quantity: line.quantity,
                unit_price_cents,
            });
        }

        let invoice = Invoice {
            number,
            issued_at: store.now(),
            client_id: sale.client_id,
            client_name: sale.client_name,
            issued_by: actor.user_id,
            lines,
        };
        tracing::info!(
            invoice = %invoice.number,
            lines = invoice.lines.len(),
            total_cents,
            "sale registered"
        );

        self.next_seq += 1;
        self.invoices.push(invoice);
        let last = self.invoices.len() - 1;
        Ok(&self.invoices[last])
    }
}

impl InvoiceLookup for SalesLedger {
    fn find_invoice(&self, number: &InvoiceNumber) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.number == *number)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmastock_core::{ClientId, MedicationId, UserId};

/// Invoice number, e.g. `FAC-000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    const PREFIX: &'static str = "FAC-";

    pub fn sequential(seq: u64) -> Self {
        Self(format!("{}{:06}", Self::PREFIX, seq))
    }

    /// Parse a user-typed number (case and surrounding whitespace are ignored).
    pub fn parse(input: &str) -> Option<Self> {
        let upper = input.trim().to_uppercase();
        let digits = upper.strip_prefix(Self::PREFIX)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(upper))
    }

    /// Sequence component of the number.
    pub fn seq(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invoice line: medication, quantity, unit price at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub medication_id: MedicationId,
    pub medication_name: String,
    pub quantity: i64,
    /// Price in smallest currency unit (cents).
    pub unit_price_cents: u64,
}

impl InvoiceLine {
    /// `None` when the amount does not fit in a `u64`.
    pub fn checked_subtotal_cents(&self) -> Option<u64> {
        let quantity = u64::try_from(self.quantity).ok()?;
        self.unit_price_cents.checked_mul(quantity)
    }

    pub fn subtotal_cents(&self) -> u64 {
        self.checked_subtotal_cents().unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub number: InvoiceNumber,
    pub issued_at: DateTime<Utc>,
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
    pub issued_by: UserId,
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// Sum of line subtotals, saturating at `u64::MAX`.
    ///
    /// Sales are rejected before issue when their total overflows, so only a
    /// hand-edited snapshot can reach the ceiling.
    pub fn total_cents(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |total, line| total.saturating_add(line.subtotal_cents()))
    }

    /// Total quantity of a medication sold on this invoice.
    pub fn quantity_of(&self, medication_id: &MedicationId) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.medication_id == *medication_id)
            .map(|l| l.quantity)
            .sum()
    }
}

/// Read access to issued invoices (used by the customer-return flow).
pub trait InvoiceLookup {
    fn find_invoice(&self, number: &InvoiceNumber) -> Option<&Invoice>;
}

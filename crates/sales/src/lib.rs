//! Sales: invoices issued over the inventory ledger.
//!
//! A sale is validated as a whole before any stock moves, then recorded as
//! one `salida` per invoice line.

pub mod invoice;
pub mod ledger;

pub use invoice::{Invoice, InvoiceLine, InvoiceLookup, InvoiceNumber};
pub use ledger::{NewSale, SaleLine, SalesLedger};

//! Returns Processor.
//!
//! Every flow validates its whole request up front and then translates into
//! Movement Recorder calls on the [`InventoryStore`](pharmastock_inventory::InventoryStore):
//! supplier returns and the expired sweep issue `salida`s, customer returns
//! issue an `entrada`.

pub mod customer;
pub mod supplier;
pub mod sweep;

pub use customer::{CustomerReturn, ReturnPolicy, accept_customer_return};
pub use supplier::{SupplierReturn, SupplierReturnType, return_to_supplier};
pub use sweep::{SWEEP_REASON, SweepItem, SweepOutcome, SweepReport, sweep_expired};

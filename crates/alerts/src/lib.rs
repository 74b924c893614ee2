//! Alert derivation and the alert book.
//!
//! Alerts are derived from current medication state by a pure function
//! ([`derive_alerts`]); the [`AlertBook`] turns those candidates into alert
//! instances without duplicating an open alert for the same condition.

pub mod alert;
pub mod book;
pub mod deriver;

pub use alert::{Alert, AlertCandidate, AlertKey, AlertKind, Severity};
pub use book::AlertBook;
pub use deriver::{AlertPolicy, derive_alerts};

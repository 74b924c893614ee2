//! Application root: one [`Pharmacy`] owns every store, the notification bus
//! and the snapshot persister.

pub mod notification;
pub mod pharmacy;

pub use notification::{DirectoryChange, PharmacyNotification};
pub use pharmacy::{OpenError, Pharmacy};

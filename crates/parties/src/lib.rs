//! Parties directories (suppliers and clients).
//!
//! Both entities are plain records held in a
//! [`Directory`](pharmastock_core::Directory); this crate defines their
//! validation schemas and uniqueness keys.

pub mod client;
pub mod contact;
pub mod supplier;

pub use client::{Client, ClientPatch, NewClient};
pub use contact::ContactInfo;
pub use supplier::{NewSupplier, Supplier, SupplierPatch};

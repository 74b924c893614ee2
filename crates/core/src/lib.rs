//! Shared vocabulary of the pharmacy domain: typed ids, the error type, the
//! clock, acting user, directories and the aggregate traits. No IO here.

pub mod actor;
pub mod aggregate;
pub mod clock;
pub mod directory;
pub mod entity;
pub mod error;
pub mod id;
pub mod text;
pub mod validation;

pub use actor::Actor;
pub use aggregate::{Aggregate, AggregateRoot};
pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::{Directory, DirectoryEntry, UniqueKey};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AlertId, ClientId, MedicationId, MovementId, SupplierId, UserId};

//! `pharmastock-auth`: pharmacy staff accounts.
//!
//! Token issuance and session handling live outside this workspace; this
//! crate only owns the user directory entry and its roles.

pub mod roles;
pub mod user;

pub use roles::Role;
pub use user::{NewUser, User, UserPatch};

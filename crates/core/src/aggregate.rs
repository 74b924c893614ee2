//! Ledger-backed aggregates.
//!
//! An aggregate splits every state change into a decision step and an
//! evolution step. Only the decision step can fail.

/// Something with a stable identity and a count of ledger entries applied.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// How many ledger entries have been folded into this value.
    fn version(&self) -> u64;
}

/// Decide-then-apply state machine.
///
/// `handle` reads the current state and answers with the entries a command
/// produces (or an error). `apply` folds one entry into the state and cannot
/// fail, so a rejected command never leaves partial changes behind.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}

use chrono::{DateTime, Utc};

/// A fact worth telling listeners about.
///
/// Implementors are plain values: cloned per subscriber and never mutated
/// after they are published.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `inventory.movement.recorded`.
    fn event_type(&self) -> &'static str;

    /// Payload shape revision; bump when fields change meaning.
    fn version(&self) -> u32;

    /// Business time of the fact, not the time it was delivered.
    fn occurred_at(&self) -> DateTime<Utc>;
}

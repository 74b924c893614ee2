//! Keyed in-memory collections with uniqueness constraints.
//!
//! Suppliers, clients and users all share the same rules: an entry is
//! validated against its schema, must not collide with another entry on any of
//! its normalized unique keys, and a rejected operation leaves the collection
//! untouched.

use validator::Validate;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// One normalized uniqueness key of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    fn collides_with(&self, other: &UniqueKey) -> bool {
        !self.value.is_empty() && self.field == other.field && self.value == other.value
    }
}

/// An entity that can live in a [`Directory`].
pub trait DirectoryEntry: Entity + Clone + Validate {
    /// Entity label used in errors and logs ("client", "supplier", "user").
    const KIND: &'static str;

    /// Normalized keys that must be unique across the directory.
    ///
    /// Two entries conflict when they share a key with the same `field` and a
    /// non-empty, equal `value`.
    fn unique_keys(&self) -> Vec<UniqueKey>;
}

/// Ordered keyed collection (insertion order is preserved for listing).
#[derive(Debug, Clone)]
pub struct Directory<T> {
    entries: Vec<T>,
}

impl<T> Default for Directory<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: DirectoryEntry> Directory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries (trusted; no re-validation).
    pub fn from_entries(entries: Vec<T>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Find the entry owning a normalized key, if any.
    pub fn find_by_key(&self, key: &UniqueKey) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.unique_keys().iter().any(|k| k.collides_with(key)))
    }

    /// Insert a new entry.
    ///
    /// Fails with `ValidationFailed` on schema violations and `DuplicateEntity`
    /// when any unique key is already taken. Nothing is mutated on failure.
    pub fn add(&mut self, entry: T) -> DomainResult<&T> {
        entry.validate()?;

        if self.get(entry.id()).is_some() {
            return Err(DomainError::duplicate(format!(
                "{} with id {} already exists",
                T::KIND,
                entry.id()
            )));
        }

        self.ensure_unique(&entry.unique_keys(), None)?;

        tracing::debug!(kind = T::KIND, id = %entry.id(), "directory entry added");
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Apply a change to an existing entry.
    ///
    /// Uniqueness is re-checked only for keys whose value the change modifies,
    /// and never against the entry itself.
    pub fn update(&mut self, id: &T::Id, change: impl FnOnce(&mut T)) -> DomainResult<&T> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(DomainError::not_found)?;

        let current = &self.entries[index];
        let before = current.unique_keys();
        let mut candidate = current.clone();
        change(&mut candidate);
        candidate.validate()?;

        let changed: Vec<UniqueKey> = candidate
            .unique_keys()
            .into_iter()
            .filter(|k| !before.contains(k))
            .collect();
        self.ensure_unique(&changed, Some(id))?;

        tracing::debug!(kind = T::KIND, id = %id, "directory entry updated");
        self.entries[index] = candidate;
        Ok(&self.entries[index])
    }

    /// Remove an entry. Ledger records keep their denormalized names, so no
    /// reference check is performed.
    pub fn remove(&mut self, id: &T::Id) -> DomainResult<T> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(DomainError::not_found)?;
        tracing::debug!(kind = T::KIND, id = %id, "directory entry removed");
        Ok(self.entries.remove(index))
    }

    fn ensure_unique(&self, keys: &[UniqueKey], exclude: Option<&T::Id>) -> DomainResult<()> {
        for existing in self.entries.iter().filter(|e| Some(e.id()) != exclude) {
            for theirs in existing.unique_keys() {
                if let Some(ours) = keys.iter().find(|k| k.collides_with(&theirs)) {
                    return Err(DomainError::duplicate(format!(
                        "{} with the same {} already exists",
                        T::KIND,
                        ours.field
                    )));
                }
            }
        }
        Ok(())
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use pharmastock_core::{AlertId, DomainError, DomainResult};

use crate::alert::{Alert, AlertCandidate, AlertKey, Severity};

/// Alert instances: the open ones plus the resolved history.
///
/// Dedup rules, per condition key:
/// - while an unresolved instance exists, no new instance is raised (the open
///   instance's message and severity follow the latest derivation);
/// - once resolved, the condition stays dismissed until it either clears (a
///   refresh no longer derives it) or escalates to a higher severity.
#[derive(Debug, Clone, Default)]
pub struct AlertBook {
    alerts: Vec<Alert>,
    dismissed: HashMap<AlertKey, Severity>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted history.
    ///
    /// A key whose most recent instance is resolved starts out dismissed.
    pub fn from_history(alerts: Vec<Alert>) -> Self {
        let mut latest: HashMap<AlertKey, &Alert> = HashMap::new();
        for alert in &alerts {
            latest.insert(alert.key(), alert);
        }
        let dismissed = latest
            .into_iter()
            .filter(|(_, a)| a.resolved && a.kind.is_derived())
            .map(|(k, a)| (k, a.severity))
            .collect();
        Self { alerts, dismissed }
    }

    /// Every instance ever raised, oldest first.
    pub fn history(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    pub fn get(&self, id: &AlertId) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == *id)
    }

    /// Merge a fresh derivation into the book. Returns newly raised instances.
    ///
    /// Calling this twice with the same candidates raises nothing the second time.
    pub fn refresh(&mut self, candidates: Vec<AlertCandidate>, now: DateTime<Utc>) -> Vec<Alert> {
        let derived: Vec<AlertKey> = candidates.iter().map(AlertCandidate::key).collect();

        // Conditions that no longer hold are no longer dismissed.
        self.dismissed.retain(|key, _| derived.contains(key));

        let mut raised = Vec::new();
        for candidate in candidates {
            let key = candidate.key();

            if let Some(open) = self.alerts.iter_mut().find(|a| !a.resolved && a.key() == key) {
                open.message = candidate.message;
                open.severity = candidate.severity;
                continue;
            }

            if let Some(severity) = self.dismissed.get(&key) {
                if candidate.severity <= *severity {
                    continue;
                }
                self.dismissed.remove(&key);
            }

            let alert = Alert::from_candidate(candidate, now);
            tracing::info!(
                alert_id = %alert.id,
                kind = ?alert.kind,
                severity = ?alert.severity,
                "alert raised"
            );
            self.alerts.push(alert.clone());
            raised.push(alert);
        }

        raised
    }

    /// Raise a manual alert (sales trend, technical task).
    ///
    /// Returns `None` when an unresolved instance already covers the same condition.
    pub fn raise(&mut self, candidate: AlertCandidate, now: DateTime<Utc>) -> Option<Alert> {
        let key = candidate.key();
        if self.alerts.iter().any(|a| !a.resolved && a.key() == key) {
            return None;
        }
        let alert = Alert::from_candidate(candidate, now);
        tracing::info!(alert_id = %alert.id, kind = ?alert.kind, "alert raised manually");
        self.alerts.push(alert.clone());
        Some(alert)
    }

    /// Resolve one instance. Resolving an already resolved instance is a no-op.
    pub fn resolve(&mut self, id: &AlertId, now: DateTime<Utc>) -> DomainResult<&Alert> {
        let index = self
            .alerts
            .iter()
            .position(|a| a.id == *id)
            .ok_or_else(DomainError::not_found)?;

        if !self.alerts[index].resolved {
            self.mark_resolved(index, now);
            tracing::info!(alert_id = %id, "alert resolved");
        }
        Ok(&self.alerts[index])
    }

    /// Resolve every open instance. Returns how many were resolved.
    pub fn resolve_all(&mut self, now: DateTime<Utc>) -> usize {
        let open: Vec<usize> = self
            .alerts
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.resolved)
            .map(|(i, _)| i)
            .collect();
        for &index in &open {
            self.mark_resolved(index, now);
        }
        tracing::info!(count = open.len(), "all alerts resolved");
        open.len()
    }

    fn mark_resolved(&mut self, index: usize, now: DateTime<Utc>) {
        let alert = &mut self.alerts[index];
        alert.resolved = true;
        alert.resolved_at = Some(now);
        if alert.kind.is_derived() {
            self.dismissed.insert(alert.key(), alert.severity);
        }
    }
}

use serde::Serialize;

use pharmastock_core::{Actor, DomainError, DomainResult, MedicationId};
use pharmastock_inventory::{InventoryMovement, InventoryStore, MovementType};

/// Reason written on every movement issued by the sweep.
pub const SWEEP_REASON: &str = "Devolución automática: Producto vencido";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Returned { movement: InventoryMovement },
    Failed { kind: &'static str, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepItem {
    pub medication_id: MedicationId,
    pub medication_name: String,
    pub quantity: i64,
    pub outcome: SweepOutcome,
}

/// Per-item result of an expired-stock sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub items: Vec<SweepItem>,
    /// Expired medications left alone because they had no stock.
    pub skipped: usize,
}

impl SweepReport {
    pub fn returned(&self) -> impl Iterator<Item = &SweepItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, SweepOutcome::Returned { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &SweepItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, SweepOutcome::Failed { .. }))
    }

    pub fn returned_units(&self) -> i64 {
        self.returned().map(|i| i.quantity).sum()
    }
}

/// Return every expired batch with stock to its supplier.
///
/// Each medication is handled independently: a failure is recorded in the
/// report and the sweep moves on.
pub fn sweep_expired(store: &mut InventoryStore, actor: &Actor) -> SweepReport {
    sweep_with(store, |store, medication_id, quantity| {
        store.record_movement(MovementType::Salida, medication_id, quantity, SWEEP_REASON, actor)
    })
}

fn sweep_with<F>(store: &mut InventoryStore, mut issue: F) -> SweepReport
where
    F: FnMut(&mut InventoryStore, &MedicationId, i64) -> DomainResult<InventoryMovement>,
{
    let today = store.today();
    let mut report = SweepReport::default();

    let expired: Vec<(MedicationId, String, i64)> = store
        .medications()
        .iter()
        .filter(|m| m.is_expired(today))
        .map(|m| (m.id_typed(), m.name().to_string(), m.quantity()))
        .collect();

    for (medication_id, medication_name, quantity) in expired {
        if quantity <= 0 {
            report.skipped += 1;
            continue;
        }
        let outcome = match issue(store, &medication_id, quantity) {
            Ok(movement) => SweepOutcome::Returned { movement },
            Err(err) => failed(&medication_id, err),
        };
        report.items.push(SweepItem {
            medication_id,
            medication_name,
            quantity,
            outcome,
        });
    }

    tracing::info!(
        returned = report.returned().count(),
        failed = report.failed().count(),
        skipped = report.skipped,
        units = report.returned_units(),
        "expired sweep finished"
    );
    report
}

fn failed(medication_id: &MedicationId, err: DomainError) -> SweepOutcome {
    tracing::warn!(medication_id = %medication_id, error = %err, "expired sweep item failed");
    SweepOutcome::Failed {
        kind: err.kind(),
        error: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pharmastock_core::{FixedClock, UserId};
    use pharmastock_inventory::{MovementKind, NewMedication};
    use std::sync::Arc;

    fn store() -> InventoryStore {
        InventoryStore::new(Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap(),
        )))
    }

    fn register(store: &mut InventoryStore, name: &str, quantity: i64, expiry: NaiveDate) -> MedicationId {
        store
            .register_medication(NewMedication {
                name: name.to_string(),
                batch: format!("{name}-L1"),
                expiry_date: expiry,
                quantity,
                min_stock: 5,
                supplier_id: None,
                category: "General".to_string(),
                unit_price_cents: 100,
                active_ingredient: None,
                location: None,
                image_url: None,
                controlled: false,
            })
            .unwrap()
            .id_typed()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expired_batches_are_drained() {
        let mut store = store();
        let a = register(&mut store, "Loratadina", 20, date(2025, 4, 1));
        let b = register(&mut store, "Omeprazol", 15, date(2025, 5, 9));
        let fresh = register(&mut store, "Metformina", 40, date(2026, 5, 9));

        let report = sweep_expired(&mut store, &Actor::new(UserId::new(), "Ana Torres"));

        assert_eq!(report.returned().count(), 2);
        assert_eq!(report.returned_units(), 35);
        assert_eq!(store.available(&a).unwrap(), 0);
        assert_eq!(store.available(&b).unwrap(), 0);
        assert_eq!(store.available(&fresh).unwrap(), 40);
        assert_eq!(store.movements().len(), 2);
        assert!(store
            .movements()
            .iter()
            .all(|m| m.kind == MovementKind::Salida && m.reason == SWEEP_REASON));
    }

    #[test]
    fn expiring_today_is_not_expired() {
        let mut store = store();
        register(&mut store, "Loratadina", 20, date(2025, 5, 10));

        let report = sweep_expired(&mut store, &Actor::system());
        assert!(report.items.is_empty());
        assert!(store.movements().is_empty());
    }

    #[test]
    fn zero_stock_is_skipped() {
        let mut store = store();
        register(&mut store, "Loratadina", 0, date(2025, 1, 1));

        let report = sweep_expired(&mut store, &Actor::system());
        assert_eq!(report.skipped, 1);
        assert!(report.items.is_empty());
    }

    #[test]
    fn one_failing_item_does_not_stop_the_rest() {
        let mut store = store();
        let a = register(&mut store, "Loratadina", 20, date(2025, 4, 1));
        let broken = register(&mut store, "Omeprazol", 15, date(2025, 4, 2));
        let c = register(&mut store, "Cetirizina", 8, date(2025, 4, 3));
        let actor = Actor::system();

        let report = sweep_with(&mut store, |store, id, quantity| {
            if *id == broken {
                return Err(DomainError::validation("supplier rejected the batch"));
            }
            store.record_movement(MovementType::Salida, id, quantity, SWEEP_REASON, &actor)
        });

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.returned().count(), 2);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].medication_id, broken);
        assert_eq!(
            failed[0].outcome,
            SweepOutcome::Failed {
                kind: "validation_failed",
                error: "validation failed: supplier rejected the batch".to_string(),
            }
        );
        assert_eq!(report.returned_units(), 28);
        assert_eq!(store.available(&a).unwrap(), 0);
        assert_eq!(store.available(&broken).unwrap(), 15);
        assert_eq!(store.available(&c).unwrap(), 0);
        assert_eq!(store.movements().len(), 2);
    }

    #[test]
    fn second_sweep_is_a_no_op() {
        let mut store = store();
        register(&mut store, "Loratadina", 20, date(2025, 1, 1));

        sweep_expired(&mut store, &Actor::system());
        let again = sweep_expired(&mut store, &Actor::system());
        assert_eq!(again.returned().count(), 0);
        assert_eq!(again.skipped, 1);
        assert_eq!(store.movements().len(), 1);
    }
}

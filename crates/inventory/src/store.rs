//! Inventory Store: sole owner of medications and the movement ledger.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

use pharmastock_core::text::normalize_name;
use pharmastock_core::{Actor, Clock, DomainError, DomainResult, MedicationId, MovementId};
use pharmastock_events::execute;

use crate::medication::{Medication, MedicationCommand, MedicationDetails, NewMedication, RecordMovement};
use crate::movement::{InventoryMovement, MovementType};

/// A medication whose ledger does not add up to its current stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationMismatch {
    pub medication_id: MedicationId,
    pub medication_name: String,
    /// `opening_quantity + Σ signed deltas`.
    pub expected: i64,
    pub actual: i64,
}

/// In-memory inventory: medications plus the append-only movement ledger.
///
/// Every stock change goes through [`InventoryStore::record_movement`]; the
/// ledger is never edited or truncated.
pub struct InventoryStore {
    medications: Vec<Medication>,
    movements: Vec<InventoryMovement>,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("medications", &self.medications.len())
            .field("movements", &self.movements.len())
            .finish()
    }
}

impl InventoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            medications: Vec::new(),
            movements: Vec::new(),
            clock,
        }
    }

    /// Rebuild from a persisted snapshot.
    ///
    /// Mismatches between ledger and stock are logged, not repaired: the
    /// snapshot is the source of truth and [`InventoryStore::reconcile`] lets
    /// callers surface them.
    pub fn from_snapshot(
        medications: Vec<Medication>,
        movements: Vec<InventoryMovement>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Self {
            medications,
            movements,
            clock,
        };
        for mismatch in store.reconcile() {
            tracing::warn!(
                medication_id = %mismatch.medication_id,
                expected = mismatch.expected,
                actual = mismatch.actual,
                "snapshot stock is negative or does not reconcile with its ledger"
            );
        }
        store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// The full ledger, in recording order.
    pub fn movements(&self) -> &[InventoryMovement] {
        &self.movements
    }

    pub fn get(&self, id: &MedicationId) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id_typed() == *id)
    }

    /// Live stock for a medication.
    pub fn available(&self, id: &MedicationId) -> DomainResult<i64> {
        self.get(id)
            .map(Medication::quantity)
            .ok_or_else(|| DomainError::medication_not_found(id))
    }

    pub fn movements_for<'a>(&'a self, id: &'a MedicationId) -> impl Iterator<Item = &'a InventoryMovement> + 'a {
        self.movements.iter().filter(move |m| m.medication_id == *id)
    }

    /// Intake of a new medication batch.
    ///
    /// The same name + batch code may only be registered once.
    pub fn register_medication(&mut self, intake: NewMedication) -> DomainResult<&Medication> {
        intake.validate()?;

        let name_key = normalize_name(&intake.name);
        let batch_key = intake.batch.trim().to_uppercase();
        if self
            .medications
            .iter()
            .any(|m| normalize_name(m.name()) == name_key && m.batch().to_uppercase() == batch_key)
        {
            return Err(DomainError::duplicate(format!(
                "medication {} batch {} already registered",
                intake.name.trim(),
                intake.batch.trim()
            )));
        }

        let medication = Medication::from_intake(MedicationId::new(), intake, self.clock.now());
        tracing::info!(
            medication_id = %medication.id_typed(),
            name = medication.name(),
            quantity = medication.quantity(),
            "medication registered"
        );
        self.medications.push(medication);
        let last = self.medications.len() - 1;
        Ok(&self.medications[last])
    }

    /// Update non-stock attributes of a medication.
    pub fn update_medication_details(
        &mut self,
        id: &MedicationId,
        details: MedicationDetails,
    ) -> DomainResult<&Medication> {
        details.validate()?;
        let now = self.clock.now();
        let index = self.index_of(id)?;
        let medication = &mut self.medications[index];
        medication.apply_details(details, now);
        tracing::info!(medication_id = %id, "medication details updated");
        Ok(&self.medications[index])
    }

    /// Movement Recorder.
    ///
    /// Validates and appends one ledger entry, updating the medication's stock
    /// by exactly the recorded delta. On error nothing is mutated.
    pub fn record_movement(
        &mut self,
        movement_type: MovementType,
        medication_id: &MedicationId,
        quantity: i64,
        reason: &str,
        actor: &Actor,
    ) -> DomainResult<InventoryMovement> {
        self.record(movement_type, medication_id, quantity, reason, None, actor)
    }

    /// Same as [`InventoryStore::record_movement`], tagging the entry with the
    /// document it belongs to (an invoice number).
    pub fn record_referenced_movement(
        &mut self,
        movement_type: MovementType,
        medication_id: &MedicationId,
        quantity: i64,
        reason: &str,
        reference: &str,
        actor: &Actor,
    ) -> DomainResult<InventoryMovement> {
        self.record(
            movement_type,
            medication_id,
            quantity,
            reason,
            Some(reference.to_string()),
            actor,
        )
    }

    fn record(
        &mut self,
        movement_type: MovementType,
        medication_id: &MedicationId,
        quantity: i64,
        reason: &str,
        reference: Option<String>,
        actor: &Actor,
    ) -> DomainResult<InventoryMovement> {
        let index = match self.index_of(medication_id) {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(medication_id = %medication_id, "movement rejected: unknown medication");
                return Err(err);
            }
        };

        let command = MedicationCommand::RecordMovement(RecordMovement {
            movement_id: MovementId::new(),
            medication_id: *medication_id,
            movement_type,
            quantity,
            reason: reason.to_string(),
            reference,
            actor: actor.clone(),
            occurred_at: self.clock.now(),
        });

        let medication = &mut self.medications[index];
        let recorded = match execute(medication, &command) {
            Ok(recorded) => recorded,
            Err(err) => {
                tracing::warn!(
                    medication_id = %medication_id,
                    kind = movement_type.kind().as_str(),
                    quantity,
                    error = %err,
                    "movement rejected"
                );
                return Err(err);
            }
        };

        let stock = medication.quantity();
        let mut recorded = recorded.into_iter();
        let movement = recorded
            .next()
            .ok_or_else(|| DomainError::validation("movement produced no ledger entry"))?;
        self.movements.push(movement.clone());
        self.movements.extend(recorded);

        tracing::info!(
            movement_id = %movement.id,
            medication_id = %medication_id,
            kind = movement.kind.as_str(),
            quantity = movement.quantity,
            reference = movement.reference.as_deref(),
            stock,
            "movement recorded"
        );
        Ok(movement)
    }

    /// Check the reconciliation invariant for every medication.
    ///
    /// Negative stock is reported even when the ledger adds up to it.
    pub fn reconcile(&self) -> Vec<ReconciliationMismatch> {
        self.medications
            .iter()
            .filter_map(|m| {
                let id = m.id_typed();
                let expected = m.opening_quantity()
                    + self.movements_for(&id).map(InventoryMovement::signed_delta).sum::<i64>();
                (expected != m.quantity() || m.quantity() < 0).then(|| ReconciliationMismatch {
                    medication_id: id,
                    medication_name: m.name().to_string(),
                    expected,
                    actual: m.quantity(),
                })
            })
            .collect()
    }

    fn index_of(&self, id: &MedicationId) -> DomainResult<usize> {
        self.medications
            .iter()
            .position(|m| m.id_typed() == *id)
            .ok_or_else(|| DomainError::medication_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{AdjustmentDirection, MovementKind};
    use chrono::TimeZone;
    use pharmastock_core::{FixedClock, UserId};
    use proptest::prelude::*;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()))
    }

    fn actor() -> Actor {
        Actor::new(UserId::new(), "Ana Torres")
    }

    fn intake(name: &str, quantity: i64, min_stock: i64) -> NewMedication {
        NewMedication {
            name: name.to_string(),
            batch: "L-001".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            quantity,
            min_stock,
            supplier_id: None,
            category: "General".to_string(),
            unit_price_cents: 100,
            active_ingredient: None,
            location: Some("Estante A".to_string()),
            image_url: None,
            controlled: false,
        }
    }

    fn store_with(name: &str, quantity: i64) -> (InventoryStore, MedicationId) {
        let mut store = InventoryStore::new(clock());
        let id = store.register_medication(intake(name, quantity, 50)).unwrap().id_typed();
        (store, id)
    }

    #[test]
    fn salida_reduces_stock_and_appends_entry() {
        let (mut store, id) = store_with("Paracetamol 500mg", 150);

        let mv = store
            .record_movement(MovementType::Salida, &id, 40, "Venta", &actor())
            .unwrap();

        assert_eq!(store.available(&id).unwrap(), 110);
        assert_eq!(store.movements().len(), 1);
        assert_eq!(store.movements()[0], mv);
        assert_eq!(mv.kind, MovementKind::Salida);
        assert_eq!(mv.occurred_at, Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap());
        assert_eq!(store.get(&id).unwrap().last_updated(), mv.occurred_at);
    }

    #[test]
    fn oversized_salida_is_rejected_without_side_effects() {
        let (mut store, id) = store_with("Paracetamol 500mg", 40);

        let err = store
            .record_movement(MovementType::Salida, &id, 1000, "Venta", &actor())
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 40,
                requested: 1000
            }
        );
        assert_eq!(store.available(&id).unwrap(), 40);
        assert!(store.movements().is_empty());
    }

    #[test]
    fn unknown_medication_is_reported() {
        let mut store = InventoryStore::new(clock());
        let missing = MedicationId::new();
        let err = store
            .record_movement(MovementType::Entrada, &missing, 1, "", &actor())
            .unwrap_err();
        assert_eq!(err, DomainError::MedicationNotFound(missing.to_string()));
    }

    #[test]
    fn duplicate_batch_registration_is_rejected() {
        let (mut store, _) = store_with("Amoxicilina 500mg", 10);
        let err = store
            .register_medication(intake("AMOXICILINA 500MG", 3, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEntity(_)));
        assert_eq!(store.medications().len(), 1);
    }

    #[test]
    fn invalid_intake_is_rejected() {
        let mut store = InventoryStore::new(clock());
        let err = store.register_medication(intake("   ", 3, 1)).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        let err = store.register_medication(intake("Loratadina", -1, 1)).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[test]
    fn details_update_keeps_ledger_reconciled() {
        let (mut store, id) = store_with("Loratadina 10mg", 30);
        store
            .update_medication_details(
                &id,
                MedicationDetails {
                    min_stock: Some(5),
                    ..MedicationDetails::default()
                },
            )
            .unwrap();
        assert_eq!(store.get(&id).unwrap().min_stock(), 5);
        assert!(store.reconcile().is_empty());
    }

    #[test]
    fn reconcile_reports_tampered_snapshot() {
        let (mut store, id) = store_with("Omeprazol 20mg", 20);
        store
            .record_movement(MovementType::Salida, &id, 5, "Venta", &actor())
            .unwrap();

        let mut movements = store.movements().to_vec();
        movements[0].quantity = 6;
        let restored = InventoryStore::from_snapshot(store.medications().to_vec(), movements, clock());

        let mismatches = restored.reconcile();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].expected, 14);
        assert_eq!(mismatches[0].actual, 15);
    }

    #[test]
    fn reconcile_reports_negative_stock_even_when_ledger_agrees() {
        let (store, id) = store_with("Omeprazol 20mg", 20);
        let mut value = serde_json::to_value(&store.medications()[0]).unwrap();
        value["quantity"] = serde_json::json!(-4);
        value["opening_quantity"] = serde_json::json!(-4);
        let tampered: Medication = serde_json::from_value(value).unwrap();

        let restored = InventoryStore::from_snapshot(vec![tampered], Vec::new(), clock());

        let mismatches = restored.reconcile();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].medication_id, id);
        assert_eq!(mismatches[0].expected, -4);
        assert_eq!(mismatches[0].actual, -4);
    }

    #[test]
    fn entrada_past_counter_range_leaves_store_untouched() {
        let (mut store, id) = store_with("Paracetamol 500mg", 10);

        let err = store
            .record_movement(MovementType::Entrada, &id, i64::MAX, "Compra", &actor())
            .unwrap_err();

        assert_eq!(err, DomainError::InvalidQuantity(i64::MAX));
        assert_eq!(store.available(&id).unwrap(), 10);
        assert!(store.movements().is_empty());
        assert!(store.reconcile().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Entrada(i64),
        Salida(i64),
        Ajuste(bool, i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..50).prop_map(Op::Entrada),
            (1i64..80).prop_map(Op::Salida),
            (any::<bool>(), 1i64..30).prop_map(|(up, q)| Op::Ajuste(up, q)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: stock equals opening + entradas - salidas ± ajustes, never
        /// drops below zero, and rejected movements leave no trace.
        #[test]
        fn conservation_and_non_negativity(
            opening in 0i64..100,
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let (mut store, id) = store_with("Ibuprofeno 400mg", opening);
            let who = actor();
            let mut expected = opening;

            for op in ops {
                let (movement_type, quantity) = match op {
                    Op::Entrada(q) => (MovementType::Entrada, q),
                    Op::Salida(q) => (MovementType::Salida, q),
                    Op::Ajuste(true, q) => (MovementType::Ajuste(AdjustmentDirection::Increase), q),
                    Op::Ajuste(false, q) => (MovementType::Ajuste(AdjustmentDirection::Decrease), q),
                };

                let ledger_before = store.movements().len();
                match store.record_movement(movement_type, &id, quantity, "prop", &who) {
                    Ok(_) => {
                        expected += movement_type.sign() * quantity;
                        prop_assert_eq!(store.movements().len(), ledger_before + 1);
                    }
                    Err(DomainError::InsufficientStock { available, requested }) => {
                        prop_assert_eq!(available, expected);
                        prop_assert!(requested > available);
                        prop_assert_eq!(store.movements().len(), ledger_before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
                }

                let stock = store.available(&id).unwrap();
                prop_assert_eq!(stock, expected);
                prop_assert!(stock >= 0);
            }

            prop_assert!(store.reconcile().is_empty());
        }

        /// Property: recorded entries never change once appended.
        #[test]
        fn ledger_prefix_is_immutable(quantities in prop::collection::vec(1i64..20, 1..20)) {
            let (mut store, id) = store_with("Cetirizina 10mg", 1_000);
            let who = actor();
            let mut snapshot: Vec<InventoryMovement> = Vec::new();

            for q in quantities {
                store.record_movement(MovementType::Salida, &id, q, "prop", &who).unwrap();
                prop_assert_eq!(&store.movements()[..snapshot.len()], &snapshot[..]);
                snapshot = store.movements().to_vec();
            }
        }
    }
}

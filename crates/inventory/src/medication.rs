use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::validation::not_blank;
use pharmastock_core::{
    Actor, Aggregate, AggregateRoot, DomainError, MedicationId, MovementId, SupplierId,
};

use crate::movement::{InventoryMovement, MovementType};

/// Aggregate root: one stock-keeping unit (a medication batch).
///
/// Stock only changes by applying [`InventoryMovement`]s, so
/// `opening_quantity + Σ signed deltas == quantity` holds for the whole life
/// of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    id: MedicationId,
    name: String,
    batch: String,
    expiry_date: NaiveDate,
    quantity: i64,
    opening_quantity: i64,
    min_stock: i64,
    supplier_id: Option<SupplierId>,
    category: String,
    unit_price_cents: u64,
    active_ingredient: Option<String>,
    location: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    controlled: bool,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Intake payload for a new medication batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewMedication {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 64), custom(function = "not_blank"))]
    pub batch: String,
    pub expiry_date: NaiveDate,
    #[validate(range(min = 0))]
    pub quantity: i64,
    #[validate(range(min = 0))]
    pub min_stock: i64,
    pub supplier_id: Option<SupplierId>,
    #[validate(custom(function = "not_blank"))]
    pub category: String,
    pub unit_price_cents: u64,
    pub active_ingredient: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub controlled: bool,
}

/// Partial update of non-stock attributes. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MedicationDetails {
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub min_stock: Option<i64>,
    pub supplier_id: Option<SupplierId>,
    #[validate(custom(function = "not_blank"))]
    pub category: Option<String>,
    pub unit_price_cents: Option<u64>,
    pub active_ingredient: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub controlled: Option<bool>,
}

impl Medication {
    /// Build a medication from a (validated) intake payload.
    pub fn from_intake(id: MedicationId, intake: NewMedication, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: intake.name.trim().to_string(),
            batch: intake.batch.trim().to_string(),
            expiry_date: intake.expiry_date,
            quantity: intake.quantity,
            opening_quantity: intake.quantity,
            min_stock: intake.min_stock,
            supplier_id: intake.supplier_id,
            category: intake.category.trim().to_string(),
            unit_price_cents: intake.unit_price_cents,
            active_ingredient: intake.active_ingredient,
            location: intake.location,
            image_url: intake.image_url,
            controlled: intake.controlled,
            last_updated: now,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> MedicationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn opening_quantity(&self) -> i64 {
        self.opening_quantity
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price_cents(&self) -> u64 {
        self.unit_price_cents
    }

    pub fn active_ingredient(&self) -> Option<&str> {
        self.active_ingredient.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    /// Whole days from `today` until expiry (negative once expired).
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Apply a details patch. Stock is never touched here.
    pub(crate) fn apply_details(&mut self, details: MedicationDetails, now: DateTime<Utc>) {
        if let Some(name) = details.name {
            self.name = name.trim().to_string();
        }
        if let Some(expiry_date) = details.expiry_date {
            self.expiry_date = expiry_date;
        }
        if let Some(min_stock) = details.min_stock {
            self.min_stock = min_stock;
        }
        if details.supplier_id.is_some() {
            self.supplier_id = details.supplier_id;
        }
        if let Some(category) = details.category {
            self.category = category.trim().to_string();
        }
        if let Some(price) = details.unit_price_cents {
            self.unit_price_cents = price;
        }
        if details.active_ingredient.is_some() {
            self.active_ingredient = details.active_ingredient;
        }
        if details.location.is_some() {
            self.location = details.location;
        }
        if details.image_url.is_some() {
            self.image_url = details.image_url;
        }
        if let Some(controlled) = details.controlled {
            self.controlled = controlled;
        }
        self.last_updated = now;
    }
}

impl AggregateRoot for Medication {
    type Id = MedicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordMovement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovement {
    pub movement_id: MovementId,
    pub medication_id: MedicationId,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedicationCommand {
    RecordMovement(RecordMovement),
}

impl Aggregate for Medication {
    type Command = MedicationCommand;
    type Event = InventoryMovement;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        self.quantity += event.signed_delta();
        self.last_updated = event.occurred_at;

        // +1 per applied ledger entry.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            MedicationCommand::RecordMovement(cmd) => self.handle_record(cmd),
        }
    }
}

impl Medication {
    fn handle_record(&self, cmd: &RecordMovement) -> Result<Vec<InventoryMovement>, DomainError> {
        if cmd.medication_id != self.id {
            return Err(DomainError::medication_not_found(cmd.medication_id));
        }

        if cmd.quantity <= 0 {
            return Err(DomainError::InvalidQuantity(cmd.quantity));
        }

        if cmd.movement_type.sign() < 0 && cmd.quantity > self.quantity {
            return Err(DomainError::InsufficientStock {
                available: self.quantity,
                requested: cmd.quantity,
            });
        }

        // Increases must still fit the stock counter.
        if self.quantity.checked_add(cmd.movement_type.sign() * cmd.quantity).is_none() {
            return Err(DomainError::InvalidQuantity(cmd.quantity));
        }

        Ok(vec![InventoryMovement {
            id: cmd.movement_id,
            medication_id: self.id,
            medication_name: self.name.clone(),
            kind: cmd.movement_type.kind(),
            direction: cmd.movement_type.direction(),
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            reason: cmd.reason.trim().to_string(),
            reference: cmd.reference.clone(),
            user_id: cmd.actor.user_id,
            user_name: cmd.actor.name.clone(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{AdjustmentDirection, MovementKind};
    use pharmastock_core::UserId;
    use pharmastock_events::execute;

    fn paracetamol(quantity: i64) -> Medication {
        Medication::from_intake(
            MedicationId::new(),
            NewMedication {
                name: "Paracetamol 500mg".to_string(),
                batch: "L-2024-01".to_string(),
                expiry_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
                quantity,
                min_stock: 50,
                supplier_id: None,
                category: "Analgésicos".to_string(),
                unit_price_cents: 25,
                active_ingredient: Some("Paracetamol".to_string()),
                location: None,
                image_url: None,
                controlled: false,
            },
            Utc::now(),
        )
    }

    fn record(med: &Medication, movement_type: MovementType, quantity: i64) -> MedicationCommand {
        MedicationCommand::RecordMovement(RecordMovement {
            movement_id: MovementId::new(),
            medication_id: med.id_typed(),
            movement_type,
            quantity,
            reason: " Venta ".to_string(),
            reference: None,
            actor: Actor::new(UserId::new(), "Ana"),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn salida_emits_one_movement_with_denormalized_name() {
        let med = paracetamol(150);
        let events = med.handle(&record(&med, MovementType::Salida, 40)).unwrap();
        assert_eq!(events.len(), 1);

        let mv = &events[0];
        assert_eq!(mv.kind, MovementKind::Salida);
        assert_eq!(mv.quantity, 40);
        assert_eq!(mv.medication_name, "Paracetamol 500mg");
        assert_eq!(mv.reason, "Venta");
        assert_eq!(mv.user_name, "Ana");
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let med = paracetamol(10);
        for q in [0, -3] {
            let err = med.handle(&record(&med, MovementType::Entrada, q)).unwrap_err();
            assert_eq!(err, DomainError::InvalidQuantity(q));
        }
    }

    #[test]
    fn decreases_cannot_exceed_stock() {
        let med = paracetamol(40);
        let err = med.handle(&record(&med, MovementType::Salida, 1000)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 40,
                requested: 1000
            }
        );

        let err = med
            .handle(&record(&med, MovementType::Ajuste(AdjustmentDirection::Decrease), 41))
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { .. }));
    }

    #[test]
    fn increase_past_counter_range_is_rejected() {
        let med = paracetamol(10);
        let err = med.handle(&record(&med, MovementType::Entrada, i64::MAX)).unwrap_err();
        assert_eq!(err, DomainError::InvalidQuantity(i64::MAX));

        let err = med
            .handle(&record(&med, MovementType::Ajuste(AdjustmentDirection::Increase), i64::MAX - 9))
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidQuantity(i64::MAX - 9));

        let mut med = paracetamol(10);
        let top_up = record(&med, MovementType::Entrada, i64::MAX - 10);
        execute(&mut med, &top_up).unwrap();
        assert_eq!(med.quantity(), i64::MAX);
    }

    #[test]
    fn salida_of_entire_stock_is_allowed() {
        let mut med = paracetamol(15);
        let cmd = record(&med, MovementType::Salida, 15);
        execute(&mut med, &cmd).unwrap();
        assert_eq!(med.quantity(), 0);
    }

    #[test]
    fn apply_tracks_quantity_and_version() {
        let mut med = paracetamol(150);
        let sale = record(&med, MovementType::Salida, 40);
        execute(&mut med, &sale).unwrap();
        let correction = record(&med, MovementType::Ajuste(AdjustmentDirection::Increase), 5);
        execute(&mut med, &correction).unwrap();
        assert_eq!(med.quantity(), 115);
        assert_eq!(med.version(), 2);
        assert_eq!(med.opening_quantity(), 150);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let med = paracetamol(20);
        let before = med.clone();
        let _ = med.handle(&record(&med, MovementType::Salida, 5)).unwrap();
        assert_eq!(med, before);
    }

    #[test]
    fn details_patch_never_touches_stock() {
        let mut med = paracetamol(20);
        med.apply_details(
            MedicationDetails {
                name: Some("Paracetamol 500 mg".to_string()),
                min_stock: Some(10),
                controlled: Some(true),
                ..MedicationDetails::default()
            },
            Utc::now(),
        );
        assert_eq!(med.quantity(), 20);
        assert_eq!(med.min_stock(), 10);
        assert!(med.is_controlled());
        assert_eq!(med.name(), "Paracetamol 500 mg");
    }

    #[test]
    fn expiry_helpers_use_calendar_days() {
        let med = paracetamol(1);
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(med.days_to_expiry(today), 30);
        assert!(!med.is_expired(today));
        assert!(med.is_expired(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
    }
}

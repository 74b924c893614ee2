use std::sync::Arc;

use thiserror::Error;

use pharmastock_alerts::{Alert, AlertBook, AlertCandidate, AlertPolicy, derive_alerts};
use pharmastock_auth::{NewUser, User, UserPatch};
use pharmastock_core::{
    Actor, AlertId, ClientId, Clock, Directory, DirectoryEntry, DomainError, DomainResult, MedicationId,
    SupplierId, UserId,
};
use pharmastock_events::{EventBus, InMemoryEventBus, Subscription, SubscriptionId};
use pharmastock_infra::{DebouncedPersister, PharmacyConfig, Snapshot, SnapshotError, SnapshotStore};
use pharmastock_inventory::{
    InventoryMovement, InventoryStore, Medication, MedicationDetails, MovementType, NewMedication,
    ReconciliationMismatch,
};
use pharmastock_parties::{Client, ClientPatch, NewClient, NewSupplier, Supplier, SupplierPatch};
use pharmastock_returns::{CustomerReturn, ReturnPolicy, SupplierReturn, SweepReport};
use pharmastock_sales::{Invoice, NewSale, SalesLedger};

use crate::notification::{DirectoryChange, PharmacyNotification};

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to load snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("failed to start snapshot persister: {0}")]
    Persister(#[from] std::io::Error),
}

/// The pharmacy engine.
///
/// Single writer: every mutation takes `&mut self`, publishes a
/// [`PharmacyNotification`] and schedules a snapshot write. Stock-changing
/// operations also refresh the alert book.
pub struct Pharmacy {
    clock: Arc<dyn Clock>,
    inventory: InventoryStore,
    alerts: AlertBook,
    alert_policy: AlertPolicy,
    return_policy: ReturnPolicy,
    suppliers: Directory<Supplier>,
    clients: Directory<Client>,
    users: Directory<User>,
    sales: SalesLedger,
    bus: Arc<InMemoryEventBus<PharmacyNotification>>,
    persister: Option<DebouncedPersister>,
    actor: Actor,
}

impl core::fmt::Debug for Pharmacy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pharmacy")
            .field("medications", &self.inventory.medications().len())
            .field("movements", &self.inventory.movements().len())
            .field("invoices", &self.sales.invoices().len())
            .field("actor", &self.actor)
            .field("persisting", &self.persister.is_some())
            .finish()
    }
}

impl Pharmacy {
    /// Empty pharmacy without persistence.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_snapshot(Snapshot::default(), clock)
    }

    /// Rebuild every collection from a snapshot (without persistence).
    pub fn from_snapshot(snapshot: Snapshot, clock: Arc<dyn Clock>) -> Self {
        Self {
            inventory: InventoryStore::from_snapshot(snapshot.medications, snapshot.movements, clock.clone()),
            alerts: AlertBook::from_history(snapshot.alerts),
            alert_policy: AlertPolicy::default(),
            return_policy: ReturnPolicy::default(),
            suppliers: Directory::from_entries(snapshot.suppliers),
            clients: Directory::from_entries(snapshot.clients),
            users: Directory::from_entries(snapshot.users),
            sales: SalesLedger::from_invoices(snapshot.invoices),
            bus: Arc::new(InMemoryEventBus::new()),
            persister: None,
            actor: Actor::system(),
            clock,
        }
    }

    /// Load the snapshot from `store` and persist every later change back to it.
    pub fn open(
        config: &PharmacyConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SnapshotStore>,
    ) -> Result<Self, OpenError> {
        let snapshot = store.load()?.unwrap_or_default();
        let persister = DebouncedPersister::spawn(store, config.persist_debounce)?;

        let pharmacy = Self::from_snapshot(snapshot, clock)
            .with_alert_policy(
                AlertPolicy::default()
                    .with_near_expiry_days(config.near_expiry_days)
                    .with_critical_expiry_days(config.critical_expiry_days),
            )
            .with_return_policy(ReturnPolicy::default().with_return_window_days(config.return_window_days))
            .with_persister(persister);

        tracing::info!(
            medications = pharmacy.inventory.medications().len(),
            movements = pharmacy.inventory.movements().len(),
            invoices = pharmacy.sales.invoices().len(),
            "pharmacy opened"
        );
        Ok(pharmacy)
    }

    pub fn with_alert_policy(mut self, policy: AlertPolicy) -> Self {
        self.alert_policy = policy;
        self
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.return_policy = policy;
        self
    }

    pub fn with_persister(mut self, persister: DebouncedPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Act as a registered, active user from now on.
    pub fn sign_in(&mut self, user_id: &UserId) -> DomainResult<&Actor> {
        let user = self.users.get(user_id).ok_or_else(DomainError::not_found)?;
        if !user.active {
            return Err(DomainError::validation(format!("user {} is inactive", user.name)));
        }
        self.actor = user.actor();
        tracing::info!(user_id = %user_id, "signed in");
        Ok(&self.actor)
    }

    /// Fall back to the system identity.
    pub fn sign_out(&mut self) {
        self.actor = Actor::system();
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    // ---------------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------------

    pub fn subscribe(&self) -> Subscription<PharmacyNotification> {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ---------------------------------------------------------------------
    // Inventory
    // ---------------------------------------------------------------------

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn register_medication(&mut self, intake: NewMedication) -> DomainResult<Medication> {
        let medication = self.inventory.register_medication(intake)?.clone();
        self.notify(PharmacyNotification::MedicationRegistered {
            medication_id: medication.id_typed(),
            name: medication.name().to_string(),
            at: self.clock.now(),
        });
        self.after_stock_change();
        Ok(medication)
    }

    pub fn update_medication(&mut self, id: &MedicationId, details: MedicationDetails) -> DomainResult<Medication> {
        let medication = self.inventory.update_medication_details(id, details)?.clone();
        self.notify(PharmacyNotification::MedicationUpdated {
            medication_id: *id,
            at: self.clock.now(),
        });
        // Expiry date and threshold feed the deriver.
        self.after_stock_change();
        Ok(medication)
    }

    /// Movement Recorder, attributed to the current actor.
    pub fn record_movement(
        &mut self,
        movement_type: MovementType,
        medication_id: &MedicationId,
        quantity: i64,
        reason: &str,
    ) -> DomainResult<InventoryMovement> {
        let movement = self
            .inventory
            .record_movement(movement_type, medication_id, quantity, reason, &self.actor)?;
        self.notify(PharmacyNotification::MovementRecorded(movement.clone()));
        self.after_stock_change();
        Ok(movement)
    }

    pub fn reconcile(&self) -> Vec<ReconciliationMismatch> {
        self.inventory.reconcile()
    }

    // ---------------------------------------------------------------------
    // Sales and returns
    // ---------------------------------------------------------------------

    pub fn invoices(&self) -> &[Invoice] {
        self.sales.invoices()
    }

    pub fn register_sale(&mut self, sale: NewSale) -> DomainResult<Invoice> {
        let before = self.inventory.movements().len();
        let invoice = self
            .sales
            .register_sale(&mut self.inventory, sale, &self.actor)?
            .clone();
        self.notify_movements_since(before);
        self.notify(PharmacyNotification::SaleRegistered {
            invoice: invoice.number.clone(),
            total_cents: invoice.total_cents(),
            at: invoice.issued_at,
        });
        self.after_stock_change();
        Ok(invoice)
    }

    pub fn return_to_supplier(&mut self, form: &SupplierReturn) -> DomainResult<InventoryMovement> {
        let movement = pharmastock_returns::return_to_supplier(&mut self.inventory, form, &self.actor)?;
        self.notify(PharmacyNotification::MovementRecorded(movement.clone()));
        self.after_stock_change();
        Ok(movement)
    }

    pub fn accept_customer_return(&mut self, form: &CustomerReturn) -> DomainResult<InventoryMovement> {
        let movement = pharmastock_returns::accept_customer_return(
            &mut self.inventory,
            &self.sales,
            &self.return_policy,
            form,
            &self.actor,
        )?;
        self.notify(PharmacyNotification::MovementRecorded(movement.clone()));
        self.after_stock_change();
        Ok(movement)
    }

    /// Return every expired batch with stock; see [`pharmastock_returns::sweep_expired`].
    pub fn sweep_expired(&mut self) -> SweepReport {
        let before = self.inventory.movements().len();
        let report = pharmastock_returns::sweep_expired(&mut self.inventory, &self.actor);
        self.notify_movements_since(before);
        self.notify(PharmacyNotification::SweepCompleted {
            returned: report.returned().count(),
            failed: report.failed().count(),
            skipped: report.skipped,
            at: self.clock.now(),
        });
        if !report.items.is_empty() {
            self.after_stock_change();
        }
        report
    }

    // ---------------------------------------------------------------------
    // Alerts
    // ---------------------------------------------------------------------

    /// Re-derive alerts from current stock. Returns the newly raised instances.
    pub fn refresh_alerts(&mut self) -> Vec<Alert> {
        let candidates = derive_alerts(self.inventory.medications(), self.clock.today(), &self.alert_policy);
        let raised = self.alerts.refresh(candidates, self.clock.now());
        for alert in &raised {
            self.notify(PharmacyNotification::AlertRaised(alert.clone()));
        }
        if !raised.is_empty() {
            self.persist();
        }
        raised
    }

    /// Raise a manual alert (sales trend, technical task).
    pub fn raise_alert(&mut self, candidate: AlertCandidate) -> Option<Alert> {
        let alert = self.alerts.raise(candidate, self.clock.now())?;
        self.notify(PharmacyNotification::AlertRaised(alert.clone()));
        self.persist();
        Some(alert)
    }

    pub fn unresolved_alerts(&self) -> Vec<&Alert> {
        self.alerts.unresolved().collect()
    }

    pub fn alert_history(&self) -> &[Alert] {
        self.alerts.history()
    }

    pub fn resolve_alert(&mut self, id: &AlertId) -> DomainResult<Alert> {
        let was_open = self.alerts.get(id).is_some_and(|a| !a.resolved);
        let alert = self.alerts.resolve(id, self.clock.now())?.clone();
        if was_open {
            self.notify(PharmacyNotification::AlertResolved {
                alert_id: *id,
                at: self.clock.now(),
            });
            self.persist();
        }
        Ok(alert)
    }

    pub fn resolve_all_alerts(&mut self) -> usize {
        let open: Vec<AlertId> = self.alerts.unresolved().map(|a| a.id).collect();
        let count = self.alerts.resolve_all(self.clock.now());
        for alert_id in open {
            self.notify(PharmacyNotification::AlertResolved {
                alert_id,
                at: self.clock.now(),
            });
        }
        if count > 0 {
            self.persist();
        }
        count
    }

    // ---------------------------------------------------------------------
    // Directories
    // ---------------------------------------------------------------------

    pub fn suppliers(&self) -> &Directory<Supplier> {
        &self.suppliers
    }

    pub fn clients(&self) -> &Directory<Client> {
        &self.clients
    }

    pub fn users(&self) -> &Directory<User> {
        &self.users
    }

    pub fn add_supplier(&mut self, data: NewSupplier) -> DomainResult<Supplier> {
        let supplier = self.suppliers.add(Supplier::register(data, self.clock.now()))?.clone();
        self.directory_changed(&supplier, DirectoryChange::Added);
        Ok(supplier)
    }

    pub fn update_supplier(&mut self, id: &SupplierId, patch: SupplierPatch) -> DomainResult<Supplier> {
        let supplier = self.suppliers.update(id, |s| s.apply(patch))?.clone();
        self.directory_changed(&supplier, DirectoryChange::Updated);
        Ok(supplier)
    }

    pub fn remove_supplier(&mut self, id: &SupplierId) -> DomainResult<Supplier> {
        let supplier = self.suppliers.remove(id)?;
        self.directory_changed(&supplier, DirectoryChange::Removed);
        Ok(supplier)
    }

    pub fn add_client(&mut self, data: NewClient) -> DomainResult<Client> {
        let client = self.clients.add(Client::register(data, self.clock.now()))?.clone();
        self.directory_changed(&client, DirectoryChange::Added);
        Ok(client)
    }

    pub fn update_client(&mut self, id: &ClientId, patch: ClientPatch) -> DomainResult<Client> {
        let client = self.clients.update(id, |c| c.apply(patch))?.clone();
        self.directory_changed(&client, DirectoryChange::Updated);
        Ok(client)
    }

    pub fn remove_client(&mut self, id: &ClientId) -> DomainResult<Client> {
        let client = self.clients.remove(id)?;
        self.directory_changed(&client, DirectoryChange::Removed);
        Ok(client)
    }

    pub fn add_user(&mut self, data: NewUser) -> DomainResult<User> {
        let user = self.users.add(User::register(data, self.clock.now()))?.clone();
        self.directory_changed(&user, DirectoryChange::Added);
        Ok(user)
    }

    pub fn update_user(&mut self, id: &UserId, patch: UserPatch) -> DomainResult<User> {
        let user = self.users.update(id, |u| u.apply(patch))?.clone();
        if self.actor.user_id == user.id {
            if user.active {
                self.actor = user.actor();
            } else {
                self.sign_out();
            }
        }
        self.directory_changed(&user, DirectoryChange::Updated);
        Ok(user)
    }

    pub fn remove_user(&mut self, id: &UserId) -> DomainResult<User> {
        let user = self.users.remove(id)?;
        if self.actor.user_id == user.id {
            self.sign_out();
        }
        self.directory_changed(&user, DirectoryChange::Removed);
        Ok(user)
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Current state as a snapshot document.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            medications: self.inventory.medications().to_vec(),
            movements: self.inventory.movements().to_vec(),
            suppliers: self.suppliers.list().to_vec(),
            clients: self.clients.list().to_vec(),
            users: self.users.list().to_vec(),
            alerts: self.alerts.history().to_vec(),
            invoices: self.sales.invoices().to_vec(),
            saved_at: Some(self.clock.now()),
        }
    }

    /// Block until the pending snapshot (if any) is written.
    pub fn flush(&self) {
        if let Some(persister) = &self.persister {
            persister.flush();
        }
    }

    /// Write pending state and stop the persister.
    pub fn shutdown(mut self) {
        if let Some(persister) = self.persister.take() {
            persister.shutdown();
        }
    }

    fn persist(&self) {
        if let Some(persister) = &self.persister {
            persister.schedule(self.snapshot());
        }
    }

    fn notify(&self, notification: PharmacyNotification) {
        if let Err(err) = self.bus.publish(notification) {
            tracing::warn!(error = %err, "notification dropped");
        }
    }

    fn notify_movements_since(&self, before: usize) {
        for movement in &self.inventory.movements()[before..] {
            self.notify(PharmacyNotification::MovementRecorded(movement.clone()));
        }
    }

    fn after_stock_change(&mut self) {
        let raised = self.refresh_alerts();
        // refresh_alerts already scheduled a write when it raised something.
        if raised.is_empty() {
            self.persist();
        }
    }

    fn directory_changed<T: DirectoryEntry>(&self, entry: &T, change: DirectoryChange) {
        self.notify(PharmacyNotification::DirectoryChanged {
            kind: T::KIND,
            change,
            id: entry.id().to_string(),
            at: self.clock.now(),
        });
        self.persist();
    }
}

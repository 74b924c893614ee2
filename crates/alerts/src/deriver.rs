use chrono::NaiveDate;

use pharmastock_inventory::Medication;

use crate::alert::{AlertCandidate, AlertKind, Severity};

/// Thresholds for expiry alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Batches expiring within this many days raise `near_expiry`.
    near_expiry_days: i64,
    /// At or below this many days `near_expiry` becomes high severity.
    critical_expiry_days: i64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            near_expiry_days: 30,
            critical_expiry_days: 7,
        }
    }
}

impl AlertPolicy {
    pub fn with_near_expiry_days(mut self, days: i64) -> Self {
        self.near_expiry_days = days;
        self
    }

    pub fn with_critical_expiry_days(mut self, days: i64) -> Self {
        self.critical_expiry_days = days;
        self
    }

    pub fn near_expiry_days(&self) -> i64 {
        self.near_expiry_days
    }

    pub fn critical_expiry_days(&self) -> i64 {
        self.critical_expiry_days
    }
}

/// Derive alert candidates from current medication state.
///
/// Pure and re-entrant. A medication may yield several candidates of
/// different kinds, emitted in rule order:
/// - `quantity <= min_stock` → low_stock (high when out of stock, else medium)
/// - expiry before `today` → expired (high)
/// - `0 <= days to expiry <= near_expiry_days` → near_expiry (high when
///   within `critical_expiry_days`, else medium)
pub fn derive_alerts(medications: &[Medication], today: NaiveDate, policy: &AlertPolicy) -> Vec<AlertCandidate> {
    let mut candidates = Vec::new();

    for med in medications {
        if med.is_low_stock() {
            let (severity, message) = if med.quantity() == 0 {
                (Severity::High, format!("Sin stock: {}", med.name()))
            } else {
                (
                    Severity::Medium,
                    format!(
                        "Stock bajo: {} ({} unidades, mínimo {})",
                        med.name(),
                        med.quantity(),
                        med.min_stock()
                    ),
                )
            };
            candidates.push(candidate(med, AlertKind::LowStock, severity, message));
        }

        let days = med.days_to_expiry(today);
        if days < 0 {
            candidates.push(candidate(
                med,
                AlertKind::Expired,
                Severity::High,
                format!(
                    "Producto vencido: {} (lote {}, venció el {})",
                    med.name(),
                    med.batch(),
                    med.expiry_date()
                ),
            ));
        } else if days <= policy.near_expiry_days {
            let severity = if days <= policy.critical_expiry_days {
                Severity::High
            } else {
                Severity::Medium
            };
            candidates.push(candidate(
                med,
                AlertKind::NearExpiry,
                severity,
                format!(
                    "Próximo a vencer: {} (lote {}) vence en {} días",
                    med.name(),
                    med.batch(),
                    days
                ),
            ));
        }
    }

    candidates
}

fn candidate(med: &Medication, kind: AlertKind, severity: Severity, message: String) -> AlertCandidate {
    AlertCandidate {
        kind,
        medication_id: Some(med.id_typed()),
        medication_name: Some(med.name().to_string()),
        message,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pharmastock_core::MedicationId;
    use pharmastock_inventory::NewMedication;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn med(quantity: i64, min_stock: i64, expiry: NaiveDate) -> Medication {
        Medication::from_intake(
            MedicationId::new(),
            NewMedication {
                name: "Paracetamol 500mg".to_string(),
                batch: "L-77".to_string(),
                expiry_date: expiry,
                quantity,
                min_stock,
                supplier_id: None,
                category: "Analgésicos".to_string(),
                unit_price_cents: 25,
                active_ingredient: None,
                location: None,
                image_url: None,
                controlled: false,
            },
            Utc::now(),
        )
    }

    fn far_future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
    }

    fn kinds(c: &[AlertCandidate]) -> Vec<(AlertKind, Severity)> {
        c.iter().map(|c| (c.kind, c.severity)).collect()
    }

    #[test]
    fn healthy_stock_yields_nothing() {
        let c = derive_alerts(&[med(110, 50, far_future())], today(), &AlertPolicy::default());
        assert!(c.is_empty());
    }

    #[test]
    fn low_stock_is_medium_above_zero() {
        let c = derive_alerts(&[med(40, 50, far_future())], today(), &AlertPolicy::default());
        assert_eq!(kinds(&c), vec![(AlertKind::LowStock, Severity::Medium)]);
        assert!(c[0].message.contains("40 unidades"));
    }

    #[test]
    fn stock_at_threshold_counts_as_low() {
        let c = derive_alerts(&[med(50, 50, far_future())], today(), &AlertPolicy::default());
        assert_eq!(kinds(&c), vec![(AlertKind::LowStock, Severity::Medium)]);
    }

    #[test]
    fn out_of_stock_is_high_low_stock() {
        let c = derive_alerts(&[med(0, 5, far_future())], today(), &AlertPolicy::default());
        assert_eq!(kinds(&c), vec![(AlertKind::LowStock, Severity::High)]);
    }

    #[test]
    fn expired_batches_are_high() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 9).unwrap();
        let c = derive_alerts(&[med(20, 5, yesterday)], today(), &AlertPolicy::default());
        assert_eq!(kinds(&c), vec![(AlertKind::Expired, Severity::High)]);
    }

    #[test]
    fn near_expiry_severity_depends_on_days_left() {
        let policy = AlertPolicy::default();
        let in_days = |d: i64| today() + chrono::Duration::days(d);

        let c = derive_alerts(&[med(20, 5, in_days(30))], today(), &policy);
        assert_eq!(kinds(&c), vec![(AlertKind::NearExpiry, Severity::Medium)]);

        let c = derive_alerts(&[med(20, 5, in_days(7))], today(), &policy);
        assert_eq!(kinds(&c), vec![(AlertKind::NearExpiry, Severity::High)]);

        let c = derive_alerts(&[med(20, 5, in_days(0))], today(), &policy);
        assert_eq!(kinds(&c), vec![(AlertKind::NearExpiry, Severity::High)]);

        let c = derive_alerts(&[med(20, 5, in_days(31))], today(), &policy);
        assert!(c.is_empty());
    }

    #[test]
    fn one_medication_can_raise_several_kinds() {
        let soon = today() + chrono::Duration::days(3);
        let c = derive_alerts(&[med(2, 10, soon)], today(), &AlertPolicy::default());
        assert_eq!(
            kinds(&c),
            vec![
                (AlertKind::LowStock, Severity::Medium),
                (AlertKind::NearExpiry, Severity::High)
            ]
        );
    }

    #[test]
    fn policy_overrides_windows() {
        let policy = AlertPolicy::default()
            .with_near_expiry_days(60)
            .with_critical_expiry_days(14);
        let c = derive_alerts(&[med(20, 5, today() + chrono::Duration::days(10))], today(), &policy);
        assert_eq!(kinds(&c), vec![(AlertKind::NearExpiry, Severity::High)]);
    }
}

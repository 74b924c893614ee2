use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use pharmastock_app::Pharmacy;
use pharmastock_core::SystemClock;
use pharmastock_infra::{JsonFileSnapshotStore, PharmacyConfig};

/// Startup report printed to stdout.
#[derive(Debug, Serialize)]
struct Summary {
    medications: usize,
    movements: usize,
    low_stock: usize,
    unresolved_alerts: usize,
    alerts_raised: usize,
    reconciliation_mismatches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<pharmastock_returns::SweepReport>,
}

fn main() -> anyhow::Result<()> {
    pharmastock_observability::init();

    let sweep_requested = std::env::args().skip(1).any(|arg| arg == "--sweep-expired");
    let config = PharmacyConfig::from_env().context("invalid configuration")?;
    tracing::info!(data_file = %config.data_file.display(), "starting pharmastock");

    let store = Arc::new(JsonFileSnapshotStore::new(config.data_file.clone()));
    let mut pharmacy = Pharmacy::open(&config, Arc::new(SystemClock), store)
        .with_context(|| format!("cannot open {}", config.data_file.display()))?;

    let mismatches = pharmacy.reconcile();
    for m in &mismatches {
        tracing::warn!(
            medication = %m.medication_name,
            expected = m.expected,
            actual = m.actual,
            "stock is negative or does not match its ledger"
        );
    }

    let sweep = sweep_requested.then(|| pharmacy.sweep_expired());
    let raised = pharmacy.refresh_alerts();

    let summary = Summary {
        medications: pharmacy.inventory().medications().len(),
        movements: pharmacy.inventory().movements().len(),
        low_stock: pharmacy
            .inventory()
            .medications()
            .iter()
            .filter(|m| m.is_low_stock())
            .count(),
        unresolved_alerts: pharmacy.unresolved_alerts().len(),
        alerts_raised: raised.len(),
        reconciliation_mismatches: mismatches.len(),
        sweep,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to encode summary")?
    );

    pharmacy.shutdown();
    Ok(())
}

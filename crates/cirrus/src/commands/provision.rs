//! `cirrus provision` — create every resource and keep it

use crate::sim::SimProvider;
use crate::specfile;
use cirrus_cloud::{LedgerStore, ProvisioningLedger, RetryConfig};
use cirrus_core::DependencyGraph;
use cirrus_engine::{teardown, ProvisioningEngine, SharedLedger};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub async fn handle(spec_file: &Path, keep: bool) -> anyhow::Result<i32> {
    let specs = specfile::load(spec_file)?;
    let graph = DependencyGraph::build(&specs)?;

    println!(
        "{} {} resources in {} layers",
        "Provisioning".green().bold(),
        specs.len(),
        graph.layers().len()
    );

    let mut ledger = ProvisioningLedger::new();
    ledger.register(specs.iter());
    let ledger: SharedLedger = Arc::new(Mutex::new(ledger));

    let cancel = CancellationToken::new();
    super::cancel_on_ctrl_c(cancel.clone());

    let provider = SimProvider::new();
    let engine = ProvisioningEngine::new(RetryConfig::default());
    let outcome = engine
        .provision(&provider, &graph, &specs, &ledger, &cancel)
        .await;

    let store = LedgerStore::new(".");
    store.save(&*ledger.lock().await).await?;

    super::print_set("succeeded", &outcome.succeeded, colored::Color::Green);
    super::print_set("failed", &outcome.failed, colored::Color::Red);

    if outcome.is_success() {
        println!("{}", "✓ All resources ready".green());
        return Ok(0);
    }

    if keep {
        println!(
            "{}",
            "Provisioning failed; partial resources kept (--keep)".yellow()
        );
        return Ok(1);
    }

    // Failed runs clean up after themselves unless told otherwise.
    println!("{}", "Provisioning failed, tearing down...".yellow());
    let teardown = teardown::teardown(&provider, &graph, &ledger).await;
    store.save(&*ledger.lock().await).await?;
    super::print_set("deleted", &teardown.deleted, colored::Color::Cyan);
    super::print_set("residual", &teardown.residual, colored::Color::Red);
    if teardown.is_clean() {
        store.clear().await?;
    }
    Ok(1)
}

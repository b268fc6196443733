//! `cirrus teardown` — delete everything the ledger tracks

use crate::sim::SimProvider;
use crate::specfile;
use cirrus_cloud::LedgerStore;
use cirrus_core::DependencyGraph;
use cirrus_engine::teardown;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle(spec_file: &Path) -> anyhow::Result<i32> {
    // The ledger records status and handles; deletion order comes
    // from the spec file's dependency graph.
    let specs = specfile::load(spec_file)?;
    let graph = DependencyGraph::build(&specs)?;

    let store = LedgerStore::new(".");
    let ledger = Arc::new(Mutex::new(store.load().await?));

    let provider = SimProvider::new();
    let outcome = teardown::teardown(&provider, &graph, &ledger).await;
    store.save(&*ledger.lock().await).await?;

    super::print_set("deleted", &outcome.deleted, colored::Color::Cyan);
    super::print_set("residual", &outcome.residual, colored::Color::Red);

    if outcome.is_clean() {
        store.clear().await?;
        println!("{}", "✓ Teardown complete".green());
        Ok(0)
    } else {
        println!(
            "{} {} resource(s) could not be removed",
            "✗".red(),
            outcome.residual.len()
        );
        Ok(1)
    }
}

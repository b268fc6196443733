//! `cirrus run` — ephemeral session: provision, then tear down

use crate::sim::SimProvider;
use crate::specfile;
use cirrus_cloud::LedgerStore;
use cirrus_engine::Session;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

pub async fn handle(spec_file: &Path, keep: bool) -> anyhow::Result<i32> {
    let specs = specfile::load(spec_file)?;

    let session = Session::new(Arc::new(SimProvider::new()), specs)?.keep_resources(keep);
    super::cancel_on_ctrl_c(session.cancellation_token());

    println!(
        "{} {} layers",
        "Running session:".green().bold(),
        session.graph().layers().len()
    );

    let ledger = session.ledger();
    let report = session.run().await;

    if keep {
        LedgerStore::new(".").save(&*ledger.lock().await).await?;
    }

    super::print_set("succeeded", &report.succeeded, colored::Color::Green);
    super::print_set("failed", &report.failed, colored::Color::Red);
    super::print_set("deleted", &report.deleted, colored::Color::Cyan);
    super::print_set("residual", &report.residual, colored::Color::Red);

    if report.is_success() {
        println!("{}", "✓ Session completed cleanly".green());
        Ok(0)
    } else {
        println!("{}", "Session finished with failures".red());
        Ok(1)
    }
}

pub mod operate;
pub mod provision;
pub mod run;
pub mod status;
pub mod teardown;

use colored::Colorize;
use std::collections::BTreeSet;

/// Print one labelled id set, skipping empty ones
pub fn print_set(label: &str, ids: &BTreeSet<String>, color: colored::Color) {
    if ids.is_empty() {
        return;
    }
    let joined = ids.iter().cloned().collect::<Vec<_>>().join(", ");
    println!("  {} {}", format!("{label}:").color(color), joined);
}

/// Wire Ctrl-C to a cancellation token
pub fn cancel_on_ctrl_c(cancel: tokio_util::sync::CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{}", "Interrupted, cancelling session...".yellow());
            cancel.cancel();
        }
    });
}

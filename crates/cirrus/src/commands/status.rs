//! `cirrus status` — show the persisted ledger

use cirrus_cloud::{LedgerStore, ResourceStatus};
use colored::Colorize;

pub async fn handle() -> anyhow::Result<i32> {
    let store = LedgerStore::new(".");
    let ledger = store.load().await?;

    if ledger.is_empty() {
        println!("{}", "No tracked resources".yellow());
        return Ok(0);
    }

    println!(
        "{:<20} {:<15} {:<10} {:<12} HANDLE",
        "ID", "KIND", "REGION", "STATUS"
    );
    for (id, entry) in &ledger.entries {
        println!(
            "{:<20} {:<15} {:<10} {} {}",
            id,
            entry.kind.to_string(),
            entry.region,
            status_cell(entry.status),
            entry
                .handle
                .as_ref()
                .map(|h| h.as_str().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(0)
}

/// Pad before coloring: ANSI escape bytes count toward `{:<12}`
/// widths, so coloring first would misalign the column.
fn status_cell(status: ResourceStatus) -> colored::ColoredString {
    let padded = format!("{:<12}", status.to_string());
    match status {
        ResourceStatus::Ready => padded.green(),
        ResourceStatus::Failed => padded.red(),
        ResourceStatus::Deleted => padded.dimmed(),
        _ => padded.yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_cell_padded_to_column_width() {
        for status in [
            ResourceStatus::Pending,
            ResourceStatus::InProgress,
            ResourceStatus::Ready,
            ResourceStatus::Failed,
            ResourceStatus::Deleted,
        ] {
            // ColoredString derefs to the uncolored input text, so
            // the width check sees no ANSI escape bytes.
            let cell = status_cell(status);
            assert_eq!(cell.len(), 12, "{status} not padded");
            assert!(cell.starts_with(&status.to_string()));
        }
    }
}

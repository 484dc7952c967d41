//! `mashup history`: list or clear past results.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use mashup_core::history::{HistoryEntry, HistoryStore};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Delete every entry.
    #[arg(long)]
    clear: bool,
}

pub fn run(args: HistoryArgs, history_path: &Path) -> Result<()> {
    let store = HistoryStore::new(history_path);

    if args.clear {
        store
            .clear()
            .with_context(|| format!("Failed to clear {}", store.path().display()))?;
        println!("History cleared");
        return Ok(());
    }

    let entries = store.load();
    if entries.is_empty() {
        println!("No results yet");
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &HistoryEntry) -> String {
    let when = entry.created_at.format("%Y-%m-%d %H:%M");
    match &entry.user_details {
        Some(details) => format!("{when}  {}  ({details})", entry.image_url),
        None => format!("{when}  {}", entry.image_url),
    }
}

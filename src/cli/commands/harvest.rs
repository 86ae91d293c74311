//! One-shot harvest command.

use std::sync::Arc;

use console::style;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::models::HarvestRequest;
use crate::storage::{HttpPostingStore, MemoryPostingStore, PostingStore};

use super::super::helpers::{print_summary, HarvestRuntime};

pub struct HarvestArgs {
    pub query: Option<String>,
    pub pages: Option<u32>,
    pub sources: Vec<String>,
    pub no_store: bool,
    pub json: bool,
}

/// Run a harvest. Ctrl-C cancels between pages and prints partial results.
pub async fn cmd_harvest(settings: &Settings, args: HarvestArgs) -> anyhow::Result<()> {
    let store: Arc<dyn PostingStore> = if args.no_store {
        Arc::new(MemoryPostingStore::new())
    } else {
        Arc::new(HttpPostingStore::new(
            &settings.database_service_url,
            settings.request_timeout(),
        )?)
    };
    let runtime = HarvestRuntime::new(settings, store)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Cancelling after the current page...", style("!").yellow());
            on_signal.cancel();
        }
    });

    if !args.json {
        println!(
            "{} Harvesting{}",
            style("→").cyan(),
            if args.no_store { " (dry run)" } else { "" }
        );
    }

    let request = HarvestRequest::new(
        args.query.unwrap_or_default(),
        args.sources,
        args.pages.unwrap_or(0),
    );
    let result = runtime.harvester.harvest(request, &cancel).await;
    signal_task.abort();
    runtime.shutdown().await;
    let result = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, args.no_store);
    }

    Ok(())
}

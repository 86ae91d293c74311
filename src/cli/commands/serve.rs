//! Web server command.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::server::AppState;
use crate::storage::HttpPostingStore;

use super::super::helpers::HarvestRuntime;

/// Start the web server.
pub async fn cmd_serve(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let store = HttpPostingStore::new(&settings.database_service_url, settings.request_timeout())?;
    println!(
        "{} Posting store at {}",
        style("→").cyan(),
        store.endpoint()
    );
    let runtime = HarvestRuntime::new(&settings, Arc::new(store))?;

    let addr = settings.bind_addr();
    println!("{} Starting jobharvest server at http://{}", style("→").cyan(), addr);
    println!("  Press Ctrl+C to stop");

    let served = crate::server::serve(AppState::new(runtime.harvester.clone()), &addr).await;
    runtime.shutdown().await;
    served
}

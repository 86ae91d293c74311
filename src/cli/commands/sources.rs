//! Source listing command.

use console::style;

use crate::scrapers::sites;

/// List known sources.
pub fn cmd_sources(json: bool) -> anyhow::Result<()> {
    let infos = sites::describe()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("\n{}", style("Job Sources").bold());
    println!("{}", "-".repeat(72));
    println!("{:<10} {:<14} {:<32} Mode", "ID", "Name", "Base URL");
    println!("{}", "-".repeat(72));

    for info in infos {
        let mode = match (info.requires_rendering, info.detail_pages) {
            (true, _) => "rendered",
            (false, true) => "http + detail",
            (false, false) => "http",
        };
        println!(
            "{:<10} {:<14} {:<32} {}",
            info.id.as_str(),
            info.name,
            info.base_url,
            mode
        );
    }

    Ok(())
}

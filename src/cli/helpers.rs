//! Shared helper functions for CLI commands.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::harvest::Harvester;
use crate::models::HarvestResult;
use crate::scrapers::{build_renderer, Renderer, SourceRegistry};
use crate::storage::PostingStore;

/// Harvester wired from settings, plus the renderer it shares so the browser
/// can be shut down when the command ends.
pub struct HarvestRuntime {
    pub harvester: Arc<Harvester>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl HarvestRuntime {
    pub fn new(settings: &Settings, store: Arc<dyn PostingStore>) -> anyhow::Result<Self> {
        let classifier = Arc::new(settings.classifier()?);
        tracing::debug!(
            "keywords: {} include, {} exclude",
            classifier.include().len(),
            classifier.exclude().len()
        );

        let renderer = build_renderer(&settings.browser);
        let registry =
            SourceRegistry::standard(classifier, renderer.clone(), &settings.registry_options())?;

        let harvester = Harvester::new(Arc::new(registry), store)
            .with_max_concurrent(settings.max_concurrent_sources)
            .with_defaults(settings.request_defaults());

        Ok(Self {
            harvester: Arc::new(harvester),
            renderer,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(ref renderer) = self.renderer {
            renderer.shutdown().await;
        }
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Human-readable harvest summary.
pub fn print_summary(result: &HarvestResult, dry_run: bool) {
    println!(
        "\n{} {:?}, {} page(s) per source",
        style("Harvest").bold(),
        result.query,
        result.pages
    );
    println!("{}", "-".repeat(72));
    println!("{:<10} {:<30} {:<30}", "Source", "Title", "Company");
    println!("{}", "-".repeat(72));
    for posting in &result.postings {
        println!(
            "{:<10} {:<30} {:<30}",
            posting.source.as_str(),
            truncate(&posting.title, 29),
            truncate(&posting.company, 29)
        );
    }
    println!("{}", "-".repeat(72));

    for (source, count) in &result.per_source_counts {
        println!("  {:<10} {}", source.as_str(), count);
    }

    let stored = if dry_run { "kept in memory" } else { "saved" };
    println!(
        "{} {} found, {} {}",
        style("✓").green(),
        result.total_found(),
        result.saved,
        stored
    );
    if result.cancelled {
        println!("{} Harvest was cancelled; results are partial", style("!").yellow());
    }
    if !result.errors.is_empty() {
        println!("{} {} error(s):", style("✗").red(), result.errors.len());
        for issue in &result.errors {
            println!("  - {}", issue);
        }
    }
}

use anyhow::{Context, Result, bail};
use trawl_fetch::{ContactExpansions, FetchOptions, Ingestor, ReqwestClient, Resource};
use trawl_format::{Aggregator, ArrayStyle};

use crate::FetchContactsArgs;
use crate::layout::Layout;
use crate::ui::PageTracker;

/// Execute `fetch-contacts`: pull every page newer than the stored watermark,
/// then rebuild the output file from all staged contacts.
pub async fn execute(layout: &Layout, args: FetchContactsArgs) -> Result<()> {
    let Some(api_key) = args.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        bail!("No API key: pass --apikey or set the SigParserApiKey environment variable");
    };

    let resource = Resource::contacts(ContactExpansions {
        relationship_metrics:         args.relationship_metrics,
        relationship_metrics_history: args.relationship_metrics_history,
        relationship_metrics_type:    args.relationship_metrics_type,
    });
    let client = ReqwestClient::new(&args.base_url, api_key).context("Failed to build API client")?;
    let checkpoints = layout.checkpoints(&resource);
    let staging = layout.staging(&resource);

    tracing::info!(
        root = %layout.root().display(),
        staging = %staging.dir().display(),
        checkpoint = %resource.checkpoint_key(),
        "Fetching contacts"
    );

    let tracker = PageTracker::new("contacts");
    let options = FetchOptions::default()
        .page_size(args.page_size)
        .on_progress(tracker.observer());
    let ingestor = Ingestor::new(client, checkpoints, staging, resource).with_options(options);

    let summary = match ingestor.run().await {
        Ok(summary) => {
            tracker.finish(format!("{} records in {} pages", summary.records, summary.pages));
            summary
        }
        Err(e) => {
            tracker.abandon();
            return Err(e).context("Failed to fetch contacts");
        }
    };

    let style = if args.strict_json { ArrayStyle::Strict } else { ArrayStyle::TrailingComma };
    let aggregator = Aggregator::new(args.format)
        .style(style)
        .encoding(args.encoding.unwrap_or_default());
    let generated = aggregator
        .generate(ingestor.staging(), &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("Fetched {} contacts in {} pages.", summary.records, summary.pages);
    println!("  Watermark: {}", summary.watermark);
    println!(
        "  Wrote {} contacts ({} bytes) to {}",
        generated.records,
        generated.bytes,
        args.output.display()
    );
    Ok(())
}

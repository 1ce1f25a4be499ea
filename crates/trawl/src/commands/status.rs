use anyhow::{Context, Result};
use trawl_fetch::{ContactExpansions, Resource};
use trawl_state::CheckpointStore;
use trawl_store::StagingStore;

use crate::layout::Layout;

/// Execute `status`: print every stored watermark and the staged contact count.
pub fn execute(layout: &Layout) -> Result<()> {
    let resource = Resource::contacts(ContactExpansions::default());
    let checkpoints = layout.checkpoints(&resource);
    let entries = checkpoints
        .entries()
        .with_context(|| format!("Failed to read {}", checkpoints.path().display()))?;

    println!("State: {}", checkpoints.path().display());
    if entries.is_empty() {
        println!("  no checkpoints yet");
    }
    for (key, watermark) in entries {
        match watermark {
            Some(watermark) => println!("  {key}: {watermark}"),
            None => println!("  {key}: (from the beginning)"),
        }
    }

    let resume = checkpoints
        .load(&resource.checkpoint_key())
        .with_context(|| format!("Failed to read {}", checkpoints.path().display()))?;
    println!("Next {} fetch starts after {}", resource.name, resume);

    let staging = layout.staging(&resource);
    let staged = staging
        .len()
        .with_context(|| format!("Failed to list {}", staging.dir().display()))?;
    println!("Staged {}: {} records in {}", resource.name, staged, staging.dir().display());
    Ok(())
}

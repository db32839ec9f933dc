//! Check command - Classify declarations without touching the provider.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use xstack_core::{ClassifiedResources, Lifecycle, RunContext, RunSettings, StackComposer};
use xstack_families::standard_registry;
use xstack_provider::OfflineFactory;

use super::load_document;

#[derive(Args)]
pub struct CheckArgs {
    /// Compose document holding the x-<family> sections
    #[arg(short, long)]
    pub file: PathBuf,

    /// Fail when any warning was reported
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    info!("Checking {}", args.file.display());
    let document = load_document(&args.file)?;

    let composer = StackComposer::new(standard_registry()?, Arc::new(OfflineFactory));
    let mut context = RunContext::new(RunSettings::default());
    let families = composer.classify(&document, &mut context)?;

    println!("📋 Declarations in {}", args.file.display());
    if families.is_empty() {
        println!("   (no registered family section found)");
    }
    for (family, classified) in &families {
        println!("   {} ({})", family.key, family.section);
        for line in bucket_lines(classified) {
            println!("      {}", line);
        }
    }

    for warning in context.diagnostics.entries() {
        println!("   ⚠️  {}", warning);
    }

    println!();
    if args.strict && !context.diagnostics.is_empty() {
        anyhow::bail!(
            "Validation failed: {} warning(s) reported in strict mode",
            context.diagnostics.len()
        );
    }
    println!("✅ Check passed");
    Ok(())
}

fn bucket_lines(classified: &ClassifiedResources) -> Vec<String> {
    [Lifecycle::New, Lifecycle::Lookup, Lifecycle::Use]
        .into_iter()
        .filter_map(|lifecycle| {
            let bucket = classified.bucket(lifecycle);
            if bucket.is_empty() {
                return None;
            }
            let names: Vec<&str> = bucket.iter().map(|r| r.name()).collect();
            Some(format!("{}: {}", lifecycle, names.join(", ")))
        })
        .collect()
}

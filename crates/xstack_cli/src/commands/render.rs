//! Render command - Resolve every declaration and write the template tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use xstack_core::{RunContext, RunSettings, StackComposer};
use xstack_families::standard_registry;
use xstack_provider::{ClientFactory, OfflineFactory, ProviderFixtures};

use super::load_document;

#[derive(Args)]
pub struct RenderArgs {
    /// Compose document holding the x-<family> sections
    #[arg(short, long)]
    pub file: PathBuf,

    /// Name of the root stack (defaults to the settings file value)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory the templates are written to
    #[arg(short, long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// YAML run settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// YAML provider fixtures used to resolve lookups offline
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Region lookups default to when the ARN does not carry one
    #[arg(long, env = "XSTACK_REGION")]
    pub region: Option<String>,

    /// Location the nested templates will be uploaded to
    #[arg(long)]
    pub template_url_base: Option<String>,

    /// Do not export outputs as CloudFormation exports
    #[arg(long)]
    pub no_cfn_exports: bool,

    /// Also export outputs to SSM parameters
    #[arg(long)]
    pub ssm_exports: bool,
}

impl RenderArgs {
    /// Settings file values, overridden by whatever was given on the command line.
    fn settings(&self) -> Result<RunSettings> {
        let mut settings = match &self.settings {
            Some(path) => RunSettings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => RunSettings::default(),
        };

        if let Some(name) = &self.name {
            settings.root_stack_name = name.clone();
        }
        if let Some(region) = &self.region {
            settings = settings.with_region(region.clone());
        }
        if let Some(base) = &self.template_url_base {
            settings = settings.with_template_url_base(base.clone());
        }
        if self.no_cfn_exports {
            settings = settings.with_cfn_exports(false);
        }
        if self.ssm_exports {
            settings = settings.with_ssm_exports(true);
        }
        Ok(settings)
    }

    fn client_factory(&self) -> Result<Arc<dyn ClientFactory>> {
        match &self.fixtures {
            Some(path) => {
                let fixtures = ProviderFixtures::from_file(path)
                    .with_context(|| format!("Failed to load provider fixtures from {}", path.display()))?;
                info!("Resolving lookups against {} fixture resource(s)", fixtures.resources.len());
                Ok(Arc::new(fixtures.into_provider()))
            }
            None => Ok(Arc::new(OfflineFactory)),
        }
    }
}

pub async fn execute(args: RenderArgs) -> Result<()> {
    let document = load_document(&args.file)?;
    let settings = args.settings()?;
    let title = settings.root_stack_name.clone();
    info!("Rendering {} from {}", title, args.file.display());

    let composer = StackComposer::new(standard_registry()?, args.client_factory()?);
    let mut context = RunContext::new(settings);

    let composition = composer
        .compose(&title, &document, &mut context)
        .await
        .with_context(|| format!("Failed to compose {}", title))?;

    let written = composition
        .root
        .write_all(&args.output_dir)
        .with_context(|| format!("Failed to write templates to {}", args.output_dir.display()))?;

    let params_path = args.output_dir.join(format!("{}.params.json", title));
    context.settings.root_parameters().write_to(&params_path)?;

    for warning in context.diagnostics.entries() {
        println!("⚠️  {}", warning);
    }
    for path in &written {
        println!("📄 {}", path.display());
    }
    println!("📄 {}", params_path.display());
    println!();
    println!("✅ Rendered {} template(s) for {}", written.len(), title);

    Ok(())
}

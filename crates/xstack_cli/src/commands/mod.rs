//! CLI command definitions.
//!
//! Each subcommand maps to one stage of a run: `check` stops after
//! classification, `render` goes all the way to templates on disk.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use xstack_core::ComposeDocument;

pub mod check;
pub mod render;

/// xstack - compose CloudFormation stacks from x-resource declarations
#[derive(Parser)]
#[command(name = "xstack")]
#[command(version, about = "xstack - compose CloudFormation stacks from x-resource declarations")]
#[command(long_about = r#"
xstack reads the x-<family> sections of a compose document, resolves every
declared resource as new, looked up or used, and renders one nested
CloudFormation template per family under a root stack.

WORKFLOWS:
  check   → Classify declarations without calling the provider
  render  → Resolve lookups and write the template tree

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Lookup failure
  5 - Provider error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve resources and write the stack templates
    Render(render::RenderArgs),

    /// Classify declarations and report warnings
    Check(check::CheckArgs),
}

pub(crate) fn load_document(path: &Path) -> Result<ComposeDocument> {
    ComposeDocument::from_file(path).with_context(|| format!("Failed to read compose file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "xstack", "render", "-f", "compose.yaml", "-n", "shop", "-o", "out", "--region", "eu-west-1",
        ])
        .unwrap();

        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.name.as_deref(), Some("shop"));
                assert_eq!(args.region.as_deref(), Some("eu-west-1"));
                assert!(args.fixtures.is_none());
            }
            Commands::Check(_) => panic!("expected render"),
        }
    }

    #[test]
    fn test_file_is_required() {
        assert!(Cli::try_parse_from(["xstack", "check"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["xstack", "-v", "-q", "check", "-f", "compose.yaml"]).is_err());
    }
}

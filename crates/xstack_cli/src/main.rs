//! xstack CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Lookup failure
//! - 5: Provider error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use xstack_core::CoreError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const LOOKUP_FAILURE: u8 = 4;
    pub const PROVIDER_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&cli)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logging may already be initialized, continue either way
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args).await,
        Commands::Check(args) => commands::check::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn default_directives(cli: &Cli) -> &'static str {
    if cli.quiet {
        "error"
    } else if cli.verbose {
        "xstack=debug,debug"
    } else {
        "xstack=info,warn"
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let Some(core) = e.chain().find_map(|cause| cause.downcast_ref::<CoreError>()) else {
        return ExitCodes::GENERAL_ERROR;
    };

    match core {
        CoreError::Validation { .. } | CoreError::InvalidDocument(_) => ExitCodes::VALIDATION_FAILURE,
        CoreError::LookupAmbiguity { .. }
        | CoreError::ResourceNotFound { .. }
        | CoreError::MissingAttribute { .. }
        | CoreError::MissingMapping { .. } => ExitCodes::LOOKUP_FAILURE,
        CoreError::Provider(_) => ExitCodes::PROVIDER_ERROR,
        CoreError::UnknownFamily(_) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

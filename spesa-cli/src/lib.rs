//! Command-line interface for the Spesa shopping-plan engine.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod import;
mod plan;

pub use error::CliError;

pub(crate) const ARG_PLAN_REQUEST: &str = "request";
pub(crate) const ARG_PLAN_DB: &str = "db";
pub(crate) const ARG_PLAN_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_PLAN_NOMINATIM_BASE_URL: &str = "nominatim-base-url";
pub(crate) const ARG_IMPORT_PAYLOAD: &str = "payload";
pub(crate) const ARG_IMPORT_DB: &str = "db";
pub(crate) const ENV_PLAN_REQUEST: &str = "SPESA_CMDS_PLAN_REQUEST";
pub(crate) const ENV_PLAN_DB: &str = "SPESA_CMDS_PLAN_DB";
pub(crate) const ENV_IMPORT_PAYLOAD: &str = "SPESA_CMDS_IMPORT_PAYLOAD";
pub(crate) const ENV_IMPORT_DB: &str = "SPESA_CMDS_IMPORT_DB";

/// Run the Spesa CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration merging, or the
/// requested command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Plan(args) => {
            let mut stdout = std::io::stdout().lock();
            plan::run_plan(args, &mut stdout)
        }
        Command::Import(args) => import::run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "spesa",
    about = "Shopping-plan optimizer over a receipt price history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a shopping plan from the price database.
    Plan(plan::PlanArgs),
    /// Append extracted receipt data to the price database.
    Import(import::ImportArgs),
}

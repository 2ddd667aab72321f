// Declare the display submodule
mod display;

// Declare the command handlers
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use raidionics_catalog::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "rads", version, about = "Raidionics model catalog and backend configuration")]
pub struct Cli {
    /// Directory holding default.toml and local.toml
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List local models, optionally restricted to a task and name terms
    Models {
        #[arg(long)]
        task: Option<String>,
        terms: Vec<String>,
    },
    /// Show the metadata of one local model
    Details { name: String },
    /// Show the images cached by the container runtime
    Inventory,
    /// List cloud models that are not installed locally
    Cloud { terms: Vec<String> },
    /// Register a downloaded manifest in the manifest directory
    Install { manifest: PathBuf },
    /// Pick the post-operative segmentation variant for the available inputs
    Select {
        /// Available optional input, e.g. "T1w postop" (repeatable)
        #[arg(long = "present", value_name = "INPUT")]
        present: Vec<String>,
    },
    /// Write the backend configuration for a processing request
    Generate(commands::GenerateArgs),
}

/// Runs one command against the loaded settings.
pub async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Models { task, terms } => commands::handle_models(settings, task, &terms).await,
        Command::Details { name } => commands::handle_details(settings, &name).await,
        Command::Inventory => commands::handle_inventory(settings).await,
        Command::Cloud { terms } => commands::handle_cloud(settings, &terms).await,
        Command::Install { manifest } => commands::handle_install(settings, &manifest),
        Command::Select { present } => {
            commands::handle_select(&present);
            Ok(())
        }
        Command::Generate(args) => commands::handle_generate(settings, args).await,
    }
}

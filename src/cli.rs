// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Provision Azure infrastructure and deploy container images to ACI")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final endpoint
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new gantry.yml configuration file
    Init {
        /// Registry name to write into the template
        #[arg(long)]
        registry: Option<String>,

        /// Image reference to write into the template
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Resolve and print the effective parameters without touching Azure
    Check,

    /// Provision infrastructure and deploy the container
    Up,
}

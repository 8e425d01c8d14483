// ABOUTME: Entry point for the gantry CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use gantry::cloud::AzureCli;
use gantry::config::{self, Config, Params};
use gantry::engine::EngineCli;
use gantry::error::Result;
use gantry::exec::CliRunner;
use gantry::output::{Output, OutputMode};
use gantry::provision::Provision;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Default to info so every external invocation is traced to the
    // console; --verbose turns on debug detail.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command {
        Commands::Init {
            registry,
            image,
            force,
        } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, registry.as_deref(), image.as_deref(), force)
        }
        Commands::Check => {
            let cwd = env::current_dir()?;
            let params = Config::discover(&cwd)?.resolve()?;
            print_params(&params, output);
            Ok(())
        }
        Commands::Up => {
            let cwd = env::current_dir()?;
            let params = Config::discover(&cwd)?.resolve()?;
            up(params, output).await
        }
    }
}

fn print_params(params: &Params, output: &Output) {
    output.line(&format!("Resource group: {}", params.resource_group));
    output.line(&format!("Location:       {}", params.location));
    output.line(&format!(
        "Registry:       {} ({})",
        params.registry,
        params.registry_sku.as_str()
    ));
    output.line(&format!("Image:          {}", params.image));
    output.line(&format!("Identity:       {}", params.identity));
    output.line(&format!("Container:      {}", params.container));
    output.line(&format!("DNS label:      {}", params.dns_label));
    let ports: Vec<String> = params.ports.iter().map(u16::to_string).collect();
    output.line(&format!("Ports:          {}", ports.join(", ")));
    output.line(&format!(
        "Resources:      {} cpu, {} GB",
        params.cpu, params.memory_gb
    ));
}

/// Run the provisioning state machine to completion.
async fn up(params: Params, output: &Output) -> Result<()> {
    let az = AzureCli::new(CliRunner);
    let engine = EngineCli::new(CliRunner);

    let run = Provision::new(params);

    output.step(&format!(
        "Ensuring resource group {}...",
        run.params().resource_group
    ));
    let run = run.ensure_group(&az).await?;

    output.step(&format!("Ensuring registry {}...", run.params().registry));
    let run = run.ensure_registry(&az).await?;

    output.step("Tagging image for the registry...");
    let run = run.tag_image(&az, &engine).await?;

    output.step(&format!(
        "Ensuring pull credential {}...",
        run.params().identity
    ));
    let run = run.ensure_credential(&az).await?;

    output.step(&format!("Pushing {}...", run.image()));
    let run = run.push(&engine).await?;

    output.step(&format!(
        "Deploying container {}...",
        run.params().container
    ));
    let run = run.deploy(&az).await?;

    output.step("Resolving public endpoint...");
    let run = run.resolve_endpoint(&az).await?;

    output.deployed(run.endpoint());
    Ok(())
}

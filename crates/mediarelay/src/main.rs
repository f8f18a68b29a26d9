//! mediarelay CLI - relay images and prompts to AI vendor job APIs.
//!
//! Submits generation jobs to Kie.ai-style vendors, falling back across
//! candidate models, polls them to completion, and prints normalized
//! outcomes as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Enhance a product photo
//! mediarelay run enhance-product --image shoe.jpg --prompt "studio lighting"
//!
//! # Generate a video and save it
//! mediarelay run generate-video --prompt "a red fox in snow" --download ./out
//!
//! # Submit only, then check later
//! mediarelay submit remove-background --image cat.png
//! mediarelay status 9f2c1e
//!
//! # View configuration
//! mediarelay config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// mediarelay - relay images and prompts to AI vendor job APIs.
#[derive(Parser, Debug)]
#[command(name = "mediarelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a preset job and poll it until it finishes
    Run(cli::run::JobArgs),

    /// Submit a preset job without waiting for it
    Submit(cli::run::JobArgs),

    /// Check the status of a submitted job once
    Status(cli::status::StatusArgs),

    /// Send one chat turn to the chat vendor
    Chat(cli::chat::ChatArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match mediarelay_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `mediarelay config path`."
            );
            mediarelay_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("mediarelay v{}", mediarelay_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute_run(config, args).await,
        Commands::Submit(args) => cli::run::execute_submit(config, args).await,
        Commands::Status(args) => cli::status::execute(config, args).await,
        Commands::Chat(args) => cli::chat::execute(config, args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kindred - long-term fact memory for companion chat personas.
//!
//! This is the binary entry point. It loads configuration, wires the
//! OpenRouter and Pinecone adapters into the memory pipeline, and runs one
//! command against them.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kindred_config::model::KindredConfig;
use kindred_core::Namespace;
use tracing_subscriber::EnvFilter;

/// Kindred - long-term fact memory for companion chat personas.
#[derive(Parser, Debug)]
#[command(name = "kindred", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Consolidate a transcript of turns into stored facts.
    Consolidate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        persona: String,
        /// JSON array of turns (`id`, `role`, `content`), oldest first.
        #[arg(long)]
        transcript: PathBuf,
        /// Prefix for created fact ids. Defaults to the newest turn's id;
        /// pass a fresh value when re-running a transcript.
        #[arg(long)]
        trigger_id: Option<String>,
    },
    /// Look up stored facts through the `get_facts` tool.
    Recall {
        #[arg(long)]
        user: String,
        #[arg(long)]
        persona: String,
        #[arg(long)]
        user_query: Option<String>,
        #[arg(long)]
        agent_query: Option<String>,
    },
    /// Print the validated configuration with secrets redacted.
    Config,
    /// Check configuration and adapter connectivity.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => kindred_config::load_and_validate_path(path),
        None => kindred_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            kindred_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);
    kindred_memory::recording::register_metrics();

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("kindred: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Option<Commands>,
    config: &KindredConfig,
) -> Result<(), kindred_core::KindredError> {
    match command {
        Some(Commands::Consolidate {
            user,
            persona,
            transcript,
            trigger_id,
        }) => {
            let namespace = Namespace::new(user, persona);
            commands::run_consolidate(config, &namespace, &transcript, trigger_id.as_deref()).await
        }
        Some(Commands::Recall {
            user,
            persona,
            user_query,
            agent_query,
        }) => {
            let namespace = Namespace::new(user, persona);
            commands::run_recall(config, namespace, user_query, agent_query).await
        }
        Some(Commands::Config) => {
            print!("{}", commands::config_summary(config));
            Ok(())
        }
        Some(Commands::Doctor) => doctor::run_doctor(config).await,
        None => {
            println!("kindred: use --help for available commands");
            Ok(())
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn tracing_filter(log_level: &str) -> String {
    format!("kindred={log_level},kindred_memory={log_level},warn")
}

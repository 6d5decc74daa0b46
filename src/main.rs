//! apicenter-chat CLI entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use anyhow::Result;

use apicenter_chat::adapters::cli::{interrupt, CliChannel};
use apicenter_chat::catalog::{Catalog, DirectoryCatalog};
use apicenter_chat::chat::{ChatAgent, Dispatcher, SLASH_COMMANDS};
use apicenter_chat::config::Config;
use apicenter_chat::llm::{CompletionClient, CompletionOptions, ProviderRegistry};
use apicenter_chat::ui;

#[derive(Parser)]
#[command(name = "apicenter-chat")]
#[command(about = "Browse, search, and describe the APIs in your API catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration and catalog directory
    Onboard,

    /// Start an interactive chat
    Chat {
        /// Conversation id; a fresh one is generated when omitted
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Run a single slash command, e.g. "/find payments"
    Ask {
        /// Input line
        line: String,
    },

    /// List the available slash commands
    Commands,

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            apicenter_chat::config::onboard()?;
        }

        Commands::Chat { session } => {
            let config = apicenter_chat::config::load()?;
            let session = session.unwrap_or_else(|| format!("cli:{}", uuid::Uuid::new_v4()));
            let channel = build_channel(&config, &session)?;

            ui::print_header(&config.model, &config.provider);
            install_interrupt_handler(&channel);
            channel.run_interactive().await?;
        }

        Commands::Ask { line } => {
            let config = apicenter_chat::config::load()?;
            let channel = build_channel(&config, "cli:ask")?.single_shot();

            install_interrupt_handler(&channel);
            channel.run_once(&line).await?;
        }

        Commands::Commands => {
            ui::print_commands(SLASH_COMMANDS);
        }

        Commands::Status => {
            let config = apicenter_chat::config::load()?;
            println!("API Center Chat Status\n");
            println!(
                "Provider: {} (available: {})",
                config.provider,
                ProviderRegistry::available().join(", ")
            );
            println!("Model: {}", config.model);
            println!(
                "Gemini API: {}",
                if config.resolved_api_key().is_empty() { "not set" } else { "✓" }
            );

            let catalog = DirectoryCatalog::new(&config.catalog_dir);
            match catalog.fetch_all_specifications().await {
                Ok(specs) => {
                    println!("Catalog: {:?} ({} specifications)", catalog.root(), specs.len())
                }
                Err(e) => println!("Catalog: {}", e),
            }
        }
    }

    Ok(())
}

fn build_channel(
    config: &Config,
    session: &str,
) -> Result<CliChannel<DirectoryCatalog, Box<dyn CompletionClient>>> {
    let client = ProviderRegistry::create(config)?;
    let catalog = DirectoryCatalog::new(&config.catalog_dir);
    let dispatcher =
        Dispatcher::new(catalog, client).with_options(CompletionOptions::from_config(config));

    Ok(CliChannel::new(ChatAgent::new(dispatcher), session))
}

/// First Ctrl+C cancels the answer being streamed; Ctrl+C while idle exits.
fn install_interrupt_handler<K: Catalog, C: CompletionClient>(channel: &CliChannel<K, C>) {
    let handle = channel.interrupt_handle();

    ctrlc::set_handler(move || {
        if !interrupt(&handle) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        }
    })
    .ok();
}

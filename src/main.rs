//! newsdigest CLI - five-bullet news digests from the latest web articles
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use newsdigest::{resolve_credential, ui, Config, DigestPipeline, Provider, RunConfig};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "newsdigest")]
#[command(author, version, about = "Five-bullet digests of the latest news on any topic", long_about = None)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise the latest news on a topic and exit
    Digest {
        /// Topic to search for
        #[arg(short, long)]
        topic: String,
        /// Provider id (openai, google_genai, anthropic, mistralai)
        #[arg(short, long)]
        provider: Option<Provider>,
        /// Model name (defaults to the provider's default model)
        #[arg(short, long)]
        model: Option<String>,
        /// API key for the provider (defaults to the provider's environment key)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List supported providers and their defaults
    Providers,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Digest {
            topic,
            provider,
            model,
            api_key,
        }) => {
            let config = Config::load()?;
            let provider = provider.unwrap_or(config.agent.provider);
            let model = model.unwrap_or_else(|| config.model_for(provider));
            let credential = resolve_credential(api_key, provider, &config);

            let pipeline = DigestPipeline::from_config(&config)?;
            let run = RunConfig::new(provider, credential, model, topic);

            if ui::run_once(&pipeline, &run).await.is_some() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Providers) => ui::print_providers(),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "newsdigest",
                &mut std::io::stdout(),
            );
        }
        None => {
            // Default: interactive session
            let config = Config::load()?;
            let pipeline = DigestPipeline::from_config(&config)?;
            ui::run_interactive(&pipeline, &config).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "newsdigest=info"
    } else {
        "newsdigest=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

//! Grounded CLI entry point.

use anyhow::Result;
use clap::Parser;
use grounded::cli::{commands, Cli, Commands};
use grounded::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(Settings::expand_path);

    // Load configuration
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("grounded={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match &cli.command {
        Commands::Index { corpus, output } => {
            commands::run_index(corpus.clone(), output.clone(), settings).await?;
        }

        Commands::Ask {
            question,
            top_k,
            model,
            grounding,
            source,
        } => {
            commands::run_ask(question, *top_k, model.clone(), *grounding, source, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
            source,
        } => {
            commands::run_search(query, *limit, *min_score, source, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}

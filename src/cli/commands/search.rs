//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{IndexSource, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: Option<f32>,
    source: &IndexSource,
    mut settings: Settings,
) -> Result<()> {
    if let Some(score) = min_score {
        settings.retrieval.min_score = score;
    }

    let api_key = match preflight::check(Operation::Search, &settings) {
        Ok(key) => key,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let builder = super::builder(&settings, api_key.as_deref())?;
    let pipeline = super::open_pipeline(builder, source, &settings).await?;

    let spinner = Output::spinner("Searching...");
    let results = pipeline.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for result in &results {
                    Output::search_result(result, 200);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{GroundingArg, IndexSource, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    top_k: Option<usize>,
    model: Option<String>,
    grounding: Option<GroundingArg>,
    source: &IndexSource,
    mut settings: Settings,
) -> Result<()> {
    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }
    if let Some(mode) = grounding {
        settings.prompts.grounding = mode.into();
    }

    // Pre-flight checks
    let api_key = match preflight::check(Operation::Ask, &settings) {
        Ok(key) => key,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let mut builder = super::builder(&settings, api_key.as_deref())?;
    if let Some(model) = &model {
        builder = builder.with_model(model);
    }
    let pipeline = super::open_pipeline(builder, source, &settings).await?;

    let spinner = Output::spinner("Searching knowledge base...");
    let answer = pipeline.ask(question).await;
    spinner.finish_and_clear();

    if let Some(error) = &answer.error {
        Output::error(&format!("Failed to answer ({}): {}", error.kind, error.message));
        return Err(anyhow::anyhow!("{}", answer.text));
    }

    println!("\n{}\n", answer.text);

    if !answer.sources.is_empty() {
        Output::header("Sources");
        for source in &answer.sources {
            Output::search_result(source, 100);
        }
    }

    Ok(())
}

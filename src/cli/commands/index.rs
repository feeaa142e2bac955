//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(corpus: Option<String>, output: Option<String>, settings: Settings) -> Result<()> {
    let api_key = match preflight::check(Operation::Index, &settings) {
        Ok(key) => key,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    let corpus = corpus
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.corpus_path());
    let output = output
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.snapshot_path());

    let mut builder = super::builder(&settings, api_key.as_deref())?;

    let spinner = Output::spinner(&format!("Indexing {}...", corpus.display()));
    let result = builder.build(&corpus).await;
    spinner.finish_and_clear();

    let pipeline = match result {
        Ok(pipeline) => pipeline,
        Err(e) => {
            Output::error(&format!("Index build failed: {}", e));
            return Err(e.into());
        }
    };

    pipeline.save_index(&output)?;

    let report = pipeline.report();
    Output::success(&format!(
        "Indexed {} chunks from {} documents",
        report.chunks, report.documents
    ));
    if report.failed_documents > 0 {
        Output::warning(&format!(
            "{} documents could not be read (run with -v for details)",
            report.failed_documents
        ));
    }
    Output::kv("Dimensions", &report.dimensions.to_string());
    Output::kv("Snapshot", &output.display().to_string());

    Ok(())
}

//! CLI command implementations.

mod ask;
mod config;
mod index;
mod search;

pub use ask::run_ask;
pub use config::run_config;
pub use index::run_index;
pub use search::run_search;

use crate::cli::{IndexSource, Output};
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::generation::OpenAIBackend;
use crate::pipeline::{PipelineBuilder, RagPipeline};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Create a pipeline builder wired to the configured embedder and backend.
pub(crate) fn builder(settings: &Settings, api_key: Option<&str>) -> Result<PipelineBuilder> {
    let embedder = create_embedder(&settings.embedding, api_key)?;
    let backend = Arc::new(OpenAIBackend::new(
        &settings.generation.base_url,
        api_key.unwrap_or_default(),
        Duration::from_secs(settings.generation.timeout_secs),
    )?);

    Ok(PipelineBuilder::from_settings(settings, embedder, backend)?)
}

/// Open a ready pipeline from a snapshot, or build one from a corpus.
///
/// An explicit `--corpus` always rebuilds. Otherwise the snapshot is used when
/// it exists, falling back to building from `corpus.path`.
pub(crate) async fn open_pipeline(
    mut builder: PipelineBuilder,
    source: &IndexSource,
    settings: &Settings,
) -> Result<RagPipeline> {
    if let Some(corpus) = &source.corpus {
        return build_from_corpus(&mut builder, Settings::expand_path(corpus)).await;
    }

    let snapshot_path = source
        .index
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.snapshot_path());

    if snapshot_path.exists() {
        let snapshot = crate::index::FlatIndex::load(&snapshot_path)
            .with_context(|| format!("Failed to load index snapshot {}", snapshot_path.display()))?;
        return Ok(builder.from_snapshot(snapshot)?);
    }

    if source.index.is_some() {
        anyhow::bail!("Index snapshot not found: {}", snapshot_path.display());
    }

    Output::warning(&format!(
        "No index snapshot at {}, building from corpus. Run 'grounded index' to save one.",
        snapshot_path.display()
    ));
    build_from_corpus(&mut builder, settings.corpus_path()).await
}

async fn build_from_corpus(builder: &mut PipelineBuilder, corpus: PathBuf) -> Result<RagPipeline> {
    let spinner = Output::spinner(&format!("Indexing {}...", corpus.display()));
    let result = builder.build(&corpus).await;
    spinner.finish_and_clear();
    Ok(result?)
}

//! Pipeline orchestration for Grounded.
//!
//! Build phase: load the corpus, chunk, embed and index. Any build failure is
//! fatal; there is no partially usable pipeline. Query phase: embed the
//! question, retrieve, assemble the prompt and generate. Query failures are
//! contained in the returned [`Answer`].

use crate::chunking::{create_chunker, Chunker, ChunkingConfig, ChunkingStrategy};
use crate::config::{Prompts, Settings};
use crate::corpus::{CorpusLoader, Document};
use crate::embedding::{check_dimensions, embed_with_timeout, Embedder};
use crate::error::{GroundedError, Result};
use crate::generation::{Completion, CompletionBackend, GenerationClient, GenerationConfig};
use crate::index::{FlatIndex, IndexEntry, IndexSnapshot, SearchResult, VectorIndex};
use crate::rag::{Answer, PromptAssembler, Retriever};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Build-phase state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Chunking,
    Embedding,
    Indexing,
    Ready,
    Failed,
}

/// Summary of a completed build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Documents chunked into the index.
    pub documents: usize,
    /// Files that could not be read.
    pub failed_documents: usize,
    /// Chunks indexed.
    pub chunks: usize,
    pub dimensions: usize,
}

/// Builds a [`RagPipeline`], tracking the build state.
pub struct PipelineBuilder {
    state: PipelineState,
    loader: CorpusLoader,
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    generator: GenerationClient,
    assembler: PromptAssembler,
    top_k: usize,
    min_score: f32,
    batch_size: usize,
    concurrency: usize,
    embed_timeout: Duration,
}

impl PipelineBuilder {
    /// Create a builder with default chunking, retrieval and prompt settings.
    pub fn new(embedder: Arc<dyn Embedder>, backend: Arc<dyn CompletionBackend>) -> Self {
        let settings = Settings::default();
        Self {
            state: PipelineState::Idle,
            loader: CorpusLoader::new(),
            chunker: Box::new(crate::chunking::RecursiveChunker::new(ChunkingConfig::default())),
            embedder,
            generator: GenerationClient::new(backend, GenerationConfig::default()),
            assembler: PromptAssembler::new(Prompts::default(), settings.prompts.grounding),
            top_k: settings.retrieval.top_k,
            min_score: settings.retrieval.min_score,
            batch_size: settings.embedding.batch_size,
            concurrency: settings.embedding.concurrency,
            embed_timeout: Duration::from_secs(settings.embedding.timeout_secs),
        }
    }

    /// Create a builder configured from settings.
    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let strategy: ChunkingStrategy = settings
            .chunking
            .strategy
            .parse()
            .map_err(GroundedError::Config)?;
        let chunking = ChunkingConfig {
            max_size: settings.chunking.max_size,
            overlap: settings.chunking.overlap,
            split_long_words: settings.chunking.split_long_words,
        };

        let assembler = PromptAssembler::new(prompts, settings.prompts.grounding)
            .with_delimiter(&settings.prompts.context_delimiter)
            .with_max_chars(settings.prompts.max_prompt_chars);

        Ok(Self {
            state: PipelineState::Idle,
            loader: CorpusLoader::with_extensions(&settings.corpus.extensions),
            chunker: create_chunker(strategy, chunking)?,
            embedder,
            generator: GenerationClient::new(backend, GenerationConfig::from(&settings.generation)),
            assembler,
            top_k: settings.retrieval.top_k,
            min_score: settings.retrieval.min_score,
            batch_size: settings.embedding.batch_size.max(1),
            concurrency: settings.embedding.concurrency.max(1),
            embed_timeout: Duration::from_secs(settings.embedding.timeout_secs),
        })
    }

    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_generator(mut self, generator: GenerationClient) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Override the generation model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.generator = self.generator.with_model(model);
        self
    }

    /// Current build state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn enter(&mut self, state: PipelineState) {
        debug!("Pipeline state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn finish(&mut self, result: Result<RagPipeline>) -> Result<RagPipeline> {
        match result {
            Ok(pipeline) => {
                self.enter(PipelineState::Ready);
                info!(
                    "Pipeline ready: {} chunks from {} documents",
                    pipeline.report.chunks, pipeline.report.documents
                );
                Ok(pipeline)
            }
            Err(e) => {
                error!("Pipeline build failed during {:?}: {}", self.state, e);
                self.enter(PipelineState::Failed);
                Err(e)
            }
        }
    }

    /// Load, chunk, embed and index every document under `corpus`.
    #[instrument(skip(self), fields(corpus = %corpus.display()))]
    pub async fn build(&mut self, corpus: &Path) -> Result<RagPipeline> {
        let result = self.run_build(corpus).await;
        self.finish(result)
    }

    /// Build from documents already in memory.
    pub async fn build_from_documents(&mut self, documents: Vec<Document>) -> Result<RagPipeline> {
        let result = self.index_documents(documents, 0).await;
        self.finish(result)
    }

    /// Build from a previously saved index snapshot, skipping the corpus.
    pub fn from_snapshot(&mut self, snapshot: IndexSnapshot) -> Result<RagPipeline> {
        let result = self.run_from_snapshot(snapshot);
        self.finish(result)
    }

    async fn run_build(&mut self, corpus: &Path) -> Result<RagPipeline> {
        self.enter(PipelineState::Loading);
        let report = self.loader.load(corpus)?;
        let failed = report.failures.len();

        if report.documents.is_empty() {
            return Err(GroundedError::IndexBuild(format!(
                "no readable documents under {} ({} failed)",
                corpus.display(),
                failed
            )));
        }

        self.index_documents(report.documents, failed).await
    }

    async fn index_documents(&mut self, documents: Vec<Document>, failed: usize) -> Result<RagPipeline> {
        self.enter(PipelineState::Chunking);
        let chunks: Vec<_> = documents.iter().flat_map(|d| self.chunker.split(d)).collect();
        if chunks.is_empty() {
            return Err(GroundedError::IndexBuild("no chunks to index".to_string()));
        }
        info!("Chunked {} documents into {} chunks", documents.len(), chunks.len());

        self.enter(PipelineState::Embedding);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embed_all(texts).await?;

        self.enter(PipelineState::Indexing);
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect();
        let index = FlatIndex::build(entries)?;

        let report = BuildReport {
            documents: documents.len(),
            failed_documents: failed,
            chunks: index.len(),
            dimensions: index.dimensions().unwrap_or_default(),
        };
        Ok(self.assemble(index, report))
    }

    /// Embed all texts in order, running batches concurrently.
    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let batches: Vec<Vec<String>> = texts.chunks(self.batch_size).map(|b| b.to_vec()).collect();
        let timeout = self.embed_timeout;

        let results: Vec<Result<Vec<Vec<f32>>>> = stream::iter(batches)
            .map(|batch| {
                let embedder = self.embedder.clone();
                async move {
                    embed_with_timeout(timeout, embedder.embed_batch(&batch))
                        .await
                        .and_then(|r| r)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut embeddings = Vec::with_capacity(texts.len());
        for result in results {
            embeddings.extend(result?);
        }

        if embeddings.len() != texts.len() {
            return Err(GroundedError::ModelUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        check_dimensions(&embeddings, self.embedder.dimensions())?;

        Ok(embeddings)
    }

    fn run_from_snapshot(&mut self, snapshot: IndexSnapshot) -> Result<RagPipeline> {
        self.enter(PipelineState::Indexing);
        snapshot.check_compatible(self.embedder.model_id(), self.embedder.dimensions())?;

        let index = snapshot.into_index()?;
        if index.is_empty() {
            return Err(GroundedError::IndexBuild("snapshot holds no entries".to_string()));
        }

        let documents = index
            .entries()
            .iter()
            .map(|e| e.chunk.document_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let report = BuildReport {
            documents,
            failed_documents: 0,
            chunks: index.len(),
            dimensions: index.dimensions().unwrap_or_default(),
        };
        Ok(self.assemble(index, report))
    }

    fn assemble(&self, index: FlatIndex, report: BuildReport) -> RagPipeline {
        let index = Arc::new(index);
        let retriever = Retriever::new(index.clone(), self.embedder.clone())
            .with_top_k(self.top_k)
            .with_min_score(self.min_score)
            .with_timeout(self.embed_timeout);

        RagPipeline {
            index,
            retriever,
            assembler: self.assembler.clone(),
            generator: self.generator.clone(),
            model: self.embedder.model_id().to_string(),
            report,
        }
    }
}

/// A built, query-ready pipeline.
///
/// Read-only after construction; `ask` may be called concurrently.
pub struct RagPipeline {
    index: Arc<FlatIndex>,
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: GenerationClient,
    model: String,
    report: BuildReport,
}

impl RagPipeline {
    /// A constructed pipeline is always ready.
    pub fn state(&self) -> PipelineState {
        PipelineState::Ready
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Save the index as a snapshot tagged with the embedding model.
    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.index.save(path, &self.model)
    }

    /// Retrieve chunks without generating an answer.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.retriever.retrieve(query, k).await
    }

    /// Answer `question` using the configured `top_k`.
    pub async fn ask(&self, question: &str) -> Answer {
        self.ask_with_k(question, self.retriever.top_k()).await
    }

    /// Answer `question` from at most `k` chunks. Never fails; errors are
    /// reported through [`Answer::error`].
    #[instrument(skip(self), fields(k = k))]
    pub async fn ask_with_k(&self, question: &str, k: usize) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::failed(
                question,
                GroundedError::InvalidInput("question is empty".to_string()),
                Vec::new(),
            );
        }

        let results = match self.retriever.retrieve(question, k).await {
            Ok(results) => results,
            Err(e) => return Answer::failed(question, e, Vec::new()),
        };

        if results.is_empty() {
            info!("No relevant chunks for question");
            return Answer::new(question, self.assembler.no_context_answer().to_string(), Vec::new());
        }

        let prompt = match self.assembler.assemble(question, &results) {
            Ok(prompt) => prompt,
            Err(e) => return Answer::failed(question, e, Vec::new()),
        };

        let sources: Vec<SearchResult> = results.into_iter().take(prompt.included).collect();

        match self.generator.generate(&prompt.text).await {
            Completion::Text(text) => {
                debug!("Answered with {} sources", sources.len());
                Answer::new(question, text, sources)
            }
            Completion::Failed(e) => Answer::failed(question, e, sources),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::error::ErrorKind;
    use crate::generation::test_support::{FailingBackend, RecordingBackend};
    use crate::generation::CompletionRequest;
    use async_trait::async_trait;
    use std::fs;

    /// Backend that answers by quoting the first context line naming the
    /// subject, the way a model obeying the strict template would.
    struct ContextReader;

    #[async_trait]
    impl CompletionBackend for ContextReader {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            let context = request
                .prompt
                .split("Context:")
                .nth(1)
                .and_then(|rest| rest.split("Question:").next())
                .unwrap_or_default();
            Ok(context
                .lines()
                .find(|l| l.contains("dialect"))
                .unwrap_or("I don't know.")
                .trim()
                .to_string())
        }
    }

    /// Embedder that indexes fine but cannot embed questions.
    struct QueryDownEmbedder(HashingEmbedder);

    #[async_trait]
    impl Embedder for QueryDownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(GroundedError::ModelUnavailable("connection reset".to_string()))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.0.embed_batch(texts).await
        }

        fn dimensions(&self) -> usize {
            self.0.dimensions()
        }

        fn model_id(&self) -> &str {
            self.0.model_id()
        }
    }

    /// Embedder whose model is down.
    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(GroundedError::ModelUnavailable("connection refused".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(GroundedError::ModelUnavailable("connection refused".to_string()))
        }

        fn dimensions(&self) -> usize {
            8
        }

        fn model_id(&self) -> &str {
            "down"
        }
    }

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(384).unwrap())
    }

    fn write_corpus(dir: &Path) {
        fs::write(
            dir.join("languages.txt"),
            "The Quenti dialect is spoken only on the island of Marrowmere.\n\n\
             Marrowmere lies far to the north of every mapped coastline.",
        )
        .unwrap();
        fs::write(
            dir.join("baking.txt"),
            "Sourdough bread needs a starter culture, flour, water and salt.",
        )
        .unwrap();
        fs::write(
            dir.join("astronomy.md"),
            "Jupiter is the largest planet in the solar system.",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_build_and_ask_grounded_answer() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(ContextReader));
        assert_eq!(builder.state(), PipelineState::Idle);

        let pipeline = builder.build(dir.path()).await.unwrap();
        assert_eq!(builder.state(), PipelineState::Ready);
        assert_eq!(pipeline.report().documents, 3);

        let answer = pipeline.ask("Where is the Quenti dialect spoken?").await;
        assert!(!answer.is_error(), "{}", answer.text);
        assert!(answer.text.contains("Marrowmere"));
        assert_eq!(answer.sources[0].chunk.document_id, "languages.txt");
        assert!(answer.sources.len() <= 3);
    }

    #[tokio::test]
    async fn test_corpus_fact_overrides_world_knowledge() {
        let docs = vec![
            Document::new("facts.txt", "The Basque dialect is spoken in the lunar colony of Tycho Base."),
            Document::new("other.txt", "Tea is brewed by steeping leaves in hot water."),
        ];
        let backend = Arc::new(RecordingBackend::new("It is spoken in Tycho Base."));
        let mut builder = PipelineBuilder::new(embedder(), backend.clone());
        let pipeline = builder.build_from_documents(docs).await.unwrap();

        let answer = pipeline.ask("Where is the Basque dialect spoken?").await;
        assert!(answer.text.contains("Tycho Base"));

        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains("lunar colony of Tycho Base"));
        assert!(prompt.contains("ignored"));
        assert!(prompt.contains("ONLY"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(FailingBackend));
        let pipeline = builder.build(dir.path()).await.unwrap();

        let answer = pipeline.ask("Where is the Quenti dialect spoken?").await;
        assert!(answer.text.starts_with("[error]"));
        assert_eq!(answer.error.as_ref().unwrap().kind, ErrorKind::GenerationBackend);
        assert!(!answer.sources.is_empty());
        assert_eq!(pipeline.state(), PipelineState::Ready);

        // The pipeline keeps answering after a failure.
        let again = pipeline.ask("What does sourdough need?").await;
        assert!(again.is_error());
        assert_eq!(pipeline.state(), PipelineState::Ready);
    }

    #[tokio::test]
    async fn test_empty_corpus_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PipelineBuilder::new(embedder(), Arc::new(FailingBackend));

        let err = builder.build(dir.path()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::IndexBuild);
        assert_eq!(builder.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_embedder_down_fails_build() {
        let mut builder = PipelineBuilder::new(Arc::new(DownEmbedder), Arc::new(FailingBackend));
        let err = builder
            .build_from_documents(vec![Document::new("a.txt", "some text")])
            .await
            .err()
            .unwrap();

        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert_eq!(builder.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_corrupt_file_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        fs::write(dir.path().join("broken.txt"), [0xc3, 0x28, 0xff]).unwrap();

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(FailingBackend));
        let pipeline = builder.build(dir.path()).await.unwrap();

        assert_eq!(pipeline.report().documents, 3);
        assert_eq!(pipeline.report().failed_documents, 1);
    }

    #[tokio::test]
    async fn test_empty_question_is_error_answer() {
        let mut builder = PipelineBuilder::new(embedder(), Arc::new(RecordingBackend::new("x")));
        let pipeline = builder
            .build_from_documents(vec![Document::new("a.txt", "alpha beta gamma")])
            .await
            .unwrap();

        let answer = pipeline.ask("   ").await;
        assert_eq!(answer.error.unwrap().kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_no_relevant_chunks_skips_generation() {
        let backend = Arc::new(RecordingBackend::new("should not be called"));
        let mut builder = PipelineBuilder::new(embedder(), backend.clone()).with_min_score(0.99);
        let pipeline = builder
            .build_from_documents(vec![Document::new("a.txt", "alpha beta gamma")])
            .await
            .unwrap();

        let answer = pipeline.ask("unrelated astrophysics question").await;
        assert!(!answer.is_error());
        assert!(answer.sources.is_empty());
        assert!(backend.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_and_model_check() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let path = dir.path().join("out/index.json");

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(ContextReader));
        let pipeline = builder.build(dir.path()).await.unwrap();
        pipeline.save_index(&path).unwrap();

        let snapshot = FlatIndex::load(&path).unwrap();
        let restored = builder.from_snapshot(snapshot).unwrap();
        assert_eq!(restored.index().len(), pipeline.index().len());
        let answer = restored.ask("Where is the Quenti dialect spoken?").await;
        assert!(answer.text.contains("Marrowmere"));

        let mut other = PipelineBuilder::new(Arc::new(HashingEmbedder::new(128).unwrap()), Arc::new(ContextReader));
        let err = other.from_snapshot(FlatIndex::load(&path).unwrap()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::IndexBuild);
        assert_eq!(other.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn test_batched_embedding_preserves_order() {
        let docs: Vec<Document> = (0..20)
            .map(|i| Document::new(format!("doc{i}.txt"), format!("Unique topic number{i} keyword{i}.")))
            .collect();

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(RecordingBackend::new("ok")))
            .with_batch_size(3)
            .with_concurrency(4);
        let pipeline = builder.build_from_documents(docs).await.unwrap();

        let results = pipeline.search("keyword17 number17", 1).await.unwrap();
        assert_eq!(results[0].chunk.document_id, "doc17.txt");
    }

    #[tokio::test]
    async fn test_concurrent_queries() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let mut builder = PipelineBuilder::new(embedder(), Arc::new(ContextReader));
        let pipeline = Arc::new(builder.build(dir.path()).await.unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.ask("Where is the Quenti dialect spoken?").await })
            })
            .collect();

        for handle in handles {
            let answer = handle.await.unwrap();
            assert!(answer.text.contains("Marrowmere"));
        }
    }

    #[tokio::test]
    async fn test_from_settings() {
        let mut settings = Settings::default();
        settings.chunking.strategy = "fixed".to_string();
        settings.chunking.max_size = 40;
        settings.chunking.overlap = 10;
        settings.retrieval.top_k = 1;

        let mut builder =
            PipelineBuilder::from_settings(&settings, embedder(), Arc::new(RecordingBackend::new("ok"))).unwrap();
        let pipeline = builder
            .build_from_documents(vec![Document::new("a.txt", "word ".repeat(40))])
            .await
            .unwrap();

        assert!(pipeline.report().chunks > 1);
        let answer = pipeline.ask("word").await;
        assert_eq!(answer.sources.len(), 1);

        settings.chunking.strategy = "semantic".to_string();
        assert!(PipelineBuilder::from_settings(&settings, embedder(), Arc::new(FailingBackend)).is_err());
    }

    #[tokio::test]
    async fn test_question_embedding_failure_is_contained() {
        let embedder = Arc::new(QueryDownEmbedder(HashingEmbedder::new(64).unwrap()));
        let backend = Arc::new(RecordingBackend::new("unused"));
        let mut builder = PipelineBuilder::new(embedder, backend.clone());
        let pipeline = builder
            .build_from_documents(vec![Document::new("a.txt", "alpha beta gamma")])
            .await
            .unwrap();

        let answer = pipeline.ask("alpha?").await;
        assert!(answer.text.starts_with("[error]"));
        assert_eq!(answer.error.as_ref().unwrap().kind, ErrorKind::ModelUnavailable);
        assert!(answer.sources.is_empty());
        assert!(backend.last_prompt().is_none());
        assert_eq!(pipeline.state(), PipelineState::Ready);

        // Later questions still run through the pipeline.
        let again = pipeline.ask("beta?").await;
        assert_eq!(again.error.unwrap().kind, ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_prompt_budget_failure_is_contained() {
        let backend = Arc::new(RecordingBackend::new("unused"));
        let assembler = PromptAssembler::new(Prompts::default(), crate::config::GroundingMode::Strict)
            .with_max_chars(20);
        let mut builder = PipelineBuilder::new(embedder(), backend.clone()).with_assembler(assembler);
        let pipeline = builder
            .build_from_documents(vec![Document::new("a.txt", "alpha beta gamma")])
            .await
            .unwrap();

        let answer = pipeline.ask("alpha beta").await;
        assert!(answer.text.starts_with("[error]"));
        assert_eq!(answer.error.as_ref().unwrap().kind, ErrorKind::InvalidInput);
        assert!(backend.last_prompt().is_none());
        assert_eq!(pipeline.state(), PipelineState::Ready);
    }

    #[tokio::test]
    async fn test_snapshot_counts_interleaved_documents() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let mut entries = Vec::new();
        for (i, id) in ["a.txt", "b.txt", "a.txt", "c.txt", "b.txt"].iter().enumerate() {
            let text = format!("entry {i} of {id}");
            let chunk = crate::chunking::Chunk {
                document_id: id.to_string(),
                ordinal: i,
                start: 0,
                end: text.len(),
                overlap: 0,
                text: text.clone(),
            };
            entries.push(IndexEntry::new(chunk, embedder.embed(&text).await.unwrap()));
        }
        let index = FlatIndex::build(entries).unwrap();
        let snapshot = IndexSnapshot::new(embedder.model_id(), &index);

        let mut builder = PipelineBuilder::new(Arc::new(embedder), Arc::new(FailingBackend));
        let pipeline = builder.from_snapshot(snapshot).unwrap();

        assert_eq!(pipeline.report().documents, 3);
        assert_eq!(pipeline.report().chunks, 5);
    }
}

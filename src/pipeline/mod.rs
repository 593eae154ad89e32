//! Document-to-checklist pipeline
//!
//! This module handles:
//! - Segment summarization and prompt synthesis
//! - Refining a short checklist brief into a prompt
//! - Checklist generation under a ceiling policy
//! - Status indicators, task metadata and sample prompts
//! - Orchestrating a full run from a source to a persisted checklist

mod generator;
mod metadata;
mod refiner;
mod samples;
mod status;
mod summarizer;

pub use generator::{ChecklistGenerator, GenerationMode};
pub use metadata::{TaskMetadata, TaskMetadataGenerator};
pub use refiner::{ChecklistBrief, PromptRefiner};
pub use samples::{SamplePromptGenerator, MAX_SAMPLE_PROMPTS};
pub use status::StatusIndicatorGenerator;
pub use summarizer::{PromptSynthesizer, Summarizer};

use crate::checklist::{ChecklistNode, ChecklistSpec, ChecklistTreeBuilder, StatusIndicatorSet};
use crate::cluster::ClusterSelector;
use crate::config::{Config, PipelineSettings};
use crate::embedding::EmbeddingProvider;
use crate::error::{ChecklistError, Result};
use crate::ingest::{
    fingerprint_bytes, fingerprint_text, read_fingerprinted, validate_prompt_words,
    validate_text_words, Fingerprint, Segment, Source, SourceKind, TextChunker, TextExtractor,
};
use crate::llm::{parse_response, Completion};
use crate::storage::{Datastore, EmbeddingCache};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default embedding cache partition
pub const DEFAULT_SCOPE: &str = "default";

/// Run `task` over `inputs` with at most `max_concurrency` in flight
///
/// Results come back in input order. The first failure is returned and the
/// remaining tasks are aborted.
pub(crate) async fn run_bounded<I, R, F, Fut>(
    inputs: Vec<I>,
    max_concurrency: usize,
    task: F,
) -> Result<Vec<R>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut set = JoinSet::new();
    let total = inputs.len();

    for (index, input) in inputs.into_iter().enumerate() {
        let future = task(input);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| ChecklistError::Generation(e.to_string()))?;
            future.await.map(|result| (index, result))
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined
            .map_err(|e| ChecklistError::Generation(format!("Worker task failed: {}", e)))??;
        results.push((index, result));
    }

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}

/// What a pipeline run produced
///
/// An empty outcome means the model's answer held no usable checklist.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChecklistOutcome {
    pub checklist_id: Option<String>,
    pub nodes: Vec<ChecklistNode>,
    pub status_indicators: Option<StatusIndicatorSet>,
    /// Prompt written by the model when the run started from a brief
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_prompt: Option<String>,
}

impl ChecklistOutcome {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Orchestrates extraction, caching, clustering, generation and persistence
pub struct DocumentPipeline<'a> {
    completion: Arc<dyn Completion>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Box<dyn TextExtractor>,
    cache: &'a dyn EmbeddingCache,
    datastore: &'a dyn Datastore,
    chunker: TextChunker,
    selector: ClusterSelector,
    settings: PipelineSettings,
    document_mode: GenerationMode,
    project_id: Option<String>,
    scope: String,
    status_indicators: bool,
}

impl<'a> DocumentPipeline<'a> {
    pub fn new(
        completion: Arc<dyn Completion>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: &'a dyn EmbeddingCache,
        datastore: &'a dyn Datastore,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            completion,
            embedder,
            extractor: Box::new(config.extractor()?),
            cache,
            datastore,
            chunker: config.chunker()?,
            selector: ClusterSelector::new(config.pipeline.cluster_seed),
            settings: config.pipeline.clone(),
            document_mode: GenerationMode::Detailed,
            project_id: None,
            scope: DEFAULT_SCOPE.to_string(),
            status_indicators: true,
        })
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Attach every generated node to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Embedding cache partition, usually an organization
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Generation mode used for document and text checklists
    pub fn with_document_mode(mut self, mode: GenerationMode) -> Self {
        self.document_mode = mode;
        self
    }

    pub fn with_status_indicators(mut self, enabled: bool) -> Self {
        self.status_indicators = enabled;
        self
    }

    /// Checklist from a file, URL, byte buffer or text
    pub async fn checklist_from_source(
        &self,
        source: Source,
        name: &str,
    ) -> Result<ChecklistOutcome> {
        let (fingerprint, source) = match source {
            Source::File(path) => {
                let kind = SourceKind::from_path(&path).ok_or_else(|| {
                    ChecklistError::UnsupportedContent(format!(
                        "unrecognized file type: {}",
                        path.display()
                    ))
                })?;
                let (fingerprint, bytes) =
                    tokio::task::spawn_blocking(move || read_fingerprinted(&path))
                        .await
                        .map_err(|e| {
                            ChecklistError::Generation(format!("File read task failed: {}", e))
                        })??;
                (fingerprint, Source::Bytes { bytes, kind })
            }
            Source::Bytes { bytes, kind } => {
                (fingerprint_bytes(&bytes), Source::Bytes { bytes, kind })
            }
            Source::Url(url) => (fingerprint_text(&url), Source::Url(url)),
            Source::Text(text) => (fingerprint_text(&text), Source::Text(text)),
        };

        let text = self.extractor.extract(&source).await?;

        tracing::info!(
            "Extracted {} chars from {} ({})",
            text.len(),
            name,
            fingerprint
        );
        self.run_document(&text, name, &fingerprint).await
    }

    /// Checklist from free text, through clustering and summarization
    pub async fn checklist_from_text(&self, text: &str, name: &str) -> Result<ChecklistOutcome> {
        validate_text_words(text)?;
        self.run_document(text, name, &fingerprint_text(text)).await
    }

    /// Checklist straight from a user prompt
    pub async fn checklist_from_prompt(
        &self,
        prompt: &str,
        mode: GenerationMode,
    ) -> Result<ChecklistOutcome> {
        validate_prompt_words(prompt)?;

        let generator = ChecklistGenerator::new(Arc::clone(&self.completion), self.settings.clone());
        let raw = generator.generate(prompt.trim(), mode).await?;
        self.finish(&raw, &generator, mode).await
    }

    /// Checklist from a brief, generated from the prompt the model refines
    /// out of it
    ///
    /// The refined prompt is not held to the user prompt word bounds.
    pub async fn checklist_from_brief(
        &self,
        brief: &ChecklistBrief,
        mode: GenerationMode,
    ) -> Result<ChecklistOutcome> {
        let refined = PromptRefiner::new(Arc::clone(&self.completion))
            .refine(brief)
            .await?;

        let generator = ChecklistGenerator::new(Arc::clone(&self.completion), self.settings.clone());
        let raw = generator.generate(&refined, mode).await?;
        let mut outcome = self.finish(&raw, &generator, mode).await?;
        outcome.refined_prompt = Some(refined);
        Ok(outcome)
    }

    /// Checklist from free text in a single call, skipping clustering
    pub async fn checklist_direct(
        &self,
        text: &str,
        extra_prompt: Option<&str>,
    ) -> Result<ChecklistOutcome> {
        validate_text_words(text)?;

        let generator = ChecklistGenerator::new(Arc::clone(&self.completion), self.settings.clone());
        let raw = generator.generate_direct(text, extra_prompt).await?;
        self.finish(&raw, &generator, GenerationMode::Combined).await
    }

    /// Cached segments and embeddings for a document, computing them on a miss
    pub async fn load_or_embed(
        &self,
        text: &str,
        name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<(Vec<Segment>, Vec<Vec<f32>>)> {
        if let Some(cached) = self.cache.lookup(fingerprint, &self.scope)? {
            tracing::info!(
                "Embedding cache hit for {} ({} segments)",
                name,
                cached.segments.len()
            );
            return Ok((cached.segments, cached.embeddings));
        }

        let segments = self.chunker.split(text);
        if segments.is_empty() {
            return Err(ChecklistError::InputValidation(format!("{} has no text", name)));
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != segments.len() {
            return Err(ChecklistError::Generation(format!(
                "embedding model returned {} vectors for {} segments",
                embeddings.len(),
                segments.len()
            )));
        }

        self.cache
            .store(fingerprint, &self.scope, name, &segments, &embeddings)?;
        tracing::info!("Embedded and cached {} segments for {}", segments.len(), name);

        Ok((segments, embeddings))
    }

    async fn run_document(
        &self,
        text: &str,
        name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<ChecklistOutcome> {
        let (segments, embeddings) = self.load_or_embed(text, name, fingerprint).await?;
        let representatives = self.selector.select_representatives(&segments, &embeddings)?;

        let summarizer = Summarizer::new(Arc::clone(&self.completion), self.settings.max_concurrency);
        let summaries = summarizer.summarize(&representatives).await?;

        let synthesizer = PromptSynthesizer::new(Arc::clone(&self.completion));
        let prompt = synthesizer.synthesize(&summaries).await?;

        let generator = ChecklistGenerator::new(Arc::clone(&self.completion), self.settings.clone());
        let raw = generator.generate(&prompt, self.document_mode).await?;
        self.finish(&raw, &generator, self.document_mode).await
    }

    async fn finish(
        &self,
        raw: &str,
        generator: &ChecklistGenerator,
        mode: GenerationMode,
    ) -> Result<ChecklistOutcome> {
        let Some(spec) = parse_response(raw).and_then(|value| ChecklistSpec::from_value(&value))
        else {
            tracing::warn!("Model output held no usable checklist");
            return Ok(ChecklistOutcome::default());
        };

        let mut builder = ChecklistTreeBuilder::new(self.project_id.clone());
        if self.settings.enforce_ceiling {
            builder = builder.with_ceiling(generator.ceiling(mode));
        }
        let nodes = builder.build(spec);

        let Some(root) = nodes.first() else {
            return Ok(ChecklistOutcome::default());
        };

        let status_indicators = if self.status_indicators {
            let task_titles: Vec<String> = nodes
                .iter()
                .filter(|node| node.parent_id.as_deref() == Some(root.id.as_str()))
                .map(|node| node.title.clone())
                .collect();
            StatusIndicatorGenerator::new(Arc::clone(&self.completion))
                .generate(&root.title, &task_titles)
                .await?
        } else {
            None
        };

        self.datastore
            .save_checklist(&nodes, status_indicators.as_ref())?;
        tracing::info!("Saved checklist '{}' with {} nodes", root.title, nodes.len());

        Ok(ChecklistOutcome {
            checklist_id: Some(root.id.clone()),
            nodes,
            status_indicators,
            refined_prompt: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedding;
    use crate::llm::{MockCompletion, MockFailure};
    use crate::storage::Database;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const STATUS_RESPONSE: &str =
        "```json\n{\"status_indicators\": [\"Done\", \"In progress\", \"Blocked\", \"N/A\"]}\n```";

    const FIVE_TASKS: &str = r#"```json
{
  "title": "Store opening",
  "tasks": [
    {"title": "Unlock doors", "priority": "High"},
    {"title": "Count float", "priority": "Medium", "subtasks": ["Notes", "Coins"]},
    {"title": "Check fridges"},
    {"title": "Switch on lights", "priority": "Low"},
    {"title": "Open tills"}
  ]
}
```"#;

    struct CountingEmbedding {
        inner: MockEmbedding,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedding {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn long_text() -> String {
        (0..150)
            .map(|i| format!("step{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn pipeline<'a>(client: Arc<MockCompletion>, db: &'a Database) -> DocumentPipeline<'a> {
        DocumentPipeline::new(
            client,
            Arc::new(MockEmbedding::new(8)),
            db,
            db,
            &Config::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_bounded_keeps_input_order() {
        let results = run_bounded(vec![30u64, 10, 20, 0], 2, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(delay * 2)
        })
        .await
        .unwrap();
        assert_eq!(results, vec![60, 20, 40, 0]);
    }

    #[tokio::test]
    async fn test_run_bounded_respects_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (in_flight_task, peak_task) = (Arc::clone(&in_flight), Arc::clone(&peak));
        run_bounded((0..8).collect::<Vec<u32>>(), 3, move |_| {
            let in_flight = Arc::clone(&in_flight_task);
            let peak = Arc::clone(&peak_task);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_run_bounded_first_failure() {
        let result = run_bounded(vec![1, 2, 3], 3, |n| async move {
            if n == 2 {
                Err(ChecklistError::Generation("boom".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert!(matches!(result, Err(ChecklistError::Generation(_))));
    }

    #[tokio::test]
    async fn test_prompt_checklist_flat_ceiling() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_response("status indicators", STATUS_RESPONSE),
        );
        let mut config = Config::default();
        config.pipeline.flat_ceiling = 3;
        let pipeline = DocumentPipeline::new(
            client,
            Arc::new(MockEmbedding::new(8)),
            &db,
            &db,
            &config,
        )
        .unwrap();

        let outcome = pipeline
            .checklist_from_prompt("Open the store each morning", GenerationMode::Flat)
            .await
            .unwrap();

        let titles: Vec<&str> = outcome.nodes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Store opening", "Unlock doors", "Count float", "Check fridges"]
        );

        let stored = db
            .load_checklist(outcome.checklist_id.as_deref().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.nodes, outcome.nodes);
        assert_eq!(stored.status_indicators, vec!["Done", "In progress", "Blocked", "N/A"]);
    }

    #[tokio::test]
    async fn test_combined_ceiling_drops_weakest_leaves() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_response("status indicators", STATUS_RESPONSE),
        );
        let mut config = Config::default();
        config.pipeline.combined_ceiling = 5;
        let pipeline = DocumentPipeline::new(
            client,
            Arc::new(MockEmbedding::new(8)),
            &db,
            &db,
            &config,
        )
        .unwrap();

        let outcome = pipeline
            .checklist_from_prompt("Open the store each morning", GenerationMode::Combined)
            .await
            .unwrap();

        // 7 tasks; the unprioritized leaves go first, latest order first
        let titles: Vec<&str> = outcome.nodes.iter().skip(1).map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Unlock doors", "Count float", "Notes", "Coins", "Switch on lights"]
        );
    }

    #[tokio::test]
    async fn test_unusable_output_persists_nothing() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(MockCompletion::new().with_default("Sorry, I cannot help with that."));

        let outcome = pipeline(client, &db)
            .checklist_from_prompt("Plan a team offsite", GenerationMode::Detailed)
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert!(outcome.checklist_id.is_none());
        assert_eq!(db.get_stats().unwrap().checklists, 0);
    }

    #[tokio::test]
    async fn test_status_failure_persists_nothing() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_failure("status indicators", MockFailure::Backend("down".to_string())),
        );

        let result = pipeline(client, &db)
            .checklist_from_prompt("Open the store each morning", GenerationMode::Detailed)
            .await;

        assert!(matches!(result, Err(ChecklistError::Generation(_))));
        assert_eq!(db.get_stats().unwrap().checklist_nodes, 0);
    }

    #[tokio::test]
    async fn test_short_prompt_rejected_before_generation() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(MockCompletion::new());

        let result = pipeline(client.clone(), &db)
            .checklist_from_prompt("too short", GenerationMode::Detailed)
            .await;

        assert!(matches!(result, Err(ChecklistError::InputValidation(_))));
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_text_checklist_uses_cache_on_repeat() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("Summarize", "A long list of steps")
                .with_response("Summarized Text", "Create a checklist for the steps")
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_response("status indicators", STATUS_RESPONSE),
        );
        let embedder = Arc::new(CountingEmbedding {
            inner: MockEmbedding::new(8),
            calls: AtomicUsize::new(0),
        });
        let pipeline = DocumentPipeline::new(
            client,
            embedder.clone(),
            &db,
            &db,
            &Config::default(),
        )
        .unwrap()
        .with_project("proj-1");

        let text = long_text();
        let first = pipeline.checklist_from_text(&text, "steps.txt").await.unwrap();
        let second = pipeline.checklist_from_text(&text, "steps.txt").await.unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_ne!(first.checklist_id, second.checklist_id);
        assert!(first
            .nodes
            .iter()
            .all(|n| n.project_id.as_deref() == Some("proj-1")));

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.checklists, 2);
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_cache() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_default("summary"),
        );
        let embedder = Arc::new(CountingEmbedding {
            inner: MockEmbedding::new(8),
            calls: AtomicUsize::new(0),
        });
        let text = long_text();

        for scope in ["org-a", "org-b"] {
            DocumentPipeline::new(client.clone(), embedder.clone(), &db, &db, &Config::default())
                .unwrap()
                .with_scope(scope)
                .with_status_indicators(false)
                .checklist_from_text(&text, "steps.txt")
                .await
                .unwrap();
        }

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(db.get_stats().unwrap().documents, 2);
    }

    #[tokio::test]
    async fn test_direct_checklist() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(
            MockCompletion::new()
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_response("status indicators", STATUS_RESPONSE),
        );

        let outcome = pipeline(client.clone(), &db)
            .checklist_direct(&long_text(), Some("Mornings only"))
            .await
            .unwrap();

        assert_eq!(outcome.nodes.len(), 8);
        assert!(!client.prompts().iter().any(|p| p.contains("Summarize")));
    }

    #[tokio::test]
    async fn test_brief_checklist_generated_from_refined_prompt() {
        let db = Database::open_in_memory().unwrap();
        let refined = format!("Create a store opening checklist. {}", "Be thorough. ".repeat(60));
        let client = Arc::new(
            MockCompletion::new()
                .with_response("checklist brief", &refined)
                .with_response("expert checklist creator", FIVE_TASKS)
                .with_response("status indicators", STATUS_RESPONSE),
        );
        let brief = ChecklistBrief::new("Store opening", "Retail ops")
            .with_role(Some("Shift manager".to_string()));

        let outcome = pipeline(client.clone(), &db)
            .with_project("proj-7")
            .checklist_from_brief(&brief, GenerationMode::Detailed)
            .await
            .unwrap();

        assert_eq!(outcome.refined_prompt.as_deref(), Some(refined.trim()));
        assert_eq!(outcome.nodes[0].title, "Store opening");
        assert!(outcome
            .nodes
            .iter()
            .all(|n| n.project_id.as_deref() == Some("proj-7")));

        let prompts = client.prompts();
        assert!(prompts[0].contains("Role: \"Shift manager\""));
        assert!(prompts[1].contains("expert checklist creator"));
        assert!(prompts[1].contains("Create a store opening checklist."));

        let stored = db
            .load_checklist(outcome.checklist_id.as_deref().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.nodes, outcome.nodes);
    }

    #[tokio::test]
    async fn test_brief_without_team_rejected() {
        let db = Database::open_in_memory().unwrap();
        let client = Arc::new(MockCompletion::new());

        let result = pipeline(client.clone(), &db)
            .checklist_from_brief(&ChecklistBrief::new("Audit", ""), GenerationMode::Flat)
            .await;
        assert!(matches!(result, Err(ChecklistError::InputValidation(_))));
        assert!(client.prompts().is_empty());
        assert_eq!(db.get_stats().unwrap().checklists, 0);
    }

    #[tokio::test]
    async fn test_unsupported_file_rejected() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let result = pipeline(Arc::new(MockCompletion::new()), &db)
            .checklist_from_source(Source::File(path), "scan.pdf")
            .await;
        assert!(matches!(result, Err(ChecklistError::UnsupportedContent(_))));
    }

    #[tokio::test]
    async fn test_empty_file_is_bad_input() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.md");
        std::fs::write(&path, "  \n\n").unwrap();

        let client = Arc::new(MockCompletion::new());
        let result = pipeline(client.clone(), &db)
            .checklist_from_source(Source::File(path), "blank.md")
            .await;

        assert!(matches!(result, Err(ChecklistError::InputValidation(_))));
        assert!(client.prompts().is_empty());
        assert_eq!(db.get_stats().unwrap().documents, 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = pipeline(Arc::new(MockCompletion::new()), &db)
            .checklist_from_source(Source::File(dir.path().join("gone.txt")), "gone.txt")
            .await;
        assert!(matches!(result, Err(ChecklistError::Io(_))));
    }
}

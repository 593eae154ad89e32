//! Command implementations

use crate::checklist::{ChecklistNode, StatusIndicatorSet};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, HttpEmbedding};
use crate::error::ChecklistError;
use crate::ingest::Source;
use crate::llm::{Completion, LlmClient};
use crate::pipeline::{
    ChecklistBrief, ChecklistOutcome, DocumentPipeline, GenerationMode, PromptRefiner,
    SamplePromptGenerator, StatusIndicatorGenerator, TaskMetadata, TaskMetadataGenerator,
};
use crate::storage::{Database, DatabaseStats, Datastore, StoredChecklist};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved configuration and backends for one invocation
pub struct Session {
    pub config: Config,
    pub config_path: PathBuf,
}

impl Session {
    /// Load configuration, applying command-line overrides
    pub fn load(
        config_path: Option<&Path>,
        db_path: Option<&Path>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);
        let mut config = Config::load_or_default(&config_path)?;

        if let Some(db_path) = db_path {
            config.storage.database_path = db_path.to_path_buf();
        }
        config.apply_api_key(api_key);

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn open_database(&self) -> Result<Database> {
        let path = &self.config.storage.database_path;
        Database::open(path).with_context(|| format!("Failed to open database: {:?}", path))
    }

    pub fn completion(&self) -> Arc<dyn Completion> {
        Arc::new(LlmClient::new(self.config.llm_config()))
    }

    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider = HttpEmbedding::from_settings(&self.config.embedding, self.config.timeout())?;
        Ok(Arc::new(provider))
    }
}

/// Where a document checklist comes from
pub enum DocumentInput {
    File(PathBuf),
    Url(String),
}

/// Generate and save a checklist from a prompt
pub async fn prompt(
    session: &Session,
    text: &str,
    mode: GenerationMode,
    project: Option<&str>,
) -> Result<ChecklistOutcome> {
    let db = session.open_database()?;
    let pipeline = build_pipeline(session, &db, project, None)?;
    let outcome = pipeline.checklist_from_prompt(text, mode).await?;
    require_checklist(outcome)
}

/// Refine a brief into a prompt, then generate and save a checklist from it
pub async fn refine(
    session: &Session,
    brief: &ChecklistBrief,
    mode: GenerationMode,
    project: Option<&str>,
) -> Result<ChecklistOutcome> {
    let db = session.open_database()?;
    let pipeline = build_pipeline(session, &db, project, None)?;
    let outcome = pipeline.checklist_from_brief(brief, mode).await?;
    require_checklist(outcome)
}

/// Only the refined prompt for a brief
pub async fn refine_prompt(session: &Session, brief: &ChecklistBrief) -> Result<String> {
    Ok(PromptRefiner::new(session.completion()).refine(brief).await?)
}

/// Generate and save a checklist from a file or a web page
pub async fn document(
    session: &Session,
    input: DocumentInput,
    scope: &str,
    project: Option<&str>,
    mode: GenerationMode,
) -> Result<ChecklistOutcome> {
    let db = session.open_database()?;
    let pipeline = build_pipeline(session, &db, project, Some(scope))?.with_document_mode(mode);

    let outcome = match input {
        DocumentInput::File(path) => {
            if !path.exists() {
                return Err(ChecklistError::InputValidation(format!(
                    "file not found: {}",
                    path.display()
                ))
                .into());
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            pipeline.checklist_from_source(Source::File(path), &name).await?
        }
        DocumentInput::Url(url) => {
            let name = url.clone();
            pipeline.checklist_from_source(Source::Url(url), &name).await?
        }
    };

    require_checklist(outcome)
}

/// Generate and save a checklist from free text in a file or on stdin
pub async fn text(
    session: &Session,
    input: &str,
    direct: bool,
    extra_prompt: Option<&str>,
    scope: &str,
    project: Option<&str>,
) -> Result<ChecklistOutcome> {
    let (content, name) = read_text_input(input)?;

    let db = session.open_database()?;
    let pipeline = build_pipeline(session, &db, project, Some(scope))?;

    let outcome = if direct {
        pipeline.checklist_direct(&content, extra_prompt).await?
    } else {
        pipeline.checklist_from_text(&content, &name).await?
    };

    require_checklist(outcome)
}

/// Suggest status indicators without saving anything
pub async fn status_indicators(
    session: &Session,
    title: &str,
    tasks: &[String],
) -> Result<StatusIndicatorSet> {
    let generator = StatusIndicatorGenerator::new(session.completion());
    generator.generate(title, tasks).await?.ok_or_else(|| {
        ChecklistError::Generation("model output held no usable status indicators".to_string())
            .into()
    })
}

pub async fn metadata(
    session: &Session,
    checklist: &str,
    tasks: &[String],
) -> Result<Vec<TaskMetadata>> {
    let generator =
        TaskMetadataGenerator::new(session.completion(), session.config.pipeline.max_concurrency);
    Ok(generator.generate(checklist, tasks).await?)
}

pub async fn samples(session: &Session, job_role: &str, industry: &str) -> Result<Vec<String>> {
    let generator = SamplePromptGenerator::new(session.completion());
    Ok(generator.generate(job_role, industry).await?)
}

/// Load a saved checklist by its root id
pub fn show(session: &Session, id: &str) -> Result<StoredChecklist> {
    let db = session.open_database()?;
    db.load_checklist(id)?
        .ok_or_else(|| anyhow::anyhow!("Checklist not found: {}", id))
}

pub fn cache_stats(session: &Session) -> Result<DatabaseStats> {
    let db = session.open_database()?;
    Ok(db.get_stats()?)
}

fn build_pipeline<'a>(
    session: &Session,
    db: &'a Database,
    project: Option<&str>,
    scope: Option<&str>,
) -> Result<DocumentPipeline<'a>> {
    let mut pipeline = DocumentPipeline::new(
        session.completion(),
        session.embedder()?,
        db,
        db,
        &session.config,
    )?;

    if let Some(project) = project {
        pipeline = pipeline.with_project(project);
    }
    if let Some(scope) = scope {
        pipeline = pipeline.with_scope(scope);
    }

    Ok(pipeline)
}

fn read_text_input(input: &str) -> Result<(String, String)> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read text from stdin")?;
        return Ok((content, "stdin".to_string()));
    }

    let path = Path::new(input);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    Ok((content, name))
}

fn require_checklist(outcome: ChecklistOutcome) -> Result<ChecklistOutcome> {
    if outcome.is_empty() {
        return Err(ChecklistError::Generation(
            "model output held no usable checklist".to_string(),
        )
        .into());
    }
    Ok(outcome)
}

/// Print any serializable result as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a checklist as an indented outline
pub fn print_checklist_text(nodes: &[ChecklistNode], status_indicators: &[String]) {
    let Some(root) = nodes.first() else {
        println!("Empty checklist.");
        return;
    };

    println!("{}", root.title);
    println!("{}", "=".repeat(root.title.chars().count()));
    println!("ID: {}\n", root.id);

    let mut depths: HashMap<&str, usize> = HashMap::new();
    depths.insert(root.id.as_str(), 0);

    for node in nodes.iter().skip(1) {
        let depth = node
            .parent_id
            .as_deref()
            .and_then(|parent| depths.get(parent))
            .map_or(1, |d| d + 1);
        depths.insert(node.id.as_str(), depth);

        let indent = "  ".repeat(depth - 1);
        let mut line = format!("{}- [ ] {}", indent, node.title);
        if let Some(priority) = &node.priority {
            line.push_str(&format!(" [{}]", priority));
        }
        if let Some(estimate) = &node.time_estimate {
            line.push_str(&format!(" ({})", estimate));
        }
        println!("{}", line);

        if let Some(description) = &node.description {
            println!("{}      {}", indent, description);
        }
    }

    if !status_indicators.is_empty() {
        println!("\nStatus indicators: {}", status_indicators.join(" | "));
    }
}

pub fn print_outcome_text(outcome: &ChecklistOutcome) {
    if let Some(prompt) = &outcome.refined_prompt {
        println!("Prompt: {}\n", prompt);
    }
    let labels = outcome
        .status_indicators
        .as_ref()
        .map(|set| set.labels().to_vec())
        .unwrap_or_default();
    print_checklist_text(&outcome.nodes, &labels);
    println!("\n✓ Saved checklist with {} tasks", outcome.nodes.len().saturating_sub(1));
}

pub fn print_metadata_text(metadata: &[TaskMetadata]) {
    if metadata.is_empty() {
        println!("No task metadata generated.");
        return;
    }

    for item in metadata {
        println!("{}", item.task);
        let fields = [
            ("Description", &item.description),
            ("Completion criteria", &item.completion_criteria),
            ("Complexity", &item.complexity),
            ("Priority", &item.priority),
            ("Estimated time", &item.estimated_time_to_complete),
            ("Frequency", &item.frequency),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                println!("   {}: {}", label, value);
            }
        }
        for (i, step) in item.instructions.iter().enumerate() {
            println!("   {}. {}", i + 1, step);
        }
        for reference in &item.references {
            println!("   See: {}", reference);
        }
        println!();
    }
}

pub fn print_stats_text(stats: &DatabaseStats) {
    println!("checklistgen Cache");
    println!("==================\n");
    println!("Cached documents: {}", stats.documents);
    println!("Cached segments: {}", stats.segments);
    println!("Saved checklists: {}", stats.checklists);
    println!("Checklist nodes: {}", stats.checklist_nodes);
    println!("Status indicators: {}", stats.status_indicators);
}

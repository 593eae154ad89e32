//! CLI interface using clap
//!
//! Provides the command-line interface for checklistgen

mod commands;

pub use commands::*;

use crate::pipeline::{ChecklistBrief, GenerationMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// checklistgen - Turn prompts and documents into checklists
#[derive(Parser, Debug)]
#[command(name = "checklistgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides storage.database_path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// API key for the LLM and embedding backends
    #[arg(long, global = true, env = "CHECKLISTGEN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a checklist from a short prompt
    Prompt(PromptArgs),

    /// Refine a checklist brief into a prompt, then generate from it
    Refine(RefineArgs),

    /// Generate a checklist from a document on disk
    Document(DocumentArgs),

    /// Generate a checklist from a web page
    Url(UrlArgs),

    /// Generate a checklist from free text
    Text(TextArgs),

    /// Suggest status indicators for a checklist
    StatusIndicators(StatusIndicatorArgs),

    /// Generate metadata for checklist tasks
    Metadata(MetadataArgs),

    /// Suggest sample prompts for a job role
    Samples(SamplesArgs),

    /// Show a saved checklist
    Show(ShowArgs),

    /// Show embedding cache and checklist counts
    CacheStats,

    /// Show configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for prompt command
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// What the checklist is for (3 to 100 words)
    pub text: String,

    /// Ceiling policy
    #[arg(short, long, value_enum, default_value_t = GenerationMode::Detailed)]
    pub mode: GenerationMode,

    /// Project to attach the checklist to
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Arguments for refine command
#[derive(Parser, Debug)]
pub struct RefineArgs {
    /// Checklist name, e.g. "On-page SEO"
    pub name: String,

    /// Team or project the checklist serves
    #[arg(short, long)]
    pub team: String,

    #[arg(long)]
    pub organization: Option<String>,

    /// Role of the person who will use the checklist
    #[arg(short, long)]
    pub role: Option<String>,

    /// Ceiling policy
    #[arg(short, long, value_enum, default_value_t = GenerationMode::Detailed)]
    pub mode: GenerationMode,

    /// Project to attach the checklist to
    #[arg(short, long)]
    pub project: Option<String>,

    /// Print the refined prompt without generating a checklist
    #[arg(long)]
    pub prompt_only: bool,
}

impl RefineArgs {
    pub fn brief(&self) -> ChecklistBrief {
        ChecklistBrief::new(self.name.as_str(), self.team.as_str())
            .with_organization(self.organization.clone())
            .with_role(self.role.clone())
    }
}

/// Arguments for document command
#[derive(Parser, Debug)]
pub struct DocumentArgs {
    /// Document to read (txt, md, html, csv)
    pub path: PathBuf,

    /// Embedding cache partition
    #[arg(short, long, default_value = crate::pipeline::DEFAULT_SCOPE)]
    pub scope: String,

    /// Project to attach the checklist to
    #[arg(short, long)]
    pub project: Option<String>,

    /// Ceiling policy
    #[arg(short, long, value_enum, default_value_t = GenerationMode::Detailed)]
    pub mode: GenerationMode,
}

/// Arguments for url command
#[derive(Parser, Debug)]
pub struct UrlArgs {
    /// Page to fetch
    pub url: String,

    /// Embedding cache partition
    #[arg(short, long, default_value = crate::pipeline::DEFAULT_SCOPE)]
    pub scope: String,

    /// Project to attach the checklist to
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Arguments for text command
#[derive(Parser, Debug)]
pub struct TextArgs {
    /// File holding the text, or "-" for stdin
    pub input: String,

    /// Generate in one call instead of summarizing first
    #[arg(short, long)]
    pub direct: bool,

    /// Extra instructions for direct generation
    #[arg(long, requires = "direct")]
    pub prompt: Option<String>,

    /// Embedding cache partition
    #[arg(short, long, default_value = crate::pipeline::DEFAULT_SCOPE)]
    pub scope: String,

    /// Project to attach the checklist to
    #[arg(long)]
    pub project: Option<String>,
}

/// Arguments for status-indicators command
#[derive(Parser, Debug)]
pub struct StatusIndicatorArgs {
    /// Checklist title
    pub title: String,

    /// Top-level task titles
    #[arg(required = true)]
    pub tasks: Vec<String>,
}

/// Arguments for metadata command
#[derive(Parser, Debug)]
pub struct MetadataArgs {
    /// Checklist title
    pub checklist: String,

    /// Task titles
    #[arg(required = true)]
    pub tasks: Vec<String>,
}

/// Arguments for samples command
#[derive(Parser, Debug)]
pub struct SamplesArgs {
    pub job_role: String,
    pub industry: String,
}

/// Arguments for show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Checklist (root node) id
    pub id: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Reset to defaults
    #[arg(long)]
    pub reset: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["checklistgen", "prompt", "Open a coffee shop", "--mode", "flat"]);
        if let Commands::Prompt(args) = cli.command {
            assert_eq!(args.text, "Open a coffee shop");
            assert_eq!(args.mode, GenerationMode::Flat);
        } else {
            panic!("expected prompt command");
        }
    }

    #[test]
    fn test_text_command() {
        let cli = Cli::parse_from(["checklistgen", "text", "-", "--direct", "--prompt", "Safety only"]);
        if let Commands::Text(args) = cli.command {
            assert_eq!(args.input, "-");
            assert!(args.direct);
            assert_eq!(args.prompt.as_deref(), Some("Safety only"));
            assert_eq!(args.scope, "default");
        } else {
            panic!("expected text command");
        }
    }

    #[test]
    fn test_extra_prompt_requires_direct() {
        let result = Cli::try_parse_from(["checklistgen", "text", "notes.txt", "--prompt", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_refine_command() {
        assert!(Cli::try_parse_from(["checklistgen", "refine", "On-page SEO"]).is_err());

        let cli = Cli::parse_from([
            "checklistgen",
            "refine",
            "On-page SEO",
            "--team",
            "SEO",
            "--role",
            "Content lead",
            "--prompt-only",
        ]);
        if let Commands::Refine(args) = cli.command {
            assert!(args.prompt_only);
            assert_eq!(args.mode, GenerationMode::Detailed);
            let brief = args.brief();
            assert_eq!(brief.team, "SEO");
            assert_eq!(brief.role.as_deref(), Some("Content lead"));
            assert!(brief.organization.is_none());
        } else {
            panic!("expected refine command");
        }
    }

    #[test]
    fn test_status_indicators_need_tasks() {
        assert!(Cli::try_parse_from(["checklistgen", "status-indicators", "Audit"]).is_err());
        let cli = Cli::parse_from(["checklistgen", "status-indicators", "Audit", "a", "b"]);
        assert!(matches!(cli.command, Commands::StatusIndicators(ref args) if args.tasks.len() == 2));
    }
}

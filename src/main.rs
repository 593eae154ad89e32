//! checklistgen - Turn prompts and documents into checklists
//!
//! Command-line front end for the checklist pipeline.

use anyhow::Result;
use checklistgen::cli::{
    cache_stats, document, metadata, print_checklist_text, print_json, print_metadata_text,
    print_outcome_text, print_stats_text, prompt, refine, refine_prompt, samples, show,
    status_indicators, text, Cli, Commands, ConfigArgs, DocumentInput, OutputFormat, Session,
};
use checklistgen::{ChecklistError, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status when running the same command again may succeed (EX_TEMPFAIL)
const EXIT_RETRYABLE: i32 = 75;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let verbose = cli.verbose;
    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<ChecklistError>() {
            Some(checklist_err) => {
                eprintln!("Error: {}", checklist_err.user_message());
                if verbose {
                    eprintln!("  Cause: {:#}", err);
                }
                if checklist_err.is_retryable() {
                    EXIT_RETRYABLE
                } else {
                    1
                }
            }
            None => {
                eprintln!("Error: {:#}", err);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::load(cli.config.as_deref(), cli.db.as_deref(), cli.api_key)?;
    let format = cli.format;

    // Execute command
    match cli.command {
        Commands::Prompt(args) => {
            let outcome = prompt(&session, &args.text, args.mode, args.project.as_deref()).await?;
            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Text => print_outcome_text(&outcome),
            }
        }

        Commands::Refine(args) => {
            let brief = args.brief();
            if args.prompt_only {
                let refined = refine_prompt(&session, &brief).await?;
                match format {
                    OutputFormat::Json => print_json(&serde_json::json!({
                        "brief": brief,
                        "prompt": refined,
                    }))?,
                    OutputFormat::Text => println!("{}", refined),
                }
            } else {
                let outcome =
                    refine(&session, &brief, args.mode, args.project.as_deref()).await?;
                match format {
                    OutputFormat::Json => print_json(&outcome)?,
                    OutputFormat::Text => print_outcome_text(&outcome),
                }
            }
        }

        Commands::Document(args) => {
            let outcome = document(
                &session,
                DocumentInput::File(args.path),
                &args.scope,
                args.project.as_deref(),
                args.mode,
            )
            .await?;
            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Text => print_outcome_text(&outcome),
            }
        }

        Commands::Url(args) => {
            let outcome = document(
                &session,
                DocumentInput::Url(args.url),
                &args.scope,
                args.project.as_deref(),
                Default::default(),
            )
            .await?;
            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Text => print_outcome_text(&outcome),
            }
        }

        Commands::Text(args) => {
            let outcome = text(
                &session,
                &args.input,
                args.direct,
                args.prompt.as_deref(),
                &args.scope,
                args.project.as_deref(),
            )
            .await?;
            match format {
                OutputFormat::Json => print_json(&outcome)?,
                OutputFormat::Text => print_outcome_text(&outcome),
            }
        }

        Commands::StatusIndicators(args) => {
            let set = status_indicators(&session, &args.title, &args.tasks).await?;
            match format {
                OutputFormat::Json => print_json(&set)?,
                OutputFormat::Text => {
                    for label in set.labels() {
                        println!("{}", label);
                    }
                }
            }
        }

        Commands::Metadata(args) => {
            let items = metadata(&session, &args.checklist, &args.tasks).await?;
            match format {
                OutputFormat::Json => print_json(&items)?,
                OutputFormat::Text => print_metadata_text(&items),
            }
        }

        Commands::Samples(args) => {
            let prompts = samples(&session, &args.job_role, &args.industry).await?;
            match format {
                OutputFormat::Json => print_json(&prompts)?,
                OutputFormat::Text => {
                    for (i, p) in prompts.iter().enumerate() {
                        println!("{}. {}", i + 1, p);
                    }
                }
            }
        }

        Commands::Show(args) => {
            let stored = show(&session, &args.id)?;
            match format {
                OutputFormat::Json => print_json(&stored)?,
                OutputFormat::Text => print_checklist_text(&stored.nodes, &stored.status_indicators),
            }
        }

        Commands::CacheStats => {
            let stats = cache_stats(&session)?;
            match format {
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Text => print_stats_text(&stats),
            }
        }

        Commands::Config(args) => {
            handle_config(&session, &args)?;
        }
    }

    Ok(())
}

/// Handle config command
fn handle_config(session: &Session, args: &ConfigArgs) -> Result<()> {
    if args.reset {
        Config::default().save(&session.config_path)?;
        println!("✓ Configuration reset to defaults");
        println!("  Config: {:?}", session.config_path);
        return Ok(());
    }

    let config = &session.config;
    println!("checklistgen Configuration");
    println!("==========================\n");
    println!("Config file: {:?}\n", session.config_path);

    println!("LLM endpoint: {}", config.llm.endpoint);
    println!("LLM model: {}", config.llm.model);
    println!(
        "API key: {}",
        if config.llm.api_key.is_some() { "set" } else { "not set" }
    );
    println!("Timeout: {}s", config.llm.timeout_secs);

    println!("\nEmbedding endpoint: {}", config.embedding.endpoint);
    println!("Embedding model: {}", config.embedding.model);
    println!("Embedding dimension: {}", config.embedding.dimension);

    println!(
        "\nChunking: {} chars, {} overlap",
        config.chunking.chunk_size, config.chunking.chunk_overlap
    );
    println!("Max concurrency: {}", config.pipeline.max_concurrency);
    println!("Flat ceiling: {}", config.pipeline.flat_ceiling);
    println!("Combined ceiling: {}", config.pipeline.combined_ceiling);
    println!("Minimum detailed tasks: {}", config.pipeline.min_detailed_tasks);
    println!("Enforce ceiling: {}", config.pipeline.enforce_ceiling);

    println!(
        "\nFetch retries: {} (backoff {}ms)",
        config.fetch.max_retries, config.fetch.backoff_ms
    );

    println!("\nDatabase: {:?}", config.storage.database_path);

    Ok(())
}

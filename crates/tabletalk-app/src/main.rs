//! Tabletalk application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing (stderr)
//! 3. Open the SQLite database
//! 4. Dispatch: chat REPL, schema feed, demo seeding or one-shot query

mod cli;

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use tabletalk_chat::{
    render_frame, QueryExecutor, QuerySynthesizer, TurnOrchestrator, TurnOutcome,
};
use tabletalk_core::config::{resolve_path, TabletalkConfig};
use tabletalk_core::{QueryGate, SchemaFeed};
use tabletalk_llm::OpenAiClient;
use tabletalk_storage::{introspect, seed_company, Database};

use cli::{CliArgs, Command};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = TabletalkConfig::load_or_default(&config_file);
    if let Some(path) = args.resolve_database() {
        config.database.path = path;
    }
    if let Some(model) = args.resolve_model() {
        config.llm.model = model;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing. Stdout is reserved for results.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting tabletalk v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let db_path = resolve_path(&config.database.path);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    match args.command() {
        Command::Chat => run_chat(db, &config).await?,
        Command::Schema { output } => {
            let feed = introspect(&db, &config.schema.default_schema, &config.schema.dialect)?;
            match output {
                Some(path) => {
                    feed.save(&path)?;
                    println!(
                        "Wrote schema for {} tables to {}",
                        feed.tables.len(),
                        path.display()
                    );
                }
                None => print!("{}", feed.to_yaml()?),
            }
        }
        Command::Seed(seed) => {
            let report = seed_company(&db, &seed.plan())?;
            println!(
                "Seeded {} departments, {} employees, {} projects, {} assignments into {}",
                report.departments,
                report.employees,
                report.projects,
                report.assignments,
                db_path.display()
            );
        }
        Command::Query { sql } => {
            let executor = QueryExecutor::new(db, QueryGate::new(&config.safety));
            let frame = executor.execute(&sql)?;
            println!("{}", render_frame(&frame.with_name_column()));
        }
    }

    Ok(())
}

/// Schema text for the prompt: the configured feed file, else the live database.
fn load_schema(db: &Database, config: &TabletalkConfig) -> Result<SchemaFeed, Box<dyn std::error::Error>> {
    let feed = match config.schema.feed_path.as_deref() {
        Some(path) => {
            let path = resolve_path(path);
            tracing::info!(path = %path.display(), "Loading schema feed");
            SchemaFeed::load(&path)?
        }
        None => introspect(db, &config.schema.default_schema, &config.schema.dialect)?,
    };
    if feed.tables.is_empty() {
        tracing::warn!("Schema has no tables; try `tabletalk seed` first");
    }
    Ok(feed)
}

async fn run_chat(db: Database, config: &TabletalkConfig) -> Result<(), Box<dyn std::error::Error>> {
    let schema_text = load_schema(&db, config)?.to_prompt_text()?;
    let client = OpenAiClient::new(&config.llm)?;
    tracing::info!(model = %config.llm.model, "Completion client ready");

    let synthesizer = QuerySynthesizer::new(client, &config.chat, config.schema.dialect.clone());
    let executor = QueryExecutor::new(db, QueryGate::new(&config.safety));
    let mut orchestrator = TurnOrchestrator::new(synthesizer, executor, schema_text, &config.chat);

    println!("Ask a question about your data. Type 'exit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let utterance = line.trim();
        if EXIT_WORDS.contains(&utterance.to_lowercase().as_str()) {
            break;
        }
        if utterance.is_empty() {
            continue;
        }

        match orchestrator.handle_turn(utterance).await {
            TurnOutcome::Query { query, frame } => {
                println!("SQL: {}", query);
                println!("{}", render_frame(&frame));
            }
            TurnOutcome::FollowUp { transform, frame } => {
                println!("(from previous result: {})", transform);
                println!("{}", render_frame(&frame));
            }
            TurnOutcome::Failed { query, error } => {
                if let Some(query) = query {
                    println!("SQL: {}", query);
                }
                println!("Error: {}", error);
            }
        }
    }
    println!("Bye.");
    Ok(())
}

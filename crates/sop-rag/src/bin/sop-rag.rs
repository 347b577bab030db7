//! SOP question-answering CLI
//!
//! Run with: cargo run -p sop-rag -- ask "Who signs off a batch record?"

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sop_rag::{providers, AnswerRecord, Assistant, KnowledgeStatus, RagConfig};

#[derive(Parser)]
#[command(name = "sop-rag", version, about = "Ask questions about your SOP documents")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "sop-rag.toml")]
    config: PathBuf,

    /// Directory holding the source documents
    #[arg(short, long)]
    knowledge_dir: Option<PathBuf>,

    /// Number of chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the knowledge base and show what it holds
    Status,
    /// Answer one question
    Ask {
        question: String,
    },
    /// Answer questions read from stdin until :quit
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sop_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.knowledge_dir {
        config.knowledge.directory = dir;
    }
    if let Some(k) = cli.top_k {
        config.retrieval.top_k = k;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Knowledge directory: {}", config.knowledge.directory.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    let question = match cli.command {
        Command::Status => {
            // Parsing only: no embedding service or API key involved
            let status = KnowledgeStatus::scan(&config)
                .await
                .context("scanning knowledge base")?;
            print_status(&status);
            return Ok(());
        }
        Command::Ask { question } => Some(question),
        Command::Chat => None,
    };

    let embedder = providers::embedder_from_config(&config)?;
    let llm = providers::llm_from_config(&config)?;

    if !embedder.health_check().await.unwrap_or(false) {
        tracing::warn!("Embedding service not reachable at {}", config.embeddings.base_url);
    }

    let mut assistant = Assistant::new(config, embedder, llm);
    let status = assistant
        .load_knowledge()
        .await
        .context("loading knowledge base")?;

    match question {
        Some(question) => {
            let record = assistant.ask(&question).await?;
            print_answer(&record);
        }
        None => {
            print_status(&status);
            chat(&assistant).await?;
        }
    }

    Ok(())
}

async fn chat(assistant: &Assistant) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nquestion> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":audit" => {
                for entry in assistant.audit_trail().entries() {
                    println!("{}  {}", entry.asked_at.to_rfc3339(), entry.question);
                }
            }
            question => match assistant.ask(question).await {
                Ok(record) => print_answer(&record),
                // A failed question leaves the session usable
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    Ok(())
}

fn print_status(status: &KnowledgeStatus) {
    println!("Knowledge base: {}", status.directory.display());
    println!("  Files: {}", status.files.len());
    for file in &status.files {
        println!("    - {}", file);
    }
    println!("  Readable documents: {}", status.documents.len());
    println!("  Chunks: {}", status.chunks);
    if !status.indexed {
        println!("  Index: not built (embeddings are computed by ask/chat)");
    }
    if !status.skipped.is_empty() {
        println!("  Skipped:");
        for skipped in &status.skipped {
            println!("    - {} ({})", skipped.document, skipped.reason);
        }
    }
    if status.files.is_empty() {
        println!("  No documents found. Add PDF, TXT or MD files and run again.");
    }
}

fn print_answer(record: &AnswerRecord) {
    println!("{}", record.answer);
    if !record.sources.is_empty() {
        println!("\nSources consulted: {}", record.sources.join(", "));
    }
}

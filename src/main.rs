//! chatdoc-server binary: ingest documents and ask grounded questions
//! from the command line.

use anyhow::Context;
use chatdoc::config::Config;
use chatdoc::llm::{GenerationClient, OpenAiGenerationClient};
use chatdoc::pipeline::{DocumentRegistry, QaPipeline};
use chatdoc::rag::{EmbeddingProviderKind, GroundingPolicy, TextChunker};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Grounded document question answering.
#[derive(Parser, Debug)]
#[command(
    name = "chatdoc-server",
    version,
    about = "Grounded document question answering",
    long_about = "Ingest a document into a persisted vector index and answer questions\n\
                  from its contents. Answers that cannot be traced back to retrieved\n\
                  document text are replaced with a fixed refusal."
)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and persist the vector index for a document
    Ingest {
        /// Path to the document (read as UTF-8, invalid bytes dropped)
        file: PathBuf,
    },
    /// Answer a question against a document
    Ask {
        /// Path to the document
        file: PathBuf,

        /// The question to answer
        question: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatdoc=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Ingest { file } => {
            let pipeline = build_pipeline(&config, None, false)?;
            let id = register_file(pipeline.registry(), &file).await?;

            pipeline.ingest(id).await?;
            println!(
                "Ingested {} into {}",
                file.display(),
                pipeline.index_dir(id).display()
            );
        }
        Commands::Ask {
            file,
            question,
            top_k,
        } => {
            let pipeline = build_pipeline(&config, top_k, true)?;
            let id = register_file(pipeline.registry(), &file).await?;

            let entry = pipeline.answer(id, &question).await?;
            println!("{}", entry.answer);
            eprintln!(
                "({} ms, {} tokens, {} citations)",
                entry.latency_ms,
                entry
                    .tokens_used
                    .map_or_else(|| "?".to_string(), |t| t.to_string()),
                entry.citations.len()
            );
        }
    }

    Ok(())
}

fn build_pipeline(
    config: &Config,
    top_k: Option<usize>,
    with_generator: bool,
) -> anyhow::Result<QaPipeline> {
    let embeddings = EmbeddingProviderKind::from_config(&config.embedding)?.create_provider()?;
    let generator: Option<Arc<dyn GenerationClient>> = if with_generator {
        Some(Arc::new(OpenAiGenerationClient::from_config(&config.llm)?))
    } else {
        None
    };
    let chunker = TextChunker::new(config.rag.max_chars, config.rag.overlap)?;

    let policy = if config.grounding.lexical {
        GroundingPolicy::LexicalOverlap {
            min_overlap: config.grounding.min_overlap,
        }
    } else {
        GroundingPolicy::CitationsOnly
    };

    Ok(QaPipeline::new(
        Arc::new(DocumentRegistry::new()),
        embeddings,
        generator,
        chunker,
        config.index.root.clone(),
        top_k.unwrap_or(config.rag.top_k),
        policy,
    ))
}

async fn register_file(
    registry: &Arc<DocumentRegistry>,
    file: &PathBuf,
) -> anyhow::Result<uuid::Uuid> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    // Stable id per path, so repeated runs reuse one index directory.
    let id = uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_URL,
        file.display().to_string().as_bytes(),
    );
    Ok(registry.register_with_id(id, &filename, &bytes).id)
}

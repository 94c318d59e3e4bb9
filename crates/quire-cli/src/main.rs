//! CLI entry point for quire: index a folder of markdown documents and ask questions against it.

use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use quire_core::{
    app_data_dir, build_index, chunk_documents, get_docs_root, load_config, scan_documents,
    set_docs_root, watch_documents, Assistant, CapabilityError, Config, Corpus,
    Embedder, HashEmbedder, OllamaClient, RetrieveOptions, Vector,
};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Characters of each retrieved chunk shown in reports.
const PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "quire: answer questions from your own documents")]
struct Cli {
    /// Embed with a local hashing embedder instead of Ollama (generation still uses Ollama).
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show where quire stores its config (app data directory).
    DataDir,
    /// Print the current config, optionally setting the documents folder first.
    Config {
        /// Remember this directory as the documents folder.
        #[arg(long, value_name = "PATH")]
        set_root: Option<PathBuf>,
    },
    /// List the markdown documents in a folder.
    Scan {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Show the chunks that would be indexed.
    Chunks {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Retrieve the chunks closest to a query without generating an answer.
    Search {
        query: String,
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
        #[arg(short, long)]
        k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Answer one or more questions from the documents.
    Ask {
        #[arg(required = true)]
        queries: Vec<String>,
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
        #[arg(short, long)]
        k: Option<usize>,
        /// Also print the composed prompt.
        #[arg(long)]
        show_context: bool,
    },
    /// Print one chunk by id (e.g. `pricing_3`).
    Show {
        id: String,
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Rebuild the corpus whenever the documents folder changes (Ctrl+C to stop).
    Watch {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

/// Embedding provider chosen on the command line.
#[derive(Clone)]
enum Embedding {
    Ollama(OllamaClient),
    Hash(HashEmbedder),
}

#[async_trait]
impl Embedder for Embedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, CapabilityError> {
        match self {
            Embedding::Ollama(c) => c.embed(texts).await,
            Embedding::Hash(h) => h.embed(texts).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Embedding::Ollama(c) => Embedder::name(c),
            Embedding::Hash(h) => h.name(),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "quire_cli=info,quire_core=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli, load_config()).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Validates the settings and builds the providers for commands that embed, retrieve or generate.
fn providers(config: &Config, offline: bool) -> Result<(Embedding, OllamaClient)> {
    config.validate()?;
    let client = config.ollama_client()?;
    let embedding = if offline {
        Embedding::Hash(HashEmbedder::default())
    } else {
        Embedding::Ollama(client.clone())
    };
    Ok((embedding, client))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::DataDir => {
            let dir = app_data_dir().ok_or_else(|| anyhow!("could not determine app data directory"))?;
            println!("{}", dir.display());
        }
        Commands::Config { set_root } => {
            if let Some(root) = set_root {
                set_docs_root(&root)?;
            }
            println!("{}", serde_json::to_string_pretty(&load_config())?);
        }
        Commands::Scan { path } => {
            let root = docs_root(path)?;
            let docs = scan_documents(&root)?;
            println!("Scanned {} document(s) under {}", docs.len(), root.display());
            for d in docs {
                println!("  {}  ({} chars)", d.name, d.text.chars().count());
            }
        }
        Commands::Chunks { path, json } => {
            config.validate()?;
            let docs = scan_documents(&docs_root(path)?)?;
            let chunks = chunk_documents(&docs, &config.chunker());
            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for c in &chunks {
                    println!("[{}] {}  {}", c.id, c.source, preview(&c.text, 60));
                }
                println!("{} chunk(s)", chunks.len());
            }
        }
        Commands::Search { query, path, k, json } => {
            let (embedding, _) = providers(&config, cli.offline)?;
            let corpus = load_corpus(path, &embedding, &config).await?;
            let results = corpus
                .retrieve(&query, &embedding, retrieve_options(&config, k))
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (i, r) in results.iter().enumerate() {
                    print_hit(i + 1, &r.chunk.source, r.score, &r.chunk.text);
                }
            }
        }
        Commands::Ask {
            queries,
            path,
            k,
            show_context,
        } => {
            let (embedding, client) = providers(&config, cli.offline)?;
            let corpus = load_corpus(path, &embedding, &config).await?;
            let assistant = Assistant::new(Arc::new(corpus), embedding, client)
                .with_retrieve_options(retrieve_options(&config, k))
                .with_generation_options(config.generation_options());
            for query in queries {
                println!("\nQUERY: {query}\n");
                let answer = assistant.ask(&query).await?;
                if show_context {
                    println!("Prompt:\n{}\n", answer.prompt);
                }
                println!("Retrieved Context:\n");
                for (i, s) in answer.sources.iter().enumerate() {
                    print_hit(i + 1, &s.source, s.score, &s.text);
                }
                println!("Final Answer:\n");
                println!("{}", answer.text.trim());
                println!("\n{}", "-".repeat(80));
            }
        }
        Commands::Show { id, path } => {
            let (embedding, _) = providers(&config, cli.offline)?;
            let corpus = load_corpus(path, &embedding, &config).await?;
            let chunk = corpus
                .chunk_by_id(&id)?
                .ok_or_else(|| anyhow!("no chunk with id {id}"))?;
            println!("[{}] {}\n\n{}", chunk.id, chunk.source, chunk.text);
        }
        Commands::Watch { path } => {
            let (embedding, client) = providers(&config, cli.offline)?;
            watch(docs_root(path)?, embedding, client, config).await?
        }
    }
    Ok(())
}

async fn watch(root: PathBuf, embedding: Embedding, client: OllamaClient, config: Config) -> Result<()> {
    let corpus = load_corpus(Some(root.clone()), &embedding, &config).await?;
    println!("Indexed {} chunk(s) from {}", corpus.len(), root.display());
    let assistant = Arc::new(Mutex::new(
        Assistant::new(Arc::new(corpus), embedding, client)
            .with_retrieve_options(config.retrieve_options())
            .with_generation_options(config.generation_options()),
    ));

    let (stop_tx, stop_rx) = mpsc::channel();
    let handle = tokio::runtime::Handle::current();
    let chunker = config.chunker();
    let live = Arc::clone(&assistant);
    let watcher = tokio::task::spawn_blocking(move || {
        watch_documents(&root, stop_rx, move |scan| {
            let docs = match scan {
                Ok(docs) => docs,
                Err(e) => {
                    tracing::warn!(error = %e, "rescan failed");
                    return;
                }
            };
            let rebuilt = handle.block_on(async {
                let mut assistant = live.lock().await;
                assistant.rebuild(&docs, &chunker).await?;
                Ok::<_, quire_core::RagError>(assistant.corpus().len())
            });
            match rebuilt {
                Ok(chunks) => println!("Rebuilt: {chunks} chunk(s) from {} document(s)", docs.len()),
                Err(e) => tracing::warn!(error = %e, "rebuild failed; keeping previous corpus"),
            }
        })
    });

    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    stop_tx.send(()).ok();
    watcher.await??;
    println!("Stopped with {} chunk(s) indexed", assistant.lock().await.corpus().len());
    Ok(())
}

async fn load_corpus(path: Option<PathBuf>, embedding: &Embedding, config: &Config) -> Result<Corpus> {
    let root = docs_root(path)?;
    build_index(&root, embedding, &config.chunker())
        .await
        .with_context(|| format!("indexing {}", root.display()))
}

/// Explicit path wins; otherwise the configured documents folder.
fn docs_root(path: Option<PathBuf>) -> Result<PathBuf> {
    path.or_else(get_docs_root)
        .ok_or_else(|| anyhow!("no documents folder: pass a path or run `quire config --set-root PATH`"))
}

fn retrieve_options(config: &Config, k: Option<usize>) -> RetrieveOptions {
    let mut options = config.retrieve_options();
    if let Some(k) = k {
        options.k = k;
    }
    options
}

fn print_hit(rank: usize, source: &str, score: f64, text: &str) {
    println!("[{rank}] Source: {source} | Score: {score:.4}");
    println!("{}", preview(text, PREVIEW_CHARS).trim());
    println!();
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quire").chain(args.iter().copied())).unwrap()
    }

    fn broken_config() -> Config {
        Config {
            top_k: 0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn scan_runs_with_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "hello").unwrap();
        let path = dir.path().to_str().unwrap();
        assert!(run(cli(&["scan", path]), broken_config()).await.is_ok());
    }

    #[tokio::test]
    async fn search_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let err = run(cli(&["--offline", "search", "q", "--path", path]), broken_config())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn offline_uses_hash_embedder() {
        let (embedding, _) = providers(&Config::default(), true).unwrap();
        assert_eq!(embedding.name(), "hash");
    }

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("hi", 5), "hi");
    }
}

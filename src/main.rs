use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use tome_client::HttpBackend;
use tome_core::api::{UploadCandidate, DEFAULT_TOP_K};
use tome_engine::Engine;

mod sink;

use sink::PlainSink;

/// Chat with your PDFs: ephemeral sessions, document ingestion, grounded
/// answers. Plain questions are sent as queries; `/` starts a command.
#[derive(Parser, Debug)]
#[command(name = "tome", version, about)]
struct Args {
    /// Base URL of the backend API.
    #[arg(long, default_value = "http://localhost:8000")]
    api_base: String,

    /// How many chunks to retrieve per query.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: u32,

    /// Do not blend in the global document index.
    #[arg(long)]
    no_global: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let use_global = !args.no_global;

    let backend = Arc::new(HttpBackend::new(&args.api_base));
    let engine = Engine::new(backend, Arc::new(PlainSink));

    tracing::info!(api_base = %args.api_base, "starting tome");
    engine.health().await;
    println!("tome: ask anything, or /help for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix('/') {
            Some(command) => {
                if !dispatch(&engine, command).await {
                    break;
                }
            }
            None => engine.ask(line, args.top_k, use_global).await,
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

/// Translate one `/command` line into a core call. Returns false to quit.
async fn dispatch(engine: &Engine, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or("") {
        "session" => {
            let _ = engine.new_session().await;
        }
        "delete" => {
            let _ = engine.delete_session().await;
        }
        "upload" => {
            let candidates = read_candidates(parts).await;
            let _ = engine.upload(candidates).await;
        }
        "health" => {
            engine.health().await;
        }
        "quit" | "exit" => return false,
        other => {
            if !other.is_empty() && other != "help" {
                println!("unknown command: /{other}");
            }
            println!(
                "commands: /session  /delete  /upload <paths...>  /health  /quit\n\
                 anything else is sent as a question"
            );
        }
    }
    true
}

/// Read each path into an upload candidate named after the file. Unreadable
/// paths are skipped with a note; eligibility filtering stays in the core.
async fn read_candidates(paths: impl Iterator<Item = &str>) -> Vec<UploadCandidate> {
    let mut candidates = Vec::new();
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_owned());
                candidates.push(UploadCandidate::new(name, bytes));
            }
            Err(e) => println!("[error] cannot read {path}: {e}"),
        }
    }
    candidates
}

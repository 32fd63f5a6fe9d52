//! Vidstat daemon entry point.
//!
//! Two modes: `vidstatd ingest <file.json>` loads a statistics export
//! into the store and exits; with no arguments the daemon reads one
//! question per line from stdin and answers one integer per line.

use anyhow::Result;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vidstatd::answers;
use vidstatd::config::Config;
use vidstatd::ingest;
use vidstatd::llm::OllamaClient;
use vidstatd::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let store = Store::open_at(&config.database_path)?;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("ingest") {
        let path = args
            .get(2)
            .map(Path::new)
            .ok_or_else(|| anyhow::anyhow!("usage: vidstatd ingest <file.json>"))?;
        let (videos, snapshots) = ingest::load_file(&store, path)?;
        println!("loaded videos={videos} snapshots={snapshots}");
        return Ok(());
    }

    let client = OllamaClient::new(&config.llm.url, &config.llm.model, config.llm.timeout_secs);
    info!(
        "vidstatd v{} ready (model {}, db {})",
        env!("CARGO_PKG_VERSION"),
        client.model(),
        config.database_path
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let answer = answers::answer_question(&client, &store, text).await;
        println!("{answer}");
    }

    info!("stdin closed; shutting down");
    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use pictor_core::impls::{InMemoryDownloader, InMemoryStorageClient};
use pictor_core::{BucketPath, ProviderBuilder, ProviderConfig, Reference};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

const STORAGE_BASE: &str = "https://storage.example.com";

#[derive(Debug, Parser)]
#[command(name = "pictor", about = "Resolve and fetch remote image references")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show how a raw string is interpreted and its cache identity
    Inspect { raw: String },

    /// Fetch a reference against in-memory storage and downloader
    Fetch {
        raw: String,

        /// JSON provider config
        #[arg(long, env = "PICTOR_CONFIG")]
        config: Option<PathBuf>,

        /// Seed an object as KEY=TEXT (KEY is a bucket path or a URL path)
        #[arg(long = "object", value_name = "KEY=TEXT")]
        objects: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Inspect { raw } => inspect(&raw),
        Command::Fetch {
            raw,
            config,
            objects,
        } => fetch(&raw, config, &objects).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(raw: &str) -> anyhow::Result<ExitCode> {
    let Some(reference) = Reference::parse(raw) else {
        println!("unrecognized: {raw:?}");
        return Ok(ExitCode::from(2));
    };
    let report = serde_json::json!({
        "kind": reference.kind(),
        "reference": reference.to_string(),
        "cache_identity": reference.cache_identity(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

async fn fetch(raw: &str, config: Option<PathBuf>, objects: &[String]) -> anyhow::Result<ExitCode> {
    let config = match config {
        Some(path) => ProviderConfig::from_path(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProviderConfig::default(),
    };

    let storage = InMemoryStorageClient::new(Url::parse(STORAGE_BASE)?)
        .with_ttl(config.signed_url_ttl());
    let downloader = InMemoryDownloader::new();
    for object in objects {
        seed(&storage, &downloader, object)?;
    }

    let builder = ProviderBuilder::new()
        .storage(Arc::new(storage))
        .downloader(Arc::new(downloader))
        .config(&config);
    let provider = builder.build_for_raw(raw)?;
    info!(identity = %provider.cache_identity(), kind = provider.reference().kind(), "provider ready");

    let image = provider
        .fetch_image()
        .await
        .map_err(|err| anyhow::anyhow!(err))
        .context("fetch_image")?;
    println!("image: {} bytes ({})", image.bytes.len(), image.content_type);

    let (tx, rx) = oneshot::channel();
    provider.fetch_data(move |result| {
        let _ = tx.send(result);
    });
    let data = rx
        .await
        .context("fetch_data handler was never called")?
        .map_err(|err| anyhow::anyhow!(err))
        .context("fetch_data")?;
    println!("data: {} bytes", data.len());
    println!("cache identity: {}", provider.cache_identity());

    Ok(ExitCode::SUCCESS)
}

/// `KEY=TEXT`: bucket paths are registered with storage and served at their signed path,
/// anything starting with `/` is served as a plain URL path.
fn seed(
    storage: &InMemoryStorageClient,
    downloader: &InMemoryDownloader,
    object: &str,
) -> anyhow::Result<()> {
    let Some((key, text)) = object.split_once('=') else {
        bail!("object must look like KEY=TEXT: {object:?}");
    };
    let bytes = Bytes::from(text.to_string());

    if let Some(path) = BucketPath::parse(key) {
        storage.insert_object(path.key());
        downloader.insert(&storage.signed_path(&path), bytes.clone(), "image/png");
    }
    if key.starts_with('/') {
        downloader.insert(key, bytes, "image/png");
    }
    Ok(())
}

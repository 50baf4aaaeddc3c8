mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{load_env_file, PathManager, Settings};
use reelvault_core::upload::extension_of;
use reelvault_core::{
    ApiKeyGuard, ContentIndex, DeleteTarget, FsBlobStore, IndexOptions, Reconciler, TtlSpec,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deduplicating video store", long_about = None)]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base directory for data, config and logs
    #[arg(long, global = true, env = "REELVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Key presented for protected operations (list, delete)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Debug logging regardless of RUST_LOG
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the effective settings to the settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that open the index. The index is locked while open, so these
/// fail while `serve` is running against the same data.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Own the index: sweep once, then keep sweeping on an interval until Ctrl+C
    Serve,
    /// Store a file (duplicates only refresh metadata)
    Put {
        file: PathBuf,
        /// Lifetime in hours; 0 keeps the file forever
        #[arg(long)]
        expired: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// List stored files, newest first
    List,
    /// Add a like to a file
    Like { filename: String },
    /// Append a comment to a file
    Comment { filename: String, text: String },
    /// Set or clear the title of a file (by filename or digest)
    Annotate {
        target: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a file, or `all` to wipe the storage directory
    Delete { target: String },
    /// Run one expiry and orphan sweep
    Sweep,
}

fn load_settings(args: &Args) -> Result<Settings> {
    let settings = match &args.config {
        Some(path) => Settings::load_from(path).map_err(anyhow::Error::msg)?,
        None => Settings::load(),
    };
    Ok(settings.with_env_overrides())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env files
    load_env_file();
    let args = Args::parse();

    if let Some(dir) = &args.data_dir {
        PathManager::set_data_dir(dir.clone());
    }
    let settings = load_settings(&args)?;
    let _log_guard = logging::init_logging(settings.log_dir.as_deref(), args.verbose);

    let command = match args.command {
        Command::InitConfig { force } => return init_config(args.config.as_deref(), &settings, force),
        Command::Store(command) => command,
    };

    // Nothing works without the storage directory
    let blobs = Arc::new(
        FsBlobStore::create(settings.storage_dir.clone())
            .await
            .context("upload directory initialization failed")?,
    );
    tracing::info!(path = %settings.storage_dir.display(), "upload directory initialized");

    let index = Arc::new(
        ContentIndex::open(
            blobs,
            settings.index_path.clone(),
            IndexOptions::from_settings(&settings),
        )
        .await?,
    );
    let guard = ApiKeyGuard::new(settings.api_key.clone());

    match command {
        StoreCommand::Serve => {
            let reconciler = Reconciler::new(Arc::clone(&index));
            reconciler.sweep().await;

            let period = Duration::from_secs(settings.sweep_interval_secs.max(1));
            let handle = reconciler.spawn(period);

            println!("reelvault serving {}", settings.storage_dir.display());
            println!("Press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;

            handle.shutdown().await;
        }
        StoreCommand::Put {
            file,
            expired,
            title,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let outcome = index
                .put(
                    &data,
                    &extension_of(name),
                    title.as_deref(),
                    TtlSpec::parse(expired.as_deref()),
                )
                .await?;
            print_json(&outcome)?;
        }
        StoreCommand::List => {
            guard.authorize(args.api_key.as_deref())?;
            let files = index.list().await;
            print_json(&serde_json::json!({ "count": files.len(), "files": files }))?;
        }
        StoreCommand::Like { filename } => {
            let likes = index.like(&filename).await?;
            print_json(&serde_json::json!({ "filename": filename, "likes": likes }))?;
        }
        StoreCommand::Comment { filename, text } => {
            let comment = index.comment(&filename, &text).await?;
            print_json(&comment)?;
        }
        StoreCommand::Annotate { target, title } => {
            let entry = index.annotate(&target, title.as_deref()).await?;
            print_json(&entry)?;
        }
        StoreCommand::Delete { target } => {
            guard.authorize(args.api_key.as_deref())?;
            let outcome = index.delete(&DeleteTarget::parse(&target)).await?;
            print_json(&outcome)?;
        }
        StoreCommand::Sweep => {
            let summary = Reconciler::new(Arc::clone(&index)).sweep().await;
            print_json(&summary)?;
        }
    }

    index.close().await?;
    Ok(())
}

fn init_config(config: Option<&Path>, settings: &Settings, force: bool) -> Result<()> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => PathManager::settings_path().context("could not determine settings path")?,
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    PathManager::ensure_dirs_exist().context("creating data directories")?;
    settings.save_to(&path).map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(())
}

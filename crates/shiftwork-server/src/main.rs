//! shiftwork-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SHIFTWORK_*` environment variables (nested keys use `__`, e.g.
//! `SHIFTWORK_IMPORT__MAX_ROWS`), opens the SQLite store and either
//! serves HTTP or runs a one-shot operator command.
//!
//! ```text
//! shiftwork-server serve
//! shiftwork-server import schedule --tenant <ID> --from 2026-02-16 --to 2026-02-22 week.csv --auto-create
//! shiftwork-server reconcile --tenant <ID> --from 2026-02-16 --to 2026-02-22
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use shiftwork_core::{events::NoopSink, time::DateSpan};
use shiftwork_engine::{
  Engine,
  coverage::ReconcileOptions,
  pipeline::ImportOptions,
};
use shiftwork_server::{Broadcaster, ServerConfig};
use shiftwork_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Shift scheduling and attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,

  /// Import an export file once and print the summary as JSON.
  Import {
    kind:        ImportFile,
    #[arg(long)]
    tenant:      Uuid,
    #[arg(long)]
    from:        NaiveDate,
    #[arg(long)]
    to:          NaiveDate,
    file:        PathBuf,
    /// Provision employees, clients and locations that do not resolve.
    #[arg(long)]
    auto_create: bool,
    /// Resolve and count without writing.
    #[arg(long)]
    preview:     bool,
  },

  /// Reconcile coverage over a date range and print the report as JSON.
  Reconcile {
    #[arg(long)]
    tenant:       Uuid,
    #[arg(long)]
    from:         NaiveDate,
    #[arg(long)]
    to:           NaiveDate,
    /// Also ticket attendance by employees who were never assigned.
    #[arg(long)]
    ticket_extra: bool,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportFile {
  Schedule,
  Timeclock,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SHIFTWORK")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::Import { kind, tenant, from, to, file, auto_create, preview } => {
      let engine = Engine::new(store, Arc::new(NoopSink), &server_cfg.import)?;
      let span = DateSpan::new(from, to)?;
      let input = std::fs::read(&file).with_context(|| format!("failed to read {file:?}"))?;
      let options = ImportOptions { auto_create };
      let output = match (kind, preview) {
        (ImportFile::Schedule, true) => {
          serde_json::to_string_pretty(&engine.preview_schedule(tenant, span, &input).await?)?
        }
        (ImportFile::Timeclock, true) => {
          serde_json::to_string_pretty(&engine.preview_timeclock(tenant, span, &input).await?)?
        }
        (ImportFile::Schedule, false) => serde_json::to_string_pretty(
          &engine.import_schedule(tenant, span, &input, options).await?,
        )?,
        (ImportFile::Timeclock, false) => serde_json::to_string_pretty(
          &engine.import_timeclock(tenant, span, &input, options).await?,
        )?,
      };
      println!("{output}");
      Ok(())
    }
    Command::Reconcile { tenant, from, to, ticket_extra } => {
      let engine = Engine::new(store, Arc::new(NoopSink), &server_cfg.import)?;
      let span = DateSpan::new(from, to)?;
      let report = engine
        .reconcile(tenant, span, ReconcileOptions { ticket_extra })
        .await?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }
  }
}

async fn serve(store: Arc<SqliteStore>, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let events = Broadcaster::new(server_cfg.events.capacity);
  let engine = Engine::new(store, Arc::new(events.clone()), &server_cfg.import)
    .context("invalid import configuration")?;

  let app = shiftwork_server::router(Arc::new(engine), events);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

//! albumdb CLI
//!
//! Serve the album store over HTTP, or run one store operation and print the
//! result as JSON.
//!
//!   albumdb serve --bind 127.0.0.1:8080
//!   albumdb list [--id <id>]
//!   albumdb add --title <t> --artist <a> --price <n> [--id <id>]
//!   albumdb delete <id>...
//!   albumdb update --id <id> [--title <t>] [--artist <a>] [--price <n>]

use albumdb::{PartialRecord, PipelineConfig, Record, RewriteMode, Store, StoreConfig};
use albumdb_http::{init_tracing, AlbumService, HttpError, HttpServer, TracingConfig};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "albumdb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flat-file album store")]
struct Cli {
    /// Data file
    #[arg(long, env = "ALBUMDB_PATH", default_value = "./data/albums", global = true)]
    path: PathBuf,

    /// Job/result queue capacity of the worker pool
    #[arg(long, env = "ALBUMDB_QUEUE_CAPACITY", default_value_t = 10, global = true)]
    queue_capacity: usize,

    /// Worker threads (default: half the queue capacity)
    #[arg(long, env = "ALBUMDB_WORKERS", global = true)]
    workers: Option<usize>,

    /// Rewrite through a temporary file and rename instead of truncating in place
    #[arg(long, env = "ALBUMDB_ATOMIC_REWRITE", global = true)]
    atomic_rewrite: bool,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, env = "ALBUMDB_LOG", default_value = "info", global = true)]
    log: String,

    /// JSON log output
    #[arg(long, env = "ALBUMDB_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "ALBUMDB_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Print all albums, or one by id
    List {
        #[arg(long)]
        id: Option<String>,
    },
    /// Append an album
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long, allow_negative_numbers = true)]
        price: i64,
        /// Generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete albums by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Change fields of an album
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        price: Option<i64>,
    },
}

impl Cli {
    fn store_config(&self) -> albumdb::Result<StoreConfig> {
        let mut pipeline = PipelineConfig::new(self.queue_capacity)?;
        if let Some(workers) = self.workers {
            pipeline = pipeline.with_workers(workers)?;
        }
        let rewrite = if self.atomic_rewrite {
            RewriteMode::Atomic
        } else {
            RewriteMode::InPlace
        };

        Ok(StoreConfig::default().with_pipeline(pipeline).with_rewrite(rewrite))
    }
}

fn print_json<T: Serialize>(value: &T) -> albumdb_http::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> albumdb_http::Result<()> {
    let store = Store::open_with(&cli.path, cli.store_config()?)?;

    match cli.command {
        Command::Serve { bind } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async move {
                let server = HttpServer::bind(bind.as_str(), AlbumService::new(store)).await?;
                server
                    .serve_until(async {
                        if let Err(e) = tokio::signal::ctrl_c().await {
                            tracing::warn!(error = %e, "failed to listen for ctrl-c");
                            std::future::pending::<()>().await;
                        }
                    })
                    .await
            })
        }
        Command::List { id: None } => print_json(&store.get()?),
        Command::List { id: Some(id) } => {
            let record = store
                .get()?
                .into_iter()
                .find(|r| r.id == id)
                .ok_or_else(|| HttpError::BadRequest(format!("no album with id {id}")))?;
            print_json(&record)
        }
        Command::Add { title, artist, price, id } => {
            let mut record = Record::new(title, artist, price);
            if let Some(id) = id {
                record = record.with_id(id);
            }
            print_json(&store.add(vec![record])?)
        }
        Command::Delete { ids } => print_json(&serde_json::json!({ "keysDeleted": store.delete(ids)? })),
        Command::Update { id, title, artist, price } => {
            let partial = PartialRecord { id, title, artist, price };
            print_json(&store.update(vec![partial])?)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::default().with_level(cli.log.as_str());
    if cli.log_json {
        tracing_config = tracing_config.with_json();
    }
    init_tracing(&tracing_config);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

//! Loads a link tree, waits for its imports and runs one query against it.
//!
//! Usage: `launcher --root links.xml git tokio-rs --open`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::timeout;

use launcher::bus::Bus;
use launcher::event::LauncherEvent;
use launcher::{
    load_or_create_config, spawn_import_coordinator, CoordinatorOptions, CoreError, CoreResult,
    ExpressionCache, ImportDescriptor, LauncherConfig, LinkOpener, QuerySession,
    SourceTypeRegistry,
};

#[derive(Debug, Parser)]
#[command(name = "launcher", about = "Query a quick-launcher link tree")]
struct Cli {
    /// Root source file. Falls back to `root` in launcher.json.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Source type of the root file.
    #[arg(long = "type", default_value = "xml")]
    mime_type: String,

    /// Directory holding launcher.json; created with defaults when missing.
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Resolve the selected match and print the link it would open.
    #[arg(long)]
    open: bool,

    /// Position of the match to open, in listed order.
    #[arg(long, default_value_t = 0)]
    select: usize,

    /// How long to wait for imports to finish loading.
    #[arg(long, default_value_t = 5_000)]
    settle_timeout_ms: u64,

    /// Search expression; words after the first term become link parameters.
    query: Vec<String>,
}

struct StdoutOpener;

impl LinkOpener for StdoutOpener {
    fn open(&self, link: &str) -> CoreResult<()> {
        println!("open {link}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CoreResult<()> {
    let config = match &cli.config_dir {
        Some(dir) => load_or_create_config(dir)?,
        None => LauncherConfig::default(),
    };

    let root = match cli.root {
        Some(path) => ImportDescriptor::new(path, cli.mime_type),
        None => cli
            .config_dir
            .as_deref()
            .and_then(|dir| config.root_descriptor(dir))
            .ok_or_else(|| CoreError::Config("no root source given".to_string()))?,
    };

    let bus = Bus::new(config.bus_capacity);
    let mut events = bus.subscribe();
    let handle = spawn_import_coordinator(
        Arc::new(SourceTypeRegistry::with_defaults()),
        CoordinatorOptions::from_config(&config),
        bus,
    );

    handle.load_root(root).await?;
    let snapshot = timeout(
        Duration::from_millis(cli.settle_timeout_ms),
        handle.wait_until_settled(),
    )
    .await
    .map_err(|_| CoreError::Internal("timed out waiting for imports".to_string()))??;

    loop {
        match events.try_recv() {
            Ok(LauncherEvent::ImportFailed(payload)) => {
                eprintln!("warning: {}: {}", payload.path.display(), payload.error);
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }

    let catalog = snapshot.catalog;
    let mut session = QuerySession::new(ExpressionCache::new(config.expression_cache.max_entries));
    session.set_query(&cli.query.join(" "));

    let rows = session.filter(&catalog);
    for (position, row) in rows.iter().enumerate() {
        let item = catalog.item(*row)?;
        let tags = catalog.effective_tags(*row)?;
        println!(
            "{position:>3}  {}  [{}]  {}",
            item.name,
            tags.join(", "),
            item.link
        );
    }

    if cli.open {
        let row = rows
            .get(cli.select)
            .copied()
            .ok_or(CoreError::RowOutOfRange {
                index: cli.select,
                count: rows.len(),
            })?;
        session.open(&catalog, row, &StdoutOpener)?;
    }

    Ok(())
}

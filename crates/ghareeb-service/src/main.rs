use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use ghareeb_data::{GlossIndex, LoadMode, MeaningOverrides, PageCorpus};
use ghareeb_service::{AppState, router, to_csv, to_json, validate};
use ghareeb_types::PAGE_COUNT;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DATASET: &str = "data/ghareeb.json";
const DEFAULT_PAGES: &str = "data/pages.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuditFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    dataset_path: PathBuf,
    pages_path: PathBuf,
    overrides_path: Option<PathBuf>,
    load_mode: LoadMode,
    audit: Option<AuditFormat>,
    disable_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    info!(
        "using dataset at {} and pages at {} (mode: {:?})",
        config.dataset_path.display(),
        config.pages_path.display(),
        config.load_mode
    );

    let start = Instant::now();
    let index = GlossIndex::load(&config.dataset_path, config.load_mode)
        .with_context(|| format!("loading dataset {}", config.dataset_path.display()))?;
    let corpus = PageCorpus::load(&config.pages_path, config.load_mode)
        .with_context(|| format!("loading pages {}", config.pages_path.display()))?;
    let overrides = match &config.overrides_path {
        Some(path) => {
            let layer = MeaningOverrides::load_optional(path, config.load_mode)
                .with_context(|| format!("loading overrides {}", path.display()))?;
            if layer.is_none() {
                warn!("override file {} not found, serving curated meanings", path.display());
            }
            layer.map(Arc::new)
        }
        None => None,
    };
    info!(
        "loaded {} entries over {} pages and {} corpus pages in {} ms",
        index.len(),
        index.page_count(),
        corpus.len(),
        start.elapsed().as_millis()
    );

    if corpus.len() != PAGE_COUNT as usize {
        warn!("corpus has {} pages, expected {PAGE_COUNT}", corpus.len());
    }

    let report = validate(&index, &corpus);

    if let Some(format) = config.audit {
        let out = match format {
            AuditFormat::Json => to_json(&report).context("serializing report")?,
            AuditFormat::Csv => to_csv(&report),
        };
        println!("{out}");
        return Ok(());
    }

    info!("binding to {}:{}", config.host, config.port);
    if config.disable_cache {
        info!("cache headers disabled");
    }

    let state = AppState {
        index: Arc::new(index),
        corpus: Arc::new(corpus),
        overrides,
        report: Arc::new(report),
        disable_cache: config.disable_cache,
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    let mut disable_cache = false;
    let mut audit = None;
    let mut cli_dataset: Option<PathBuf> = None;
    let mut cli_pages: Option<PathBuf> = None;
    let mut cli_overrides: Option<PathBuf> = None;
    let mut cli_mode: Option<LoadMode> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => disable_cache = true,
            "--audit" => audit = Some(AuditFormat::Json),
            "--dataset" => cli_dataset = args.next().map(PathBuf::from),
            "--pages" => cli_pages = args.next().map(PathBuf::from),
            "--overrides" => cli_overrides = args.next().map(PathBuf::from),
            _ => {
                if let Some(path) = arg.strip_prefix("--dataset=") {
                    cli_dataset = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--pages=") {
                    cli_pages = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--overrides=") {
                    cli_overrides = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--load-mode=") {
                    cli_mode = parse_load_mode(mode);
                } else if let Some(format) = arg.strip_prefix("--audit=") {
                    audit = Some(
                        parse_audit_format(format)
                            .with_context(|| format!("unknown audit format {format:?}"))?,
                    );
                } else {
                    anyhow::bail!("unrecognised argument {arg:?}");
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let dataset_path = cli_dataset
        .or_else(|| env::var("GLOSS_DATASET_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
    let pages_path = cli_pages
        .or_else(|| env::var("PAGES_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES));
    let overrides_path =
        cli_overrides.or_else(|| env::var("MEANING_OVERRIDES_PATH").ok().map(PathBuf::from));
    let load_mode = cli_mode
        .or_else(|| {
            env::var("DATA_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);

    Ok(Config {
        host,
        port,
        dataset_path,
        pages_path,
        overrides_path,
        load_mode,
        audit,
        disable_cache,
    })
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn parse_audit_format(raw: &str) -> Option<AuditFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Some(AuditFormat::Json),
        "csv" => Some(AuditFormat::Csv),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
}

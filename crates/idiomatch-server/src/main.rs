use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use idiom_corpus::{Corpus, LoadMode};
use idiom_engine::{DefaultAnalyzer, MatchConfig};
use idiom_lemma::Lemmatizer;

use idiomatch_server::rate_limit::RateLimiterLayer;
use idiomatch_server::{AppState, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CORPUS: &str = "dictionary.json";
const DEFAULT_CORPUS_IMAGE_PATH: &str = "/app/dictionary.json";
const DEFAULT_MAX_LIMIT: usize = 50;
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using corpus at {} (mode: {:?})",
        config.corpus_path.display(),
        config.corpus_mode
    );
    if config.disable_cache {
        info!("cache headers disabled");
    }
    info!(
        "rate limit: {} req/s (burst {})",
        config.rate_limit_rps, config.rate_limit_burst
    );

    let start = Instant::now();
    let corpus = Arc::new(Corpus::load_with_mode(
        &config.corpus_path,
        config.corpus_mode,
    )?);
    info!(
        "corpus loaded in {} ms ({} entries)",
        start.elapsed().as_millis(),
        corpus.len()
    );

    let analyzer: Arc<DefaultAnalyzer> = match &config.lemma_exc_dir {
        Some(dir) => {
            info!("loading lemma exceptions from {}", dir.display());
            Arc::new(DefaultAnalyzer::with_lemmatizer(Lemmatizer::with_exc_dir(
                dir,
            )?))
        }
        None => Arc::new(DefaultAnalyzer::new()),
    };

    let state = AppState {
        corpus,
        analyzer,
        match_config: MatchConfig {
            max_gap: config.max_gap,
            ..MatchConfig::default()
        },
        max_limit: config.max_limit,
        disable_cache: config.disable_cache,
    };

    let rate_limiter = RateLimiterLayer::new(config.rate_limit_rps, config.rate_limit_burst);
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("invalid listen address");
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    corpus_path: PathBuf,
    corpus_mode: LoadMode,
    lemma_exc_dir: Option<PathBuf>,
    max_gap: usize,
    max_limit: usize,
    disable_cache: bool,
    rate_limit_rps: u32,
    rate_limit_burst: u32,
}

fn load_config() -> Config {
    let mut disable_cache = false;
    let mut cli_corpus_path: Option<PathBuf> = None;
    let mut cli_corpus_mode: Option<LoadMode> = None;
    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => disable_cache = true,
            "--corpus" => {
                if let Some(path) = args.next() {
                    cli_corpus_path = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--corpus=") {
                    cli_corpus_path = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--corpus-mode=") {
                    cli_corpus_mode = parse_load_mode(mode);
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let corpus_path = cli_corpus_path
        .or_else(|| env::var("CORPUS_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(default_corpus_path);
    let corpus_mode = cli_corpus_mode
        .or_else(|| {
            env::var("CORPUS_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);
    let lemma_exc_dir = env::var("LEMMA_EXC_DIR").ok().map(PathBuf::from);
    let max_gap = env::var("MAX_GAP")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(MatchConfig::default().max_gap);
    let max_limit = env::var("MAX_LIMIT")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_LIMIT);
    let rate_limit_rps = env::var("RATE_LIMIT_RPS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    let rate_limit_burst = env::var("RATE_LIMIT_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST);

    Config {
        host,
        port,
        corpus_path,
        corpus_mode,
        lemma_exc_dir,
        max_gap,
        max_limit,
        disable_cache,
        rate_limit_rps,
        rate_limit_burst,
    }
}

fn default_corpus_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CORPUS);
    if local.exists() {
        return local;
    }
    PathBuf::from(DEFAULT_CORPUS_IMAGE_PATH)
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
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
        .init();
}

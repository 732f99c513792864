use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shelfscout_core::SearchFilters;
use shelfscout_embed::{
    decode_image, CacheConfig, ColorHistogramImageProvider, EmbeddingCache, EmbeddingProvider,
    HashingEmbeddingProvider, ImageEmbedder, OpenAiConfig, OpenAiEmbeddingProvider, DEFAULT_IMAGE_DIM,
};
use shelfscout_search::{SearchService, ServiceConfig};
use shelfscout_storage::{load_snapshot, save_snapshot, CatalogConfig, CatalogStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Hybrid product search over a local catalog
#[derive(Parser, Debug)]
#[command(name = "shelfscout")]
#[command(about = "Hybrid product search and recommendations", long_about = None)]
struct Args {
    /// Catalog in JSON-lines format, one product per line
    #[arg(long, env = "SHELFSCOUT_CATALOG")]
    catalog: Option<PathBuf>,

    /// Catalog snapshot to load instead of the JSON-lines file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// API key for the OpenAI-compatible embedding endpoint; without one a
    /// local hashing model is used
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Embedding model name
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Base URL of the embedding endpoint
    #[arg(long, default_value = "https://api.openai.com/v1")]
    embedding_url: String,

    /// Text embedding dimension
    #[arg(long)]
    text_dim: Option<usize>,

    /// Embed products that have no text embedding before serving
    #[arg(long)]
    embed_missing: bool,

    /// Per-request time budget in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Embedding cache capacity
    #[arg(long, default_value_t = 256)]
    cache_capacity: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hybrid search with optional filters
    Search {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Filters as JSON, e.g. '{"color":["red"],"price_max_cents":5000}'
        #[arg(long)]
        filters: Option<String>,
    },
    /// Explained recommendations for a use case
    Recommend {
        #[arg(long)]
        use_case: String,
        /// Constraints as JSON, same shape as search filters
        #[arg(long)]
        constraints: Option<String>,
        #[arg(long)]
        k: Option<usize>,
    },
    /// Visual search from an image file
    Image {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = 8)]
        k: usize,
    },
    /// Write the loaded catalog to a snapshot file
    Snapshot {
        #[arg(long)]
        out: PathBuf,
    },
}

fn parse_filters(raw: Option<&str>) -> anyhow::Result<Option<SearchFilters>> {
    raw.map(|json| serde_json::from_str(json).context("invalid filters JSON"))
        .transpose()
}

fn text_provider(args: &Args) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match args.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            let mut config = OpenAiConfig::new(key)
                .with_model(&args.embedding_model)
                .with_base_url(&args.embedding_url);
            if let Some(dim) = args.text_dim {
                config.dimension = dim;
            }
            Ok(Arc::new(OpenAiEmbeddingProvider::new(config)?))
        }
        None => {
            info!("No embedding API key set, using the local hashing model");
            Ok(Arc::new(HashingEmbeddingProvider::new(
                args.text_dim.unwrap_or(shelfscout_embed::DEFAULT_HASHING_DIM),
            )))
        }
    }
}

fn load_catalog(args: &Args, text_dim: usize) -> anyhow::Result<CatalogStore> {
    if let Some(path) = &args.snapshot {
        let store = load_snapshot(path).with_context(|| format!("loading snapshot {}", path.display()))?;
        if store.config().text_dim != text_dim {
            bail!(
                "snapshot text dimension {} does not match the embedding model ({})",
                store.config().text_dim,
                text_dim
            );
        }
        return Ok(store);
    }

    let store = CatalogStore::new(CatalogConfig {
        text_dim,
        image_dim: DEFAULT_IMAGE_DIM,
    });
    match &args.catalog {
        Some(path) => {
            store
                .load_jsonl(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
        }
        None => bail!("either --catalog or --snapshot is required"),
    }
    Ok(store)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shelfscout v{}", env!("CARGO_PKG_VERSION"));

    // Providers use blocking HTTP, so they are built here and only driven
    // from tokio's blocking pool.
    let provider = text_provider(&args)?;
    info!("Embedding model: {} ({} dims)", provider.model(), provider.dimension());

    let store = load_catalog(&args, provider.dimension())?;
    info!("Catalog ready: {} products", store.len());

    let embeddings = Arc::new(EmbeddingCache::new(
        provider,
        CacheConfig {
            capacity: args.cache_capacity,
            ..Default::default()
        },
    ));

    if args.embed_missing {
        store.backfill_text_embeddings(|p| embeddings.embed(&p.embedding_text()))?;
    }

    if let Command::Snapshot { out } = &args.command {
        let count = save_snapshot(&store, out)?;
        info!("Snapshot written: {} products to {}", count, out.display());
        return Ok(());
    }

    let service = Arc::new(SearchService::new(
        Arc::clone(&embeddings),
        Arc::new(ImageEmbedder::new(Arc::new(ColorHistogramImageProvider))),
        Arc::new(store),
        ServiceConfig {
            request_timeout: Some(Duration::from_millis(args.timeout_ms)),
            ..Default::default()
        },
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // The service outlives the runtime so its HTTP client is never dropped
    // inside an async context.
    let svc = Arc::clone(&service);
    let outcome = runtime.block_on(async move {
        match args.command {
            Command::Search { query, k, filters } => {
                let filters = parse_filters(filters.as_deref())?;
                let hits = svc.search_async(query, filters, k).await?;
                print_json(&hits)
            }
            Command::Recommend {
                use_case,
                constraints,
                k,
            } => {
                let constraints = parse_filters(constraints.as_deref())?;
                let recs = svc.recommend_async(use_case, constraints, k).await?;
                print_json(&recs)
            }
            Command::Image { path, k } => {
                let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                let image = decode_image(&bytes)?;
                let result = svc.search_image_async(image, k).await?;
                print_json(&result)
            }
            Command::Snapshot { .. } => Ok(()),
        }
    });

    embeddings.run_pending_tasks();
    let stats = embeddings.stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        entries = embeddings.len(),
        "embedding cache"
    );
    outcome
}

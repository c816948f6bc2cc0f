use anyhow::{Context, Result};
use clap::Parser;
use lyrics_api::auth::AccessGate;
use lyrics_api::cache::LyricsCache;
use lyrics_api::remote::KugouClient;
use lyrics_api::resolver::Resolver;
use lyrics_api::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lyrics-api")]
#[command(version, about = "Lyrics API Server", long_about = None)]
struct Cli {
    /// Gate /lyrics behind bearer-token authentication
    #[arg(long, env = "ENABLE_AUTH")]
    enable_auth: bool,

    /// Validate tokens against the external key store instead of a fixed secret
    #[arg(long, env = "DYNAMIC_TOKEN")]
    dynamic_token: bool,

    /// Directory for cached lyrics files
    #[arg(long, env = "LYRICS_DIR", default_value = "/lyrics")]
    lyrics_dir: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "25775")]
    port: u16,

    /// Address of the key store backing dynamic tokens
    #[arg(long, env = "REDIS_ADDRESS", default_value = "localhost:6379")]
    redis_address: String,

    /// Fixed bearer token
    #[arg(long, env = "TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    tokio::fs::create_dir_all(&cli.lyrics_dir)
        .await
        .with_context(|| format!("Failed to create lyrics dir: {}", cli.lyrics_dir.display()))?;

    let gate = if cli.enable_auth {
        if cli.dynamic_token {
            tracing::info!("Auth enabled (dynamic tokens via {})", cli.redis_address);
            let client = redis::Client::open(format!("redis://{}", cli.redis_address))
                .context("Invalid key store address")?;
            let store = client
                .get_connection_manager()
                .await
                .context("Failed to connect to token store")?;
            Some(AccessGate::dynamic(Arc::new(store)))
        } else {
            let secret = cli.token.unwrap_or_default();
            if secret.is_empty() {
                tracing::warn!("Auth enabled without a fixed token; all requests will be denied");
            }
            tracing::info!("Auth enabled (fixed token)");
            Some(AccessGate::fixed(secret))
        }
    } else {
        None
    };

    let cache = LyricsCache::new(cli.lyrics_dir);
    let source = Arc::new(KugouClient::new().context("Failed to create lyrics client")?);
    let resolver = Resolver::new(cache, source);

    let app = server::create_router(AppState { resolver, gate });
    let addr = format!("0.0.0.0:{}", cli.port);

    tracing::info!("Server started on port {}", cli.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

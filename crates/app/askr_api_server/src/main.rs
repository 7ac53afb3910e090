//! askr API server binary.
//!
//! Loads (or generates) the signing key material, builds the in-memory
//! state, and serves the Yggdrasil URL surface.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use askr_api::cache::ResponseCache;
use askr_api::config::ApiConfig;
use askr_api::handlers::meta::warm_metadata_cache;
use askr_api::{AppState, router};
use askr_core::auth::jwt::{default_secret_path, resolve_token_secret};
use askr_core::auth::tokens::TokenEngine;
use askr_core::keys::SignatureKeys;
use askr_core::session::{SWEEP_INTERVAL, SessionStore, run_sweeper};
use askr_core::store::MemoryProfileStore;

/// Interval between revocation-set sweeps.
const REVOCATION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// CLI arguments. Environment variables (`ASKR_*`) configure the
/// rest; see `ApiConfig::from_env`.
#[derive(Parser, Debug)]
#[command(name = "askr_api_server", about = "Yggdrasil-compatible auth and session server")]
struct Args {
    /// Bind address; overrides `ASKR_BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// Seed the demo account (test1@example.com / password123) into
    /// the in-memory store.
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,askr_api=debug,askr_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.server_host = std::env::var("ASKR_SERVER_HOST").unwrap_or_else(|_| bind.clone());
        config.bind_addr = bind;
    }

    // 4096-bit generation takes a moment on first run.
    let keys = Arc::new(SignatureKeys::load_or_generate(
        &config.private_key_path(),
        &config.public_key_path(),
    )?);
    let token_secret = resolve_token_secret(&default_secret_path(&config.keys_dir));

    let store = Arc::new(MemoryProfileStore::new(config.non_email_login));
    if args.seed_demo {
        let profile_id = store.seed_demo()?;
        info!(profile = %profile_id, "seeded demo account test1@example.com");
    }

    let tokens = Arc::new(TokenEngine::new(store.clone(), token_secret));
    let sessions = Arc::new(SessionStore::default());
    let cache = Arc::new(ResponseCache::default());

    let state = AppState {
        store,
        tokens: tokens.clone(),
        sessions: sessions.clone(),
        keys,
        cache,
        config: config.clone(),
    };

    warm_metadata_cache(&state);

    tokio::spawn(run_sweeper(sessions, SWEEP_INTERVAL));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REVOCATION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            tokens.sweep_revocations();
        }
    });

    let app = router(state)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "askr API listening");
    axum::serve(listener, app).await?;

    Ok(())
}

//! `RecipeBox` Server
//!
//! HTTP backend for recipe storage, search and PDF export.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use recipebox_server::config::ServerConfig;
use recipebox_server::server::{AppState, build_router};
use recipebox_server::storage::RecipeDatabase;

#[derive(Parser)]
#[command(name = "recipebox-server")]
#[command(version, about = "RecipeBox server - recipe storage, search and PDF export")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "RECIPEBOX_ADDR", default_value = "0.0.0.0:3500")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long, env = "RECIPEBOX_DB")]
    db_path: Option<PathBuf>,

    /// Secret used to sign access tokens.
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: String,

    /// Secret used to sign refresh tokens.
    #[arg(long, env = "REFRESH_TOKEN_SECRET", hide_env_values = true)]
    refresh_token_secret: String,

    /// Access token TTL in seconds.
    #[arg(long, default_value_t = 600)]
    access_ttl: i64,

    /// Refresh token TTL in seconds.
    #[arg(long, default_value_t = 604_800)]
    refresh_ttl: i64,

    /// Regex of an allowed CORS origin. Repeatable; replaces the localhost defaults.
    #[arg(
        long = "allowed-origin",
        env = "RECIPEBOX_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    allowed_origins: Vec<String>,

    /// Issue the refresh cookie without `Secure` (plain-HTTP development).
    #[arg(long)]
    insecure_cookies: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".recipebox").join("recipes.db"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    recipebox_core::tracing_init::init_tracing("recipebox_server=info", args.log_json);

    let origins = if args.allowed_origins.is_empty() {
        ServerConfig::default_origin_patterns()
    } else {
        args.allowed_origins.clone()
    };
    let config = ServerConfig::new(
        args.access_token_secret.as_str(),
        args.refresh_token_secret.as_str(),
        &origins,
    )?
    .with_ttls(args.access_ttl, args.refresh_ttl)?
    .with_secure_cookies(!args.insecure_cookies);

    if args.insecure_cookies {
        warn!("Refresh cookie will be sent without Secure; do not use in production");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting recipebox-server"
    );

    let db_path = match args.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening recipe database");
    let db = RecipeDatabase::open(&db_path).await?;

    let app = build_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

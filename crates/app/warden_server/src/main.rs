//! Warden API server binary.
//!
//! Reads configuration from flags, the environment and an optional `.env`,
//! runs migrations, and serves the API until Ctrl-C. Pending notifications
//! are drained before exit.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use url::Url;
use warden_api::config::ApiConfig;
use warden_core::mail::LogMailer;
use warden_core::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};

/// Credential storage backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// PostgreSQL at `--database-url`.
    Postgres,
    /// Process memory; contents are lost on exit.
    Memory,
}

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "warden_server", version, about = "Warden credential API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,

    /// Path prefix for all routes.
    #[arg(long, env = "API_PREFIX", default_value = "/api/v1")]
    api_prefix: String,

    #[arg(long, value_enum, env = "WARDEN_STORE", default_value_t = StoreKind::Postgres)]
    store: StoreKind,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/warden"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Session token signing secret.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Session token lifetime in seconds.
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 3600)]
    session_ttl_secs: i64,

    /// Reset token signing secret; must differ from the session secret.
    #[arg(long, env = "JWT_SECRET_PASSWORD", hide_env_values = true)]
    reset_secret: String,

    /// Shared secret required to provision users.
    #[arg(long, env = "AUTH_BASE_TOKEN", hide_env_values = true)]
    provisioning_secret: String,

    /// Front-end base URL used in reset links.
    #[arg(long, env = "APP_URL", default_value = "http://localhost:3000")]
    app_url: Url,

    /// Application name used in notifications.
    #[arg(long, env = "APP_NAME", default_value = "Warden")]
    app_name: String,
}

impl Args {
    fn api_config(&self) -> ApiConfig {
        ApiConfig {
            bind_addr: self.bind_addr.clone(),
            api_prefix: self.api_prefix.clone(),
            jwt_secret: self.jwt_secret.clone(),
            session_ttl_secs: self.session_ttl_secs,
            reset_secret: self.reset_secret.clone(),
            provisioning_secret: self.provisioning_secret.clone(),
            app_url: self.app_url.clone(),
            app_name: self.app_name.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Write logs to stderr; stdout stays free for `--help`/`--version`.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_api=debug,warden_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.api_config();
    config.validate()?;

    info!(bind_addr = %config.bind_addr, store = ?args.store, "starting warden_server");

    let store: Arc<dyn CredentialStore> = match args.store {
        StoreKind::Postgres => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(&args.database_url)
                .await?;
            let store = PgCredentialStore::new(pool);
            info!("running database migrations");
            store.migrate().await?;
            Arc::new(store)
        }
        StoreKind::Memory => Arc::new(MemoryCredentialStore::new()),
    };

    let state = warden_api::AppState::new(config, store, Arc::new(LogMailer));
    let app = warden_api::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, prefix = %state.config.route_prefix(), "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(pending = state.users.notifier().pending(), "draining notifications");
    state.users.notifier().flush().await;
    info!("shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::routing::get;
use axum::{Json, Router, middleware};
use clap::{Parser, Subcommand};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use orggate_directory::{DirectoryService, HierarchyConfig};
use orggate_gate::auth::{CredentialValidator, KeyStore, SessionValidator};
use orggate_gate::middleware::{GateState, gate_middleware};
use orggate_gate::proxy::{Proxy, proxy_handler};
use orggate_gate::resolver::PermissionResolver;
use orggate_rebac::{HttpRelationEngine, InMemoryRelationEngine, RelationEngine};

use config::{AppConfig, EngineConfig};

/// OrgGate - multi-tenant identity and access gate
#[derive(Parser)]
#[command(name = "orggate-server")]
#[command(about = "OrgGate - multi-tenant identity and access gate")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for the HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("orggate={default_level},info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config {
        if !path.is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }

    init_logging(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        let addr: SocketAddr = config
            .server
            .bind_addr
            .parse()
            .context("server.bind_addr is not a socket address")?;
        config.server.bind_addr = SocketAddr::new(addr.ip(), port).to_string();
    }

    if cli.print_config {
        println!("Effective configuration:\n{config:#?}");
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    // Hierarchy validation is the part figment cannot catch.
    HierarchyConfig::new(config.hierarchy.clone())?;
    println!("Configuration is valid");
    Ok(())
}

fn build_engine(config: &EngineConfig) -> Result<Arc<dyn RelationEngine>> {
    Ok(match config {
        EngineConfig::InMemory => {
            tracing::warn!("using the in-memory relation engine; not for production");
            Arc::new(InMemoryRelationEngine::new())
        }
        EngineConfig::Http(http) => Arc::new(HttpRelationEngine::new(http)?),
    })
}

async fn connect_db(url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    orggate_directory::infra::storage::migrations::Migrator::up(&db, None).await?;
    orggate_gate::infra::storage::migrations::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("OrgGate server starting");

    let hierarchy = Arc::new(
        HierarchyConfig::new(config.hierarchy.clone()).context("invalid hierarchy config")?,
    );
    let db = connect_db(&config.server.database_url).await?;
    let engine = build_engine(&config.engine)?;

    let directory = Arc::new(DirectoryService::new(
        db.clone(),
        hierarchy,
        engine.clone(),
        config.directory.provision_default_child,
    ));

    let validator = CredentialValidator::new(
        SessionValidator::new(&config.gate.session),
        KeyStore::new(db, Duration::from_secs(config.gate.key_cache_ttl_secs)),
    );
    let resolver = PermissionResolver::new(engine, config.gate.check_retry.to_policy());
    let gate = GateState::new(validator, resolver, directory.clone(), &config.gate)?;

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .merge(orggate_directory::api::rest::router(directory));

    if let Some(downstream) = &config.downstream {
        let proxy = Arc::new(Proxy::new(downstream)?);
        app = app.fallback(move |req: Request| {
            let proxy = proxy.clone();
            async move { proxy_handler(State(proxy), req).await }
        });
        tracing::info!(base_url = %downstream.base_url, "forwarding allowed requests downstream");
    }

    let app = app
        .layer(middleware::from_fn_with_state(gate, gate_middleware))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install sigterm handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

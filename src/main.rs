use clap::Parser;
use couchdb_idp_updater::config::{Credentials, load_config};
use couchdb_idp_updater::reconciler::Reconciler;
use couchdb_idp_updater::status::StatusStore;
use couchdb_idp_updater::{logging, server};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "couchdb-idp-updater", about = "Syncs OIDC IdP signing keys into CouchDB")]
struct Cli {
    #[arg(long, env = "CONFIG_PATH", default_value = "data/config.json")]
    config: PathBuf,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: String,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    log_json: bool,

    #[arg(long, env = "ASSETS_DIR", default_value = "assets")]
    assets_dir: PathBuf,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, path = %cli.config.display(), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let creds = match Credentials::from_env() {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(error = %e, "CouchDB credentials not configured, all CouchDB calls will be skipped");
            None
        }
    };

    let status = StatusStore::new();
    let reconciler = Reconciler::new(config, creds, status.clone());
    tokio::spawn(reconciler.run());

    let listener = match tokio::net::TcpListener::bind(&cli.bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, bind = %cli.bind, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(bind = %cli.bind, "listening");
    let app = server::router(status, cli.assets_dir);
    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = serve.await {
        tracing::error!(error = %e, "HTTP server exited with an error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

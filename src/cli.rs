//! Command-line entry point for the server.
//!
//! Parses flags, layers them over the file and environment configuration,
//! then serves the web application until Ctrl+C or SIGTERM.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::logging;
use crate::service::TaskService;
use crate::tasks::{open_store, StoreKind};
use crate::templates::Templates;
use crate::web::{router, AppState};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Task list web server.
#[derive(Parser, Debug, Default)]
#[command(name = "tasklist-web")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML config file (defaults to ./tasklist-web.yaml if present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Store backend: sqlite or memory
    #[arg(long)]
    pub store: Option<StoreKind>,

    /// SQLite database path
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory of template overrides
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Delete every task before serving
    #[arg(long)]
    pub reset: bool,

    /// Render every page with sample data and exit
    #[arg(long)]
    pub check_templates: bool,
}

impl Cli {
    /// Override `config` with any flags that were given.
    #[must_use]
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        if let Some(database) = &self.database {
            config.database_path.clone_from(database);
        }
        if let Some(templates) = &self.templates {
            config.templates_dir = Some(templates.clone());
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }
        config
    }

    /// Resolve the effective configuration from file, environment and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or an environment variable is invalid.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let cwd = std::env::current_dir()?;
        let config = AppConfig::load(self.config.as_deref(), &cwd)?.apply_env()?;
        Ok(self.apply(config))
    }
}

/// Build the application state described by `config`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the templates fail to load.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let store = open_store(config.store, &config.database_path)?;
    let templates = Templates::load(config.templates_dir.as_deref())?;
    Ok(AppState::new(TaskService::new(store), templates))
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if startup fails or the server stops with an error.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;

    if cli.check_templates {
        let templates = Templates::load(config.templates_dir.as_deref())?;
        templates.verify()?;
        println!("Templates OK: {}", templates.names().join(", "));
        return Ok(());
    }

    logging::init(config.log_file.as_deref())?;
    info!(version = crate::VERSION, store = %config.store, "starting task list server");

    let state = build_state(&config)?;
    if config.store == StoreKind::Sqlite {
        info!(path = %config.database_path.display(), "using SQLite database");
    }

    if cli.reset {
        state.service.store().drop_collection()?;
        warn!("all tasks deleted (--reset)");
    }

    let address = config.bind_address();
    let listener = TcpListener::bind(address.as_str()).await?;
    match listener.local_addr() {
        Ok(local) => info!("listening on http://{local}"),
        Err(error) => warn!(%error, "could not determine local address"),
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Io)?;

    info!("server shutdown complete");
    Ok(())
}

/// Completes on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

//! yamdb-api - YaMDb review and rating service
//!
//! `serve` (the default) runs the HTTP API; `create-superuser` registers an
//! administrator and mails its confirmation code.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use yamdb_api::{build_router, AppState};
use yamdb_common::api::{load_signing_secret, TokenIssuer};
use yamdb_common::auth_flow;
use yamdb_common::config::{resolve_root_folder, TomlConfig};
use yamdb_common::db::init::init_database;
use yamdb_common::db::settings::RuntimeSettings;
use yamdb_common::mail::{FileMailer, LogMailer, MailBackend, Mailer};

#[derive(Debug, Parser)]
#[command(name = "yamdb-api", version, about = "YaMDb review and rating service")]
struct Args {
    /// Root folder holding the database and mail outbox
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Bootstrap config file (default: <config dir>/yamdb/config.toml)
    #[arg(long, env = "YAMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long, env = "YAMDB_BIND")]
    bind: Option<String>,

    /// Listen port, overrides the config file
    #[arg(long, env = "YAMDB_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Create an admin superuser and mail its confirmation code
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref())?;

    let level = &config.logging.level;
    let default_filter = format!(
        "yamdb_api={level},yamdb_common={level},tower_http={level}",
        level = level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // Build identification goes out before any database work
    info!(
        "Starting YaMDb API (yamdb-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Cannot create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    let settings = config.apply_to(RuntimeSettings::load(&pool).await?)?;
    let messages = config.messages()?;
    let secret = load_signing_secret(&pool).await?;
    let tokens = TokenIssuer::new(secret, settings.access_token_lifetime_secs);

    let mailer: Arc<dyn Mailer> = match config.mail.backend {
        MailBackend::Log => Arc::new(LogMailer {
            from: config.mail.from.clone(),
        }),
        MailBackend::File => {
            let outbox = config.outbox_dir(&root_folder);
            info!("Mail outbox: {}", outbox.display());
            Arc::new(FileMailer::new(config.mail.from.clone(), outbox))
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::CreateSuperuser { username, email } => {
            let user =
                auth_flow::create_superuser(&pool, &messages, mailer.as_ref(), &username, &email)
                    .await?;
            info!("Superuser {} created; confirmation code sent to {}", user.username, user.email);
            Ok(())
        }
        Command::Serve => {
            let bind = args.bind.unwrap_or_else(|| config.bind.clone());
            let port = args.port.unwrap_or(config.port);
            let addr = format!("{}:{}", bind, port);

            let state = AppState::new(pool, messages, tokens, mailer, settings);
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Cannot bind {}", addr))?;
            info!("yamdb-api listening on http://{}", addr);
            info!("Health check: http://{}/health", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("yamdb-api stopped");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

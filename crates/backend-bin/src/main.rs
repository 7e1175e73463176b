use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use authgate_backend::{
    config::{Environment, Settings},
    logging::init_logging,
    router::create_router,
    AppState,
};

/// Password login and signed session tokens over HTTP
#[derive(Debug, Parser)]
#[command(name = "authgate", version)]
struct Cli {
    /// Extra TOML file layered over config.toml and config.<APP_ENV>.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env = Environment::from_env();

    let mut settings =
        Settings::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    init_logging(&settings.log_level, settings.log_format)?;
    settings.validate(env).context("invalid configuration")?;
    info!(env = env.name(), data_dir = %settings.data_dir.display(), "starting authgate");

    let seed_admin = settings.seed_admin;
    let admin_password = settings.admin_password.clone();
    let addr = settings.bind_addr;

    let state = Arc::new(AppState::from_settings(settings).await?);
    if seed_admin && state.auth.seed_admin(&admin_password).await? {
        info!("seeded default admin user");
    }

    let app = create_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

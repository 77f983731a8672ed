use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use cafe::{
    application::error::AppError,
    bootstrap::{self, Connectors},
    config::{self, Command, ConfigSource},
    infra::{error::InfraError, telemetry},
};
use tokio::{net::TcpListener, signal, sync::Notify};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        return;
    };
    report_application_error(&error);
    process::exit(1);
}

/// Logs a fatal error, falling back to a stderr-only subscriber when
/// startup failed before telemetry was installed.
fn report_application_error(error: &AppError) {
    let log = || error!(target = "cafe::server", error = %error, "cafe exited with an error");

    if dispatcher::has_been_set() {
        log();
    } else {
        let fallback = Dispatch::new(tracing_fmt().with_max_level(Level::ERROR).finish());
        dispatcher::with_default(&fallback, log);
    }
}

async fn run() -> Result<(), AppError> {
    let source = ConfigSource::from_process();

    match source.command() {
        Command::CheckConfig => check_config(&source),
        Command::Serve(_) => run_serve(&source).await,
    }
}

fn check_config(source: &ConfigSource) -> Result<(), AppError> {
    let settings = config::load(source)?;
    println!("{}", settings.redacted_summary());
    Ok(())
}

async fn run_serve(source: &ConfigSource) -> Result<(), AppError> {
    let connectors = Connectors::standard()?;
    let app = bootstrap::start(source, &connectors, |settings| {
        telemetry::init(&settings.logging)
    })
    .await?;

    let addr = app.settings().server.addr;
    let grace = app.settings().server.graceful_shutdown;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "cafe::server",
        addr = %addr,
        mode = %app.settings().mode,
        routes = app.routes().len(),
        policies = %app.policies(),
        "cafe ready"
    );

    let draining = Arc::new(Notify::new());
    let server = axum::serve(listener, app.into_router().into_make_service())
        .with_graceful_shutdown({
            let draining = draining.clone();
            async move {
                shutdown_signal().await;
                draining.notify_one();
            }
        })
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&draining, grace) => {
            warn!(
                target = "cafe::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "cafe::server", "shutdown complete");
    Ok(())
}

async fn drain_deadline(draining: &Notify, grace: Duration) {
    draining.notified().await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(target = "cafe::server", error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(target = "cafe::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(target = "cafe::server", "Ctrl+C received, starting graceful shutdown"),
        _ = terminate => info!(target = "cafe::server", "SIGTERM received, starting graceful shutdown"),
    }
}

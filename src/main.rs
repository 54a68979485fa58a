use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod config;
mod handler;
mod http;
mod logger;
mod server;
mod telemetry;

use server::ServerError;
use telemetry::{NoopTracer, TelemetryError, TelemetryGuard, Tracer};

/// How long open connections get to finish after a shutdown signal
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: config::Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr().map_err(ServerError::Address)?;

    // The batch exporter spawns onto the runtime, so this must run inside it
    let (tracer, telemetry_guard) = init_tracing(&cfg);

    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg, tracer));
    let active_connections = Arc::new(AtomicUsize::new(0));

    let (shutdown_tx, shutdown_rx) = server::shutdown_channel();
    server::install_signal_handler(shutdown_tx)?;

    logger::log_server_start(&addr, &cfg);

    server::run_server_loop(
        listener,
        state,
        Arc::clone(&active_connections),
        shutdown_rx,
    )
    .await;

    let open = server::wait_for_drain(&active_connections, SHUTDOWN_GRACE).await;
    if open > 0 {
        logger::log_warning(&format!(
            "{open} connection(s) still open after {}s, closing",
            SHUTDOWN_GRACE.as_secs()
        ));
    }

    if let Some(guard) = telemetry_guard {
        guard.shutdown().await;
    }
    logger::log_shutdown_complete();
    Ok(())
}

/// Bring up the tracing backend, falling back to a no-op tracer so the
/// service keeps serving when the collector is unreachable or misconfigured
fn init_tracing(cfg: &config::Config) -> (Arc<dyn Tracer>, Option<TelemetryGuard>) {
    match telemetry::init(&cfg.telemetry, &cfg.app.environment) {
        Ok((tracer, guard)) => {
            logger::log_info("OpenTelemetry tracer initialized successfully");
            (tracer, Some(guard))
        }
        Err(TelemetryError::Disabled) => {
            logger::log_info("OpenTelemetry disabled, requests will not be traced");
            (Arc::new(NoopTracer), None)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to initialize OpenTelemetry: {e}, continuing without tracing"
            ));
            (Arc::new(NoopTracer), None)
        }
    }
}

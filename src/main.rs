#![allow(missing_docs)]

//! Poolwatch entry point.
//!
//! Loads configuration from the environment, wires the webhook transport,
//! and runs the monitor loop until interrupted. Exits 0 on interrupt and
//! non-zero on an unrecovered fault.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use poolwatch::alert::webhook::WebhookNotifier;
use poolwatch::alert::Notifier;
use poolwatch::config::Config;
use poolwatch::logging;
use poolwatch::monitor::Monitor;
use poolwatch::tail::LogTailer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load a .env file if present; real env vars win.
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    let _logging_guard = match &config.logs_dir {
        Some(dir) => Some(logging::init_with_file(dir).context("failed to initialise logging")?),
        None => {
            logging::init_console();
            None
        }
    };

    info!(
        webhook = if config.webhook_url.is_some() {
            "configured"
        } else {
            "NOT SET"
        },
        error_rate_threshold = config.error_rate_threshold,
        window_size = config.window_size,
        cooldown_secs = config.alert_cooldown.as_secs(),
        maintenance_mode = config.maintenance_mode,
        log_file = %config.log_file.display(),
        "poolwatch starting"
    );

    let notifier: Option<Arc<dyn Notifier>> = config
        .webhook_url
        .as_deref()
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn Notifier>);

    // Ctrl-C flips the watch channel; the monitor observes it between
    // line-processing iterations.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    // The file may not exist yet (the proxy starts in parallel); stay
    // interruptible while waiting for it.
    let mut tailer = tokio::select! {
        tailer = LogTailer::open(&config.log_file) => tailer?,
        _ = shutdown_rx.changed() => {
            info!("shut down before the log file appeared");
            return Ok(());
        }
    };

    let mut monitor = Monitor::new(&config, notifier);
    match monitor.run(&mut tailer, shutdown_rx).await {
        Ok(()) => {
            info!("poolwatch stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "fatal error, exiting");
            Err(e)
        }
    }
}

//! Application entry point: candy kiosk.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`KioskConfig`] from the path given as the first argument, or from
//!    the platform config dir (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the HTTP transport and request coordinator from config.
//! 5. Spawn the line-capture thread reading utterances from stdin.
//! 6. Run the stage scheduler until stdin closes.

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use candy_kiosk::{
    capture::{CaptureEvent, LineCapture},
    config::KioskConfig,
    coordinator::{HttpTransport, RequestCoordinator},
    pipeline::{LogSink, StageScheduler},
};

fn load_config() -> KioskConfig {
    let result = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            KioskConfig::load_from(&path)
        }
        None => KioskConfig::load(),
    };
    result.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        KioskConfig::default()
    })
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Candy kiosk starting up");

    // 2. Configuration
    let config = load_config();
    log::info!(
        "Backend {} ({} → {})",
        config.api.base_url,
        config.language.source,
        config.language.target
    );

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Transport + coordinator
    let transport = Arc::new(HttpTransport::from_config(&config.api));
    let coordinator = RequestCoordinator::new(transport);

    // 5. Capture thread: one utterance per line, plus `:lang` and `:restart`
    let (capture_tx, capture_rx) = mpsc::channel::<CaptureEvent>(16);
    let _capture = LineCapture::start(BufReader::new(std::io::stdin()), capture_tx)
        .context("failed to spawn line-capture thread")?;
    log::info!(
        "Type what the visitor says; `:lang <code>` switches the analysis language, \
         `:restart` starts a new session"
    );

    // 6. Scheduler (blocks until stdin closes)
    let scheduler = StageScheduler::new(config, coordinator, Arc::new(LogSink));
    rt.block_on(scheduler.run(capture_rx));

    log::info!("Candy kiosk stopped");
    Ok(())
}

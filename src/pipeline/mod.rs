//! Stage pipeline for the candy kiosk.
//!
//! This module sequences one visitor interaction through its stages and
//! hands each completed stage to a [`RenderSink`].
//!
//! # Architecture
//!
//! ```text
//! CaptureEvent (mpsc)
//!        │
//!        ▼
//! StageScheduler::run()  ← one tokio task
//!        │
//!        ├─ handlers::enter / captured / translated / analyzed   (pure)
//!        ├─ RequestCoordinator::send / send_pair                 (spawned)
//!        ├─ TimerHandle::schedule(resolved_at + delay)           (spawned)
//!        │
//!        └─ RenderSink::stage_completed(StageEvent)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use candy_kiosk::capture::CaptureEvent;
//! use candy_kiosk::config::KioskConfig;
//! use candy_kiosk::coordinator::{HttpTransport, RequestCoordinator};
//! use candy_kiosk::pipeline::{LogSink, StageScheduler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = KioskConfig::default();
//!     let transport = Arc::new(HttpTransport::from_config(&config.api));
//!     let scheduler = StageScheduler::new(
//!         config,
//!         RequestCoordinator::new(transport),
//!         Arc::new(LogSink),
//!     );
//!
//!     let (capture_tx, capture_rx) = mpsc::channel(16);
//!     let task = tokio::spawn(scheduler.run(capture_rx));
//!
//!     capture_tx
//!         .send(CaptureEvent::EndOfSpeech("Kan jeg få sjokolade".into()))
//!         .await
//!         .unwrap();
//!     drop(capture_tx);
//!     task.await.unwrap();
//! }
//! ```

pub mod handlers;
pub mod scheduler;
pub mod sink;
pub mod stage;
pub mod timer;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use handlers::{Directive, Effect, Step};
pub use scheduler::StageScheduler;
pub use sink::{LogSink, RenderSink, StageEvent};
pub use stage::Stage;
pub use timer::TimerHandle;

//! Render sink: the outbound edge of the pipeline.
//!
//! The scheduler hands one [`StageEvent`] per completed stage to a
//! [`RenderSink`].  Sinks must not block and cannot fail the pipeline:
//! `stage_completed` has no return value.

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::session::Session;

use super::stage::Stage;

// ---------------------------------------------------------------------------
// StageEvent
// ---------------------------------------------------------------------------

/// A stage finished; `session` is the context as of that stage.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: Stage,
    pub session: Session,
    /// When the stage's work resolved.
    pub at: Instant,
}

impl StageEvent {
    pub fn new(stage: Stage, session: &Session, at: Instant) -> Self {
        Self {
            stage,
            session: session.clone(),
            at,
        }
    }

    /// One-line description of what the stage produced.
    pub fn summary(&self) -> String {
        let s = &self.session;
        match self.stage {
            Stage::Capture => format!("heard {:?}", s.transcript().unwrap_or_default()),
            Stage::Translate => format!("translated to {:?}", s.translation().unwrap_or_default()),
            Stage::Analyze => format!(
                "{} morphs, {} labels, {} detected items",
                s.morphs().map_or(0, |m| m.morphs.len()),
                s.similarities().map_or(0, |sim| sim.force.len()),
                s.similarities().map_or(0, |sim| sim.embedded.len()),
            ),
            Stage::PresentGraph => format!(
                "force graph with {} nodes",
                s.similarities().map_or(0, |sim| sim.force_graph().nodes.len())
            ),
            Stage::PresentImage => format!(
                "camera image {}",
                s.similarities().map_or("<none>", |sim| sim.url.as_str())
            ),
            Stage::Select => format!(
                "selected item at {:?}",
                s.selection()
                    .and_then(|n| n.bounding_box.first())
                    .unwrap_or(&[0.0, 0.0])
            ),
            Stage::Dispense => "dispensing".to_string(),
            Stage::Thank => "thank you".to_string(),
            Stage::Sorry => "sorry".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// RenderSink
// ---------------------------------------------------------------------------

/// Receives stage-completion events and presents them.
pub trait RenderSink: Send + Sync {
    fn stage_completed(&self, event: StageEvent);
}

/// Forwards events over a channel; a closed receiver is ignored.
impl RenderSink for mpsc::UnboundedSender<StageEvent> {
    fn stage_completed(&self, event: StageEvent) {
        let _ = self.send(event);
    }
}

/// Writes a one-line summary per stage to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn stage_completed(&self, event: StageEvent) {
        log::info!(
            "render: [{}] {} (session {})",
            event.stage,
            event.summary(),
            event.session.id()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Stage scheduler: drives one session through the kiosk stages.
//!
//! [`StageScheduler`] owns the current stage, the session, at most one
//! pending timer and at most one pending request.  Capture events arrive
//! over a `tokio::sync::mpsc` channel; request completions and timer firings
//! come back on an internal channel tagged with the generation of the stage
//! instance that issued them.
//!
//! # Flow
//!
//! ```text
//! CaptureEvent::EndOfSpeech
//!   └─▶ handlers::captured                        [capture]
//!         └─▶ timer(capture_ms) ─▶ enter(translate)
//!               └─▶ send(translate) ─▶ handlers::translated
//!                     ├─ Ok  → timer(translate_ms) ─▶ enter(analyze)
//!                     └─ Err → enter(sorry)
//!
//! enter(stage)
//!   └─▶ cancel previous timer/request, generation += 1, handlers::enter
//!
//! Internal message with generation != current  →  discarded
//! ```
//!
//! Delays are measured from the moment a stage's work resolved, so a slow
//! request never eats into the display time of its result.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::api::{
    Endpoint, MorphAnalysis, PickupRequest, SimilarityResponse, TranslateRequest,
    TranslateResponse,
};
use crate::capture::CaptureEvent;
use crate::config::KioskConfig;
use crate::coordinator::{
    Canceller, NetworkError, PairCanceller, PairError, RequestCoordinator, RequestPair,
};
use crate::session::{Session, SessionPatch};

use super::handlers::{self, Directive, Effect, Step};
use super::sink::RenderSink;
use super::stage::Stage;
use super::timer::TimerHandle;

// ---------------------------------------------------------------------------
// Internal messages
// ---------------------------------------------------------------------------

/// Completions and timer firings, tagged with the stage instance they
/// belong to.
#[derive(Debug)]
enum Internal {
    Translated {
        generation: u64,
        resolved_at: Instant,
        result: Result<String, NetworkError>,
    },
    Analyzed {
        generation: u64,
        resolved_at: Instant,
        result: Result<(MorphAnalysis, SimilarityResponse), PairError>,
    },
    TimerFired {
        generation: u64,
        next: Stage,
    },
}

impl Internal {
    fn generation(&self) -> u64 {
        match self {
            Internal::Translated { generation, .. }
            | Internal::Analyzed { generation, .. }
            | Internal::TimerFired { generation, .. } => *generation,
        }
    }
}

/// The awaited request of the current stage.
#[derive(Debug)]
enum PendingRequest {
    Single(Canceller),
    Pair(PairCanceller),
}

impl PendingRequest {
    fn cancel(&self) -> usize {
        match self {
            PendingRequest::Single(c) => usize::from(c.cancel()),
            PendingRequest::Pair(c) => c.cancel(),
        }
    }
}

// ---------------------------------------------------------------------------
// StageScheduler
// ---------------------------------------------------------------------------

/// Runs the kiosk pipeline for one session at a time.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use candy_kiosk::config::KioskConfig;
/// use candy_kiosk::coordinator::{HttpTransport, RequestCoordinator};
/// use candy_kiosk::pipeline::{LogSink, StageScheduler};
///
/// # async fn example() {
/// let config = KioskConfig::default();
/// let transport = Arc::new(HttpTransport::from_config(&config.api));
/// let scheduler = StageScheduler::new(
///     config,
///     RequestCoordinator::new(transport),
///     Arc::new(LogSink),
/// );
///
/// let (capture_tx, capture_rx) = tokio::sync::mpsc::channel(16);
/// # drop(capture_tx);
/// scheduler.run(capture_rx).await;
/// # }
/// ```
pub struct StageScheduler {
    config: KioskConfig,
    coordinator: RequestCoordinator,
    sink: Arc<dyn RenderSink>,
    stage: Stage,
    session: Session,
    /// Bumped on every stage entry.
    generation: u64,
    timer: Option<TimerHandle>,
    request: Option<PendingRequest>,
    history: Vec<Stage>,
    /// Analysis language for the current and later sessions.
    target_language: String,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
}

impl StageScheduler {
    pub fn new(
        config: KioskConfig,
        coordinator: RequestCoordinator,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let target_language = config.language.target.clone();
        let session = fresh_session(&config.language.source, &target_language);
        Self {
            config,
            coordinator,
            sink,
            stage: Stage::Capture,
            session,
            generation: 0,
            timer: None,
            request: None,
            history: Vec::new(),
            target_language,
            internal_tx,
            internal_rx,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stages entered in the current session, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn has_pending_request(&self) -> bool {
        self.request.is_some()
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Run until `capture_rx` is closed, then cancel whatever is pending.
    pub async fn run(mut self, mut capture_rx: mpsc::Receiver<CaptureEvent>) {
        self.start();

        loop {
            tokio::select! {
                event = capture_rx.recv() => match event {
                    Some(event) => self.handle_capture(event),
                    None => break,
                },
                Some(message) = self.internal_rx.recv() => {
                    self.dispatch(message);
                }
            }
        }

        self.cancel_pending();
        log::info!("scheduler: capture channel closed, shutting down");
    }

    /// Enter `capture` for the first session.  Does nothing once started.
    pub fn start(&mut self) {
        if self.history.is_empty() {
            log::info!("scheduler: new session {}", self.session.id());
            self.enter(Stage::Capture);
        }
    }

    /// Process internal messages until one from the current stage instance
    /// has been applied.  Returns the stage afterwards, or `None` when
    /// nothing is pending and no message can arrive.
    pub async fn advance(&mut self) -> Option<Stage> {
        while self.timer.is_some() || self.request.is_some() {
            let message = self.internal_rx.recv().await?;
            if self.dispatch(message) {
                return Some(self.stage);
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Capture events
    // -----------------------------------------------------------------------

    pub fn handle_capture(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Interim(text) => {
                log::debug!("scheduler: interim transcript {text:?}");
            }
            CaptureEvent::EndOfSpeech(text) => {
                if self.stage.is_terminal() {
                    self.restart();
                }
                if self.stage != Stage::Capture || self.session.transcript().is_some() {
                    log::warn!(
                        "scheduler: end of speech ignored in {} (session {})",
                        self.stage,
                        self.session.id()
                    );
                    return;
                }
                let now = Instant::now();
                let step = handlers::captured(self.session.clone(), text, now);
                self.apply(step, now);
            }
            CaptureEvent::Language(code) => self.switch_language(code),
            CaptureEvent::Restart => self.restart(),
        }
    }

    /// Change the analysis language.  A session still in `capture` picks it
    /// up immediately; every later session starts with it.
    pub fn switch_language(&mut self, code: String) {
        log::info!(
            "scheduler: analysis language {} → {code}",
            self.target_language
        );
        self.target_language = code;
        if self.stage == Stage::Capture {
            self.session = self.session.clone().with(SessionPatch {
                target_language: Some(self.target_language.clone()),
                ..SessionPatch::default()
            });
        } else {
            log::debug!(
                "scheduler: session {} keeps its language until restart",
                self.session.id()
            );
        }
    }

    /// Discard the current session and begin a new one in `capture`.
    pub fn restart(&mut self) {
        self.cancel_pending();
        let previous = self.session.id();
        self.session = fresh_session(&self.config.language.source, &self.target_language);
        self.history.clear();
        log::info!(
            "scheduler: session {previous} replaced by {}",
            self.session.id()
        );
        self.enter(Stage::Capture);
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn enter(&mut self, stage: Stage) {
        if self.history.contains(&stage) {
            log::warn!(
                "scheduler: {stage} already entered in session {}, ignoring",
                self.session.id()
            );
            return;
        }

        self.cancel_pending();
        self.generation += 1;
        self.stage = stage;
        self.history.push(stage);
        log::info!(
            "scheduler: entering {stage} (generation {}, awaiting {} request(s))",
            self.generation,
            stage.awaited_requests()
        );

        let now = Instant::now();
        let step = handlers::enter(stage, self.session.clone(), now);
        self.apply(step, now);
    }

    fn apply(&mut self, step: Step, resolved_at: Instant) {
        let Step {
            session,
            directive,
            effect,
            event,
            failure,
        } = step;

        self.session = session;
        if let Some(event) = event {
            self.sink.stage_completed(event);
        }
        if let Some(effect) = effect {
            self.issue(effect);
        }

        match directive {
            Directive::Wait => {}
            Directive::Advance { next } => {
                let deadline = resolved_at + self.config.delays.for_stage(self.stage);
                let message = Internal::TimerFired {
                    generation: self.generation,
                    next,
                };
                log::debug!(
                    "scheduler: {next} due in {:?}",
                    deadline.saturating_duration_since(Instant::now())
                );
                self.timer = Some(TimerHandle::schedule(
                    deadline,
                    self.internal_tx.clone(),
                    message,
                ));
            }
            Directive::Fallback => {
                log::error!(
                    "scheduler: {}, falling back to sorry (session {})",
                    failure.as_deref().unwrap_or("stage failed"),
                    self.session.id()
                );
                if let Some(next) = self.stage.failure_successor() {
                    self.enter(next);
                }
            }
            Directive::Halt => {
                log::info!(
                    "scheduler: session {} finished in {}",
                    self.session.id(),
                    self.stage
                );
            }
        }
    }

    /// Apply one internal message.  Returns `false` when it was stale.
    fn dispatch(&mut self, message: Internal) -> bool {
        if message.generation() != self.generation {
            log::debug!(
                "scheduler: discarding stale message from generation {} (current {})",
                message.generation(),
                self.generation
            );
            return false;
        }

        match message {
            Internal::TimerFired { next, .. } => {
                self.timer = None;
                self.enter(next);
            }
            Internal::Translated {
                resolved_at,
                result,
                ..
            } => {
                self.request = None;
                if matches!(&result, Err(e) if e.is_abort()) {
                    log::debug!("scheduler: translate aborted, dropping result");
                    return true;
                }
                let step = handlers::translated(self.session.clone(), result, resolved_at);
                self.apply(step, resolved_at);
            }
            Internal::Analyzed {
                resolved_at,
                result,
                ..
            } => {
                self.request = None;
                if matches!(&result, Err(e) if e.is_abort()) {
                    log::debug!("scheduler: analyze aborted, dropping result");
                    return true;
                }
                let step = handlers::analyzed(self.session.clone(), result, resolved_at);
                self.apply(step, resolved_at);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    fn issue(&mut self, effect: Effect) {
        let generation = self.generation;
        let tx = self.internal_tx.clone();

        match effect {
            Effect::Translate(request) => {
                let in_flight = self
                    .coordinator
                    .send::<TranslateRequest, TranslateResponse>(Endpoint::Translate, &request);
                self.request = Some(PendingRequest::Single(in_flight.canceller()));
                tokio::spawn(async move {
                    let result = in_flight.await.and_then(|reply| {
                        reply.into_text().ok_or_else(|| {
                            NetworkError::MalformedResponse("empty translation array".into())
                        })
                    });
                    let _ = tx.send(Internal::Translated {
                        generation,
                        resolved_at: Instant::now(),
                        result,
                    });
                });
            }
            Effect::Analyze { morphs, similarity } => {
                let pair: RequestPair<MorphAnalysis, SimilarityResponse> = self.coordinator.send_pair(
                    Endpoint::Morphs,
                    &morphs,
                    Endpoint::Similarities,
                    &similarity,
                );
                self.request = Some(PendingRequest::Pair(pair.canceller()));
                tokio::spawn(async move {
                    let result = pair.resolve().await;
                    let _ = tx.send(Internal::Analyzed {
                        generation,
                        resolved_at: Instant::now(),
                        result,
                    });
                });
            }
            Effect::Dispense(request) => dispense(&self.coordinator, &request),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
            log::debug!("scheduler: cancelled timer for {}", self.stage);
        }
        if let Some(request) = self.request.take() {
            let cancelled = request.cancel();
            log::debug!(
                "scheduler: cancelled {cancelled} request(s) of {}",
                self.stage
            );
        }
    }
}

/// Fire the pickup request without tracking it.  Its outcome never changes
/// the pipeline.
fn dispense(coordinator: &RequestCoordinator, request: &PickupRequest) {
    let in_flight = coordinator.send::<PickupRequest, serde_json::Value>(Endpoint::Pickup, request);
    let id = request.id;
    tokio::spawn(async move {
        match in_flight.await {
            Ok(_) => log::debug!("scheduler: pickup acknowledged for session {id}"),
            Err(e) => log::warn!("scheduler: pickup failed for session {id}: {e}"),
        }
    });
}

fn fresh_session(source: &str, target: &str) -> Session {
    Session::create(source).with(SessionPatch {
        target_language: Some(target.to_string()),
        ..SessionPatch::default()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

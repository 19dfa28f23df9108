//! Stage handlers: pure functions from a session to the next step.
//!
//! A handler never performs I/O, logs or reads the clock.  It returns a
//! [`Step`]: the new session, what the scheduler should do next, the request
//! it should issue (if any) and the stage-completion event for the render
//! sink.  The scheduler passes in the instant the stage's work resolved and
//! logs any fallback reason itself.
//!
//! | Stage          | On entry                        | On resolution                  |
//! |----------------|---------------------------------|--------------------------------|
//! | `Capture`      | wait for end of speech          | [`captured`] → `Translate`     |
//! | `Translate`    | issue translate request         | [`translated`] → `Analyze`     |
//! | `Analyze`      | issue morphs + similarity pair  | [`analyzed`] → `PresentGraph`  |
//! | `PresentGraph` | emit, advance                   |                                |
//! | `PresentImage` | emit, advance                   |                                |
//! | `Select`       | project `nearest`, advance      |                                |
//! | `Dispense`     | fire pickup, advance            |                                |
//! | `Thank`/`Sorry`| emit, halt                      |                                |

use tokio::time::Instant;

use crate::api::{
    AnalysisRequest, MorphAnalysis, PickupRequest, SimilarityResponse, TranslateRequest,
};
use crate::coordinator::{NetworkError, PairError};
use crate::session::{Session, SessionPatch};

use super::sink::StageEvent;
use super::stage::Stage;

// ---------------------------------------------------------------------------
// Step / Directive / Effect
// ---------------------------------------------------------------------------

/// What the scheduler does after applying a [`Step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Stay in the stage until external input or a request resolves.
    Wait,
    /// Enter `next` once the current stage's delay has elapsed.
    Advance { next: Stage },
    /// Enter `Sorry` immediately.
    Fallback,
    /// Terminal; nothing further happens until an external restart.
    Halt,
}

/// Request a handler needs the coordinator to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Awaited single request.
    Translate(TranslateRequest),
    /// Awaited request pair; `morphs` is the primary member.
    Analyze {
        morphs: AnalysisRequest,
        similarity: AnalysisRequest,
    },
    /// Fire-and-forget; its outcome is only logged.
    Dispense(PickupRequest),
}

#[derive(Debug, Clone)]
pub struct Step {
    pub session: Session,
    pub directive: Directive,
    pub effect: Option<Effect>,
    pub event: Option<StageEvent>,
    /// Why the step falls back to `Sorry`; set only with
    /// [`Directive::Fallback`].
    pub failure: Option<String>,
}

impl Step {
    fn wait(session: Session, effect: Option<Effect>) -> Self {
        Self {
            session,
            directive: Directive::Wait,
            effect,
            event: None,
            failure: None,
        }
    }

    fn fallback(session: Session, reason: impl Into<String>) -> Self {
        Self {
            session,
            directive: Directive::Fallback,
            effect: None,
            event: None,
            failure: Some(reason.into()),
        }
    }

    /// Emit `stage`'s completion event, stamped `at`, and move on to its
    /// successor.
    fn complete(stage: Stage, session: Session, effect: Option<Effect>, at: Instant) -> Self {
        let event = Some(StageEvent::new(stage, &session, at));
        let directive = match stage.successor() {
            Some(next) => Directive::Advance { next },
            None => Directive::Halt,
        };
        Self {
            session,
            directive,
            effect,
            event,
            failure: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Handler run when `stage` is entered.
///
/// A stage whose required input is missing falls back to `Sorry` rather
/// than sending an empty request.
pub fn enter(stage: Stage, session: Session, at: Instant) -> Step {
    match stage {
        Stage::Capture => Step::wait(session, None),

        Stage::Translate => match session.transcript() {
            Some(text) => {
                let request = TranslateRequest {
                    id: session.id(),
                    text: text.to_string(),
                    source: session.source_language().to_string(),
                };
                Step::wait(session, Some(Effect::Translate(request)))
            }
            None => Step::fallback(session, "translate entered without a transcript"),
        },

        Stage::Analyze => match session.translation() {
            Some(text) => {
                let request = AnalysisRequest {
                    id: session.id(),
                    text: text.to_string(),
                    lang: session.target_language().to_string(),
                };
                let effect = Effect::Analyze {
                    morphs: request.clone(),
                    similarity: request,
                };
                Step::wait(session, Some(effect))
            }
            None => Step::fallback(session, "analyze entered without a translation"),
        },

        Stage::PresentGraph | Stage::PresentImage => {
            if session.similarities().is_some() {
                Step::complete(stage, session, None, at)
            } else {
                Step::fallback(session, format!("{stage} entered without similarities"))
            }
        }

        Stage::Select => select(session, at),

        Stage::Dispense => {
            let request = PickupRequest { id: session.id() };
            Step::complete(stage, session, Some(Effect::Dispense(request)), at)
        }

        Stage::Thank | Stage::Sorry => Step::complete(stage, session, None, at),
    }
}

/// Projects the service's `nearest` candidate into the session.
fn select(session: Session, at: Instant) -> Step {
    let nearest = match session.similarities() {
        Some(sim) => sim.nearest.clone(),
        None => return Step::fallback(session, "select entered without similarities"),
    };
    let session = session.with(SessionPatch {
        selection: Some(nearest),
        ..SessionPatch::default()
    });
    Step::complete(Stage::Select, session, None, at)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The capture provider delivered its final transcript.
pub fn captured(session: Session, transcript: String, at: Instant) -> Step {
    let transcript = transcript.trim().to_string();
    if transcript.is_empty() {
        return Step::wait(session, None);
    }
    let session = session.with(SessionPatch {
        transcript: Some(transcript),
        ..SessionPatch::default()
    });
    Step::complete(Stage::Capture, session, None, at)
}

/// The translate request resolved.  Aborts are filtered out by the
/// scheduler before this is called.
pub fn translated(session: Session, result: Result<String, NetworkError>, at: Instant) -> Step {
    match result {
        Ok(translation) => {
            let session = session.with(SessionPatch {
                translation: Some(translation),
                ..SessionPatch::default()
            });
            Step::complete(Stage::Translate, session, None, at)
        }
        Err(e) => Step::fallback(session, format!("translate failed: {e}")),
    }
}

/// The analyze pair resolved.  Aborts are filtered out by the scheduler
/// before this is called.
pub fn analyzed(
    session: Session,
    result: Result<(MorphAnalysis, SimilarityResponse), PairError>,
    at: Instant,
) -> Step {
    match result {
        Ok((morphs, similarity)) => {
            let session = session.with(SessionPatch {
                morphs: Some(morphs),
                similarities: Some(similarity.similarities),
                ..SessionPatch::default()
            });
            Step::complete(Stage::Analyze, session, None, at)
        }
        Err(e) => Step::fallback(session, format!("analyze failed: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

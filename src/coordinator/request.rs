//! Cancellable single request.
//!
//! Each request runs on its own tokio task.  [`InFlight`] is the future the
//! issuer awaits; [`Canceller`] is a cloneable handle that can stop waiting
//! on it from anywhere, exactly once.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::{AbortHandle, JoinError, JoinHandle};

use crate::api::Endpoint;

use super::error::NetworkError;

// ---------------------------------------------------------------------------
// Canceller
// ---------------------------------------------------------------------------

/// Handle that cancels one in-flight request.
///
/// Cancelling aborts the request task, so the transport future is dropped
/// and its result can never reach the pipeline.  The remote side may still
/// finish processing.
#[derive(Debug, Clone)]
pub struct Canceller {
    endpoint: Endpoint,
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl Canceller {
    /// `true` while the request has neither completed nor been cancelled.
    pub fn is_in_flight(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire) && !self.abort.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the request if it is still in flight.
    ///
    /// Returns `true` only for the call that actually cancelled it; calls on
    /// a completed or already-cancelled request are no-ops.
    pub fn cancel(&self) -> bool {
        if self.abort.is_finished() {
            return false;
        }
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.abort.abort();
        log::debug!("coordinator: cancelled {} request", self.endpoint);
        true
    }
}

// ---------------------------------------------------------------------------
// InFlight
// ---------------------------------------------------------------------------

/// A request running on its own task.  Resolves with the decoded response,
/// or with [`NetworkError::Aborted`] once cancelled, even if the task
/// managed to finish first.
#[derive(Debug)]
pub struct InFlight<R> {
    handle: JoinHandle<Result<R, NetworkError>>,
    canceller: Canceller,
}

impl<R: Send + 'static> InFlight<R> {
    pub(crate) fn spawn<F>(endpoint: Endpoint, work: F) -> Self
    where
        F: Future<Output = Result<R, NetworkError>> + Send + 'static,
    {
        let handle = tokio::spawn(work);
        let canceller = Canceller {
            endpoint,
            abort: handle.abort_handle(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        Self { handle, canceller }
    }
}

impl<R> InFlight<R> {
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.canceller.is_in_flight()
    }

    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }
}

fn join_outcome<R>(
    endpoint: Endpoint,
    cancelled: bool,
    joined: Result<Result<R, NetworkError>, JoinError>,
) -> Result<R, NetworkError> {
    if cancelled {
        return Err(NetworkError::Aborted);
    }
    match joined {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(NetworkError::Aborted),
        Err(e) => Err(NetworkError::Failed(format!(
            "{endpoint} request task panicked: {e}"
        ))),
    }
}

impl<R> Future for InFlight<R> {
    type Output = Result<R, NetworkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let joined = match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(joined) => joined,
            Poll::Pending => return Poll::Pending,
        };
        let cancelled = self.canceller.is_cancelled();
        Poll::Ready(join_outcome(self.canceller.endpoint, cancelled, joined))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn completed_request_resolves_with_value() {
        let req = InFlight::spawn(Endpoint::Translate, async { Ok::<_, NetworkError>(7) });
        assert_eq!(req.await, Ok(7));
    }

    #[tokio::test]
    async fn failure_is_passed_through() {
        let req = InFlight::<u32>::spawn(Endpoint::Morphs, async {
            Err(NetworkError::Failed("502".into()))
        });
        assert_eq!(req.await, Err(NetworkError::Failed("502".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_resolves_as_aborted() {
        let req = InFlight::spawn(Endpoint::Similarities, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, NetworkError>(1)
        });
        assert!(req.is_in_flight());
        assert!(req.cancel());
        assert!(!req.is_in_flight());
        assert_eq!(req.await, Err(NetworkError::Aborted));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_effective_only_once() {
        let req = InFlight::spawn(Endpoint::Similarities, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, NetworkError>(1)
        });
        let canceller = req.canceller();
        assert!(canceller.cancel());
        assert!(!canceller.cancel());
        assert!(!req.cancel());
    }

    #[tokio::test]
    async fn cancelling_a_finished_request_is_a_noop() {
        let req = InFlight::spawn(Endpoint::Pickup, async { Ok::<_, NetworkError>(()) });
        let canceller = req.canceller();
        assert_eq!(req.await, Ok(()));
        assert!(!canceller.is_in_flight());
        assert!(!canceller.cancel());
        assert!(!canceller.is_cancelled());
    }

    #[test]
    fn completion_after_cancel_is_ignored() {
        let outcome = join_outcome::<u32>(Endpoint::Morphs, true, Ok(Ok(5)));
        assert_eq!(outcome, Err(NetworkError::Aborted));
    }
}

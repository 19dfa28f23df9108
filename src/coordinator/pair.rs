//! Request pair: two concurrent requests resolved as one unit.
//!
//! ```text
//!   primary ──┐
//!             ├──▶ resolve() ──▶ Ok((A, B))          both succeeded
//!   secondary ┘                  Err(PairError)      first member to fail;
//!                                                    sibling cancelled once
//! ```
//!
//! Completion order does not matter: results are paired by [`Role`].  Once
//! the pair has resolved, the members are gone, so a sibling that still
//! completes late has nothing left to resolve.

use std::fmt;

use thiserror::Error;

use super::error::NetworkError;
use super::request::{Canceller, InFlight};

// ---------------------------------------------------------------------------
// Role / PairError
// ---------------------------------------------------------------------------

/// Position of a member within its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Secondary => f.write_str("secondary"),
        }
    }
}

/// The failure that resolved a pair.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{role} request of pair: {source}")]
pub struct PairError {
    /// Member whose outcome resolved the pair.
    pub role: Role,
    #[source]
    pub source: NetworkError,
}

impl PairError {
    pub fn is_abort(&self) -> bool {
        self.source.is_abort()
    }
}

// ---------------------------------------------------------------------------
// PairCanceller
// ---------------------------------------------------------------------------

/// Cancels both members of a pair; each only if still in flight.
#[derive(Debug, Clone)]
pub struct PairCanceller {
    primary: Canceller,
    secondary: Canceller,
}

impl PairCanceller {
    pub fn is_in_flight(&self) -> bool {
        self.primary.is_in_flight() || self.secondary.is_in_flight()
    }

    /// Returns how many members this call actually cancelled.
    pub fn cancel(&self) -> usize {
        usize::from(self.primary.cancel()) + usize::from(self.secondary.cancel())
    }
}

// ---------------------------------------------------------------------------
// RequestPair
// ---------------------------------------------------------------------------

/// Two requests issued together for one stage.
#[derive(Debug)]
pub struct RequestPair<A, B> {
    primary: InFlight<A>,
    secondary: InFlight<B>,
}

impl<A, B> RequestPair<A, B> {
    pub(crate) fn new(primary: InFlight<A>, secondary: InFlight<B>) -> Self {
        Self { primary, secondary }
    }

    pub fn canceller(&self) -> PairCanceller {
        PairCanceller {
            primary: self.primary.canceller(),
            secondary: self.secondary.canceller(),
        }
    }

    /// Wait for the pair.
    ///
    /// The first member to fail or be aborted resolves the pair: its sibling
    /// is cancelled if still in flight, and the pair fails with that
    /// member's error.  An aborted member resolves the pair as aborted.
    pub async fn resolve(self) -> Result<(A, B), PairError> {
        let RequestPair {
            mut primary,
            mut secondary,
        } = self;
        let mut first: Option<A> = None;
        let mut second: Option<B> = None;

        loop {
            tokio::select! {
                result = &mut primary, if first.is_none() => match result {
                    Ok(a) => match second.take() {
                        Some(b) => return Ok((a, b)),
                        None => first = Some(a),
                    },
                    Err(source) => {
                        secondary.cancel();
                        return Err(PairError { role: Role::Primary, source });
                    }
                },
                result = &mut secondary, if second.is_none() => match result {
                    Ok(b) => match first.take() {
                        Some(a) => return Ok((a, b)),
                        None => second = Some(b),
                    },
                    Err(source) => {
                        primary.cancel();
                        return Err(PairError { role: Role::Secondary, source });
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::Endpoint;

    /// Counts drops of a request future that never got to finish.
    struct DropCounter {
        finished: bool,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            if !self.finished {
                self.drops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn delayed<T: Send + 'static>(
        endpoint: Endpoint,
        after: Duration,
        outcome: Result<T, NetworkError>,
        drops: Arc<AtomicUsize>,
    ) -> InFlight<T> {
        InFlight::spawn(endpoint, async move {
            let mut guard = DropCounter {
                finished: false,
                drops,
            };
            tokio::time::sleep(after).await;
            guard.finished = true;
            outcome
        })
    }

    #[tokio::test(start_paused = true)]
    async fn both_succeed_in_any_order() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pair = RequestPair::new(
            delayed(Endpoint::Morphs, Duration::from_secs(3), Ok("morphs"), drops.clone()),
            delayed(Endpoint::Similarities, Duration::from_secs(1), Ok(42u32), drops.clone()),
        );
        assert_eq!(pair.resolve().await, Ok(("morphs", 42)));
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn secondary_failure_cancels_primary_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pair = RequestPair::new(
            delayed(Endpoint::Morphs, Duration::from_secs(10), Ok("late"), drops.clone()),
            delayed::<u32>(
                Endpoint::Similarities,
                Duration::from_secs(1),
                Err(NetworkError::Failed("500".into())),
                drops.clone(),
            ),
        );
        let canceller = pair.canceller();

        let err = pair.resolve().await.unwrap_err();
        assert_eq!(err.role, Role::Secondary);
        assert_eq!(err.source, NetworkError::Failed("500".into()));
        assert!(!err.is_abort());

        // Let the aborted task wind down, then well past its own completion.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(!canceller.is_in_flight());
        assert_eq!(canceller.cancel(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn primary_failure_cancels_secondary() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pair = RequestPair::new(
            delayed::<u32>(
                Endpoint::Morphs,
                Duration::from_secs(1),
                Err(NetworkError::MalformedResponse("eof".into())),
                drops.clone(),
            ),
            delayed(Endpoint::Similarities, Duration::from_secs(10), Ok(1u32), drops.clone()),
        );

        let err = pair.resolve().await.unwrap_err();
        assert_eq!(err.role, Role::Primary);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_sibling_finished_cancels_nothing() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pair = RequestPair::new(
            delayed(Endpoint::Morphs, Duration::from_secs(1), Ok(1u32), drops.clone()),
            delayed::<u32>(
                Endpoint::Similarities,
                Duration::from_secs(2),
                Err(NetworkError::Failed("timeout".into())),
                drops.clone(),
            ),
        );
        let canceller = pair.canceller();

        let err = pair.resolve().await.unwrap_err();
        assert_eq!(err.role, Role::Secondary);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        assert_eq!(canceller.cancel(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn external_cancel_resolves_as_abort() {
        let drops = Arc::new(AtomicUsize::new(0));
        let pair = RequestPair::new(
            delayed(Endpoint::Morphs, Duration::from_secs(5), Ok(1u32), drops.clone()),
            delayed(Endpoint::Similarities, Duration::from_secs(5), Ok(2u32), drops.clone()),
        );
        let canceller = pair.canceller();
        let resolving = tokio::spawn(pair.resolve());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(canceller.is_in_flight());
        assert_eq!(canceller.cancel(), 2);
        assert_eq!(canceller.cancel(), 0);

        let err = resolving.await.unwrap().unwrap_err();
        assert!(err.is_abort());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}

//! Request coordinator: issues single or paired cancellable requests.
//!
//! # Architecture
//!
//! ```text
//! RequestCoordinator::send(endpoint, payload)
//!        │  encode payload (serde_json)
//!        ▼
//! tokio::spawn ── Transport::post ── decode response ──▶ InFlight<R>
//!                                                         │
//!                                   Canceller ◀───────────┘ (abort, once)
//!
//! RequestCoordinator::send_pair(a, b) ──▶ RequestPair<A, B>::resolve()
//! ```
//!
//! Aborts are reported as [`NetworkError::Aborted`] and never as failures.
//! There is no retry anywhere in this module.

pub mod error;
pub mod pair;
pub mod request;
pub mod transport;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::Endpoint;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::NetworkError;
pub use pair::{PairCanceller, PairError, RequestPair, Role};
pub use request::{Canceller, InFlight};
pub use transport::{HttpTransport, Transport};

// ---------------------------------------------------------------------------
// RequestCoordinator
// ---------------------------------------------------------------------------

/// Issues requests against a shared [`Transport`].  Cheap to clone.
///
/// Must be used from within a tokio runtime: every request runs on its own
/// task so it can be cancelled independently of whoever awaits it.
#[derive(Clone)]
pub struct RequestCoordinator {
    transport: Arc<dyn Transport>,
}

impl RequestCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue one request.  The returned future resolves with the decoded
    /// response, a [`NetworkError::Failed`] / [`NetworkError::MalformedResponse`],
    /// or [`NetworkError::Aborted`] once cancelled.
    pub fn send<P, R>(&self, endpoint: Endpoint, payload: &P) -> InFlight<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let body = serde_json::to_value(payload)
            .map_err(|e| NetworkError::Failed(format!("could not encode {endpoint} payload: {e}")));
        let transport = Arc::clone(&self.transport);

        log::debug!("coordinator: issuing {endpoint} request");
        InFlight::spawn(endpoint, async move {
            let reply = transport.post(endpoint, body?).await?;
            let decoded = serde_json::from_value::<R>(reply)?;
            Ok(decoded)
        })
    }

    /// Issue two requests concurrently and coordinate them as one
    /// [`RequestPair`].  `a` takes the [`Role::Primary`] slot.
    pub fn send_pair<PA, RA, PB, RB>(
        &self,
        endpoint_a: Endpoint,
        payload_a: &PA,
        endpoint_b: Endpoint,
        payload_b: &PB,
    ) -> RequestPair<RA, RB>
    where
        PA: Serialize + ?Sized,
        RA: DeserializeOwned + Send + 'static,
        PB: Serialize + ?Sized,
        RB: DeserializeOwned + Send + 'static,
    {
        let primary = self.send(endpoint_a, payload_a);
        let secondary = self.send(endpoint_b, payload_b);
        RequestPair::new(primary, secondary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::api::{AnalysisRequest, MorphAnalysis, SimilarityResponse, TranslateResponse};
    use crate::session::SessionId;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Replies per endpoint after a fixed delay; records every body it saw.
    #[derive(Default)]
    struct Scripted {
        replies: HashMap<Endpoint, (Duration, Result<Value, NetworkError>)>,
        seen: Mutex<Vec<(Endpoint, Value)>>,
    }

    impl Scripted {
        fn reply(mut self, endpoint: Endpoint, after: Duration, value: Result<Value, NetworkError>) -> Self {
            self.replies.insert(endpoint, (after, value));
            self
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value, NetworkError> {
            self.seen.lock().unwrap().push((endpoint, body));
            let (after, reply) = self
                .replies
                .get(&endpoint)
                .cloned()
                .unwrap_or((Duration::ZERO, Err(NetworkError::Failed("unscripted".into()))));
            tokio::time::sleep(after).await;
            reply
        }
    }

    fn analysis_request() -> AnalysisRequest {
        AnalysisRequest {
            id: SessionId::new(),
            text: "May I have chocolate".into(),
            lang: "en".into(),
        }
    }

    fn similarity_json() -> Value {
        json!({
            "similarities": {
                "force": [], "embedded": [], "url": "/image/a.jpg",
                "nearest": { "box": [[0, 0], [1, 0], [1, 1], [0, 1]] }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn send_encodes_payload_and_decodes_reply() {
        let transport = Arc::new(Scripted::default().reply(
            Endpoint::Translate,
            Duration::ZERO,
            Ok(json!([{ "translatedText": "May I have chocolate" }])),
        ));
        let coordinator = RequestCoordinator::new(transport.clone());

        let body = json!({ "id": "abc", "text": "Kan jeg få sjokolade", "source": "no" });
        let resp: TranslateResponse = coordinator.send(Endpoint::Translate, &body).await.unwrap();

        assert_eq!(resp.into_text().as_deref(), Some("May I have chocolate"));
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (Endpoint::Translate, body));
    }

    #[tokio::test]
    async fn undecodable_reply_is_malformed() {
        let transport = Arc::new(Scripted::default().reply(
            Endpoint::Morphs,
            Duration::ZERO,
            Ok(json!({ "unexpected": true })),
        ));
        let coordinator = RequestCoordinator::new(transport);

        let err = coordinator
            .send::<_, MorphAnalysis>(Endpoint::Morphs, &analysis_request())
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::MalformedResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn pair_pairs_by_role_not_completion_order() {
        let transport = Arc::new(
            Scripted::default()
                .reply(Endpoint::Morphs, Duration::from_secs(4), Ok(json!({ "morphs": [] })))
                .reply(Endpoint::Similarities, Duration::from_secs(1), Ok(similarity_json())),
        );
        let coordinator = RequestCoordinator::new(transport);
        let req = analysis_request();

        let (morphs, sim): (MorphAnalysis, SimilarityResponse) = coordinator
            .send_pair(Endpoint::Morphs, &req, Endpoint::Similarities, &req)
            .resolve()
            .await
            .unwrap();

        assert!(morphs.morphs.is_empty());
        assert_eq!(sim.similarities.url, "/image/a.jpg");
    }

    #[tokio::test(start_paused = true)]
    async fn pair_failure_reports_originating_error() {
        let transport = Arc::new(
            Scripted::default()
                .reply(Endpoint::Morphs, Duration::from_secs(9), Ok(json!({ "morphs": [] })))
                .reply(
                    Endpoint::Similarities,
                    Duration::from_secs(1),
                    Err(NetworkError::Failed("HTTP 500".into())),
                ),
        );
        let coordinator = RequestCoordinator::new(transport);
        let req = analysis_request();

        let pair = coordinator
            .send_pair::<_, MorphAnalysis, _, SimilarityResponse>(
                Endpoint::Morphs,
                &req,
                Endpoint::Similarities,
                &req,
            );
        let canceller = pair.canceller();
        let err = pair.resolve().await.unwrap_err();

        assert_eq!(err.role, Role::Secondary);
        assert_eq!(err.source, NetworkError::Failed("HTTP 500".into()));
        assert!(!canceller.is_in_flight());
    }
}

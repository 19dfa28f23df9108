//! JSON wire types for the kiosk backend endpoints.
//!
//! | Endpoint       | Request                 | Response               |
//! |----------------|-------------------------|------------------------|
//! | `Translate`    | [`TranslateRequest`]    | [`TranslateResponse`]  |
//! | `Morphs`       | [`AnalysisRequest`]     | [`MorphAnalysis`]      |
//! | `Similarities` | [`AnalysisRequest`]     | [`SimilarityResponse`] |
//! | `Pickup`       | [`PickupRequest`]       | any JSON value         |
//!
//! Besides the raw types, the response modules carry the small projections
//! a renderer needs (dependency arcs, force-graph dataset, best label per
//! detected item).  None of them take part in control flow.

pub mod morphs;
pub mod pickup;
pub mod similarity;
pub mod translate;

use std::fmt;

use serde::Serialize;

use crate::session::SessionId;

pub use morphs::{Dependency, Morph, MorphAnalysis, PartOfSpeech};
pub use pickup::PickupRequest;
pub use similarity::{EmbeddedItem, ForceGraph, LabelScore, Nearest, Similarities, SimilarityResponse};
pub use translate::{TranslateRequest, TranslateResponse, Translation};

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Named remote endpoint.  URLs are resolved from
/// [`ApiConfig`](crate::config::ApiConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Translate,
    Morphs,
    Similarities,
    Pickup,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Translate => "translate",
            Endpoint::Morphs => "morphs",
            Endpoint::Similarities => "similarities",
            Endpoint::Pickup => "pickup",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// AnalysisRequest
// ---------------------------------------------------------------------------

/// Body shared by the morphological-analysis and similarity endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub id: SessionId,
    pub text: String,
    pub lang: String,
}

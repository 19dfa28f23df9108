//! Session context: the accumulating record of one visitor interaction.
//!
//! A [`Session`] is a plain value.  Stage handlers receive it by value and
//! hand back a new one built with [`Session::with`]; nothing mutates a
//! session another stage has already captured.
//!
//! ```
//! use candy_kiosk::session::{Session, SessionPatch};
//!
//! let session = Session::create("no");
//! let session = session.with(SessionPatch {
//!     transcript: Some("Kan jeg få sjokolade".into()),
//!     ..SessionPatch::default()
//! });
//! assert_eq!(session.transcript(), Some("Kan jeg få sjokolade"));
//! assert!(session.translation().is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{MorphAnalysis, Nearest, Similarities};

/// Target language used until the scheduler patches in the configured one.
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Identifier sent as `id` with every endpoint request of one interaction.
///
/// Random v4 UUIDs; 122 random bits keep the collision probability
/// negligible for any realistic number of sessions per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// SessionPatch
// ---------------------------------------------------------------------------

/// Fields to merge into a [`Session`].
///
/// `Some` overwrites the session's field, `None` leaves it untouched.  A
/// patch can never clear a field.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub target_language: Option<String>,
    pub transcript: Option<String>,
    pub translation: Option<String>,
    pub morphs: Option<MorphAnalysis>,
    pub similarities: Option<Similarities>,
    pub selection: Option<Nearest>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One visitor interaction.
///
/// Fields are populated stage by stage and are only reachable through
/// accessors, so the only way to change a session is to build a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    source_language: String,
    target_language: String,
    transcript: Option<String>,
    translation: Option<String>,
    morphs: Option<MorphAnalysis>,
    similarities: Option<Similarities>,
    selection: Option<Nearest>,
}

impl Session {
    /// Start a new interaction with a fresh identifier and no data.
    pub fn create(source_language: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            source_language: source_language.into(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            transcript: None,
            translation: None,
            morphs: None,
            similarities: None,
            selection: None,
        }
    }

    /// Return a session with every `Some` field of `patch` merged in.
    ///
    /// The whole patch is applied before the new value is returned, so no
    /// caller can observe it half-applied.
    pub fn with(self, patch: SessionPatch) -> Self {
        Self {
            id: self.id,
            source_language: self.source_language,
            target_language: patch.target_language.unwrap_or(self.target_language),
            transcript: patch.transcript.or(self.transcript),
            translation: patch.translation.or(self.translation),
            morphs: patch.morphs.or(self.morphs),
            similarities: patch.similarities.or(self.similarities),
            selection: patch.selection.or(self.selection),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Final transcript delivered by the speech-capture provider.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Transcript translated into the target language.
    pub fn translation(&self) -> Option<&str> {
        self.translation.as_deref()
    }

    pub fn morphs(&self) -> Option<&MorphAnalysis> {
        self.morphs.as_ref()
    }

    pub fn similarities(&self) -> Option<&Similarities> {
        self.similarities.as_ref()
    }

    /// Candidate chosen for dispensing.
    pub fn selection(&self) -> Option<&Nearest> {
        self.selection.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn create_starts_empty() {
        let session = Session::create("no");
        assert_eq!(session.source_language(), "no");
        assert_eq!(session.target_language(), DEFAULT_TARGET_LANGUAGE);
        assert!(session.transcript().is_none());
        assert!(session.translation().is_none());
        assert!(session.morphs().is_none());
        assert!(session.similarities().is_none());
        assert!(session.selection().is_none());
    }

    #[test]
    fn sequential_sessions_have_distinct_ids() {
        let ids: HashSet<SessionId> = (0..1_000).map(|_| Session::create("no").id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn with_merges_only_set_fields() {
        let session = Session::create("no").with(SessionPatch {
            transcript: Some("Jeg liker smurf".into()),
            ..SessionPatch::default()
        });
        let id = session.id();

        let session = session.with(SessionPatch {
            translation: Some("I like smurf".into()),
            target_language: Some("ja".into()),
            ..SessionPatch::default()
        });

        assert_eq!(session.id(), id);
        assert_eq!(session.transcript(), Some("Jeg liker smurf"));
        assert_eq!(session.translation(), Some("I like smurf"));
        assert_eq!(session.target_language(), "ja");
    }

    #[test]
    fn with_overwrites_existing_values() {
        let session = Session::create("no")
            .with(SessionPatch {
                translation: Some("first".into()),
                ..SessionPatch::default()
            })
            .with(SessionPatch {
                translation: Some("second".into()),
                ..SessionPatch::default()
            });
        assert_eq!(session.translation(), Some("second"));
    }

    #[test]
    fn empty_patch_is_identity() {
        let session = Session::create("no");
        let patched = session.clone().with(SessionPatch::default());
        assert_eq!(session, patched);
    }

    #[test]
    fn earlier_value_is_unaffected_by_later_patch() {
        let before = Session::create("no");
        let after = before.clone().with(SessionPatch {
            transcript: Some("Kan jeg få lakris".into()),
            ..SessionPatch::default()
        });
        assert!(before.transcript().is_none());
        assert_eq!(after.id(), before.id());
    }
}

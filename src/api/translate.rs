//! Translation endpoint: `{id, text, source}` → `[{translatedText, ...}, ...]`.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslateRequest {
    pub id: SessionId,
    pub text: String,
    /// Language code of `text`, e.g. `"no"`.
    pub source: String,
}

/// One translation candidate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
}

/// The endpoint answers with a bare JSON array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TranslateResponse(pub Vec<Translation>);

impl TranslateResponse {
    /// Text of the first candidate; `None` for an empty array.
    pub fn into_text(self) -> Option<String> {
        self.0.into_iter().next().map(|t| t.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_first_translation() {
        let resp: TranslateResponse = serde_json::from_value(serde_json::json!([
            { "translatedText": "May I have chocolate", "detectedSourceLanguage": "no" },
            { "translatedText": "Can I get chocolate" }
        ]))
        .unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("May I have chocolate"));
    }

    #[test]
    fn empty_array_has_no_text() {
        let resp: TranslateResponse = serde_json::from_value(serde_json::json!([])).unwrap();
        assert!(resp.into_text().is_none());
    }

    #[test]
    fn object_instead_of_array_is_rejected() {
        let resp = serde_json::from_value::<TranslateResponse>(
            serde_json::json!({ "translatedText": "x" }),
        );
        assert!(resp.is_err());
    }
}

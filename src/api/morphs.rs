//! Morphological-analysis endpoint response:
//! `{morphs: [{word, pos: {tag, ...}, depend: {label, index: [...]}}]}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphAnalysis {
    pub morphs: Vec<Morph>,
}

impl MorphAnalysis {
    /// Dependency arcs as `(from, to)` token indices, in response order.
    ///
    /// A token with several heads yields one arc per head.
    pub fn dependency_arcs(&self) -> Vec<(usize, usize)> {
        self.morphs
            .iter()
            .enumerate()
            .flat_map(|(from, morph)| morph.depend.index.iter().map(move |&to| (from, to)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morph {
    pub word: String,
    pub pos: PartOfSpeech,
    pub depend: Dependency,
}

impl Morph {
    /// Displayable part-of-speech features: string values only, without the
    /// `tag` key and without values the analyser marked `UNKNOWN`.
    pub fn features(&self) -> Vec<(&str, &str)> {
        self.pos
            .features
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|v| (key.as_str(), v)))
            .filter(|(_, value)| !value.contains("UNKNOWN"))
            .collect()
    }
}

/// Part-of-speech block.  `tag` is always present; every other key
/// (`case`, `number`, `tense`, ...) lands in `features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartOfSpeech {
    pub tag: String,
    #[serde(flatten)]
    pub features: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub label: String,
    #[serde(default)]
    pub index: Vec<usize>,
}

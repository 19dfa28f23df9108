//! Similarity endpoint response:
//! `{similarities: {force: [...], embedded: [...], url, nearest: {box, ...}}}`.
//!
//! The service picks the `nearest` candidate itself; the kiosk only
//! projects it out of the response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResponse {
    pub similarities: Similarities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarities {
    /// Label similarities to the request text, one node per label.
    #[serde(default)]
    pub force: Vec<LabelScore>,
    /// Items detected in the camera image.
    #[serde(default)]
    pub embedded: Vec<EmbeddedItem>,
    /// Camera image the `embedded` boxes refer to.
    pub url: String,
    pub nearest: Nearest,
}

impl Similarities {
    /// Node/link dataset for the force graph: a fixed centre node standing
    /// for the request text, then one node per `force` entry, each linked
    /// to the centre.
    pub fn force_graph(&self) -> ForceGraph {
        let centre = LabelScore {
            label: String::new(),
            lid: 0,
            em: 0.0,
        };
        let nodes: Vec<LabelScore> = std::iter::once(centre)
            .chain(self.force.iter().cloned())
            .collect();
        let links = (1..nodes.len()).map(|target| (0, target)).collect();
        ForceGraph { nodes, links }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub lid: u32,
    pub em: f64,
}

/// One item found in the camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedItem {
    /// Corner points of the item's outline, in image pixels.
    #[serde(rename = "box")]
    pub bounding_box: Vec<[f64; 2]>,
    #[serde(default)]
    pub similarities: Vec<LabelScore>,
}

impl EmbeddedItem {
    /// Label this item resembles most.  The first entry wins a tie.
    pub fn best_match(&self) -> Option<&LabelScore> {
        self.similarities.iter().fold(None, |best, score| match best {
            Some(b) if b.em >= score.em => Some(b),
            _ => Some(score),
        })
    }
}

/// The candidate the service designated for dispensing.  Fields other than
/// `box` are kept verbatim for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nearest {
    #[serde(rename = "box")]
    pub bounding_box: Vec<[f64; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceGraph {
    pub nodes: Vec<LabelScore>,
    pub links: Vec<(usize, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimilarityResponse {
        serde_json::from_value(serde_json::json!({
            "similarities": {
                "force": [
                    { "label": "chocolate", "lid": 1, "em": 0.82 },
                    { "label": "licorice", "lid": 2, "em": 0.11 }
                ],
                "embedded": [
                    {
                        "box": [[10, 10], [60, 10], [60, 50], [10, 50]],
                        "similarities": [
                            { "label": "chocolate", "lid": 1, "em": 0.4 },
                            { "label": "licorice", "lid": 2, "em": 0.7 },
                            { "label": "smurf", "lid": 3, "em": 0.7 }
                        ]
                    },
                    { "box": [[0, 0], [1, 0], [1, 1], [0, 1]] }
                ],
                "url": "/image/capture.jpg",
                "nearest": {
                    "box": [[10, 10], [60, 10], [60, 50], [10, 50]],
                    "label": "licorice",
                    "em": 0.7
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn decodes_nearest_with_extra_fields() {
        let sim = sample().similarities;
        assert_eq!(sim.nearest.bounding_box.len(), 4);
        assert_eq!(sim.nearest.bounding_box[1], [60.0, 10.0]);
        assert_eq!(sim.nearest.extra["label"], "licorice");
        assert_eq!(sim.url, "/image/capture.jpg");
    }

    #[test]
    fn best_match_prefers_first_on_tie() {
        let sim = sample().similarities;
        let best = sim.embedded[0].best_match().unwrap();
        assert_eq!(best.label, "licorice");
        assert!(sim.embedded[1].best_match().is_none());
    }

    #[test]
    fn force_graph_links_every_node_to_centre() {
        let graph = sample().similarities.force_graph();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[0].lid, 0);
        assert!(graph.nodes[0].label.is_empty());
        assert_eq!(graph.nodes[1].label, "chocolate");
        assert_eq!(graph.links, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn missing_nearest_is_rejected() {
        let result = serde_json::from_value::<SimilarityResponse>(serde_json::json!({
            "similarities": { "force": [], "embedded": [], "url": "x" }
        }));
        assert!(result.is_err());
    }
}

//! The kiosk's stages and their fixed ordering.
//!
//! The state machine transitions are:
//!
//! ```text
//! Capture ──end of speech──▶ Translate ──▶ Analyze ──▶ PresentGraph
//!     ──▶ PresentImage ──▶ Select ──▶ Dispense ──▶ Thank
//!
//! Translate / Analyze ──failure──▶ Sorry
//! Thank / Sorry ──external restart──▶ Capture (new session)
//! ```

use std::fmt;

/// One named step of the interaction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Waiting for the speech-capture provider's final transcript.
    Capture,
    /// Translating the transcript into the target language.
    Translate,
    /// Morphological analysis and similarity search, as a request pair.
    Analyze,
    /// Label similarities shown as a force graph.
    PresentGraph,
    /// Detected items shown on the camera image.
    PresentImage,
    /// Nearest candidate highlighted.
    Select,
    /// Pickup request fired in the background.
    Dispense,
    /// Successful run finished.
    Thank,
    /// Failed run finished.
    Sorry,
}

impl Stage {
    /// Stages of a successful run, in order.
    pub const LINEAR: [Stage; 8] = [
        Stage::Capture,
        Stage::Translate,
        Stage::Analyze,
        Stage::PresentGraph,
        Stage::PresentImage,
        Stage::Select,
        Stage::Dispense,
        Stage::Thank,
    ];

    /// Stage entered when this one completes successfully.
    ///
    /// ```
    /// use candy_kiosk::pipeline::Stage;
    ///
    /// assert_eq!(Stage::Analyze.successor(), Some(Stage::PresentGraph));
    /// assert_eq!(Stage::Thank.successor(), None);
    /// assert_eq!(Stage::Sorry.successor(), None);
    /// ```
    pub fn successor(&self) -> Option<Stage> {
        match self {
            Stage::Capture => Some(Stage::Translate),
            Stage::Translate => Some(Stage::Analyze),
            Stage::Analyze => Some(Stage::PresentGraph),
            Stage::PresentGraph => Some(Stage::PresentImage),
            Stage::PresentImage => Some(Stage::Select),
            Stage::Select => Some(Stage::Dispense),
            Stage::Dispense => Some(Stage::Thank),
            Stage::Thank | Stage::Sorry => None,
        }
    }

    /// Stage entered when this one fails.  Every non-terminal stage falls
    /// back to `Sorry`, though only the network stages can actually fail.
    pub fn failure_successor(&self) -> Option<Stage> {
        if self.is_terminal() {
            None
        } else {
            Some(Stage::Sorry)
        }
    }

    /// `true` for `Thank` and `Sorry`; only an external restart leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Thank | Stage::Sorry)
    }

    /// Number of requests the stage waits on before it can advance.
    /// `Dispense` fires its request without waiting, so it counts as zero.
    pub fn awaited_requests(&self) -> usize {
        match self {
            Stage::Translate => 1,
            Stage::Analyze => 2,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Translate => "translate",
            Stage::Analyze => "analyze",
            Stage::PresentGraph => "present-graph",
            Stage::PresentImage => "present-image",
            Stage::Select => "select",
            Stage::Dispense => "dispense",
            Stage::Thank => "thank",
            Stage::Sorry => "sorry",
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Capture
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

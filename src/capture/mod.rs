//! Speech-capture collaborator.
//!
//! Recognition itself happens outside this crate.  Whatever performs it
//! delivers [`CaptureEvent`]s to the scheduler over a `tokio::sync::mpsc`
//! channel; [`LineCapture`] is the provider used by the binary, reading one
//! utterance per line from any `BufRead`.
//!
//! # Usage
//!
//! ```no_run
//! use std::io::BufReader;
//! use tokio::sync::mpsc;
//! use candy_kiosk::capture::LineCapture;
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let _capture = LineCapture::start(BufReader::new(std::io::stdin()), tx)
//!     .expect("capture thread");
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod listener;

pub use listener::LineCapture;

/// Line that requests an external restart.
pub const RESTART_COMMAND: &str = ":restart";

/// Command switching the analysis language, followed by a code: `:lang ja`.
pub const LANGUAGE_COMMAND: &str = ":lang";

/// Prefix marking a line as an interim (non-final) transcript.
pub const INTERIM_PREFIX: char = '~';

// ---------------------------------------------------------------------------
// CaptureEvent
// ---------------------------------------------------------------------------

/// Events emitted by a speech-capture provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Partial recognition result; informational only.
    Interim(String),
    /// The visitor stopped speaking; carries the final transcript.
    EndOfSpeech(String),
    /// The visitor picked another analysis language (`en`, `ja`, ...).
    Language(String),
    /// Abandon the current session and start over.
    Restart,
}

// ---------------------------------------------------------------------------
// parse_line
// ---------------------------------------------------------------------------

/// Parse one input line into a [`CaptureEvent`].
///
/// Returns `None` for blank lines and for a language command without a
/// code.
///
/// # Examples
///
/// ```
/// use candy_kiosk::capture::{parse_line, CaptureEvent};
///
/// assert_eq!(parse_line(":restart"), Some(CaptureEvent::Restart));
/// assert_eq!(parse_line(":lang ja"), Some(CaptureEvent::Language("ja".into())));
/// assert_eq!(parse_line("~Kan jeg"), Some(CaptureEvent::Interim("Kan jeg".into())));
/// assert_eq!(
///     parse_line("Kan jeg få sjokolade"),
///     Some(CaptureEvent::EndOfSpeech("Kan jeg få sjokolade".into()))
/// );
/// assert_eq!(parse_line("   "), None);
/// ```
pub fn parse_line(line: &str) -> Option<CaptureEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line == RESTART_COMMAND {
        return Some(CaptureEvent::Restart);
    }
    if let Some(rest) = line.strip_prefix(LANGUAGE_COMMAND) {
        if rest.is_empty() {
            return None;
        }
        if rest.starts_with(char::is_whitespace) {
            return Some(CaptureEvent::Language(rest.trim_start().to_string()));
        }
    }
    match line.strip_prefix(INTERIM_PREFIX) {
        Some(partial) => Some(CaptureEvent::Interim(partial.trim_start().to_string())),
        None => Some(CaptureEvent::EndOfSpeech(line.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

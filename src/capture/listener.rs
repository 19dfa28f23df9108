//! Dedicated OS-thread line reader feeding capture events to the scheduler.
//!
//! Reading from a `BufRead` such as stdin blocks, so it cannot live inside a
//! tokio task.  [`LineCapture`] owns that thread and a stop flag; dropping it
//! sets the flag so the thread forwards nothing further.
//!
//! # Shutdown caveat
//!
//! A blocked read cannot be interrupted.  After the handle is dropped the
//! thread stays parked in its current read until the next line or EOF
//! arrives, then exits without forwarding it.

use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{parse_line, CaptureEvent};

// ---------------------------------------------------------------------------
// LineCapture
// ---------------------------------------------------------------------------

/// Handle to a running line-capture thread.
///
/// Construct one with [`LineCapture::start`].  Drop it to stop forwarding
/// events.  The sender is dropped when the thread exits, so the receiving
/// side observes a closed channel at EOF.
pub struct LineCapture {
    /// Set on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Kept so the thread is not detached prematurely; never joined because
    /// it may be blocked in a read.
    thread: std::thread::JoinHandle<()>,
}

impl LineCapture {
    /// Spawn a thread that reads `reader` line by line and forwards each
    /// parsed [`CaptureEvent`] on `tx`.
    ///
    /// The thread uses `blocking_send`, which is correct from a non-async
    /// context.  It exits at EOF, on a read error, or once the receiver is
    /// gone.
    pub fn start<R>(reader: R, tx: mpsc::Sender<CaptureEvent>) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("line-capture".into())
            .spawn(move || {
                for line in reader.lines() {
                    if stop_clone.load(Ordering::Relaxed) {
                        break;
                    }

                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::error!("line-capture: read failed: {e}");
                            break;
                        }
                    };

                    let Some(event) = parse_line(&line) else {
                        continue;
                    };
                    log::debug!("line-capture: {event:?}");
                    if tx.blocking_send(event).is_err() {
                        log::debug!("line-capture: receiver closed");
                        break;
                    }
                }
                log::info!("line-capture: input ended");
            })?;

        Ok(Self {
            stop,
            thread,
        })
    }

    /// `true` once the reader thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

impl Drop for LineCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

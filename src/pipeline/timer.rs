//! Cancellable delayed message: the scheduler's stage-transition timer.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A message that will be sent at `deadline` unless the handle is cancelled
/// or dropped first.
///
/// Dropping cancels, so replacing the scheduler's stored handle with a new
/// one invalidates the old timer.
#[derive(Debug)]
pub struct TimerHandle {
    deadline: Instant,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn schedule<M: Send + 'static>(
        deadline: Instant,
        tx: mpsc::UnboundedSender<M>,
        message: M,
    ) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(message);
        });
        Self { deadline, task }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_at_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let timer = TimerHandle::schedule(start + Duration::from_secs(5), tx, "next");

        assert!(timer.is_pending());
        assert_eq!(rx.recv().await, Some("next"));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = TimerHandle::schedule(Instant::now() + Duration::from_secs(1), tx, 1);
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_timer_drops_the_old_one() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        let mut slot = TimerHandle::schedule(now + Duration::from_secs(1), tx.clone(), "old");
        assert!(slot.is_pending());
        slot = TimerHandle::schedule(now + Duration::from_secs(2), tx, "new");

        assert_eq!(rx.recv().await, Some("new"));
        assert_eq!(slot.deadline(), now + Duration::from_secs(2));
        assert!(rx.try_recv().is_err());
    }
}

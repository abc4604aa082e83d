//! Server-side poll expiry.
//!
//! One pending task at most. It is aborted whenever a poll is created or
//! ended, and on firing it only ends the poll it was armed for.

use super::AppState;
use std::time::Duration;

impl AppState {
    pub(crate) async fn arm_poll_timer(&self, generation: u64, after: Duration) {
        let mut slot = self.poll_timer.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        if !self.config.server_timer {
            return;
        }

        tracing::debug!("Poll {} expires in {:?}", generation, after);
        let state = self.clone();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            state.expire_poll(generation).await;
        }));
    }

    pub(crate) async fn cancel_poll_timer(&self) {
        if let Some(handle) = self.poll_timer.lock().await.take() {
            handle.abort();
        }
    }

    /// End the poll created at `generation` if it is still running
    pub async fn expire_poll(&self, generation: u64) {
        let mut session = self.session.lock().await;
        let Some(transition) = session.expire(generation) else {
            tracing::debug!("Timer for poll {} fired after it ended", generation);
            return;
        };
        tracing::info!("Poll {} time limit reached, ending it", generation);

        // The stored handle is this task; release it instead of aborting
        self.poll_timer.lock().await.take();
        self.publish(transition.outbound);
    }
}

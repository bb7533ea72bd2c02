use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::Input;

/// Background ticker feeding `Input::CountdownTick(generation)` into an agent inbox.
///
/// The ticker stops when the handle is cancelled or dropped.
pub struct CountdownHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn start<C: Send + 'static>(
        generation: u64,
        interval: Duration,
        inbox: mpsc::UnboundedSender<Input<C>>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                if inbox.send(Input::CountdownTick(generation)).is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Countdown {} started", generation);
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(self) {
        tracing::debug!("Countdown {} cancelled", self.generation);
        // Drop aborts the ticker.
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

use std::{
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::debug;

/// Background thread running a task at a fixed interval until dropped.
#[derive(Debug)]
pub struct PeriodicTask {
    debug_name: &'static str,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(interval: Duration, debug_name: &'static str, task: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            match shutdown_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => task(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("{} thread received shutdown signal", debug_name);
                    return;
                }
            }
        });

        Self {
            debug_name,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        // Closing the channel wakes the thread immediately
        drop(self.shutdown_tx.take());

        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => debug!("{} thread shut down cleanly", self.debug_name),
                Err(_) => debug!("{} thread panicked during shutdown", self.debug_name),
            }
        }
    }
}

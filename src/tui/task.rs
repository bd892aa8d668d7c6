//! Background probe worker with a single-slot result channel.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::report::ResultEnvelope;

/// One probe running on its own thread.
///
/// The worker hands its document over through a channel of capacity one and
/// never blocks on it: if the task was dropped (the session ended) the send
/// fails immediately and the document is discarded.
#[derive(Debug)]
pub struct ProbeTask {
    endpoint: String,
    receiver: Receiver<String>,
    consumed: bool,
    worker: JoinHandle<()>,
}

impl ProbeTask {
    /// Starts `check(endpoint)` on a new thread.
    pub fn spawn<F>(endpoint: String, check: F) -> Self
    where
        F: FnOnce(&str) -> String + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let target = endpoint.clone();

        let worker = thread::spawn(move || {
            let document = check(&target);
            if sender.try_send(document).is_err() {
                debug!(endpoint = %target, "session ended before the probe finished, result discarded");
            }
        });

        ProbeTask {
            endpoint,
            receiver,
            consumed: false,
            worker,
        }
    }

    /// Drops the receiving side and returns the worker handle.
    pub fn detach(self) -> JoinHandle<()> {
        let ProbeTask { receiver, worker, .. } = self;
        drop(receiver);
        worker
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Takes the finished document, if there is one yet. Returns it at most
    /// once.
    ///
    /// A worker that died without producing a document yields an error
    /// document, so a pending task always resolves.
    pub fn poll(&mut self) -> Option<String> {
        if self.consumed {
            return None;
        }
        let document = match self.receiver.try_recv() {
            Ok(document) => document,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                ResultEnvelope::Error(format!("probe of {} stopped unexpectedly", self.endpoint))
                    .render()
            }
        };
        self.consumed = true;
        Some(document)
    }
}

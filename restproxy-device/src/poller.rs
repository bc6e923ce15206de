//! Interval polling loop shared by the fingerprint and stats streams
//!
//! Each stream is one tokio task:
//! - `Polling`: GET the endpoint, deliver the snapshot on success
//! - `Waiting`: sleep until the next tick
//! - every suspension point races the cancel token; cancellation ends the
//!   task, which drops the sender and closes the consumer's channel
//!
//! Failed calls are logged and skipped. The loop never stops on a backend
//! error, only on cancellation or when the consumer goes away.

use crate::cancel::CancelToken;
use crate::transport::HttpTransport;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Poll loop configuration for one endpoint
pub struct Poller {
    transport: Arc<HttpTransport>,
    stream: &'static str,
    endpoint: &'static str,
    interval: Duration,
}

impl Poller {
    pub fn new(
        transport: Arc<HttpTransport>,
        stream: &'static str,
        endpoint: &'static str,
        interval: Duration,
    ) -> Self {
        Self {
            transport,
            stream,
            endpoint,
            interval,
        }
    }

    /// Launch the loop as its own task and hand back the consumer side
    /// immediately. The first poll happens as soon as the task runs.
    pub fn spawn<T>(self, cancel: CancelToken) -> SnapshotStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(self.run(tx, cancel.clone()));
        SnapshotStream { rx, cancel }
    }

    async fn run<T>(self, tx: mpsc::Sender<T>, cancel: CancelToken)
    where
        T: DeserializeOwned + Send + 'static,
    {
        debug!(stream = self.stream, interval = ?self.interval, "stream started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self
                .transport
                .request::<(), T>(Method::GET, self.endpoint, None, Some(&cancel))
                .await
            {
                Ok(snapshot) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = tx.send(snapshot) => {
                            if sent.is_err() {
                                debug!(stream = self.stream, "consumer dropped the stream");
                                break;
                            }
                        }
                    }
                }
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    warn!(stream = self.stream, endpoint = self.endpoint, error = %e, "failed making request");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => {
                    debug!(stream = self.stream, "consumer dropped the stream");
                    break;
                }
                _ = sleep(self.interval) => {}
            }
        }

        debug!(stream = self.stream, "stream terminated");
    }
}

/// Consumer side of a stream.
///
/// Yields snapshots in tick order. Returns `None` once the stream's token is
/// cancelled or the producing task has exited; nothing is yielded after that.
#[derive(Debug)]
pub struct SnapshotStream<T> {
    rx: mpsc::Receiver<T>,
    cancel: CancelToken,
}

impl<T> SnapshotStream<T> {
    pub async fn next(&mut self) -> Option<T> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            item = self.rx.recv() => return item,
        }
        self.rx.close();
        None
    }

    /// Non-blocking variant of [`next`](Self::next)
    pub fn try_next(&mut self) -> Option<T> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return None;
        }
        self.rx.try_recv().ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.rx.is_closed()
    }
}

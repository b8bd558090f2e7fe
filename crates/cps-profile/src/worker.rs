//! Background apply queue.
//!
//! Menu input is handled on the caller's thread; every apply runs on a
//! single worker thread in submission order, so a slow or hung tool never
//! blocks input and two quick selections never interleave their
//! `dispwin`/`colormgr` calls.

use crate::applier::{ApplyOutcome, ProfileApplier};
use cps_core::{Error, ProfileSelection, Result};
use log::{debug, error, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One queued apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRequest {
    pub device_path: String,
    pub output_name: String,
    pub selection: ProfileSelection,
}

struct Job {
    request: ApplyRequest,
    reply: Sender<Result<ApplyOutcome>>,
}

/// Handle for the result of a submitted request.
pub struct ApplyTicket {
    rx: Receiver<Result<ApplyOutcome>>,
}

impl ApplyTicket {
    /// Block until the worker has processed the request.
    pub fn wait(self) -> Result<ApplyOutcome> {
        self.rx.recv().map_err(|_| Error::WorkerStopped)?
    }

    /// Wait at most `timeout`; `None` if the request is still queued or
    /// running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<ApplyOutcome>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(Error::WorkerStopped)),
        }
    }
}

/// Owns the worker thread; dropping it drains the queue and joins.
pub struct ApplyWorker {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
}

impl ApplyWorker {
    pub fn spawn(applier: Arc<ProfileApplier>) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let pending_worker = pending.clone();

        let handle = thread::Builder::new()
            .name("apply-worker".to_string())
            .spawn(move || {
                for job in rx {
                    let ApplyRequest {
                        device_path,
                        output_name,
                        selection,
                    } = &job.request;
                    debug!("worker: applying {:?} to {}", selection, device_path);

                    let result = applier.apply(device_path, output_name, selection);
                    if let Err(ref e) = result {
                        error!("Apply for {} failed: {}", device_path, e);
                    }
                    pending_worker.fetch_sub(1, Ordering::SeqCst);
                    // Submitter may have stopped waiting.
                    let _ = job.reply.send(result);
                }
                info!("Apply worker stopped");
            });

        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                error!("Could not start apply worker: {}", e);
                None
            }
        };

        Self {
            tx: handle.as_ref().map(|_| tx),
            handle,
            pending,
        }
    }

    /// Queue a request; the returned ticket yields its result.
    pub fn submit(&self, request: ApplyRequest) -> ApplyTicket {
        let (reply, rx) = mpsc::channel();
        let job = Job { request, reply };

        match &self.tx {
            Some(tx) => {
                self.pending.fetch_add(1, Ordering::SeqCst);
                if let Err(mpsc::SendError(job)) = tx.send(job) {
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                    let _ = job.reply.send(Err(Error::WorkerStopped));
                }
            }
            None => {
                let _ = job.reply.send(Err(Error::WorkerStopped));
            }
        }
        ApplyTicket { rx }
    }

    /// Requests queued or running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting work, finish what is queued, and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApplyWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
mod tests;

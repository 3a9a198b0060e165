//! Background display worker.
//!
//! Requests are queued to a small pool of threads and answered on a reply
//! channel, tagged with the request id. Replies may arrive out of order;
//! callers that only care about the newest request filter them through a
//! [`RequestTracker`].

use crate::DisplayEngine;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use loopscope_core::{defaults, DisplayRequest, DisplayResponse, LoopscopeError, RequestId, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Configuration for a [`DisplayWorker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Thread name prefix.
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get().clamp(1, defaults::MAX_WORKER_THREADS),
            name: "loopscope-display".into(),
        }
    }
}

/// The answer to one submitted request.
#[derive(Debug, Clone)]
pub struct WorkerReply {
    pub request_id: RequestId,
    pub result: Result<DisplayResponse>,
}

/// Pool of threads preparing display data off the caller's thread.
pub struct DisplayWorker {
    jobs: Option<Sender<DisplayRequest>>,
    replies: Receiver<WorkerReply>,
    handles: Vec<JoinHandle<()>>,
}

impl DisplayWorker {
    /// Start the worker threads.
    pub fn spawn(engine: DisplayEngine, config: WorkerConfig) -> Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<DisplayRequest>();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<WorkerReply>();
        let engine = Arc::new(engine);
        let threads = config.threads.max(1);

        let mut handles = Vec::with_capacity(threads);
        for idx in 0..threads {
            let engine = Arc::clone(&engine);
            let jobs = job_rx.clone();
            let replies = reply_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("{}-{}", config.name, idx))
                .spawn(move || run_worker(&engine, &jobs, &replies))
                .map_err(|e| LoopscopeError::Worker(format!("Failed to spawn worker thread: {}", e)))?;
            handles.push(handle);
        }

        info!(threads, "Display worker started");
        Ok(Self {
            jobs: Some(job_tx),
            replies: reply_rx,
            handles,
        })
    }

    /// Queue a request. Returns immediately; the reply arrives later.
    pub fn submit(&self, request: DisplayRequest) -> Result<()> {
        let jobs = self.jobs.as_ref().ok_or(LoopscopeError::WorkerClosed)?;
        jobs.send(request).map_err(|_| LoopscopeError::WorkerClosed)
    }

    /// Take a reply if one is ready.
    pub fn try_recv(&self) -> Option<WorkerReply> {
        self.replies.try_recv().ok()
    }

    /// Wait up to `timeout` for the next reply.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerReply>> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Ok(Some(reply)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LoopscopeError::WorkerClosed),
        }
    }

    /// A handle on the reply channel, e.g. for `select!` in an event loop.
    pub fn replies(&self) -> Receiver<WorkerReply> {
        self.replies.clone()
    }

    /// Number of worker threads still attached.
    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }

    /// Stop accepting requests, finish queued ones and join the threads.
    ///
    /// Replies for queued requests stay readable afterwards.
    pub fn shutdown(&mut self) {
        if self.jobs.take().is_none() {
            return;
        }
        for handle in self.handles.drain(..) {
            if let Err(payload) = handle.join() {
                error!(reason = %panic_reason(&*payload), "Display worker thread panicked");
            }
        }
        info!("Display worker stopped");
    }
}

impl Drop for DisplayWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(engine: &DisplayEngine, jobs: &Receiver<DisplayRequest>, replies: &Sender<WorkerReply>) {
    for request in jobs.iter() {
        let request_id = request.request_id;
        // A panicking request still gets its reply and the thread keeps serving
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.prepare(&request)))
            .unwrap_or_else(|payload| {
                let reason = panic_reason(&*payload);
                error!(request_id, %reason, "Display preparation panicked");
                Err(LoopscopeError::Worker(format!("Display preparation panicked: {}", reason)))
            });
        if replies.send(WorkerReply { request_id, result }).is_err() {
            debug!(request_id, "Reply receiver dropped, worker exiting");
            break;
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Prepare `request` on tokio's blocking pool.
pub async fn prepare_async(
    engine: Arc<DisplayEngine>,
    request: DisplayRequest,
) -> Result<DisplayResponse> {
    tokio::task::spawn_blocking(move || engine.prepare(&request))
        .await
        .map_err(|e| LoopscopeError::Worker(format!("Display task failed: {}", e)))?
}

/// Tracks the newest request issued for one view so stale replies can be dropped.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the id for a new request. Ids start at 1 and only grow.
    pub fn next_id(&self) -> RequestId {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record an id the caller issued itself.
    pub fn observe(&self, id: RequestId) {
        self.latest.fetch_max(id, Ordering::AcqRel);
    }

    pub fn latest(&self) -> RequestId {
        self.latest.load(Ordering::Acquire)
    }

    /// Whether `id` belongs to the newest request.
    pub fn is_current(&self, id: RequestId) -> bool {
        id == self.latest()
    }

    /// Pass `reply` through only if it answers the newest request.
    pub fn accept(&self, reply: WorkerReply) -> Option<WorkerReply> {
        if self.is_current(reply.request_id) {
            Some(reply)
        } else {
            debug!(
                request_id = reply.request_id,
                latest = self.latest(),
                "Dropping stale display reply"
            );
            None
        }
    }
}

//! Background worker owning one OS thread and an unbounded bulk queue
//!
//! Producers call [`Worker::submit`] from any thread. The worker thread
//! swaps the whole queue out under the lock and runs the handler on the
//! taken bulks with the lock released, so a slow handler never blocks
//! producers. [`Worker::stop`] drains everything submitted before it and
//! joins the thread.

use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use crate::bulk::Bulk;
use crate::debug::{self, DebugConfig};

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a worker, assigned at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    fn next() -> Self {
        WorkerId(NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Passed to the handler on every call so it knows which worker runs it
#[derive(Debug, Clone, Copy)]
pub struct WorkerContext {
    id: WorkerId,
}

impl WorkerContext {
    pub fn id(&self) -> WorkerId {
        self.id
    }
}

pub type Handler = Arc<dyn Fn(&WorkerContext, Bulk) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct State {
    queue: VecDeque<Bulk>,
    lifecycle: Lifecycle,
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
    processed: AtomicUsize,
    failed: AtomicUsize,
}

impl Shared {
    /// Lock queue state with poison recovery
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                debug::warn("worker queue lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.wakeup
            .wait(guard)
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct Worker {
    id: WorkerId,
    name: String,
    handler: Handler,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    thread_id: Option<ThreadId>,
    debug: DebugConfig,
}

impl Worker {
    /// Create a worker and start its thread immediately
    pub fn new<F>(name: &str, debug: DebugConfig, handler: F) -> Result<Self>
    where
        F: Fn(&WorkerContext, Bulk) -> Result<()> + Send + Sync + 'static,
    {
        let mut worker = Self::idle(name, debug, handler);
        worker.start()?;
        Ok(worker)
    }

    /// Create a worker without starting it; submissions queue up until `start`
    pub fn idle<F>(name: &str, debug: DebugConfig, handler: F) -> Self
    where
        F: Fn(&WorkerContext, Bulk) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: WorkerId::next(),
            name: name.to_string(),
            handler: Arc::new(handler),
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    lifecycle: Lifecycle::Idle,
                }),
                wakeup: Condvar::new(),
                processed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
            thread: None,
            thread_id: None,
            debug,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn thread_name(&self) -> String {
        format!("bulkmt-{}-{}", self.name, self.id.0)
    }

    /// Number of bulks handed to the handler so far, failed ones included
    pub fn processed(&self) -> usize {
        self.shared.processed.load(Ordering::Acquire)
    }

    /// Number of bulks whose handler returned an error or panicked
    pub fn failed(&self) -> usize {
        self.shared.failed.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().lifecycle == Lifecycle::Running
    }

    /// Queue a bulk for processing.
    ///
    /// Accepted while idle or running. Once `stop` has been called the bulk
    /// is rejected, since nothing would ever drain it.
    pub fn submit(&self, bulk: Bulk) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.lifecycle == Lifecycle::Stopped {
                return Err(anyhow!(
                    "{} is stopped, rejected bulk of {} commands",
                    self.id,
                    bulk.len()
                ));
            }
            state.queue.push_back(bulk);
        }
        self.shared.wakeup.notify_one();
        Ok(())
    }

    /// Spawn the worker thread. No-op if already running or stopped.
    pub fn start(&mut self) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.lifecycle != Lifecycle::Idle {
                return Ok(());
            }
            state.lifecycle = Lifecycle::Running;
        }

        let id = self.id;
        let shared = Arc::clone(&self.shared);
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(self.thread_name())
            .spawn(move || worker_loop(id, &shared, &handler));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.lock().lifecycle = Lifecycle::Idle;
                return Err(e).with_context(|| format!("Failed to spawn thread for {}", self.id));
            }
        };

        self.thread_id = Some(handle.thread().id());
        self.thread = Some(handle);
        self.debug
            .log_basic(&format!("{} started ({})", self.id, self.thread_name()));
        Ok(())
    }

    /// Stop the worker after draining its queue. Idempotent.
    ///
    /// Blocks until every bulk submitted before this call has been handled.
    /// A worker that was never started drains on the calling thread.
    pub fn stop(&mut self) {
        let previous = {
            let mut state = self.shared.lock();
            let previous = state.lifecycle;
            state.lifecycle = Lifecycle::Stopped;
            previous
        };

        match previous {
            Lifecycle::Stopped => {}
            Lifecycle::Idle => {
                let pending = std::mem::take(&mut self.shared.lock().queue);
                let ctx = WorkerContext { id: self.id };
                for bulk in pending {
                    process_one(&ctx, &self.shared, &self.handler, bulk);
                }
                self.debug.log_basic(&format!("{} stopped (never started)", self.id));
            }
            Lifecycle::Running => {
                self.shared.wakeup.notify_all();

                if self.thread_id == Some(thread::current().id()) {
                    // Joining ourselves would deadlock; the loop exits after this bulk.
                    debug::warn(&format!("{} asked to stop from its own thread", self.id));
                    return;
                }

                if let Some(handle) = self.thread.take() {
                    if handle.join().is_err() {
                        debug::warn(&format!("{} thread terminated abnormally", self.id));
                    }
                }
                self.debug.log_basic(&format!(
                    "{} stopped after {} bulks",
                    self.id,
                    self.processed()
                ));
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("processed", &self.processed())
            .finish()
    }
}

fn worker_loop(id: WorkerId, shared: &Shared, handler: &Handler) {
    let ctx = WorkerContext { id };
    loop {
        let (pending, stopping) = {
            let mut state = shared.lock();
            while state.queue.is_empty() && state.lifecycle == Lifecycle::Running {
                state = shared.wait(state);
            }
            (
                std::mem::take(&mut state.queue),
                state.lifecycle != Lifecycle::Running,
            )
        };

        for bulk in pending {
            process_one(&ctx, shared, handler, bulk);
        }

        // Submissions are rejected once stopped, so the take above was the final drain.
        if stopping {
            break;
        }
    }
}

fn process_one(ctx: &WorkerContext, shared: &Shared, handler: &Handler, bulk: Bulk) {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, bulk))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            debug::warn(&format!("{} skipped bulk: {:#}", ctx.id, e));
        }
        Err(payload) => {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            debug::warn(&format!("{} handler panicked: {}", ctx.id, message));
        }
    }
    shared.processed.fetch_add(1, Ordering::AcqRel);
}

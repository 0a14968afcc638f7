use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::jobs::domain::run_result::{RunResult, StatusReport};
use crate::jobs::domain::run_store::{RunStore, RunStoreError};
use crate::pipeline::find_config::FindConfig;
use crate::pipeline::find_error::FindError;
use crate::presence::domain::appearance_interval::AppearanceInterval;

/// Everything a worker needs to perform one run.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub id: String,
    pub video: PathBuf,
    pub reference_image: PathBuf,
    pub config: FindConfig,
}

/// Performs a single run on a worker thread.
///
/// Each call must build its own encoder, reader and tracker; nothing is
/// shared between runs except the store the facade writes to.
pub trait RunExecutor: Send + Sync {
    fn execute(&self, request: &RunRequest) -> Result<Vec<AppearanceInterval>, FindError>;
}

impl<F> RunExecutor for F
where
    F: Fn(&RunRequest) -> Result<Vec<AppearanceInterval>, FindError> + Send + Sync,
{
    fn execute(&self, request: &RunRequest) -> Result<Vec<AppearanceInterval>, FindError> {
        self(request)
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Store(#[from] RunStoreError),
    #[error("no workers are accepting runs")]
    WorkersStopped,
}

/// Handle to a submitted run.
pub struct RunTicket {
    id: String,
    done_rx: Receiver<RunResult>,
}

impl RunTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Blocks until the run reaches a terminal state.
    pub fn wait(self) -> RunResult {
        self.done_rx
            .recv()
            .unwrap_or_else(|_| RunResult::failed("worker stopped before finishing the run"))
    }
}

struct Job {
    request: RunRequest,
    done_tx: Sender<RunResult>,
}

/// Accepts runs, executes them on a fixed pool of worker threads and
/// records each run's status in a `RunStore`.
///
/// Dropping the facade stops accepting work and joins the workers after
/// the queue drains.
pub struct JobFacade {
    store: Arc<dyn RunStore>,
    queue: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl JobFacade {
    pub fn new(store: Arc<dyn RunStore>, executor: Arc<dyn RunExecutor>, workers: usize) -> Self {
        let (queue_tx, queue_rx) = crossbeam_channel::unbounded::<Job>();
        let workers = (0..workers.max(1))
            .map(|worker| {
                let rx = queue_rx.clone();
                let store = store.clone();
                let executor = executor.clone();
                std::thread::spawn(move || worker_loop(worker, rx, store, executor))
            })
            .collect();

        Self {
            store,
            queue: Some(queue_tx),
            workers,
        }
    }

    /// Records the run as queued and hands it to the next free worker.
    pub fn submit(
        &self,
        video: impl Into<PathBuf>,
        reference_image: impl Into<PathBuf>,
        config: FindConfig,
    ) -> Result<RunTicket, SubmitError> {
        let queue = self.queue.as_ref().ok_or(SubmitError::WorkersStopped)?;
        let id = uuid::Uuid::new_v4().to_string();
        self.store.put(&id, RunResult::queued())?;

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let request = RunRequest {
            id: id.clone(),
            video: video.into(),
            reference_image: reference_image.into(),
            config,
        };
        if queue.send(Job { request, done_tx }).is_err() {
            self.store.put(&id, RunResult::failed("no workers are accepting runs"))?;
            return Err(SubmitError::WorkersStopped);
        }
        log::info!("Queued run {id}");
        Ok(RunTicket { id, done_rx })
    }

    pub fn status(&self, id: &str) -> Result<StatusReport, RunStoreError> {
        Ok(StatusReport::new(id, self.store.get(id)?))
    }
}

impl Drop for JobFacade {
    fn drop(&mut self) {
        self.queue.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Run worker panicked");
            }
        }
    }
}

fn worker_loop(
    worker: usize,
    rx: Receiver<Job>,
    store: Arc<dyn RunStore>,
    executor: Arc<dyn RunExecutor>,
) {
    for Job { request, done_tx } in rx {
        let id = request.id.as_str();
        if let Err(e) = store.put(id, RunResult::processing()) {
            log::warn!("Failed to mark run {id} as processing: {e}");
        }
        log::info!("Worker {worker} started run {id}");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&request)));
        let result = match outcome {
            Ok(Ok(appearances)) => {
                log::info!("Run {id} finished with {} appearances", appearances.len());
                RunResult::done(appearances)
            }
            Ok(Err(e)) => {
                log::error!("Run {id} failed: {e}");
                RunResult::failed(e.to_string())
            }
            Err(_) => {
                log::error!("Run {id} panicked");
                RunResult::failed("run panicked")
            }
        };

        if let Err(e) = store.put(id, result.clone()) {
            log::error!("Failed to store result of run {id}: {e}");
        }
        // The caller may have dropped its ticket.
        let _ = done_tx.send(result);
    }
}

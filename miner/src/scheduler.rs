use std::{
    any::Any,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use core_affinity::CoreId;
use shared::errors::{MinerError, MinerResult};
use tracing::*;

use crate::{
    hasher::PowHash,
    reporter::{RateReport, RateReporter},
    worker::{plan_round, MiningContext, WorkReport, Worker},
};

pub type WorkerJob = Box<dyn FnOnce() -> MinerResult<WorkReport> + Send + 'static>;
pub type WorkerHandle = JoinHandle<MinerResult<WorkReport>>;

/// Starts the thread for worker `id`.
pub type Spawner = fn(usize, WorkerJob) -> io::Result<WorkerHandle>;

/// One named OS thread per worker.
pub fn spawn_thread(id: usize, job: WorkerJob) -> io::Result<WorkerHandle> {
    thread::Builder::new().name(format!("worker-{id}")).spawn(job)
}

/// Runs rounds back to back: capture a timestamp, give every worker thread
/// one chunk of the nonce space, wait for all of them, report throughput.
///
/// Any spawn, join, hash or sink failure ends the loop with an error; there is
/// no recovery from a failed round.
pub struct RoundScheduler<H, W: Write + Send> {
    ctx: Arc<MiningContext<H, W>>,
    reporter: RateReporter,
    clock: fn() -> u64,
    spawner: Spawner,
    cores: Vec<CoreId>,
}

impl<H, W> RoundScheduler<H, W>
where
    H: PowHash + 'static,
    W: Write + Send + 'static,
{
    pub fn new(ctx: MiningContext<H, W>) -> MinerResult<Self> {
        ctx.config.validate()?;

        let cores = if ctx.config.pin_cores {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            vec![]
        };

        Ok(Self {
            reporter: RateReporter::new(ctx.config.difficulty),
            ctx: Arc::new(ctx),
            clock: shared::timestamp,
            spawner: spawn_thread,
            cores,
        })
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn context(&self) -> &MiningContext<H, W> {
        &self.ctx
    }

    /// Take the context back once no worker holds it, e.g. to close the sink.
    pub fn into_context(self) -> Option<MiningContext<H, W>> {
        Arc::try_unwrap(self.ctx).ok()
    }

    /// Run until `shutdown` is set or the configured round limit is reached.
    /// Returns the number of completed rounds.
    pub fn run(&mut self, shutdown: &AtomicBool) -> MinerResult<u64> {
        let max_rounds = self.ctx.config.max_rounds;
        while !shutdown.load(Ordering::SeqCst) {
            self.round()?;

            if let Some(max) = max_rounds {
                if self.reporter.rounds() >= max {
                    info!("reached {max} rounds, {} solutions found", self.reporter.total_solutions());
                    break;
                }
            }
        }
        Ok(self.reporter.rounds())
    }

    pub fn round(&mut self) -> MinerResult<RateReport> {
        let config = &self.ctx.config;
        let start = (self.clock)();
        let tasks = plan_round(config.address, start, config.chunk_size, config.threads)?;

        let mut handles = Vec::with_capacity(tasks.len());
        let mut spawn_failure = None;
        for (id, task) in tasks.into_iter().enumerate() {
            let ctx = self.ctx.clone();
            let core = (!self.cores.is_empty()).then(|| self.cores[id % self.cores.len()]);

            let job: WorkerJob = Box::new(move || {
                if let Some(core) = core {
                    let _ = core_affinity::set_for_current(core);
                }
                Worker::new(id).search(&task, &ctx)
            });
            match (self.spawner)(id, job) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_failure = Some(MinerError::Spawn { worker: id, source });
                    break;
                }
            }
        }

        // join every started worker before surfacing the first failure
        let (hashes, solutions, join_failure) = join_all(handles);
        if let Some(err) = spawn_failure.or(join_failure) {
            return Err(err);
        }

        let end = (self.clock)();
        Ok(self.reporter.report(start, end, hashes, solutions))
    }
}

fn join_all(handles: Vec<WorkerHandle>) -> (u64, usize, Option<MinerError>) {
    let mut hashes = 0;
    let mut solutions = 0;
    let mut failure = None;
    for (id, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(report)) => {
                hashes += report.hashes;
                solutions += report.solutions;
            }
            Ok(Err(err)) => {
                error!("worker: {id}, {err}");
                failure.get_or_insert(err);
            }
            Err(panic) => {
                let err = MinerError::Join {
                    worker: id,
                    reason: panic_reason(panic.as_ref()),
                };
                error!("{err}");
                failure.get_or_insert(err);
            }
        }
    }
    (hashes, solutions, failure)
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(reason) = panic.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = panic.downcast_ref::<String>() {
        reason.clone()
    } else {
        "worker panicked".to_string()
    }
}

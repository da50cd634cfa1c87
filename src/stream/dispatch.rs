//! Cast dispatch
//!
//! Validates a cast request synchronously, then hands it to a bounded work
//! queue. A worker runs each cast on its own task under a concurrency limit
//! and a timeout. Outcomes are logged and delivered on the job's ticket;
//! callers that drop the ticket still get the log line.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use super::cast::{DeviceController, DeviceError};
use super::resolver::{validate_channel, ResolveError, StreamResolver};
use crate::models::{CastTarget, ResolvedStream};

/// Work queue and timeout bounds
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub queue_capacity: usize,
    pub max_concurrent: usize,
    pub cast_timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            max_concurrent: 2,
            cast_timeout: Duration::from_secs(120),
        }
    }
}

/// Synchronous rejections; nothing has been spawned when these are returned
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid channel name '{0}'")]
    InvalidChannel(String),
    #[error("No configured cast target at '{0}'")]
    UnknownDevice(String),
    #[error("Cast queue is full, try again shortly")]
    QueueFull,
    #[error("Cast worker has shut down")]
    Closed,
}

/// Terminal failure of an accepted cast
#[derive(Debug, Error)]
pub enum CastFailure {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("Cast timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug)]
pub enum CastOutcome {
    Done(ResolvedStream),
    Failed(CastFailure),
}

impl CastOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, CastOutcome::Done(_))
    }
}

/// Lifecycle of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastPhase {
    Received,
    QualityLookup,
    Resolving,
    Casting,
    Done,
    Failed,
}

impl fmt::Display for CastPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CastPhase::Received => "received",
            CastPhase::QualityLookup => "quality_lookup",
            CastPhase::Resolving => "resolving",
            CastPhase::Casting => "casting",
            CastPhase::Done => "done",
            CastPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Handle to an accepted cast
#[derive(Debug)]
pub struct CastTicket {
    pub id: Uuid,
    pub channel: String,
    pub target: CastTarget,
    outcome: oneshot::Receiver<CastOutcome>,
}

impl CastTicket {
    /// Wait for the cast to finish. `None` if the worker went away first.
    pub async fn outcome(self) -> Option<CastOutcome> {
        self.outcome.await.ok()
    }
}

struct CastJob {
    id: Uuid,
    channel: String,
    target: CastTarget,
    reply: oneshot::Sender<CastOutcome>,
}

/// Accepts cast requests and runs them in the background
pub struct CastDispatcher {
    targets: Vec<CastTarget>,
    queue: mpsc::Sender<CastJob>,
}

impl CastDispatcher {
    /// Spawn the cast worker on the current tokio runtime
    pub fn start(
        targets: Vec<CastTarget>,
        resolver: Arc<StreamResolver>,
        controller: Arc<dyn DeviceController>,
        options: DispatchOptions,
    ) -> Self {
        let (queue, jobs) = mpsc::channel(options.queue_capacity.max(1));
        tokio::spawn(run_worker(jobs, resolver, controller, options));
        Self { targets, queue }
    }

    pub fn targets(&self) -> &[CastTarget] {
        &self.targets
    }

    pub fn target(&self, address: IpAddr) -> Option<&CastTarget> {
        self.targets.iter().find(|t| t.address == address)
    }

    /// Validate and enqueue a cast; returns as soon as the job is accepted
    pub fn dispatch(&self, channel: &str, address: &str) -> Result<CastTicket, DispatchError> {
        let id = Uuid::new_v4();
        tracing::info!(%id, channel, device = address, phase = %CastPhase::Received, "cast requested");

        validate_channel(channel).map_err(|_| DispatchError::InvalidChannel(channel.to_string()))?;

        tracing::debug!(%id, phase = %CastPhase::QualityLookup);
        let target = address
            .parse::<IpAddr>()
            .ok()
            .and_then(|ip| self.target(ip))
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(%id, device = address, "cast rejected: unknown device");
                DispatchError::UnknownDevice(address.to_string())
            })?;

        let (reply, outcome) = oneshot::channel();
        let job = CastJob {
            id,
            channel: channel.to_string(),
            target: target.clone(),
            reply,
        };

        self.queue.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!(%id, "cast rejected: queue full");
                DispatchError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })?;

        Ok(CastTicket {
            id,
            channel: channel.to_string(),
            target,
            outcome,
        })
    }
}

async fn run_worker(
    mut jobs: mpsc::Receiver<CastJob>,
    resolver: Arc<StreamResolver>,
    controller: Arc<dyn DeviceController>,
    options: DispatchOptions,
) {
    let permits = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
    let mut running = JoinSet::new();

    while let Some(job) = jobs.recv().await {
        // Reap finished casts so panics surface in the log
        while let Some(result) = running.try_join_next() {
            log_join(result);
        }

        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let span = tracing::info_span!(
            "cast",
            id = %job.id,
            channel = %job.channel,
            device = %job.target.address
        );
        let resolver = resolver.clone();
        let controller = controller.clone();
        running.spawn(
            async move {
                let _permit = permit;
                run_job(job, &resolver, controller.as_ref(), options.cast_timeout).await;
            }
            .instrument(span),
        );
    }

    while let Some(result) = running.join_next().await {
        log_join(result);
    }
    tracing::debug!("cast worker stopped");
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "cast task aborted");
    }
}

async fn run_job(
    job: CastJob,
    resolver: &StreamResolver,
    controller: &dyn DeviceController,
    timeout: Duration,
) {
    let work = async {
        tracing::info!(phase = %CastPhase::Resolving, quality = %job.target.max_quality);
        let stream = resolver
            .resolve(&job.channel, &job.target.max_quality)
            .await?;

        tracing::info!(phase = %CastPhase::Casting, quality = %stream.quality);
        controller.play(job.target.address, &stream.url).await?;
        Ok::<_, CastFailure>(stream)
    };

    let outcome = match tokio::time::timeout(timeout, work).await {
        Ok(Ok(stream)) => CastOutcome::Done(stream),
        Ok(Err(failure)) => CastOutcome::Failed(failure),
        Err(_) => CastOutcome::Failed(CastFailure::TimedOut(timeout)),
    };

    match &outcome {
        CastOutcome::Done(stream) => {
            tracing::info!(phase = %CastPhase::Done, url = %stream.url, quality = %stream.quality, "cast started");
        }
        CastOutcome::Failed(failure) => {
            tracing::error!(phase = %CastPhase::Failed, error = %failure, "cast failed");
        }
    }

    // Receiver may be gone; the outcome is already logged
    let _ = job.reply.send(outcome);
}

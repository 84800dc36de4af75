//! Bounded, concurrent enrichment pipeline.
//!
//! ```text
//! submit() -> intake (bounded) -> dispatcher -> N enrichment tasks -> output (bounded) -> sink
//! ```
//!
//! The dispatcher is the only reader of the intake queue. It spawns one task
//! per event, but waits for a semaphore permit first, so at most
//! `max_in_flight` enrichments exist at once. A full output queue stalls the
//! tasks, the stalled tasks hold their permits, the dispatcher stops reading,
//! and the intake queue fills until `submit` starts returning
//! `CapacityExceeded`.
//!
//! Output order is NOT intake order. Enrichment tasks race each other onto the
//! output queue and no ordering is restored.

use std::sync::Arc;
use std::time::Duration;

use log_core::{CapacityErrorCode, EnrichedEvent, Error, RawEvent, Result};
use parking_lot::{Mutex, RwLock};
use telemetry::{health, metrics};
use tokio::sync::mpsc::{self, error::SendTimeoutError, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{PipelineConfig, SubmitPolicy};
use crate::enrichment::Enricher;

/// Seconds suggested to callers in `Retry-After` on a full intake queue.
const RETRY_AFTER_SECS: u64 = 1;

/// Owned handle to a running enrichment pipeline.
///
/// Built once at startup and shared by reference (`Arc`) with every caller;
/// there is no process-wide pipeline.
pub struct EnrichmentPipeline {
    /// `None` once closed.
    intake: RwLock<Option<mpsc::Sender<RawEvent>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    config: PipelineConfig,
}

impl EnrichmentPipeline {
    /// Starts the dispatcher and returns the pipeline together with the
    /// receiving end of the output queue.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: PipelineConfig) -> (Self, mpsc::Receiver<EnrichedEvent>) {
        let config = config.normalized();
        let (intake_tx, intake_rx) = mpsc::channel(config.intake_capacity);
        let (output_tx, output_rx) = mpsc::channel(config.output_capacity);
        let permits = Arc::new(Semaphore::new(config.max_in_flight));

        let dispatcher = tokio::spawn(dispatch(
            intake_rx,
            output_tx,
            permits,
            config.task_deadline(),
        ));

        info!(
            intake_capacity = config.intake_capacity,
            output_capacity = config.output_capacity,
            max_in_flight = config.max_in_flight,
            submit_policy = ?config.submit_policy,
            "Enrichment pipeline started"
        );
        health().pipeline.set_healthy();

        let pipeline = Self {
            intake: RwLock::new(Some(intake_tx)),
            dispatcher: Mutex::new(Some(dispatcher)),
            config,
        };
        (pipeline, output_rx)
    }

    /// Enqueues a raw event for enrichment.
    ///
    /// Never blocks beyond the configured bound: immediately under
    /// `SubmitPolicy::Reject`, `submit_wait_ms` under `SubmitPolicy::Wait`.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has been closed.
    pub async fn submit(&self, raw: RawEvent) -> Result<()> {
        let sender = self.intake.read().as_ref().cloned();
        let Some(sender) = sender else {
            panic!("submit called on a closed enrichment pipeline");
        };

        let outcome = match self.config.submit_policy {
            SubmitPolicy::Reject => match sender.try_send(raw) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(self.capacity_exceeded()),
                Err(TrySendError::Closed(_)) => Err(dispatcher_gone()),
            },
            SubmitPolicy::Wait => match sender.send_timeout(raw, self.config.submit_wait()).await {
                Ok(()) => Ok(()),
                Err(SendTimeoutError::Timeout(_)) => Err(self.capacity_exceeded()),
                Err(SendTimeoutError::Closed(_)) => Err(dispatcher_gone()),
            },
        };

        match &outcome {
            Ok(()) => {
                metrics().events_accepted.inc();
                metrics().backpressure_active.set(0);
            }
            Err(e) if e.is_capacity() => {
                metrics().events_rejected.inc();
                metrics().backpressure_active.set(1);
                warn!(
                    intake_capacity = self.config.intake_capacity,
                    "Intake queue full, rejecting event"
                );
            }
            Err(e) => error!(error = %e, "Failed to submit event"),
        }

        outcome
    }

    /// Stops intake, waits for every in-flight enrichment to finish, then
    /// closes the output queue.
    ///
    /// The output consumer must keep draining while this runs, otherwise
    /// tasks stalled on a full output queue never finish.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline was already closed.
    pub async fn close(&self) {
        let sender = self.intake.write().take();
        let Some(sender) = sender else {
            panic!("enrichment pipeline closed twice");
        };
        drop(sender);

        info!("Closing enrichment pipeline, draining in-flight events");
        health().pipeline.set_unhealthy("closed");

        let dispatcher = self.dispatcher.lock().take();
        if let Some(handle) = dispatcher {
            if let Err(e) = handle.await {
                error!(error = %e, "Enrichment dispatcher terminated abnormally");
            }
        }

        info!("Enrichment pipeline closed");
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.intake.read().is_none()
    }

    /// Number of events currently waiting in the intake queue.
    pub fn queued(&self) -> usize {
        self.intake
            .read()
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn capacity_exceeded(&self) -> Error {
        Error::capacity(
            CapacityErrorCode::IntakeFull,
            format!(
                "intake queue is full ({} events)",
                self.config.intake_capacity
            ),
            Some(RETRY_AFTER_SECS),
        )
    }
}

fn dispatcher_gone() -> Error {
    Error::internal("enrichment dispatcher is not running")
}

/// Sole consumer of the intake queue.
async fn dispatch(
    mut intake: mpsc::Receiver<RawEvent>,
    output: mpsc::Sender<EnrichedEvent>,
    permits: Arc<Semaphore>,
    deadline: Option<Duration>,
) {
    let enricher = Enricher::new();
    let mut tasks = JoinSet::new();

    debug!("Enrichment dispatcher running");

    while let Some(raw) = intake.recv().await {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("Enrichment semaphore closed, stopping dispatcher");
                break;
            }
        };

        let output = output.clone();
        metrics().in_flight_enrichments.inc();
        tasks.spawn(async move {
            let _permit = permit;
            let event = enricher.enrich(raw);
            hand_off(event, &output, deadline).await;
            metrics().in_flight_enrichments.dec();
        });

        while let Some(result) = tasks.try_join_next() {
            log_task_result(result);
        }
    }

    // Intake closed: the output queue closes once the last task drops its sender.
    drop(output);
    while let Some(result) = tasks.join_next().await {
        log_task_result(result);
    }

    debug!("Enrichment dispatcher finished");
}

/// Publishes one enriched event, blocking while the output queue is full.
async fn hand_off(
    event: EnrichedEvent,
    output: &mpsc::Sender<EnrichedEvent>,
    deadline: Option<Duration>,
) {
    let id = event.id.clone();

    let sent = match deadline {
        None => output.send(event).await,
        Some(limit) => match tokio::time::timeout(limit, output.send(event)).await {
            Ok(sent) => sent,
            Err(_) => {
                metrics().enrichment_deadline_exceeded.inc();
                metrics().events_dropped.inc();
                warn!(
                    id = %id,
                    deadline_ms = limit.as_millis() as u64,
                    "Enrichment deadline exceeded, dropping event"
                );
                return;
            }
        },
    };

    match sent {
        Ok(()) => {
            metrics().events_enriched.inc();
            debug!(id = %id, "Enriched event handed off");
        }
        Err(_) => {
            metrics().events_dropped.inc();
            warn!(id = %id, "Output queue closed, dropping enriched event");
        }
    }
}

fn log_task_result(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        metrics().in_flight_enrichments.dec();
        error!(error = %e, "Enrichment task failed");
    }
}

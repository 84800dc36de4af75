//! Pipeline and sink configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What `submit` does when the intake queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Return `CapacityExceeded` immediately.
    #[default]
    Reject,
    /// Wait up to `submit_wait_ms` for space, then return `CapacityExceeded`.
    Wait,
}

/// Enrichment pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Intake queue capacity
    #[serde(default = "default_capacity")]
    pub intake_capacity: usize,
    /// Output queue capacity
    #[serde(default = "default_capacity")]
    pub output_capacity: usize,
    /// Maximum enrichment tasks in flight at once
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Behaviour on a full intake queue
    #[serde(default)]
    pub submit_policy: SubmitPolicy,
    /// Upper bound on waiting under `SubmitPolicy::Wait`
    #[serde(default = "default_submit_wait_ms")]
    pub submit_wait_ms: u64,
    /// Optional deadline for one enrichment task, hand-off included.
    /// Unset means a task waits for output space indefinitely.
    #[serde(default)]
    pub task_deadline_ms: Option<u64>,
}

fn default_capacity() -> usize {
    1000
}

fn default_max_in_flight() -> usize {
    64
}

fn default_submit_wait_ms() -> u64 {
    100
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intake_capacity: default_capacity(),
            output_capacity: default_capacity(),
            max_in_flight: default_max_in_flight(),
            submit_policy: SubmitPolicy::default(),
            submit_wait_ms: default_submit_wait_ms(),
            task_deadline_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn submit_wait(&self) -> Duration {
        Duration::from_millis(self.submit_wait_ms)
    }

    pub fn task_deadline(&self) -> Option<Duration> {
        self.task_deadline_ms.map(Duration::from_millis)
    }

    /// Zero capacities are bumped to one; tokio channels and semaphores
    /// cannot be built with zero slots.
    pub(crate) fn normalized(mut self) -> Self {
        self.intake_capacity = self.intake_capacity.max(1);
        self.output_capacity = self.output_capacity.max(1);
        self.max_in_flight = self.max_in_flight.max(1);
        self
    }
}

/// Sink worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Deadline for one persist call
    #[serde(default = "default_persist_timeout_ms")]
    pub persist_timeout_ms: u64,
    /// Extra attempts after a failed persist. Zero keeps delivery
    /// at-most-once; anything higher may write duplicates.
    #[serde(default)]
    pub max_retries: u32,
    /// Backoff between retries, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_persist_timeout_ms() -> u64 {
    5_000
}

fn default_retry_backoff_ms() -> u64 {
    100
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            persist_timeout_ms: default_persist_timeout_ms(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl SinkConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

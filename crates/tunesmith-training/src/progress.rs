use crate::orchestrator::PipelineStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Identifier for one fine-tuning run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { run_id: RunId },
    Stage { run_id: RunId, stage: PipelineStage },
    Message { run_id: RunId, message: String },
    Finished { run_id: RunId },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Forwards pipeline milestones to `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => info!(run_id = %run_id, "Fine-tuning run started"),
            ProgressEvent::Stage { run_id, stage } => info!(run_id = %run_id, stage = ?stage, "Pipeline stage reached"),
            ProgressEvent::Message { run_id, message } => info!(run_id = %run_id, "{message}"),
            ProgressEvent::Finished { run_id } => info!(run_id = %run_id, "Fine-tuning run finished"),
        }
    }
}

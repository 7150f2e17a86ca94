//! Structured story-run logging utilities.
//!
//! Every line carries the run id and the pipeline stage so a single request
//! can be followed through the logs.

use storyreel_models::StoryStage;
use tracing::{error, info, warn, Span};

/// Logger for one story run.
#[derive(Debug, Clone)]
pub struct StoryLogger {
    run_id: String,
    operation: String,
}

impl StoryLogger {
    /// Create a new logger for a run and operation.
    ///
    /// # Arguments
    /// * `run_id` - Identifier shared by every artifact of the run
    /// * `operation` - The kind of run (e.g., "story_to_reel", "single_image")
    pub fn new(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log entry into a stage.
    pub fn log_stage(&self, stage: StoryStage, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %stage,
            "{}", message
        );
    }

    pub fn log_warning(&self, stage: StoryStage, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %stage,
            "{}", message
        );
    }

    pub fn log_error(&self, stage: StoryStage, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %stage,
            "{}", message
        );
    }

    /// Log the end of the run.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            stage = %StoryStage::Done,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "story_run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}

use crate::core::error::{PipelineError, ServiceError};
use crate::services::gateway::{AnalysisService, PromptMode, RawResult, ReturnFormat};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Ordered run phases. The two pipelines walk disjoint subsets:
/// extraction uses chunking/ingesting/extracting/consolidating, tagging uses
/// chunking/ingesting/tagging/retrieving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Chunking,
    Ingesting,
    Extracting,
    Consolidating,
    Tagging,
    Retrieving,
    Done,
    Failed,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Chunking => "chunking",
            Phase::Ingesting => "ingesting",
            Phase::Extracting => "extracting",
            Phase::Consolidating => "consolidating",
            Phase::Tagging => "tagging",
            Phase::Retrieving => "retrieving",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: Phase,
    pub label: String,
    pub error: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            label: String::new(),
            error: None,
        }
    }
}

impl RunState {
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Done | Phase::Failed)
    }

    pub(crate) fn complete(&mut self, label: &str) {
        self.phase = Phase::Done;
        self.label = label.to_string();
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: &PipelineError) {
        self.phase = Phase::Failed;
        self.error = Some(error.to_string());
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared chunk → ingest → prompt → retrieve machinery both pipelines
/// instantiate. Holds the cancellation flag, which is consulted at every
/// phase boundary; a call already dispatched is allowed to finish but its
/// result is discarded by the caller when cancellation wins the race.
pub(crate) struct PipelineCore<'a> {
    pub service: &'a dyn AnalysisService,
    pub state: &'a mut RunState,
    pub cancel: &'a AtomicBool,
}

impl<'a> PipelineCore<'a> {
    pub fn new(
        service: &'a dyn AnalysisService,
        state: &'a mut RunState,
        cancel: &'a AtomicBool,
    ) -> Self {
        Self {
            service,
            state,
            cancel,
        }
    }

    /// Advance to `phase`, failing fast when a cancel was requested.
    pub fn enter(&mut self, phase: Phase, label: &str) -> Result<(), PipelineError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }
        debug!("entering {} phase: {}", phase.name(), label);
        self.state.phase = phase;
        self.state.label = label.to_string();
        Ok(())
    }

    pub fn phase_err(&self, source: ServiceError) -> PipelineError {
        PipelineError::Service {
            phase: self.state.phase.name(),
            source,
        }
    }

    pub async fn ingest(&self, name: &str, chunks: &[String]) -> Result<(), PipelineError> {
        let result = self.service.ingest(name, chunks).await;
        result.map_err(|e| self.phase_err(e))
    }

    pub async fn apply_prompt(
        &self,
        output_name: &str,
        prompt: &str,
        input_name: &str,
        mode: PromptMode,
    ) -> Result<(), PipelineError> {
        let result = self
            .service
            .apply_prompt(output_name, prompt, input_name, mode)
            .await;
        result.map_err(|e| self.phase_err(e))
    }

    pub async fn fetch(&self, name: &str, format: ReturnFormat) -> Result<RawResult, PipelineError> {
        let result = self.service.fetch_result(name, format).await;
        result.map_err(|e| self.phase_err(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_done_failed_are_not_active() {
        let mut state = RunState::default();
        assert!(!state.is_active());
        state.phase = Phase::Chunking;
        assert!(state.is_active());
        state.complete("done");
        assert!(!state.is_active());
        state.fail(&PipelineError::NoCharactersFound);
        assert!(!state.is_active());
        assert!(state.error.is_some());
    }
}

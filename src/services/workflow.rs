use crate::core::chunker::word_count;
use crate::core::config::Config;
use crate::core::error::{IncompleteTagging, PipelineError};
use crate::core::progress::ProgressTracker;
use crate::core::state::{CharacterRecord, StoryRelevance};
use crate::services::export;
use crate::services::extraction::ExtractionPipeline;
use crate::services::gateway::{AnalysisService, ApiCallEntry, CallLog, HttpGateway, ALL_OBJECTS};
use crate::services::pipeline::RunState;
use crate::services::tagging::TaggingPipeline;
use anyhow::Result;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One manuscript's analysis session. Owns the manuscript, both pipeline
/// state machines and their results, and the append-only API audit trail.
/// Only one run (of either pipeline) may be live at a time.
pub struct Workflow {
    config: Config,
    service: Box<dyn AnalysisService>,
    call_log: CallLog,
    manuscript: Option<String>,
    roster: Vec<CharacterRecord>,
    tagged_segments: Vec<String>,
    tagging_warning: Option<IncompleteTagging>,
    extraction_state: RunState,
    tagging_state: RunState,
    progress: Arc<Mutex<ProgressTracker>>,
    cancel: Arc<AtomicBool>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let call_log: CallLog = Arc::default();
        let service = Box::new(HttpGateway::new(config.api.clone(), Arc::clone(&call_log)));
        Self::with_service(config, service, call_log)
    }

    /// Inject a service implementation; tests use a scripted in-memory one.
    pub fn with_service(
        config: Config,
        service: Box<dyn AnalysisService>,
        call_log: CallLog,
    ) -> Self {
        Self {
            config,
            service,
            call_log,
            manuscript: None,
            roster: Vec::new(),
            tagged_segments: Vec::new(),
            tagging_warning: None,
            extraction_state: RunState::default(),
            tagging_state: RunState::default(),
            progress: Arc::new(Mutex::new(ProgressTracker::new())),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Supply the manuscript for this session. Replaces any previous results.
    pub fn load_manuscript(&mut self, text: String) -> Result<(), PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::NoManuscript);
        }
        info!("loaded manuscript ({} words)", word_count(&text));
        self.manuscript = Some(text);
        self.roster.clear();
        self.tagged_segments.clear();
        self.tagging_warning = None;
        self.extraction_state.reset();
        self.tagging_state.reset();
        Ok(())
    }

    fn guard_idle(&self) -> Result<(), PipelineError> {
        if self.extraction_state.is_active() || self.tagging_state.is_active() {
            return Err(PipelineError::RunActive);
        }
        Ok(())
    }

    /// Run the extraction pipeline and keep the consolidated roster.
    pub async fn extract_characters(&mut self) -> Result<&[CharacterRecord], PipelineError> {
        self.guard_idle()?;
        let manuscript = self.manuscript.as_deref().ok_or(PipelineError::NoManuscript)?;
        self.cancel.store(false, Ordering::SeqCst);
        self.roster.clear();

        let pipeline = ExtractionPipeline::new(
            self.service.as_ref(),
            &mut self.extraction_state,
            &self.cancel,
        );
        let roster = pipeline.run(manuscript).await?;
        self.roster = roster;
        Ok(&self.roster)
    }

    /// Run the tagging pipeline and keep the ordered tagged segments.
    /// Re-entrant against the same manuscript used for extraction.
    pub async fn tag_emotions(
        &mut self,
    ) -> Result<(&[String], Option<&IncompleteTagging>), PipelineError> {
        self.guard_idle()?;
        let manuscript = self.manuscript.as_deref().ok_or(PipelineError::NoManuscript)?;
        self.cancel.store(false, Ordering::SeqCst);
        self.tagged_segments.clear();
        self.tagging_warning = None;

        let pipeline = TaggingPipeline::new(
            self.service.as_ref(),
            &mut self.tagging_state,
            &self.cancel,
            Arc::clone(&self.progress),
        );
        let outcome = pipeline.run(manuscript).await?;
        self.tagged_segments = outcome.segments;
        self.tagging_warning = outcome.warning;
        Ok((&self.tagged_segments, self.tagging_warning.as_ref()))
    }

    /// Request cancellation of the live run. Checked at the next phase
    /// boundary; an already-dispatched call completes but its result is
    /// discarded.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn roster(&self) -> &[CharacterRecord] {
        &self.roster
    }

    pub fn tagged_segments(&self) -> &[String] {
        &self.tagged_segments
    }

    pub fn tagging_warning(&self) -> Option<&IncompleteTagging> {
        self.tagging_warning.as_ref()
    }

    pub fn extraction_state(&self) -> &RunState {
        &self.extraction_state
    }

    pub fn tagging_state(&self) -> &RunState {
        &self.tagging_state
    }

    pub fn progress(&self) -> ProgressTracker {
        self.progress
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the append-only audit trail.
    pub fn api_calls(&self) -> Vec<ApiCallEntry> {
        self.call_log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Apply a caller-entered voice id to the record matching the proxy key
    /// (name, relevance, dialogue sample). Best-effort: returns false when no
    /// record matches.
    pub fn assign_voice(
        &mut self,
        name: &str,
        relevance: StoryRelevance,
        dialogue_sample: &str,
        voice_id: &str,
    ) -> bool {
        match self
            .roster
            .iter_mut()
            .find(|c| c.matches_key(name, relevance, dialogue_sample))
        {
            Some(record) => {
                record.voice_id = voice_id.to_string();
                true
            }
            None => false,
        }
    }

    pub fn analysis_json(&self) -> Result<String> {
        let total_words = self.manuscript.as_deref().map(word_count).unwrap_or(0);
        export::analysis_json(&self.roster, &self.tagged_segments, total_words)
    }

    pub fn tagged_text_document(&self) -> Option<String> {
        if self.tagged_segments.is_empty() {
            return None;
        }
        Some(export::tagged_text_document(&self.tagged_segments))
    }

    /// Delete all remote objects this session may have created. Best-effort;
    /// never fails.
    pub async fn cleanup_remote(&self) {
        self.service.delete_objects(&ALL_OBJECTS).await;
    }

    /// Full reset: remote cleanup, then discard the manuscript and every
    /// local result so a fresh submission starts from scratch.
    pub async fn reset(&mut self) {
        self.cleanup_remote().await;
        self.manuscript = None;
        self.roster.clear();
        self.tagged_segments.clear();
        self.tagging_warning = None;
        self.extraction_state.reset();
        self.tagging_state.reset();
        if let Ok(mut tracker) = self.progress.lock() {
            *tracker = ProgressTracker::new();
        }
        self.cancel.store(false, Ordering::SeqCst);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

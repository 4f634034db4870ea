use crate::core::chunker::chunk_for_extraction;
use crate::core::error::PipelineError;
use crate::core::state::{sort_roster, CharacterRecord, StoryRelevance};
use crate::services::gateway::{
    AnalysisService, PromptMode, ReturnFormat, BOOK_CHUNKS, CHARACTER_EXTRACTIONS, FINAL_CHARACTERS,
};
use crate::services::normalize::roster_from_result;
use crate::services::pipeline::{Phase, PipelineCore, RunState};
use crate::services::prompts::{CONSOLIDATION_PROMPT, EXTRACTION_PROMPT};
use log::{info, warn};
use std::sync::atomic::AtomicBool;

/// Character extraction over coarse paragraph chunks:
/// chunking → ingesting → extracting (per-item) → consolidating (combined).
pub struct ExtractionPipeline<'a> {
    core: PipelineCore<'a>,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(
        service: &'a dyn AnalysisService,
        state: &'a mut RunState,
        cancel: &'a AtomicBool,
    ) -> Self {
        Self {
            core: PipelineCore::new(service, state, cancel),
        }
    }

    pub async fn run(mut self, manuscript: &str) -> Result<Vec<CharacterRecord>, PipelineError> {
        let result = self.execute(manuscript).await;
        match &result {
            Ok(roster) => self
                .core
                .state
                .complete(&format!("Identified {} characters", roster.len())),
            Err(e) => self.core.state.fail(e),
        }
        result
    }

    async fn execute(&mut self, manuscript: &str) -> Result<Vec<CharacterRecord>, PipelineError> {
        self.core
            .enter(Phase::Chunking, "Chunking book into manageable sections...")?;
        let chunks = chunk_for_extraction(manuscript);
        info!("split manuscript into {} extraction chunks", chunks.len());

        self.core.enter(Phase::Ingesting, "Ingesting book content...")?;
        self.core.ingest(BOOK_CHUNKS, &chunks).await?;

        self.core
            .enter(Phase::Extracting, "Identifying characters and dialogue...")?;
        self.core
            .apply_prompt(
                CHARACTER_EXTRACTIONS,
                EXTRACTION_PROMPT,
                BOOK_CHUNKS,
                PromptMode::UseIndividually,
            )
            .await?;

        self.core
            .enter(Phase::Consolidating, "Consolidating character profiles...")?;
        self.core
            .apply_prompt(
                FINAL_CHARACTERS,
                CONSOLIDATION_PROMPT,
                CHARACTER_EXTRACTIONS,
                PromptMode::CombineEvents,
            )
            .await?;

        self.core.enter(Phase::Consolidating, "Formatting results...")?;
        let raw = self.core.fetch(FINAL_CHARACTERS, ReturnFormat::Json).await?;
        let mut roster =
            roster_from_result(FINAL_CHARACTERS, &raw).map_err(|e| self.core.phase_err(e))?;
        if roster.is_empty() {
            return Err(PipelineError::NoCharactersFound);
        }

        // The consolidation prompt asks for this ordering, but it is re-applied
        // locally rather than trusted.
        sort_roster(&mut roster);
        let narrators = roster
            .iter()
            .filter(|c| c.story_relevance == StoryRelevance::Narrator)
            .count();
        if narrators != 1 {
            warn!("consolidated roster has {} narrator entries", narrators);
        }
        Ok(roster)
    }
}

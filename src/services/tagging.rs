use crate::core::chunker::{chunk_for_tagging, word_count};
use crate::core::error::{IncompleteTagging, PipelineError, ServiceError};
use crate::core::progress::ProgressTracker;
use crate::services::gateway::{
    AnalysisService, PromptMode, ReturnFormat, EMOTION_CHUNKS, TAGGED_TEXT,
};
use crate::services::normalize::{segments_from_value, split_chunk_markers};
use crate::services::pipeline::{Phase, PipelineCore, RunState};
use crate::services::prompts::TAGGING_PROMPT;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Cadence of the advisory progress tick while the batched tagging call is
/// outstanding. The service reports no true per-chunk completion.
const PROGRESS_TICK: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct TaggingOutcome {
    pub segments: Vec<String>,
    pub warning: Option<IncompleteTagging>,
}

/// Emotion/cadence tagging over fine sentence chunks:
/// chunking → ingesting → tagging (per-item) → retrieving.
pub struct TaggingPipeline<'a> {
    core: PipelineCore<'a>,
    tracker: Arc<Mutex<ProgressTracker>>,
}

impl<'a> TaggingPipeline<'a> {
    pub fn new(
        service: &'a dyn AnalysisService,
        state: &'a mut RunState,
        cancel: &'a AtomicBool,
        tracker: Arc<Mutex<ProgressTracker>>,
    ) -> Self {
        Self {
            core: PipelineCore::new(service, state, cancel),
            tracker,
        }
    }

    pub async fn run(mut self, manuscript: &str) -> Result<TaggingOutcome, PipelineError> {
        let result = self.execute(manuscript).await;
        match &result {
            Ok(outcome) => self
                .core
                .state
                .complete(&format!("Tagged {} chunks", outcome.segments.len())),
            Err(e) => self.core.state.fail(e),
        }
        result
    }

    async fn execute(&mut self, manuscript: &str) -> Result<TaggingOutcome, PipelineError> {
        self.core
            .enter(Phase::Chunking, "Creating small chunks for emotion tagging...")?;
        let chunks = chunk_for_tagging(manuscript);
        let original_words = word_count(manuscript);
        info!(
            "created {} tagging chunks (avg {} words per chunk)",
            chunks.len(),
            original_words / chunks.len().max(1)
        );
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.begin(chunks.len(), "Preparing chunks...");
        }

        self.core
            .enter(Phase::Ingesting, "Ingesting text chunks for emotion processing...")?;
        self.core.ingest(EMOTION_CHUNKS, &chunks).await?;

        self.core.enter(
            Phase::Tagging,
            &format!("Adding emotion and cadence tags to {} chunks...", chunks.len()),
        )?;
        let ticker = self.spawn_ticker(chunks.len());
        let applied = self
            .core
            .apply_prompt(
                TAGGED_TEXT,
                TAGGING_PROMPT,
                EMOTION_CHUNKS,
                PromptMode::UseIndividually,
            )
            .await;
        ticker.stop();
        applied?;

        self.core.enter(Phase::Retrieving, "Retrieving tagged text...")?;
        let segments = self.retrieve_segments().await?;
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.finish(segments.len(), "Processing complete!");
        }

        let tagged_words: usize = segments.iter().map(|s| word_count(s)).sum();
        info!("original: {} words, tagged: {} words", original_words, tagged_words);
        let warning = if (tagged_words as f64) < original_words as f64 * 0.8 {
            let w = IncompleteTagging {
                original_words,
                tagged_words,
            };
            warn!("{}", w);
            Some(w)
        } else {
            None
        };

        Ok(TaggingOutcome { segments, warning })
    }

    /// Pretty text first; when the formatted reply carries no chunk-boundary
    /// markers, fall back to the JSON fetch to recover per-chunk granularity.
    async fn retrieve_segments(&self) -> Result<Vec<String>, PipelineError> {
        let pretty = self.core.fetch(TAGGED_TEXT, ReturnFormat::PrettyText).await?;

        if let Some(text) = pretty.text_value.as_deref() {
            if let Some(segments) = split_chunk_markers(text) {
                return Ok(segments);
            }
            let raw = self.core.fetch(TAGGED_TEXT, ReturnFormat::Json).await?;
            return Ok(match raw.value {
                Some(value) if value.is_array() => segments_from_value(&value),
                _ => vec![text.to_string()],
            });
        }

        let value = pretty.value.as_ref().ok_or_else(|| {
            self.core.phase_err(ServiceError::MalformedResponse {
                object: TAGGED_TEXT.to_string(),
                detail: "reply carried neither text_value nor value".to_string(),
            })
        })?;
        Ok(segments_from_value(value))
    }

    fn spawn_ticker(&self, total: usize) -> Ticker {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let tracker = Arc::clone(&self.tracker);
        let tick_bar = bar.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_TICK);
            interval.tick().await; // the first tick completes immediately
            loop {
                interval.tick().await;
                if let Ok(mut tracker) = tracker.lock() {
                    let elapsed = tracker.elapsed();
                    tracker.tick(elapsed);
                    tick_bar.set_position(tracker.completed as u64);
                    tick_bar.set_message(tracker.current_label.clone());
                }
            }
        });
        Ticker { handle, bar }
    }
}

struct Ticker {
    handle: tokio::task::JoinHandle<()>,
    bar: ProgressBar,
}

impl Ticker {
    fn stop(self) {
        self.handle.abort();
        self.bar.finish_and_clear();
    }
}

use thiserror::Error;

/// Failures at the analysis-service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The service replied, but none of the recognized response shapes
    /// carried the expected payload.
    #[error("unrecognized response shape for object {object}: {detail}")]
    MalformedResponse { object: String, detail: String },
}

/// Phase-level failures. Any of these aborts the current run; a retry starts
/// the pipeline again from chunking.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{phase} phase failed: {source}")]
    Service {
        phase: &'static str,
        #[source]
        source: ServiceError,
    },

    /// The consolidation call succeeded but yielded no usable roster.
    #[error("no characters found in the consolidated roster")]
    NoCharactersFound,

    #[error("no manuscript loaded")]
    NoManuscript,

    #[error("a pipeline run is already active")]
    RunActive,

    #[error("run cancelled")]
    Cancelled,
}

/// Non-fatal warning attached to an otherwise successful tagging run. The
/// partial output is still delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "tagged text appears incomplete: {tagged_words} of {original_words} words came back"
)]
pub struct IncompleteTagging {
    pub original_words: usize,
    pub tagged_words: usize,
}

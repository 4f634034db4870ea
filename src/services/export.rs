use crate::core::chunker::word_count;
use crate::core::state::CharacterRecord;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CHUNK_BREAK: &str = "---CHUNK BREAK---";
const CHUNK_BREAK_SEPARATOR: &str = "\n\n---CHUNK BREAK---\n\n";

#[derive(Debug, Serialize)]
struct AnalysisBundle<'a> {
    characters: &'a [CharacterRecord],
    tagged_text_chunks: &'a [String],
    metadata: BundleMetadata,
}

#[derive(Debug, Serialize)]
struct BundleMetadata {
    total_chunks: usize,
    total_words: usize,
    tagged_words: usize,
    processing_date: DateTime<Utc>,
}

/// JSON document bundling the roster, the tagged segments and run metadata.
pub fn analysis_json(
    characters: &[CharacterRecord],
    tagged_segments: &[String],
    total_words: usize,
) -> Result<String> {
    let bundle = AnalysisBundle {
        characters,
        tagged_text_chunks: tagged_segments,
        metadata: BundleMetadata {
            total_chunks: tagged_segments.len(),
            total_words,
            tagged_words: tagged_segments.iter().map(|s| word_count(s)).sum(),
            processing_date: Utc::now(),
        },
    };
    Ok(serde_json::to_string_pretty(&bundle)?)
}

/// Plain-text document of tagged segments with explicit chunk boundaries.
pub fn tagged_text_document(segments: &[String]) -> String {
    segments.join(CHUNK_BREAK_SEPARATOR)
}

/// Inverse of `tagged_text_document` for re-importing a saved document.
pub fn split_tagged_text_document(document: &str) -> Vec<String> {
    document
        .split(CHUNK_BREAK_SEPARATOR)
        .map(str::to_string)
        .collect()
}

//! Prompt templates submitted through `/apply_prompt`. The single placeholder
//! in each template is bound to the named ingested collection by the service.

/// Per-chunk character extraction. Applied individually to every extraction
/// chunk; each application returns its own character list, narrator included.
pub const EXTRACTION_PROMPT: &str = r#"Analyze this text chunk and identify all speaking characters and narrator elements: {book_chunks}

For each speaking character found, extract:
- Character name (or description if unnamed)
- Gender (male/female/non-binary/unknown)
- Estimated age range (child/teen/young adult/middle-aged/elderly/unknown)
- Nationality/accent (if determinable from dialogue or description)
- Personality traits (based on speech patterns and described behavior)
- Representative dialogue sample (1-2 sentences that show their voice)
- Story relevance (main/supporting/minor)

For the narrator, analyze as a character with:
- Name: "Narrator"
- Gender (inferred from narrative voice and style)
- Age range (inferred from narrative maturity and perspective)
- Nationality/accent (inferred from narrative language patterns)
- Personality traits (narrative tone, formality, emotional range)
- Representative sample (1-2 sentences of narrative text)
- Story relevance: "narrator"

Return as JSON format:
{
  "characters": [
    {
      "name": "Character Name",
      "gender": "gender",
      "age_range": "age range",
      "nationality": "nationality/accent",
      "personality": "personality description",
      "dialogue_sample": "sample dialogue or narrative",
      "story_relevance": "main/supporting/minor/narrator",
      "fish_audio_voice_id": ""
    }
  ]
}"#;

/// Cross-chunk consolidation. Applied once over all per-chunk extractions;
/// the service merges duplicates by character identity and orders the result.
pub const CONSOLIDATION_PROMPT: &str = r#"Consolidate these character extractions from different book chunks: {character_extractions}

Merge duplicate characters (same person appearing in multiple chunks) and create a comprehensive character list. For each unique character, provide:
- Most complete name available
- Consistent gender identification
- Most specific age range
- Best nationality/accent determination
- Comprehensive personality description
- Best representative dialogue sample
- Story relevance ranking (main/supporting/minor based on frequency and importance)
- Empty fish_audio_voice_id field for user input

For the narrator, consolidate all narrator analysis into a single "Narrator" character entry with:
- Name: "Narrator"
- Consistent gender, age, nationality, personality analysis
- Best representative narrative sample
- Story relevance: "narrator"
- Empty fish_audio_voice_id field for user input

Sort characters by story relevance (narrator first, then main characters, then supporting, then minor).

Return as clean JSON:
{
  "characters": [
    {
      "name": "Character Name",
      "gender": "gender",
      "age_range": "age range",
      "nationality": "nationality/accent",
      "personality": "personality description",
      "dialogue_sample": "sample dialogue or narrative",
      "story_relevance": "main/supporting/minor/narrator",
      "fish_audio_voice_id": ""
    }
  ]
}"#;

/// Emotion and cadence tagging. Deliberately short: the per-chunk call budget
/// is tight and the chunks themselves are already small.
pub const TAGGING_PROMPT: &str = r#"Add Fish Audio tags to this text: {emotion_chunks}

Add (emotion) before sentences and (break) for pauses.
Emotions: serious, excited, angry, sad, curious, confident, nervous, happy, worried, surprised

Example: "(serious)The morning sun cast long shadows. (excited)We finally made it!"

Return the tagged text:"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_reference_their_input_objects() {
        assert!(EXTRACTION_PROMPT.contains("{book_chunks}"));
        assert!(CONSOLIDATION_PROMPT.contains("{character_extractions}"));
        assert!(TAGGING_PROMPT.contains("{emotion_chunks}"));
    }

    #[test]
    fn templates_request_the_roster_schema() {
        for prompt in [EXTRACTION_PROMPT, CONSOLIDATION_PROMPT] {
            assert!(prompt.contains("story_relevance"));
            assert!(prompt.contains("fish_audio_voice_id"));
        }
    }
}

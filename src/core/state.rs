use serde::{Deserialize, Serialize};

/// Relevance classes in roster order. The derived `Ord` follows declaration
/// order, so sorting a roster by relevance puts the narrator first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StoryRelevance {
    Narrator,
    Main,
    Supporting,
    Minor,
    #[default]
    #[serde(other)]
    Unknown,
}

impl StoryRelevance {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryRelevance::Narrator => "narrator",
            StoryRelevance::Main => "main",
            StoryRelevance::Supporting => "supporting",
            StoryRelevance::Minor => "minor",
            StoryRelevance::Unknown => "unknown",
        }
    }
}

/// One entry of the consolidated roster. Every field is defaulted so a
/// partially filled record from the service still parses; the voice id in
/// particular is instructed to come back empty but that is not trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub dialogue_sample: String,
    #[serde(default)]
    pub story_relevance: StoryRelevance,
    #[serde(
        rename = "fish_audio_voice_id",
        alias = "voice_id",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub voice_id: String,
}

// The upstream prompts ask for an empty voice id, but replies have been seen
// carrying null instead.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CharacterRecord {
    /// Proxy-key equality used for local re-lookup (e.g. applying a
    /// caller-entered voice id back to a record). Best-effort: true identity
    /// merging happens upstream in the analysis service.
    pub fn matches_key(&self, name: &str, relevance: StoryRelevance, dialogue_sample: &str) -> bool {
        self.name == name
            && self.story_relevance == relevance
            && self.dialogue_sample == dialogue_sample
    }
}

/// Narrator first, then main, supporting, minor, unknown last. Stable, so the
/// service's ordering within a relevance class is preserved.
pub fn sort_roster(roster: &mut [CharacterRecord]) {
    roster.sort_by_key(|c| c.story_relevance);
}

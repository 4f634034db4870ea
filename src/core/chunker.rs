/// Soft word target per extraction chunk. Character extraction tolerates
/// paragraph-level boundaries, so chunks can be large.
pub const EXTRACTION_CHUNK_WORDS: usize = 10_000;

/// Soft word target per tagging chunk. Kept small so each per-chunk prompt
/// application stays inside the analysis service's timeout envelope.
pub const TAGGING_CHUNK_WORDS: usize = 350;

/// Whitespace-run tokenization. All word-count invariants in this crate are
/// defined against this function.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split a manuscript into extraction chunks: whole text when it fits the
/// target, otherwise blank-line-delimited paragraphs accumulated greedily.
/// A single paragraph over the target is kept whole in its own chunk.
pub fn chunk_for_extraction(text: &str) -> Vec<String> {
    if word_count(text) <= EXTRACTION_CHUNK_WORDS {
        return vec![text.to_string()];
    }
    accumulate(split_paragraphs(text), EXTRACTION_CHUNK_WORDS, "\n\n")
}

/// Split a manuscript into tagging chunks: sentence-delimited so no chunk
/// boundary ever falls inside a sentence.
pub fn chunk_for_tagging(text: &str) -> Vec<String> {
    if word_count(text) <= TAGGING_CHUNK_WORDS {
        return vec![text.to_string()];
    }
    accumulate(split_sentences(text), TAGGING_CHUNK_WORDS, " ")
}

fn accumulate(units: Vec<&str>, target: usize, joiner: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut words = 0;

    for unit in units {
        let unit_words = word_count(unit);
        if words + unit_words > target && !current.is_empty() {
            chunks.push(current.join(joiner));
            current = vec![unit];
            words = unit_words;
        } else {
            current.push(unit);
            words += unit_words;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(joiner));
    }
    chunks
}

/// Paragraph boundaries are whitespace runs containing at least two newlines.
/// The separator spans from the first newline of the run to the last, so any
/// leading indentation of the next paragraph is preserved.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut scan = 0;

    while scan < text.len() {
        let Some(off) = text[scan..].find('\n') else {
            break;
        };
        let first_nl = scan + off;
        let mut last_nl = first_nl;
        let mut newlines = 1;
        for (i, c) in text[first_nl + 1..].char_indices() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' {
                last_nl = first_nl + 1 + i;
                newlines += 1;
            }
        }
        if newlines >= 2 {
            out.push(&text[start..first_nl]);
            start = last_nl + 1;
            scan = start;
        } else {
            scan = first_nl + 1;
        }
    }
    out.push(&text[start..]);
    out
}

/// Sentence boundaries are `.`, `!` or `?` directly followed by whitespace.
/// The terminator stays with its sentence; the whitespace run is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, c)) = iter.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(_, next)) = iter.peek() else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }
        out.push(&text[start..idx + c.len_utf8()]);
        while let Some(&(_, w)) = iter.peek() {
            if !w.is_whitespace() {
                break;
            }
            iter.next();
        }
        start = match iter.peek() {
            Some(&(i, _)) => i,
            None => text.len(),
        };
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn small_manuscript_is_one_extraction_chunk() {
        let text = repeat_words(5_000);
        let chunks = chunk_for_extraction(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn large_manuscript_splits_on_paragraphs() {
        // 25 paragraphs of 1,000 words each with clear breaks
        let text = (0..25)
            .map(|_| repeat_words(1_000))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_for_extraction(&text);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(word_count(chunk) <= EXTRACTION_CHUNK_WORDS);
        }
    }

    #[test]
    fn oversized_paragraph_is_kept_whole() {
        let huge = repeat_words(12_000);
        let text = format!("{}\n\n{}", repeat_words(2_000), huge);
        let chunks = chunk_for_extraction(&text);
        assert!(chunks.iter().any(|c| word_count(c) == 12_000));
    }

    #[test]
    fn extraction_preserves_word_count() {
        let texts = [
            repeat_words(25_000),
            (0..30)
                .map(|_| repeat_words(900))
                .collect::<Vec<_>>()
                .join("\n \n"),
            format!("{}\n\n\n\n{}", repeat_words(11_000), repeat_words(500)),
        ];
        for text in &texts {
            let chunks = chunk_for_extraction(text);
            let total: usize = chunks.iter().map(|c| word_count(c)).sum();
            assert_eq!(total, word_count(text));
        }
    }

    #[test]
    fn tagging_preserves_word_count() {
        let text = (0..200)
            .map(|i| format!("Sentence number {} has exactly six words.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_for_tagging(&text);
        assert!(chunks.len() >= 2);
        let total: usize = chunks.iter().map(|c| word_count(c)).sum();
        assert_eq!(total, word_count(&text));
    }

    #[test]
    fn tagging_never_splits_inside_a_sentence() {
        let text = (0..200)
            .map(|i| format!("Sentence number {} ends here.", i))
            .collect::<Vec<_>>()
            .join(" ");
        for chunk in chunk_for_tagging(&text) {
            assert!(chunk.ends_with('.'), "chunk did not end at a sentence boundary: {:?}", chunk);
            assert!(word_count(&chunk) <= TAGGING_CHUNK_WORDS);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = (0..100)
            .map(|i| format!("Paragraph {} with a few words.\nStill paragraph {}.", i, i))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(chunk_for_extraction(&text), chunk_for_extraction(&text));
        assert_eq!(chunk_for_tagging(&text), chunk_for_tagging(&text));
    }

    #[test]
    fn empty_input_yields_a_single_empty_chunk() {
        assert_eq!(chunk_for_extraction(""), vec![String::new()]);
        assert_eq!(chunk_for_tagging(""), vec![String::new()]);
    }

    #[test]
    fn text_without_boundaries_degenerates_to_one_chunk() {
        // no sentence terminators, no blank lines
        let text = repeat_words(600);
        assert_eq!(chunk_for_tagging(&text).len(), 1);
    }

    #[test]
    fn sentence_split_keeps_terminators() {
        let parts = split_sentences("One ends. Two ends! Three ends? Four");
        assert_eq!(parts, vec!["One ends.", "Two ends!", "Three ends?", "Four"]);
    }

    #[test]
    fn paragraph_split_handles_padded_blank_lines() {
        let parts = split_paragraphs("first\n \t \nsecond\n\n\nthird");
        assert_eq!(parts, vec!["first", "second", "third"]);
    }
}

//! Sentence-level chunking for the streaming delivery mode.

/// Split an answer into sentence-like fragments on the `". "` delimiter.
///
/// Each fragment is trimmed, stripped of trailing periods and re-suffixed
/// with `". "`, so `"A. B. C."` becomes `["A. ", "B. ", "C. "]` and the
/// concatenation approximately reconstructs the original text.
pub fn sentence_fragments(text: &str) -> Vec<String> {
    text.split(". ")
        .map(|fragment| fragment.trim().trim_end_matches('.'))
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| format!("{}. ", fragment))
        .collect()
}

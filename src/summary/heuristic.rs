//! Offline keyword-scored extractive summary.

use crate::core::errors::ApiError;

/// Terms that mark a sentence as likely to carry an obligation or risk.
pub const LEGAL_KEYWORDS: &[&str] = &[
    "termination",
    "notice",
    "payment",
    "liability",
    "indemnify",
    "confidential",
    "governing law",
    "warranty",
    "obligation",
    "shall",
    "must",
    "penalty",
    "breach",
    "term",
    "renewal",
];

/// Pick the `max_sentences` highest-scoring sentences and return them in
/// document order as `- sentence` lines.
pub fn summarize(text: &str, max_sentences: usize) -> Result<String, ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::invalid("text is required"));
    }

    let sentences = split_sentences(text);
    let mut ranked: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(position, sentence)| (position, keyword_score(sentence)))
        .collect();

    let picked: Vec<usize> = if ranked.iter().all(|(_, score)| *score == 0) {
        (0..sentences.len().min(max_sentences)).collect()
    } else {
        // Stable sort keeps earlier sentences ahead on equal scores.
        ranked.sort_by(|left, right| right.1.cmp(&left.1));
        let mut positions: Vec<usize> = ranked
            .into_iter()
            .filter(|(_, score)| *score > 0)
            .take(max_sentences)
            .map(|(position, _)| position)
            .collect();
        positions.sort_unstable();
        positions
    };

    Ok(picked
        .into_iter()
        .map(|position| format!("- {}", sentences[position]))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Whole-word keyword occurrences; multi-word terms match as word sequences.
pub fn keyword_score(sentence: &str) -> usize {
    let lower = sentence.to_lowercase();
    let words: Vec<&str> = lower
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    LEGAL_KEYWORDS
        .iter()
        .map(|keyword| {
            let terms: Vec<&str> = keyword.split_whitespace().collect();
            words
                .windows(terms.len())
                .filter(|window| *window == terms.as_slice())
                .count()
        })
        .sum()
}

/// Sentences end at `.`, `!` or `?` followed by whitespace, or at a line break.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for line in text.lines() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();
        while let Some((index, ch)) = chars.next() {
            if !matches!(ch, '.' | '!' | '?') {
                continue;
            }
            let at_boundary = match chars.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                let end = index + ch.len_utf8();
                push_sentence(&line[start..end], &mut sentences);
                start = end;
            }
        }
        push_sentence(&line[start..], &mut sentences);
    }
    sentences
}

fn push_sentence(raw: &str, sentences: &mut Vec<String>) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

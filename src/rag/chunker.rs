/// Maximum characters kept per chunk.
pub const MAX_CHUNK_CHARS: usize = 2000;

/// Split text into paragraphs separated by one or more blank lines.
///
/// A line holding only whitespace counts as blank. Segments are trimmed,
/// empty ones dropped, and each is cut to at most `max_chars` characters.
pub fn split_segments(text: &str, max_chars: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_segment(&mut current, &mut segments, max_chars);
        } else {
            current.push(line);
        }
    }
    flush_segment(&mut current, &mut segments, max_chars);

    segments
}

fn flush_segment(lines: &mut Vec<&str>, segments: &mut Vec<String>, max_chars: usize) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    lines.clear();

    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return;
    }
    segments.push(truncate_chars(trimmed, max_chars));
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Boundaries tried from the largest unit down before a hard cut.
const SEPARATORS: [&str; 9] = ["\n\n", "\n", ". ", "? ", "! ", "। ", "。", " ", "\t"];

/// Byte offset `n` characters after `from`, clamped to the end of `text`.
fn advance_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte offset `n` characters before `to`, clamped to the start of `text`.
fn retreat_chars(text: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    text[..to]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Splits `text` into passages of at most `max_chunk_size` characters, each
/// overlapping the previous one by up to `overlap` characters.
///
/// Every character of the trimmed input lands in at least one chunk and no
/// chunk is empty. Input that already fits comes back as a single chunk.
pub fn chunk_text(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let max_chunk_size = max_chunk_size.max(1);
    let overlap = overlap.min(max_chunk_size - 1);

    if text.chars().count() <= max_chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = advance_chars(text, start, max_chunk_size);
        let actual_end = if end < text.len() {
            find_break_point(text, start, end)
        } else {
            end
        };

        let chunk = text[start..actual_end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if actual_end >= text.len() {
            break;
        }

        let next_start = overlap_start(text, retreat_chars(text, actual_end, overlap), actual_end);
        start = if next_start > start { next_start } else { actual_end };
    }

    chunks
}

/// Latest separator in `text[start..max_end]` that keeps at least half the
/// window, else `max_end`.
fn find_break_point(text: &str, start: usize, max_end: usize) -> usize {
    let segment = &text[start..max_end];
    let min_len = segment.len() / 2;

    for separator in SEPARATORS {
        if let Some(pos) = segment.rfind(separator) {
            let cut = pos + separator.len();
            if cut >= min_len && cut > 0 {
                return start + cut;
            }
        }
    }
    max_end
}

/// Moves a raw overlap cut at `from` forward to the first separator inside
/// `text[from..end]`, so the next chunk opens on a boundary. Keeps `from`
/// when the window has none.
fn overlap_start(text: &str, from: usize, end: usize) -> usize {
    if from == 0 || text[..from].ends_with(char::is_whitespace) {
        return from;
    }
    let window = text[from..end].trim_end();

    for separator in SEPARATORS {
        if let Some(pos) = window.find(separator) {
            return from + pos + separator.len();
        }
    }
    from
}

//! Separator splitting and window merging for the recursive splitter

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters and always applies.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Length as the splitter measures it (Unicode scalar values, not bytes)
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` at every occurrence of `separator`, keeping the separator
/// at the start of the piece that follows it. Empty pieces are dropped.
pub fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Greedily pack `splits` into windows of at most `chunk_size` characters.
///
/// When a window is emitted, pieces are dropped from its front until at
/// most `chunk_overlap` characters remain, and those carry into the next
/// window. Each emitted window is whitespace-trimmed; blank windows are
/// skipped.
pub fn merge_splits(splits: &[&str], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut docs = Vec::new();
    let mut window: Vec<(&str, usize)> = Vec::new();
    let mut total = 0usize;
    let mut front = 0usize;

    for split in splits {
        let len = char_len(split);

        if total + len > chunk_size && front < window.len() {
            push_joined(&mut docs, &window[front..]);

            while front < window.len()
                && (total > chunk_overlap || (total + len > chunk_size && total > 0))
            {
                total -= window[front].1;
                front += 1;
            }
        }

        window.push((split, len));
        total += len;
    }

    push_joined(&mut docs, &window[front..]);
    docs
}

fn push_joined(docs: &mut Vec<String>, pieces: &[(&str, usize)]) {
    let joined: String = pieces.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

//! Recursive character splitting of manual text into overlapping chunks.
//!
//! Tries paragraph breaks first, then line breaks, then spaces, then single
//! characters, so chunks end on the coarsest boundary that fits. Sizes are
//! counted in characters, not bytes, since the manuals are Korean.

use std::collections::VecDeque;

/// Separators in order of preference. The empty separator splits into chars.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splitter settings.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Split `text` into chunks of at most `chunk_size` characters (single
/// unsplittable pieces aside), consecutive chunks sharing up to
/// `chunk_overlap` characters.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    split_recursive(text, SEPARATORS, config)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive(text: &str, separators: &[&str], config: &ChunkConfig) -> Vec<String> {
    let mut separator = separators.last().copied().unwrap_or("");
    let mut remaining: &[&str] = &[];
    for (i, sep) in separators.iter().copied().enumerate() {
        if sep.is_empty() {
            separator = sep;
            break;
        }
        if text.contains(sep) {
            separator = sep;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for piece in splits {
        if char_len(&piece) < config.chunk_size {
            pending.push(piece);
            continue;
        }
        if !pending.is_empty() {
            chunks.extend(merge_splits(&pending, separator, config));
            pending.clear();
        }
        if remaining.is_empty() {
            chunks.push(piece);
        } else {
            chunks.extend(split_recursive(&piece, remaining, config));
        }
    }
    if !pending.is_empty() {
        chunks.extend(merge_splits(&pending, separator, config));
    }
    chunks
}

/// Greedily pack small pieces into chunks, carrying a tail of at most
/// `chunk_overlap` characters into the next chunk.
fn merge_splits(splits: &[String], separator: &str, config: &ChunkConfig) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut docs = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in splits {
        let len = char_len(piece);
        let joined_len = |current: &VecDeque<&str>, total: usize| {
            total + len + if current.is_empty() { 0 } else { sep_len }
        };

        if joined_len(&current, total) > config.chunk_size && !current.is_empty() {
            push_joined(&mut docs, &current, separator);
            while total > config.chunk_overlap
                || (joined_len(&current, total) > config.chunk_size && total > 0)
            {
                let Some(first) = current.pop_front() else {
                    break;
                };
                total -= char_len(first) + if current.is_empty() { 0 } else { sep_len };
            }
        }

        total += len + if current.is_empty() { 0 } else { sep_len };
        current.push_back(piece.as_str());
    }
    push_joined(&mut docs, &current, separator);
    docs
}

fn push_joined(docs: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

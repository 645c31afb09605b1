use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 12_000;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = 2;

/// A blank line: newline, optional whitespace, newline.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Split `content` into chunks of at most `max_chunk_size` characters,
/// breaking only between paragraphs.
///
/// A paragraph longer than the limit is never cut; it becomes a chunk of its
/// own. Chunks are trimmed and never empty, so blank input yields no chunks.
pub fn split_into_chunks(content: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for paragraph in PARAGRAPH_BREAK.split(content) {
        if paragraph.trim().is_empty() {
            continue;
        }
        let paragraph_chars = paragraph.chars().count();

        if !buffer.is_empty() && buffer_chars + SEPARATOR_LEN + paragraph_chars > max_chunk_size {
            flush(&mut chunks, &mut buffer);
            buffer_chars = 0;
        }

        if !buffer.is_empty() {
            buffer.push_str(PARAGRAPH_SEPARATOR);
            buffer_chars += SEPARATOR_LEN;
        }
        buffer.push_str(paragraph);
        buffer_chars += paragraph_chars;
    }

    flush(&mut chunks, &mut buffer);
    chunks
}

fn flush(chunks: &mut Vec<String>, buffer: &mut String) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(text: &str) -> Vec<String> {
        PARAGRAPH_BREAK
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_into_chunks("", 100).is_empty());
        assert!(split_into_chunks("   \n\n  \n\t\n", 100).is_empty());
    }

    #[test]
    fn short_input_is_one_trimmed_chunk() {
        let chunks = split_into_chunks("  first comment\n\nsecond comment \n", 100);
        assert_eq!(chunks, vec!["first comment\n\nsecond comment"]);
    }

    #[test]
    fn breaks_between_paragraphs_when_limit_reached() {
        let a = "a".repeat(40);
        let b = "b".repeat(40);
        let c = "c".repeat(40);
        let content = format!("{a}\n\n{b}\n\n{c}");

        let chunks = split_into_chunks(&content, 90);
        assert_eq!(chunks, vec![format!("{a}\n\n{b}"), c]);
    }

    #[test]
    fn separator_counts_toward_limit() {
        let a = "a".repeat(40);
        let b = "b".repeat(40);
        let content = format!("{a}\n\n{b}");

        // 40 + 2 + 40 = 82 > 81
        assert_eq!(split_into_chunks(&content, 81).len(), 2);
        assert_eq!(split_into_chunks(&content, 82).len(), 1);
    }

    #[test]
    fn oversized_paragraph_becomes_its_own_chunk() {
        let small = "short";
        let huge = "x".repeat(500);
        let content = format!("{small}\n\n{huge}\n\n{small}");

        let chunks = split_into_chunks(&content, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], huge);
    }

    #[test]
    fn blank_lines_with_whitespace_are_paragraph_breaks() {
        let chunks = split_into_chunks("one\n   \t\ntwo\n\n\n\nthree", 7);
        assert_eq!(chunks, vec!["one", "two", "three"]);
    }

    #[test]
    fn single_newlines_stay_inside_a_paragraph() {
        let text = "line one\nline two\nline three";
        assert_eq!(split_into_chunks(text, 10), vec![text]);
    }

    #[test]
    fn limit_is_measured_in_characters() {
        let a = "é".repeat(10);
        let b = "ü".repeat(10);
        let content = format!("{a}\n\n{b}");
        // 22 chars but 42 bytes
        assert_eq!(split_into_chunks(&content, 22).len(), 1);
    }

    #[test]
    fn every_chunk_respects_bound_unless_single_paragraph() {
        let content: String = (0..200)
            .map(|i| "w".repeat((i * 37) % 150 + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        let max = 300;

        for chunk in split_into_chunks(&content, max) {
            let is_single_paragraph = paragraphs(&chunk).len() == 1;
            assert!(
                chunk.chars().count() <= max || is_single_paragraph,
                "chunk of {} chars exceeds {max}",
                chunk.chars().count()
            );
        }
    }

    #[test]
    fn chunks_cover_every_paragraph_in_order() {
        let content: String = (0..120)
            .map(|i| format!("comment {i}: {}", "text ".repeat(i % 17)))
            .collect::<Vec<_>>()
            .join("\n \n");

        let chunks = split_into_chunks(&content, 250);
        let rejoined: Vec<String> = chunks.iter().flat_map(|c| paragraphs(c)).collect();

        assert_eq!(rejoined, paragraphs(&content));
    }
}

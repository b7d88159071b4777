//! Paragraph chunking for knowledge documents.
//!
//! Paragraphs (blank-line separated) are packed into chunks of at most [`MAX_CHUNK_CHARS`]
//! characters. A paragraph longer than that is split on sentence ends, falling back to
//! whitespace. Markdown headings start a new chunk so a section's text stays with its title.

use crate::constants::MAX_CHUNK_CHARS;

pub fn chunk_text(content: &str) -> Vec<String> {
    chunk_text_with_limit(content, MAX_CHUNK_CHARS)
}

pub(crate) fn chunk_text_with_limit(content: &str, max_chars: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs(content) {
        let starts_section = paragraph.starts_with('#');
        let fits = char_len(&current) + char_len(&paragraph) + 2 <= max_chars;
        if !current.is_empty() && (starts_section || !fits) {
            pieces.push(std::mem::take(&mut current));
        }

        if char_len(&paragraph) > max_chars {
            pieces.extend(split_long(&paragraph, max_chars));
            continue;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&paragraph);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn paragraphs(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !lines.is_empty() {
                out.push(lines.join("\n"));
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        out.push(lines.join("\n"));
    }
    out
}

fn split_long(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let needed = usize::from(!current.is_empty()) + char_len(word);
        let sentence_end = current.ends_with(['.', '!', '?']);
        let over = char_len(&current) + needed > max_chars;
        // Prefer breaking right after a sentence once the chunk is at least half full.
        if !current.is_empty() && (over || (sentence_end && char_len(&current) >= max_chars / 2)) {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paragraphs_are_packed_together() {
        let chunks = chunk_text("Primeiro parágrafo.\n\nSegundo parágrafo.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Primeiro parágrafo.\n\nSegundo parágrafo.");
    }

    #[test]
    fn headings_start_new_chunks() {
        let chunks = chunk_text("# Toxina\n\nDiluição padrão.\n\n# Preenchimento\n\nUsar cânula.");
        assert_eq!(
            chunks,
            vec!["# Toxina\n\nDiluição padrão.", "# Preenchimento\n\nUsar cânula."]
        );
    }

    #[test]
    fn long_paragraphs_respect_the_limit() {
        let sentence = "Aplicar em pontos equidistantes na região frontal. ";
        let long = sentence.repeat(20);
        let chunks = chunk_text_with_limit(&long, 120);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 120));
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        assert_eq!(rejoined, long.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn blank_input_has_no_chunks() {
        assert!(chunk_text("\n \n\t\n").is_empty());
    }
}

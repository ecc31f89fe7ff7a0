//! Response chunking and Discord message utilities
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Dropped the truncation helper; every reply path chunks
//! - 1.1.0: Header-aware pagination for list replies
//! - 1.0.0: Extracted from duplicate implementations in the handlers

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Page size for list replies, leaving headroom under the message limit
pub const LIST_PAGE_LIMIT: usize = 1900;

/// Chunk text into pieces that fit Discord limits (UTF-8 safe, line-aware)
///
/// This function splits text respecting:
/// - UTF-8 character boundaries (never splits mid-character)
/// - Line boundaries when possible (prefers splitting at newlines)
/// - Falls back to byte-aware character splitting for very long lines
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line_with_newline = format!("{line}\n");
        if current.len() + line_with_newline.len() > max_size {
            if !current.is_empty() {
                chunks.push(current.trim_end().to_string());
                current = String::new();
            }
            // Handle lines longer than max_size (byte-aware)
            if line_with_newline.len() > max_size {
                chunks.extend(chunk_long_line(line, max_size));
            } else {
                current = line_with_newline;
            }
        } else {
            current.push_str(&line_with_newline);
        }
    }
    if !current.is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

/// Split a single long line into chunks respecting UTF-8 boundaries
fn chunk_long_line(line: &str, max_size: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        let ch_len = ch.len_utf8();
        if current.len() + ch_len > max_size && !current.is_empty() {
            result.push(current);
            current = String::new();
        }
        current.push(ch);
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Chunk text for message content (2000 character limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Pages a header plus lines into `limit`-sized replies. The header
/// only appears on the first page; every line stays whole.
pub fn paginate_lines(header: &str, lines: &[String], limit: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = format!("{header}\n");

    for line in lines {
        let line_with_newline = format!("{line}\n");
        if current.len() + line_with_newline.len() > limit && !current.trim().is_empty() {
            pages.push(current.trim_end().to_string());
            current = String::new();
        }
        current.push_str(&line_with_newline);
    }
    if !current.trim().is_empty() {
        pages.push(current.trim_end().to_string());
    }
    pages
}

//! Minimal shell-style highlighter for the demo driver.
//!
//! Not a parser: it tags the first word as a keyword, quoted runs as strings,
//! digit runs as numbers, `#` to end of line as a comment and `| & ; < >` as
//! operators. An unterminated quote is tagged `Error`.

use crate::{HighlightSpan, ThemeCategory};

pub fn highlight(text: &str) -> Vec<HighlightSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    let mut seen_word = false;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'#' if i == 0 || bytes[i - 1].is_ascii_whitespace() => {
                spans.push(HighlightSpan::new(i, bytes.len(), ThemeCategory::Comment));
                break;
            }
            b'"' | b'\'' => {
                let close = bytes[i + 1..].iter().position(|c| *c == b).map(|p| i + 1 + p);
                match close {
                    Some(end) => {
                        spans.push(HighlightSpan::new(i, end + 1, ThemeCategory::String));
                        i = end + 1;
                    }
                    None => {
                        spans.push(HighlightSpan::new(i, bytes.len(), ThemeCategory::Error));
                        break;
                    }
                }
                seen_word = true;
            }
            b'|' | b'&' | b';' | b'<' | b'>' => {
                spans.push(HighlightSpan::new(i, i + 1, ThemeCategory::Operator));
                i += 1;
                // next word starts a new command
                seen_word = matches!(b, b'<' | b'>');
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'|' | b'&' | b';' | b'<' | b'>' | b'"' | b'\'')
                {
                    i += 1;
                }
                let word = &bytes[start..i];
                if !seen_word {
                    spans.push(HighlightSpan::new(start, i, ThemeCategory::Keyword));
                } else if word.iter().all(u8::is_ascii_digit) {
                    spans.push(HighlightSpan::new(start, i, ThemeCategory::Number));
                }
                seen_word = true;
            }
        }
    }
    spans
}

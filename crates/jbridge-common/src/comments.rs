//! Comment scanning.
//!
//! The parse tree only keeps doc comments that precede a declaration. The
//! bridge recovers every other comment by rescanning the raw text with
//! [`get_comment_ranges`], which understands string, char and text-block
//! literals so that `"//"` inside a literal is not taken for a comment.

use memchr::{memchr2, memmem};
use serde::{Deserialize, Serialize};

/// Comment flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentStyle {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `/** ... */`
    DocBlock,
    /// `/// ...`
    DocLine,
}

impl CommentStyle {
    pub fn is_doc(self) -> bool {
        matches!(self, CommentStyle::DocBlock | CommentStyle::DocLine)
    }
}

/// A comment in the source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    /// Start position (byte offset)
    pub pos: u32,
    /// End position (exclusive byte offset)
    pub end: u32,
    pub style: CommentStyle,
    /// Whether the comment is followed directly by a newline
    pub has_trailing_new_line: bool,
}

impl CommentRange {
    pub fn new(pos: u32, end: u32, style: CommentStyle, has_trailing_new_line: bool) -> Self {
        CommentRange {
            pos,
            end,
            style,
            has_trailing_new_line,
        }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.pos
    }

    /// Whether `offset` lies in `[pos, end)`.
    pub fn contains(&self, offset: u32) -> bool {
        self.pos <= offset && offset < self.end
    }

    /// Get the comment text from source.
    pub fn get_text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.pos as usize..self.end as usize).unwrap_or("")
    }
}

/// Classify a block comment starting at `pos` and ending at `end`.
///
/// `/**/` is a plain block comment, not an empty doc comment.
pub fn block_style(bytes: &[u8], pos: usize, end: usize) -> CommentStyle {
    if end - pos > 4 && bytes.get(pos + 2) == Some(&b'*') {
        CommentStyle::DocBlock
    } else {
        CommentStyle::Block
    }
}

/// Extract all comment ranges from source text, in source order.
pub fn get_comment_ranges(source: &str) -> Vec<CommentRange> {
    let mut comments = Vec::new();
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        match bytes[pos] {
            b'"' => pos = skip_string_literal(bytes, pos),
            b'\'' => pos = skip_quoted(bytes, pos, b'\''),
            b'/' if pos + 1 < len && bytes[pos + 1] == b'/' => {
                let start = pos;
                let style = if bytes.get(pos + 2) == Some(&b'/') {
                    CommentStyle::DocLine
                } else {
                    CommentStyle::Line
                };
                pos = memchr2(b'\n', b'\r', &bytes[pos..]).map_or(len, |i| pos + i);
                comments.push(CommentRange::new(
                    start as u32,
                    pos as u32,
                    style,
                    pos < len,
                ));
            }
            b'/' if pos + 1 < len && bytes[pos + 1] == b'*' => {
                let start = pos;
                pos = memmem::find(&bytes[pos + 2..], b"*/").map_or(len, |i| pos + 2 + i + 2);
                let has_trailing_new_line =
                    pos < len && (bytes[pos] == b'\n' || bytes[pos] == b'\r');
                comments.push(CommentRange::new(
                    start as u32,
                    pos as u32,
                    block_style(bytes, start, pos),
                    has_trailing_new_line,
                ));
            }
            _ => pos += 1,
        }
    }

    comments
}

fn skip_string_literal(bytes: &[u8], pos: usize) -> usize {
    if bytes.get(pos + 1) == Some(&b'"') && bytes.get(pos + 2) == Some(&b'"') {
        // text block
        let body = pos + 3;
        let mut i = body;
        while i + 2 < bytes.len() {
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if &bytes[i..i + 3] == b"\"\"\"" {
                return i + 3;
            }
            i += 1;
        }
        return bytes.len();
    }
    skip_quoted(bytes, pos, b'"')
}

fn skip_quoted(bytes: &[u8], pos: usize, quote: u8) -> usize {
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' | b'\r' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_all_styles() {
        let source = "// a\n/* b */ /** c */\n/// d\nclass A {}";
        let comments = get_comment_ranges(source);
        let styles: Vec<_> = comments.iter().map(|c| c.style).collect();
        assert_eq!(
            styles,
            vec![
                CommentStyle::Line,
                CommentStyle::Block,
                CommentStyle::DocBlock,
                CommentStyle::DocLine
            ]
        );
        assert_eq!(comments[1].get_text(source), "/* b */");
        assert!(comments[2].has_trailing_new_line);
    }

    #[test]
    fn empty_doc_is_block() {
        let comments = get_comment_ranges("/**/ class A {}");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].style, CommentStyle::Block);
    }

    #[test]
    fn literals_hide_comment_markers() {
        let source = "String s = \"// not\"; char c = '/'; /* yes */";
        let comments = get_comment_ranges(source);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].get_text(source), "/* yes */");
    }

    #[test]
    fn unclosed_block_runs_to_end() {
        let source = "class A {} /* open";
        let comments = get_comment_ranges(source);
        assert_eq!(comments[0].end as usize, source.len());
    }
}

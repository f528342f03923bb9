//! Scanner state machine.
//!
//! The scanner is pull-based: the parser calls [`ScannerState::scan`] to move
//! to the next token and reads the current token through accessors. Trivia
//! (whitespace and comments) is skipped; the last doc comment seen before a
//! token is remembered so declarations can pick it up.

use std::sync::Arc;

use jbridge_common::comments::{CommentRange, CommentStyle, block_style};
use jbridge_common::diagnostics::codes;
use jbridge_common::{Atom, SharedNames};

use crate::syntax_kind::{SyntaxKind, keyword_kind};

/// A lexical error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: u32,
    pub length: u32,
    pub code: &'static str,
    pub args: Vec<String>,
}

/// Saved scanner position for speculative parsing.
#[derive(Clone, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    token: SyntaxKind,
    token_start: u32,
    token_end: u32,
    doc_comment: Option<CommentRange>,
    diagnostics_len: usize,
    comments_len: usize,
}

pub struct ScannerState {
    source: Arc<str>,
    pos: usize,
    token: SyntaxKind,
    token_start: u32,
    token_end: u32,
    names: SharedNames,
    diagnostics: Vec<ScannerDiagnostic>,
    doc_comment: Option<CommentRange>,
    comments: Vec<CommentRange>,
    keep_comments: bool,
}

impl ScannerState {
    pub fn new(source: Arc<str>, names: SharedNames) -> Self {
        ScannerState {
            source,
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_end: 0,
            names,
            diagnostics: Vec::new(),
            doc_comment: None,
            comments: Vec::new(),
            keep_comments: false,
        }
    }

    /// Record every comment skipped as trivia, not only doc comments.
    #[must_use]
    pub fn with_comments(mut self) -> Self {
        self.keep_comments = true;
        self
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn names(&self) -> &SharedNames {
        &self.names
    }

    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    pub fn token_pos(&self) -> u32 {
        self.token_start
    }

    pub fn token_end(&self) -> u32 {
        self.token_end
    }

    pub fn token_text(&self) -> &str {
        self.source
            .get(self.token_start as usize..self.token_end as usize)
            .unwrap_or("")
    }

    /// Intern the current token's text.
    pub fn token_atom(&self) -> Atom {
        self.names.intern(self.token_text())
    }

    /// Decoded value of a string, text-block or char literal token. For other
    /// tokens this is the raw text.
    pub fn token_value(&self) -> String {
        let text = self.token_text();
        match self.token {
            SyntaxKind::StringLiteral | SyntaxKind::CharLiteral => {
                let inner = text
                    .get(1..text.len().saturating_sub(1).max(1))
                    .unwrap_or("");
                unescape(inner)
            }
            SyntaxKind::TextBlock => {
                let body = text.get(3..text.len().saturating_sub(3).max(3)).unwrap_or("");
                let body = body
                    .strip_prefix("\r\n")
                    .or_else(|| body.strip_prefix('\n'))
                    .unwrap_or(body);
                unescape(body)
            }
            _ => text.to_string(),
        }
    }

    /// Doc comment immediately preceding the current token, if any.
    pub fn doc_comment(&self) -> Option<&CommentRange> {
        self.doc_comment.as_ref()
    }

    pub fn comments(&self) -> &[CommentRange] {
        &self.comments
    }

    pub fn diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScannerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn save_state(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            token: self.token,
            token_start: self.token_start,
            token_end: self.token_end,
            doc_comment: self.doc_comment.clone(),
            diagnostics_len: self.diagnostics.len(),
            comments_len: self.comments.len(),
        }
    }

    pub fn restore_state(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.token = snapshot.token;
        self.token_start = snapshot.token_start;
        self.token_end = snapshot.token_end;
        self.doc_comment = snapshot.doc_comment;
        self.diagnostics.truncate(snapshot.diagnostics_len);
        self.comments.truncate(snapshot.comments_len);
    }

    /// Split a compound `>` token so the parser can close one level of type
    /// arguments. `>>` becomes `>` followed by `>`, `>=` becomes `>` then `=`.
    pub fn split_gt(&mut self) -> SyntaxKind {
        let rest = match self.token {
            SyntaxKind::GtGt => SyntaxKind::Gt,
            SyntaxKind::GtGtGt => SyntaxKind::GtGt,
            SyntaxKind::GtEq => SyntaxKind::Eq,
            SyntaxKind::GtGtEq => SyntaxKind::GtEq,
            SyntaxKind::GtGtGtEq => SyntaxKind::GtGtEq,
            other => return other,
        };
        self.token_start += 1;
        self.token = rest;
        self.doc_comment = None;
        rest
    }

    fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn error(&mut self, pos: usize, length: usize, code: &'static str, args: Vec<String>) {
        self.diagnostics.push(ScannerDiagnostic {
            pos: pos as u32,
            length: length as u32,
            code,
            args,
        });
    }

    /// Advance to the next token.
    pub fn scan(&mut self) -> SyntaxKind {
        self.doc_comment = None;
        self.skip_trivia();
        let start = self.pos;
        self.token_start = start as u32;
        let kind = self.scan_token();
        self.token = kind;
        self.token_end = self.pos as u32;
        kind
    }

    fn skip_trivia(&mut self) {
        let len = self.bytes().len();
        while self.pos < len {
            let b = self.bytes()[self.pos];
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    let start = self.pos;
                    while self.pos < len && !matches!(self.bytes()[self.pos], b'\n' | b'\r') {
                        self.pos += 1;
                    }
                    if self.keep_comments {
                        let style = if self.bytes().get(start + 2) == Some(&b'/') {
                            CommentStyle::DocLine
                        } else {
                            CommentStyle::Line
                        };
                        self.comments.push(CommentRange::new(
                            start as u32,
                            self.pos as u32,
                            style,
                            self.pos < len,
                        ));
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut closed = false;
                    while self.pos < len {
                        if self.bytes()[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                            self.pos += 2;
                            closed = true;
                            break;
                        }
                        self.pos += 1;
                    }
                    if !closed {
                        self.error(start, 2, codes::UNCLOSED_COMMENT, Vec::new());
                    }
                    let style = block_style(self.bytes(), start, self.pos);
                    let trailing = matches!(self.peek(0), Some(b'\n' | b'\r'));
                    let range = CommentRange::new(start as u32, self.pos as u32, style, trailing);
                    if style.is_doc() {
                        self.doc_comment = Some(range.clone());
                    }
                    if self.keep_comments {
                        self.comments.push(range);
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> SyntaxKind {
        let Some(b) = self.peek(0) else {
            return SyntaxKind::EndOfFile;
        };
        match b {
            b'(' => self.single(SyntaxKind::OpenParen),
            b')' => self.single(SyntaxKind::CloseParen),
            b'{' => self.single(SyntaxKind::OpenBrace),
            b'}' => self.single(SyntaxKind::CloseBrace),
            b'[' => self.single(SyntaxKind::OpenBracket),
            b']' => self.single(SyntaxKind::CloseBracket),
            b';' => self.single(SyntaxKind::Semicolon),
            b',' => self.single(SyntaxKind::Comma),
            b'@' => self.single(SyntaxKind::At),
            b'?' => self.single(SyntaxKind::Question),
            b'~' => self.single(SyntaxKind::Tilde),
            b'.' => {
                if self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else if self.peek(1) == Some(b'.') && self.peek(2) == Some(b'.') {
                    self.pos += 3;
                    SyntaxKind::Ellipsis
                } else {
                    self.single(SyntaxKind::Dot)
                }
            }
            b':' => {
                if self.peek(1) == Some(b':') {
                    self.pos += 2;
                    SyntaxKind::ColonColon
                } else {
                    self.single(SyntaxKind::Colon)
                }
            }
            b'=' => self.with_eq(SyntaxKind::Eq, SyntaxKind::EqEq),
            b'!' => self.with_eq(SyntaxKind::Bang, SyntaxKind::BangEq),
            b'*' => self.with_eq(SyntaxKind::Star, SyntaxKind::StarEq),
            b'/' => self.with_eq(SyntaxKind::Slash, SyntaxKind::SlashEq),
            b'%' => self.with_eq(SyntaxKind::Percent, SyntaxKind::PercentEq),
            b'^' => self.with_eq(SyntaxKind::Caret, SyntaxKind::CaretEq),
            b'+' => match self.peek(1) {
                Some(b'+') => self.double(SyntaxKind::PlusPlus),
                Some(b'=') => self.double(SyntaxKind::PlusEq),
                _ => self.single(SyntaxKind::Plus),
            },
            b'-' => match self.peek(1) {
                Some(b'-') => self.double(SyntaxKind::MinusMinus),
                Some(b'=') => self.double(SyntaxKind::MinusEq),
                Some(b'>') => self.double(SyntaxKind::Arrow),
                _ => self.single(SyntaxKind::Minus),
            },
            b'&' => match self.peek(1) {
                Some(b'&') => self.double(SyntaxKind::AmpAmp),
                Some(b'=') => self.double(SyntaxKind::AmpEq),
                _ => self.single(SyntaxKind::Amp),
            },
            b'|' => match self.peek(1) {
                Some(b'|') => self.double(SyntaxKind::BarBar),
                Some(b'=') => self.double(SyntaxKind::BarEq),
                _ => self.single(SyntaxKind::Bar),
            },
            b'<' => match (self.peek(1), self.peek(2)) {
                (Some(b'<'), Some(b'=')) => {
                    self.pos += 3;
                    SyntaxKind::LtLtEq
                }
                (Some(b'<'), _) => self.double(SyntaxKind::LtLt),
                (Some(b'='), _) => self.double(SyntaxKind::LtEq),
                _ => self.single(SyntaxKind::Lt),
            },
            b'>' => self.scan_gt(),
            b'"' => self.scan_string(),
            b'\'' => self.scan_char(),
            b'0'..=b'9' => self.scan_number(),
            _ => self.scan_identifier_or_unknown(),
        }
    }

    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    fn double(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 2;
        kind
    }

    fn with_eq(&mut self, plain: SyntaxKind, with_eq: SyntaxKind) -> SyntaxKind {
        if self.peek(1) == Some(b'=') {
            self.double(with_eq)
        } else {
            self.single(plain)
        }
    }

    fn scan_gt(&mut self) -> SyntaxKind {
        match (self.peek(1), self.peek(2), self.peek(3)) {
            (Some(b'>'), Some(b'>'), Some(b'=')) => {
                self.pos += 4;
                SyntaxKind::GtGtGtEq
            }
            (Some(b'>'), Some(b'>'), _) => {
                self.pos += 3;
                SyntaxKind::GtGtGt
            }
            (Some(b'>'), Some(b'='), _) => {
                self.pos += 3;
                SyntaxKind::GtGtEq
            }
            (Some(b'>'), _, _) => self.double(SyntaxKind::GtGt),
            (Some(b'='), _, _) => self.double(SyntaxKind::GtEq),
            _ => self.single(SyntaxKind::Gt),
        }
    }

    fn scan_string(&mut self) -> SyntaxKind {
        let start = self.pos;
        if self.peek(1) == Some(b'"') && self.peek(2) == Some(b'"') {
            self.pos += 3;
            let len = self.bytes().len();
            while self.pos < len {
                match self.bytes()[self.pos] {
                    b'\\' => self.pos += 2,
                    b'"' if self.peek(1) == Some(b'"') && self.peek(2) == Some(b'"') => {
                        self.pos += 3;
                        return SyntaxKind::TextBlock;
                    }
                    _ => self.pos += 1,
                }
            }
            self.pos = len;
            self.error(start, 3, codes::UNCLOSED_STR_LIT, Vec::new());
            return SyntaxKind::TextBlock;
        }
        if !self.scan_quoted(b'"') {
            self.error(start, self.pos - start, codes::UNCLOSED_STR_LIT, Vec::new());
        }
        SyntaxKind::StringLiteral
    }

    fn scan_char(&mut self) -> SyntaxKind {
        let start = self.pos;
        if !self.scan_quoted(b'\'') {
            self.error(start, self.pos - start, codes::UNCLOSED_CHAR_LIT, Vec::new());
        }
        SyntaxKind::CharLiteral
    }

    /// Scan a single-line quoted literal. Returns false when the line ends
    /// before the closing quote.
    fn scan_quoted(&mut self, quote: u8) -> bool {
        self.pos += 1;
        let len = self.bytes().len();
        while self.pos < len {
            match self.bytes()[self.pos] {
                b'\\' => self.pos = (self.pos + 2).min(len),
                b'\n' | b'\r' => return false,
                b if b == quote => {
                    self.pos += 1;
                    return true;
                }
                _ => self.pos += 1,
            }
        }
        false
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;
        let bytes = self.source.clone();
        let bytes = bytes.as_bytes();
        let len = bytes.len();
        let digits = |pos: &mut usize, accept: fn(u8) -> bool| {
            while *pos < len && (accept(bytes[*pos]) || bytes[*pos] == b'_') {
                *pos += 1;
            }
        };

        let mut pos = self.pos;
        let mut floating = false;
        if bytes[pos] == b'0' && matches!(bytes.get(pos + 1), Some(b'x' | b'X')) {
            pos += 2;
            let body = pos;
            digits(&mut pos, |b| b.is_ascii_hexdigit());
            if pos == body {
                self.pos = pos;
                self.error(start, pos - start, codes::MALFORMED_NUMBER, Vec::new());
                return SyntaxKind::IntLiteral;
            }
        } else if bytes[pos] == b'0' && matches!(bytes.get(pos + 1), Some(b'b' | b'B')) {
            pos += 2;
            let body = pos;
            digits(&mut pos, |b| b == b'0' || b == b'1');
            if pos == body {
                self.pos = pos;
                self.error(start, pos - start, codes::MALFORMED_NUMBER, Vec::new());
                return SyntaxKind::IntLiteral;
            }
        } else {
            digits(&mut pos, |b| b.is_ascii_digit());
            if bytes.get(pos) == Some(&b'.')
                && bytes.get(pos + 1).is_none_or(|b| b.is_ascii_digit() || !is_ident_start_byte(*b))
            {
                floating = true;
                pos += 1;
                digits(&mut pos, |b| b.is_ascii_digit());
            }
            if matches!(bytes.get(pos), Some(b'e' | b'E')) {
                floating = true;
                pos += 1;
                if matches!(bytes.get(pos), Some(b'+' | b'-')) {
                    pos += 1;
                }
                let exp = pos;
                digits(&mut pos, |b| b.is_ascii_digit());
                if pos == exp {
                    self.pos = pos;
                    self.error(start, pos - start, codes::MALFORMED_NUMBER, Vec::new());
                    return SyntaxKind::DoubleLiteral;
                }
            }
        }

        let kind = match bytes.get(pos) {
            Some(b'l' | b'L') if !floating => {
                pos += 1;
                SyntaxKind::LongLiteral
            }
            Some(b'f' | b'F') => {
                pos += 1;
                SyntaxKind::FloatLiteral
            }
            Some(b'd' | b'D') => {
                pos += 1;
                SyntaxKind::DoubleLiteral
            }
            _ if floating => SyntaxKind::DoubleLiteral,
            _ => SyntaxKind::IntLiteral,
        };
        self.pos = pos;
        kind
    }

    fn scan_identifier_or_unknown(&mut self) -> SyntaxKind {
        let start = self.pos;
        let rest = self.source.get(start..).unwrap_or("");
        let mut chars = rest.char_indices();
        let Some((_, first)) = chars.next() else {
            return SyntaxKind::EndOfFile;
        };
        if !is_ident_start(first) {
            self.pos += first.len_utf8();
            self.error(
                start,
                first.len_utf8(),
                codes::ILLEGAL_CHAR,
                vec![format!("\\u{:04x}", first as u32)],
            );
            return SyntaxKind::Unknown;
        }
        let mut end = rest.len();
        for (offset, ch) in chars {
            if !is_ident_part(ch) {
                end = offset;
                break;
            }
        }
        self.pos = start + end;
        let text = &rest[..end];
        keyword_kind(text).unwrap_or(SyntaxKind::Identifier)
    }
}

fn is_ident_start_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('0') => out.push('\0'),
            Some('u') => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbridge_common::NameTable;

    fn scanner(text: &str) -> ScannerState {
        ScannerState::new(Arc::from(text), NameTable::shared())
    }

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        let mut s = scanner(text);
        let mut out = Vec::new();
        loop {
            let kind = s.scan();
            if kind == SyntaxKind::EndOfFile {
                return out;
            }
            out.push(kind);
        }
    }

    #[test]
    fn test_scan_class_header() {
        assert_eq!(
            kinds("public class A extends B {}"),
            vec![
                SyntaxKind::PublicKeyword,
                SyntaxKind::ClassKeyword,
                SyntaxKind::Identifier,
                SyntaxKind::ExtendsKeyword,
                SyntaxKind::Identifier,
                SyntaxKind::OpenBrace,
                SyntaxKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_contextual_keywords_are_identifiers() {
        assert_eq!(
            kinds("var module record"),
            vec![SyntaxKind::Identifier; 3]
        );
    }

    #[test]
    fn test_scan_numbers() {
        assert_eq!(
            kinds("1 10L 0x1F 0b101 1.5 2f 3d 1e10 .5 1_000"),
            vec![
                SyntaxKind::IntLiteral,
                SyntaxKind::LongLiteral,
                SyntaxKind::IntLiteral,
                SyntaxKind::IntLiteral,
                SyntaxKind::DoubleLiteral,
                SyntaxKind::FloatLiteral,
                SyntaxKind::DoubleLiteral,
                SyntaxKind::DoubleLiteral,
                SyntaxKind::DoubleLiteral,
                SyntaxKind::IntLiteral,
            ]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds(">>>= >>= >> >= -> :: ... ++ &&"),
            vec![
                SyntaxKind::GtGtGtEq,
                SyntaxKind::GtGtEq,
                SyntaxKind::GtGt,
                SyntaxKind::GtEq,
                SyntaxKind::Arrow,
                SyntaxKind::ColonColon,
                SyntaxKind::Ellipsis,
                SyntaxKind::PlusPlus,
                SyntaxKind::AmpAmp,
            ]
        );
    }

    #[test]
    fn test_string_values() {
        let mut s = scanner(r#""a\tb" 'x' "A""#);
        assert_eq!(s.scan(), SyntaxKind::StringLiteral);
        assert_eq!(s.token_value(), "a\tb");
        assert_eq!(s.scan(), SyntaxKind::CharLiteral);
        assert_eq!(s.token_value(), "x");
        assert_eq!(s.scan(), SyntaxKind::StringLiteral);
        assert_eq!(s.token_value(), "A");
    }

    #[test]
    fn test_text_block() {
        let mut s = scanner("\"\"\"\n  hi\n  \"\"\" ;");
        assert_eq!(s.scan(), SyntaxKind::TextBlock);
        assert_eq!(s.token_value(), "  hi\n  ");
        assert_eq!(s.scan(), SyntaxKind::Semicolon);
    }

    #[test]
    fn test_unclosed_string_reports() {
        let mut s = scanner("\"abc\nx");
        assert_eq!(s.scan(), SyntaxKind::StringLiteral);
        assert_eq!(s.diagnostics().len(), 1);
        assert_eq!(s.diagnostics()[0].code, codes::UNCLOSED_STR_LIT);
        assert_eq!(s.scan(), SyntaxKind::Identifier);
    }

    #[test]
    fn test_illegal_char() {
        let mut s = scanner("a # b");
        s.scan();
        assert_eq!(s.scan(), SyntaxKind::Unknown);
        assert_eq!(s.diagnostics()[0].code, codes::ILLEGAL_CHAR);
        assert_eq!(s.scan(), SyntaxKind::Identifier);
    }

    #[test]
    fn test_doc_comment_tracking() {
        let source = "/** doc */ /* plain */ class A { int x; }";
        let mut s = scanner(source);
        assert_eq!(s.scan(), SyntaxKind::ClassKeyword);
        let doc = s.doc_comment().cloned().unwrap();
        assert_eq!(doc.get_text(source), "/** doc */");
        s.scan();
        assert!(s.doc_comment().is_none());
    }

    #[test]
    fn test_keep_comments() {
        let mut s = scanner("// a\nx /* b */ y").with_comments();
        while s.scan() != SyntaxKind::EndOfFile {}
        assert_eq!(s.comments().len(), 2);
        assert_eq!(s.comments()[0].style, CommentStyle::Line);
    }

    #[test]
    fn test_save_restore() {
        let mut s = scanner("a b c");
        s.scan();
        let snapshot = s.save_state();
        s.scan();
        s.scan();
        assert_eq!(s.token_text(), "c");
        s.restore_state(snapshot);
        assert_eq!(s.token_text(), "a");
        s.scan();
        assert_eq!(s.token_text(), "b");
    }

    #[test]
    fn test_split_gt() {
        let mut s = scanner("List<List<String>> x");
        let mut last = SyntaxKind::Unknown;
        while s.token() != SyntaxKind::GtGt {
            last = s.scan();
        }
        assert_eq!(last, SyntaxKind::GtGt);
        assert_eq!(s.split_gt(), SyntaxKind::Gt);
        assert_eq!(s.token_text(), ">");
        assert_eq!(s.scan(), SyntaxKind::Identifier);
    }

    #[test]
    fn test_token_atom_interns() {
        let mut s = scanner("foo foo");
        s.scan();
        let first = s.token_atom();
        s.scan();
        assert_eq!(first, s.token_atom());
        assert_eq!(&*s.names().resolve(first), "foo");
    }
}

//! Parser state - token handling, diagnostics and the entry point.
//!
//! `ParserState` is a recursive descent parser over [`ScannerState`]. The
//! grammar methods live in sibling modules (`state_declarations`,
//! `state_statements`, `state_expressions`, `state_types`); this module
//! holds the shared machinery they build on.

use std::sync::Arc;

use jbridge_common::diagnostics::codes;
use jbridge_common::limits::MAX_PARSER_RECURSION_DEPTH;
use jbridge_common::{Atom, SharedNames};
use jbridge_scanner::{ScannerSnapshot, ScannerState, SyntaxKind};
use tracing::trace;

use super::arena::NodeArena;
use super::node::{NodeData, NodeFlags, NodeIndex};

/// Name given to identifiers that are missing from the source.
pub const ERROR_NAME: &str = "<error>";

/// A syntax error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub code: &'static str,
    pub args: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// Skip method and initializer bodies (used when completing classpath
    /// types, where only signatures matter).
    pub ignore_bodies: bool,
}

/// Result of parsing one source text.
#[derive(Clone)]
pub struct ParsedUnit {
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub source: Arc<str>,
    pub names: SharedNames,
}

impl ParsedUnit {
    pub fn name_text(&self, atom: Atom) -> Arc<str> {
        self.names.resolve(atom)
    }

    pub fn node_text(&self, index: NodeIndex) -> &str {
        self.arena
            .pos_end(index)
            .and_then(|(pos, end)| self.source.get(pos as usize..end as usize))
            .unwrap_or("")
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse a compilation unit.
pub fn parse_unit(source: Arc<str>, names: SharedNames, options: ParseOptions) -> ParsedUnit {
    let mut parser = ParserState::new(source.clone(), names.clone(), options);
    let root = parser.parse_compilation_unit();
    let (arena, diagnostics) = parser.finish();
    ParsedUnit {
        arena,
        root,
        diagnostics,
        source,
        names,
    }
}

pub(crate) struct LookAhead {
    scanner: ScannerSnapshot,
    prev_start: u32,
    prev_end: u32,
    arena_len: usize,
    diagnostics_len: usize,
}

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) arena: NodeArena,
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
    pub(crate) options: ParseOptions,
    recursion_depth: u32,
    prev_start: u32,
    prev_end: u32,
    last_error_pos: Option<u32>,
    error_name: Atom,
}

impl ParserState {
    pub fn new(source: Arc<str>, names: SharedNames, options: ParseOptions) -> Self {
        let error_name = names.intern(ERROR_NAME);
        ParserState {
            scanner: ScannerState::new(source, names),
            arena: NodeArena::new(),
            diagnostics: Vec::new(),
            options,
            recursion_depth: 0,
            prev_start: 0,
            prev_end: 0,
            last_error_pos: None,
            error_name,
        }
    }

    /// Hand back the tree and the merged, position-sorted diagnostics.
    pub fn finish(mut self) -> (NodeArena, Vec<ParseDiagnostic>) {
        for diag in self.scanner.take_diagnostics() {
            self.diagnostics.push(ParseDiagnostic {
                start: diag.pos,
                length: diag.length,
                code: diag.code,
                args: diag.args,
            });
        }
        self.diagnostics.sort_by_key(|d| d.start);
        (self.arena, self.diagnostics)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    pub(crate) fn token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.scanner.token() == kind
    }

    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.token_pos()
    }

    pub(crate) fn token_end(&self) -> u32 {
        self.scanner.token_end()
    }

    pub(crate) fn token_text(&self) -> &str {
        self.scanner.token_text()
    }

    /// End of the last consumed token.
    pub(crate) fn prev_end(&self) -> u32 {
        self.prev_end
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        self.prev_start = self.scanner.token_pos();
        self.prev_end = self.scanner.token_end();
        self.scanner.scan()
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `'X' expected` against the previous token.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            return true;
        }
        self.error_expected(&format!("'{}'", kind.text()));
        false
    }

    /// Report `X expected` against the previous token.
    pub(crate) fn error_expected(&mut self, what: &str) {
        let (start, end) = if self.prev_end > 0 {
            (self.prev_start, self.prev_end)
        } else {
            (self.token_pos(), self.token_end())
        };
        self.error_at(
            start,
            end.saturating_sub(start),
            codes::EXPECTED,
            vec![what.to_string()],
        );
    }

    /// Consume a closing `>` of a type argument list, splitting `>>`-style
    /// tokens when needed.
    pub(crate) fn parse_expected_gt(&mut self) -> bool {
        match self.token() {
            SyntaxKind::Gt => {
                self.next_token();
                true
            }
            SyntaxKind::GtGt
            | SyntaxKind::GtGtGt
            | SyntaxKind::GtEq
            | SyntaxKind::GtGtEq
            | SyntaxKind::GtGtGtEq => {
                let start = self.token_pos();
                self.scanner.split_gt();
                self.prev_start = start;
                self.prev_end = start + 1;
                true
            }
            _ => self.parse_expected(SyntaxKind::Gt),
        }
    }

    /// Whether the current token is the identifier `word` (contextual keyword).
    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_text() == word
    }

    pub(crate) fn intern(&self, text: &str) -> Atom {
        self.scanner.names().intern(text)
    }

    pub(crate) fn error_name(&self) -> Atom {
        self.error_name
    }

    /// Consume an identifier. Returns the error name when missing.
    pub(crate) fn parse_identifier(&mut self) -> (Atom, u32, bool) {
        let pos = self.token_pos();
        if self.is_token(SyntaxKind::Identifier) {
            let atom = self.scanner.token_atom();
            self.next_token();
            (atom, pos, true)
        } else {
            self.error_at(
                pos,
                self.token_end().saturating_sub(pos),
                codes::EXPECTED,
                vec!["<identifier>".to_string()],
            );
            (self.error_name, pos, false)
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Record a diagnostic. A second error at the same position is dropped.
    pub(crate) fn error_at(&mut self, start: u32, length: u32, code: &'static str, args: Vec<String>) {
        if self.last_error_pos == Some(start) {
            return;
        }
        self.last_error_pos = Some(start);
        trace!(start, code, "syntax error");
        self.diagnostics.push(ParseDiagnostic {
            start,
            length,
            code,
            args,
        });
    }

    pub(crate) fn error_at_current(&mut self, code: &'static str, args: Vec<String>) {
        let pos = self.token_pos();
        let len = self.token_end().saturating_sub(pos);
        self.error_at(pos, len, code, args);
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Add a node spanning from `pos` to the end of the last consumed token.
    pub(crate) fn finish_node(&mut self, pos: u32, data: NodeData) -> NodeIndex {
        let end = self.prev_end.max(pos);
        self.arena.add(pos, end, data)
    }

    pub(crate) fn mark_recovered(&mut self, index: NodeIndex) {
        self.arena.add_flags(index, NodeFlags::RECOVERED);
    }

    /// Erroneous node for input that could not be parsed.
    pub(crate) fn erroneous(&mut self, pos: u32, children: Vec<NodeIndex>) -> NodeIndex {
        let end = self.prev_end.max(pos);
        let idx = self.arena.add(pos, end, NodeData::Erroneous { children });
        self.mark_recovered(idx);
        idx
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.recursion_depth >= MAX_PARSER_RECURSION_DEPTH {
            self.error_at_current(codes::PREMATURE_EOF, Vec::new());
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // =========================================================================
    // Look-ahead
    // =========================================================================

    pub(crate) fn save(&self) -> LookAhead {
        LookAhead {
            scanner: self.scanner.save_state(),
            prev_start: self.prev_start,
            prev_end: self.prev_end,
            arena_len: self.arena.nodes.len(),
            diagnostics_len: self.diagnostics.len(),
        }
    }

    pub(crate) fn restore(&mut self, state: LookAhead) {
        self.scanner.restore_state(state.scanner);
        self.prev_start = state.prev_start;
        self.prev_end = state.prev_end;
        self.arena.nodes.truncate(state.arena_len);
        self.diagnostics.truncate(state.diagnostics_len);
    }

    /// Run `f` speculatively and rewind afterwards.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.save();
        let last_error = self.last_error_pos;
        let result = f(self);
        self.restore(saved);
        self.last_error_pos = last_error;
        result
    }

    /// Skip a type's tokens without building nodes. Returns false when the
    /// tokens cannot form a type.
    pub(crate) fn skip_type(&mut self) -> bool {
        while self.is_token(SyntaxKind::At) {
            self.next_token();
            if !self.skip_qualified_name() {
                return false;
            }
            if self.is_token(SyntaxKind::OpenParen) && !self.skip_balanced_parens() {
                return false;
            }
        }
        if self.token().is_primitive_type() {
            self.next_token();
        } else if self.is_token(SyntaxKind::Identifier) {
            loop {
                self.next_token();
                if self.is_token(SyntaxKind::Lt) && !self.skip_type_arguments() {
                    return false;
                }
                if self.is_token(SyntaxKind::Dot) {
                    self.next_token();
                    if !self.is_token(SyntaxKind::Identifier) {
                        return false;
                    }
                    continue;
                }
                break;
            }
        } else {
            return false;
        }
        while self.is_token(SyntaxKind::OpenBracket) {
            self.next_token();
            if !self.parse_optional(SyntaxKind::CloseBracket) {
                return false;
            }
        }
        true
    }

    fn skip_qualified_name(&mut self) -> bool {
        if !self.parse_optional(SyntaxKind::Identifier) {
            return false;
        }
        while self.is_token(SyntaxKind::Dot) {
            self.next_token();
            if !self.parse_optional(SyntaxKind::Identifier) {
                return false;
            }
        }
        true
    }

    /// Skip `<...>` counting nesting, `>>` and `>>>` close several levels.
    pub(crate) fn skip_type_arguments(&mut self) -> bool {
        let mut depth: i32 = 0;
        loop {
            match self.token() {
                SyntaxKind::Lt => depth += 1,
                SyntaxKind::Gt => depth -= 1,
                SyntaxKind::GtGt => depth -= 2,
                SyntaxKind::GtGtGt => depth -= 3,
                SyntaxKind::Identifier
                | SyntaxKind::Dot
                | SyntaxKind::Comma
                | SyntaxKind::Question
                | SyntaxKind::ExtendsKeyword
                | SyntaxKind::SuperKeyword
                | SyntaxKind::Amp
                | SyntaxKind::OpenBracket
                | SyntaxKind::CloseBracket
                | SyntaxKind::At => {}
                kind if kind.is_primitive_type() => {}
                _ => return false,
            }
            self.next_token();
            if depth < 0 {
                return false;
            }
            if depth == 0 {
                return true;
            }
        }
    }

    pub(crate) fn skip_balanced_parens(&mut self) -> bool {
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::OpenParen => depth += 1,
                SyntaxKind::CloseParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next_token();
                        return true;
                    }
                }
                SyntaxKind::EndOfFile => return false,
                _ => {}
            }
            self.next_token();
        }
    }

    /// Skip a `{ ... }` body without parsing it.
    pub(crate) fn skip_braces(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::OpenBrace => depth += 1,
                SyntaxKind::CloseBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next_token();
                        return;
                    }
                }
                SyntaxKind::EndOfFile => {
                    self.error_at_current(codes::PREMATURE_EOF, Vec::new());
                    return;
                }
                _ => {}
            }
            self.next_token();
        }
    }
}

//! Checker context - the shared state of one compile session.
//!
//! `CheckerContext` owns the symbol table, the session's front-end options
//! (lint categories, doc-comment checking, annotation processing) and the
//! diagnostic log. Attribution borrows it mutably through `CheckerState`.

use bitflags::bitflags;
use jbridge_binder::{SymbolId, SymbolTable, UnitId};
use rustc_hash::FxHashMap;

use crate::log::Log;

bitflags! {
    /// Lint categories enabled for the session.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LintFlags: u8 {
        /// `all` was requested (enables the post-analysis scanners).
        const ALL = 1 << 0;
        const DEPRECATION = 1 << 1;
        const RAWTYPES = 1 << 2;
        const UNCHECKED = 1 << 3;
    }
}

impl LintFlags {
    /// Parse a comma separated lint spec (`all`, `none`, `deprecation`,
    /// `rawtypes`, `unchecked`, `-name`). Unknown names are ignored, so
    /// `raw` enables nothing.
    pub fn parse(spec: &str) -> LintFlags {
        let mut flags = LintFlags::empty();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (remove, name) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let bits = match name {
                "all" => LintFlags::all(),
                "none" => {
                    flags = LintFlags::empty();
                    continue;
                }
                "deprecation" => LintFlags::DEPRECATION,
                "rawtypes" => LintFlags::RAWTYPES,
                "unchecked" => LintFlags::UNCHECKED,
                _ => LintFlags::empty(),
            };
            if remove {
                flags.remove(bits);
            } else {
                flags.insert(bits);
            }
        }
        flags
    }
}

/// Doc comment checking level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DocLint {
    /// Doc comments are not attributed.
    #[default]
    None,
    /// References in doc comments are attributed and checked.
    Reference,
    /// Every doc comment group is checked.
    All,
}

/// Front-end options of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckerOptions {
    pub lint: LintFlags,
    pub doclint: DocLint,
    pub annotation_processing: bool,
}

impl CheckerOptions {
    pub fn with_lint(mut self, spec: &str) -> Self {
        self.lint = LintFlags::parse(spec);
        self
    }

    pub fn with_doclint(mut self, doclint: DocLint) -> Self {
        self.doclint = doclint;
        self
    }
}

/// Shared state for one compile session.
pub struct CheckerContext {
    pub table: SymbolTable,
    pub options: CheckerOptions,
    pub log: Log,
    /// Symbols resolved for doc comment references, keyed by the start
    /// offset of the referencing text.
    doc_symbols: FxHashMap<(UnitId, u32), SymbolId>,
}

impl CheckerContext {
    pub fn new(table: SymbolTable, options: CheckerOptions) -> Self {
        CheckerContext {
            table,
            options,
            log: Log::new(),
            doc_symbols: FxHashMap::default(),
        }
    }

    pub fn lint(&self, flags: LintFlags) -> bool {
        self.options.lint.contains(flags)
    }

    pub fn record_doc_symbol(&mut self, unit: UnitId, start: u32, sym: SymbolId) {
        if sym.is_some() {
            self.doc_symbols.insert((unit, start), sym);
        }
    }

    pub fn doc_symbol(&self, unit: UnitId, start: u32) -> Option<SymbolId> {
        self.doc_symbols.get(&(unit, start)).copied()
    }

    /// Move queued binder diagnostics into the log.
    pub fn flush_binder_diagnostics(&mut self) {
        for diag in self.table.take_diagnostics() {
            self.log
                .report(Some(diag.unit), diag.start, diag.end, diag.code, diag.args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lint_spec_parsing() {
        assert_eq!(LintFlags::parse("raw"), LintFlags::empty());
        assert!(LintFlags::parse("all").contains(LintFlags::ALL | LintFlags::RAWTYPES));
        let some = LintFlags::parse("all,-rawtypes");
        assert!(some.contains(LintFlags::DEPRECATION));
        assert!(!some.contains(LintFlags::RAWTYPES));
        assert_eq!(LintFlags::parse("deprecation"), LintFlags::DEPRECATION);
        assert_eq!(LintFlags::parse("all,none"), LintFlags::empty());
    }
}

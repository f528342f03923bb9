//! Diagnostic log.
//!
//! Every diagnostic the front-end produces (scanner, parser, binder and
//! attribution) ends up here, in report order. A diagnostic with the same
//! unit, range and code as an earlier one is dropped.

use jbridge_binder::UnitId;
use jbridge_common::diagnostics::get_message;
use jbridge_common::{DiagnosticKind, format_message};
use rustc_hash::FxHashSet;
use tracing::trace;

/// A front-end diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JavaDiagnostic {
    /// `None` for diagnostics not tied to a source unit.
    pub unit: Option<UnitId>,
    pub code: &'static str,
    pub kind: DiagnosticKind,
    pub start: u32,
    pub end: u32,
    pub args: Vec<String>,
}

impl JavaDiagnostic {
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Formatted message text.
    pub fn message(&self) -> String {
        let template = get_message(self.code).map_or(self.code, |m| m.message);
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        format_message(template, &args)
    }
}

type DiagnosticKey = (Option<UnitId>, u32, u32, &'static str);

#[derive(Debug, Default)]
pub struct Log {
    diagnostics: Vec<JavaDiagnostic>,
    seen: FxHashSet<DiagnosticKey>,
    /// Index of the first diagnostic not yet handed out by `drain_new`.
    delivered: usize,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, unit: Option<UnitId>, start: u32, end: u32, code: &'static str, args: Vec<String>) {
        let kind = get_message(code).map_or(DiagnosticKind::Error, |m| m.kind);
        self.push(JavaDiagnostic {
            unit,
            code,
            kind,
            start,
            end: end.max(start),
            args,
        });
    }

    pub fn push(&mut self, diag: JavaDiagnostic) {
        if !self.seen.insert((diag.unit, diag.start, diag.end, diag.code)) {
            return;
        }
        trace!(code = diag.code, start = diag.start, "diagnostic");
        self.diagnostics.push(diag);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[JavaDiagnostic] {
        &self.diagnostics
    }

    /// Marker for [`truncate`](Self::truncate).
    pub fn checkpoint(&self) -> usize {
        self.diagnostics.len()
    }

    /// Discard everything reported after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        if mark >= self.diagnostics.len() {
            return;
        }
        for diag in self.diagnostics.drain(mark..) {
            self.seen.remove(&(diag.unit, diag.start, diag.end, diag.code));
        }
        self.delivered = self.delivered.min(mark);
    }

    /// Diagnostics reported since the previous call.
    pub fn drain_new(&mut self) -> Vec<JavaDiagnostic> {
        let out = self.diagnostics[self.delivered..].to_vec();
        self.delivered = self.diagnostics.len();
        out
    }

    pub fn has_errors(&self, unit: UnitId) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.unit == Some(unit) && d.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbridge_common::diagnostics::codes;

    #[test]
    fn test_dedup_and_truncate() {
        let mut log = Log::new();
        let unit = Some(UnitId(0));
        log.report(unit, 1, 4, codes::NOT_STMT, Vec::new());
        log.report(unit, 1, 4, codes::NOT_STMT, Vec::new());
        assert_eq!(log.len(), 1);

        let mark = log.checkpoint();
        log.report(unit, 8, 9, codes::CANT_RESOLVE, vec!["variable".into(), "x".into()]);
        assert_eq!(log.drain_new().len(), 2);
        log.truncate(mark);
        assert_eq!(log.len(), 1);
        // Reported again after the discarded pass.
        log.report(unit, 8, 9, codes::CANT_RESOLVE, vec!["variable".into(), "x".into()]);
        let fresh = log.drain_new();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].message(), "cannot find symbol: variable x");
    }

    #[test]
    fn test_kind_from_message_table() {
        let mut log = Log::new();
        log.report(None, 0, 0, codes::DEPRECATED, vec!["m()".into(), "A".into()]);
        assert_eq!(log.diagnostics()[0].kind, DiagnosticKind::Warning);
        assert!(!log.has_errors(UnitId(0)));
    }
}

//! Diagnostic kinds and message lookup for the embedded front-end.
//!
//! Front-end diagnostics are identified by a stable dotted code
//! (`compiler.err.cant.resolve`). The message templates live in `data.rs` and
//! use positional `{0}`, `{1}` placeholders.

use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, codes};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Severity as reported by the front-end, before host configuration applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: &'static str,
    pub kind: DiagnosticKind,
    pub message: &'static str,
}

// =============================================================================
// Message Lookup
// =============================================================================

pub fn get_message(code: &str) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

pub fn get_message_template(code: &str) -> Option<&'static str> {
    get_message(code).map(|m| m.message)
}

/// Replace `{0}`, `{1}`, ... in `message` with `args`.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_args() {
        let template = get_message_template(codes::CANT_RESOLVE).unwrap_or_default();
        assert_eq!(
            format_message(template, &["class", "Foo"]),
            "cannot find symbol: class Foo"
        );
    }

    #[test]
    fn every_code_has_a_message() {
        for msg in DIAGNOSTIC_MESSAGES {
            assert!(!msg.message.is_empty(), "{} has no message", msg.code);
            assert!(msg.code.starts_with("compiler."));
        }
    }
}

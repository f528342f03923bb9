//! Tokenizer for the jbridge embedded front-end.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine with save/restore for look-ahead
//! - Doc-comment tracking so the parser can attach `/** */` to declarations

mod scanner;
mod syntax_kind;

pub use scanner::{ScannerDiagnostic, ScannerSnapshot, ScannerState};
pub use syntax_kind::{SyntaxKind, keyword_kind};

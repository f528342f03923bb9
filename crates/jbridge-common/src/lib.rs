//! Common types and utilities for the jbridge compiler bridge.
//!
//! This crate provides foundational types used across all jbridge crates:
//! - Shared name table (`Atom`, `NameTable`, `SharedNames`)
//! - Line maps for offset <-> line/column conversion
//! - Comment scanning (`CommentRange`, `CommentStyle`)
//! - Front-end diagnostic message table and `format_message`
//! - The string-keyed configuration map and severity lookup
//! - Centralized limits

// Shared name table, reused across sessions
pub mod interner;
pub use interner::{Atom, NameTable, SharedNames};

// Line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Comment scanning utilities
pub mod comments;
pub use comments::{CommentRange, CommentStyle};

// Front-end diagnostics
pub mod diagnostics;
pub use diagnostics::{DiagnosticKind, DiagnosticMessage, format_message};

// Configuration map
pub mod options;
pub use options::{CompilerOptions, Severity};

// Centralized limits and thresholds
pub mod limits;

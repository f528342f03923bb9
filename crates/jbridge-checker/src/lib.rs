//! Attribution and the compile task for the jbridge embedded front-end.
//!
//! This crate provides:
//! - `CheckerContext`: the symbol table, session options and diagnostic log
//!   of one compile session
//! - `CheckerState`: attribution of one top-level class (names, members,
//!   expression types, front-end diagnostics)
//! - `CompileTask`: the parse, enter and analyze phases with the retried
//!   analyze loop
//! - Doc comment reference parsing and resolution

pub mod context;
pub mod doc;
pub mod log;
pub mod state;
mod state_declarations;
mod state_expressions;
mod state_lookup;
mod state_statements;
pub mod task;

pub use context::{CheckerContext, CheckerOptions, DocLint, LintFlags};
pub use doc::{DocReference, DocTag, parse_doc_references};
pub use log::{JavaDiagnostic, Log};
pub use state::CheckerState;
pub use task::{AnalyzeError, CompileTask, TaskEvent, TaskEventKind};

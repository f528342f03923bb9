//! The jbridge resolution driver.
//!
//! Turns requests for host syntax trees into front-end compilations and
//! converts the results:
//! - `driver`: batching, session setup, phase listeners and teardown
//! - `convert`: front-end parse tree to host AST, with range repair and
//!   recovery pruning
//! - `problems`, `unused`, `access`, `overrides`, `suppress`: host problems
//!   from front-end diagnostics and the bridge's own scanners
//! - `overlay`, `project`, `source`, `discovery`: where source text and
//!   classpath entries come from
//! - `trimmer`: parse tree rewrites for ignored bodies and focal points

pub mod access;
pub mod comments;
pub mod convert;
pub mod discovery;
pub mod driver;
pub mod options;
pub mod overlay;
pub mod overrides;
pub mod problems;
pub mod project;
pub mod request;
pub mod source;
pub mod suppress;
pub mod tracing_config;
pub mod trimmer;
pub mod unused;

pub use convert::{ConvertError, Converted, convert_tree};
pub use driver::{MOCK_UNIT, ResolveError, ResolvedUnits, parse, resolve, resolve_with_keys};
pub use overlay::{Overlay, WorkingCopy};
pub use problems::{DiagnosticConverter, Finding};
pub use project::Project;
pub use request::{BindingRequestor, CancellationToken, ResolveFlags, ResolveRequest};
pub use source::{SourceDescriptor, SourceEncoding, SourceError, SourceId, VIRTUAL_SCHEME};
pub use tracing_config::init_tracing;

//! Parser for the jbridge embedded front-end.
//!
//! Produces the front-end's own parse tree: an arena of [`Node`]s addressed
//! by [`NodeIndex`], with end positions, parent links, a doc-comment table
//! and RECOVERED flags on everything synthesized during error recovery.

pub mod parser;

pub use parser::{
    ClassKind, DirectiveKind, ERROR_NAME, ModifierFlags, Node, NodeArena, NodeData, NodeFlags,
    NodeIndex, NodeList, ParseDiagnostic, ParseOptions, ParsedUnit, VarKind, WildcardBound,
    parse_unit,
};

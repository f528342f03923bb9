//! Recursive descent parser producing an arena tree.

mod arena;
mod node;
mod state;
mod state_declarations;
mod state_expressions;
mod state_statements;
mod state_types;

pub use arena::NodeArena;
pub use node::{
    Children, ClassKind, DirectiveKind, ModifierFlags, Node, NodeData, NodeFlags, NodeIndex,
    NodeList, VarKind, WildcardBound,
};
pub use state::{ERROR_NAME, ParseDiagnostic, ParseOptions, ParsedUnit, ParserState, parse_unit};

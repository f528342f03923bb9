//! Host-side document model for jbridge.
//!
//! This crate provides:
//! - `Ast`/`AstNode`: the host syntax tree handed to callers, with source
//!   ranges, RECOVERED/MALFORMED flags and links back to front-end nodes
//! - `CompilationUnit`: a converted file with its comments and problems
//! - Binding keys: the textual identity of declared entities
//! - `Binding`s resolved lazily through a `Session`
//! - `Problem`s and their stable numeric ids

pub mod binding;
pub mod cache;
pub mod comment;
pub mod key;
pub mod node;
pub mod problem;
pub mod session;
pub mod tree;
pub mod unit;

pub use binding::{
    AnnotationBinding, Binding, BindingKind, MemberValuePairBinding, MethodBinding, ModuleBinding,
    PackageBinding, TypeBinding, TypeRepr, VariableBinding,
};
pub use cache::{BindingCache, resolve_type_key, symbol_key, type_key};
pub use comment::{Comment, CommentKind};
pub use key::{BindingKey, KeyParseError, MethodKey, TypeKey};
pub use node::{
    AnnotationStyle, AstChildren, AstFlags, AstId, AstNode, ForeignRef, ModuleDirectiveKind,
    NodeKind, TypeDeclKind,
};
pub use problem::{Problem, ProblemCategory, ProblemFactory, ProblemId};
pub use session::{BindingError, BindingResolver, Session, SessionState};
pub use tree::Ast;
pub use unit::CompilationUnit;

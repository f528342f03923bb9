//! Symbol table for the jbridge embedded front-end.
//!
//! This crate provides:
//! - `SymbolArena` and `SymbolId` handles for packages, classes, methods,
//!   variables, type variables and modules
//! - `Type`, the front-end's value-typed type model
//! - Classpath entries with access rules, the session `FileManager` and the
//!   session-independent `NameEnvironment`
//! - The enter phase and on-demand class completion (`SymbolTable`)

pub mod classpath;
pub mod file_manager;
pub mod platform;
pub mod state;
mod state_complete;
pub mod state_enter;
mod state_members;
pub mod state_resolve;
pub mod symbols;
pub mod types;
pub mod units;

pub use classpath::{
    AccessRestriction, AccessRule, ClasspathEntry, ClasspathError, EntryKind, EntryRoot, RuleKind,
};
pub use file_manager::{FileManager, LoadedSource, NameEnvironment, TypeAnswer};
pub use state::{BinderDiagnostic, CompletionFailure, SymbolTable, dotted_name};
pub use state_enter::{ClassPlacement, annotation_name, class_kind_word, has_annotation, modifiers_of};
pub use state_members::{Substitution, substitute};
pub use state_resolve::{Qualifier, TypeScope};
pub use symbols::{
    ClassInfo, DeclRef, MethodInfo, ModuleInfo, PackageInfo, Symbol, SymbolArena, SymbolId,
    SymbolInfo, SymbolKind, TypeVarInfo, VarInfo, symbol_flags,
};
pub use types::{PrimitiveKind, Type};
pub use units::{ImportEntry, SourceUnit, UnitId, UnitOrigin};

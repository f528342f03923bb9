//! Symbol storage.
//!
//! Symbols are allocated in a [`SymbolArena`] and addressed by [`SymbolId`]
//! handles. A symbol never owns another symbol; relations (owner, members,
//! parameters) are handles into the same arena.

use std::sync::Arc;

use jbridge_common::Atom;
use jbridge_parser::{ClassKind, ModifierFlags, NodeIndex, VarKind};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::Type;
use crate::units::UnitId;

/// Handle to a symbol in a [`SymbolArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Symbol flags.
pub mod symbol_flags {
    pub const NONE: u32 = 0;
    /// Completion failed or the declaration could not be resolved.
    pub const ERRONEOUS: u32 = 1 << 0;
    /// Loaded from a classpath entry rather than a compiled source unit.
    pub const BINARY: u32 = 1 << 1;
    /// Supertypes and member signatures have been entered.
    pub const COMPLETED: u32 = 1 << 2;
    pub const COMPLETING: u32 = 1 << 3;
    pub const DEPRECATED: u32 = 1 << 4;
    pub const VARARGS: u32 = 1 << 5;
    /// Local or anonymous class.
    pub const LOCAL: u32 = 1 << 6;
    pub const ANONYMOUS: u32 = 1 << 7;
    pub const CONSTRUCTOR: u32 = 1 << 8;
    /// Annotation member with a `default` value.
    pub const HAS_DEFAULT: u32 = 1 << 9;
    pub const ENUM_CONSTANT: u32 = 1 << 10;
    /// Member synthesized by the compiler (default constructor, enum
    /// `values()`, record accessors).
    pub const SYNTHETIC: u32 = 1 << 11;
    pub const RECORD_COMPONENT: u32 = 1 << 12;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Package,
    Class,
    Method,
    Var,
    TypeVar,
    Module,
}

/// Declaration site of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DeclRef {
    pub unit: UnitId,
    pub node: NodeIndex,
}

#[derive(Clone, Debug, Default)]
pub struct PackageInfo {
    /// Dotted name, empty for the unnamed package.
    pub qualified_name: Arc<str>,
    /// Top-level classes entered so far.
    pub classes: FxHashMap<Atom, SymbolId>,
}

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub class_kind: ClassKind,
    /// Binary name: `p.A$B`, `p.A$1`, `p.A$1Local`.
    pub flat_name: Arc<str>,
    /// Canonical dotted name; empty for anonymous and local classes.
    pub qualified_name: Arc<str>,
    pub package: SymbolId,
    pub type_params: Vec<SymbolId>,
    pub superclass: Option<Type>,
    pub interfaces: Vec<Type>,
    /// Fields, methods, constructors and member classes in declaration order.
    pub members: Vec<SymbolId>,
    pub member_types: FxHashMap<Atom, SymbolId>,
    /// Classpath entry index for binary classes.
    pub entry: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub type_params: Vec<SymbolId>,
    pub params: Vec<SymbolId>,
    pub return_type: Type,
    pub thrown: Vec<Type>,
}

#[derive(Clone, Debug)]
pub struct VarInfo {
    pub var_kind: VarKind,
    pub ty: Type,
    /// Occurrence index among same-named locals of one method; parameter
    /// position for parameters.
    pub index: u32,
    /// Source text of a constant initializer (literal fields).
    pub constant: Option<Arc<str>>,
}

#[derive(Clone, Debug, Default)]
pub struct TypeVarInfo {
    pub bounds: Vec<Type>,
}

#[derive(Clone, Debug, Default)]
pub struct ModuleInfo {
    pub qualified_name: Arc<str>,
    pub is_open: bool,
}

#[derive(Clone, Debug)]
pub enum SymbolInfo {
    Package(PackageInfo),
    Class(Box<ClassInfo>),
    Method(MethodInfo),
    Var(VarInfo),
    TypeVar(TypeVarInfo),
    Module(ModuleInfo),
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: Atom,
    pub owner: SymbolId,
    pub flags: u32,
    pub modifiers: ModifierFlags,
    pub decl: Option<DeclRef>,
    /// `Annotation` nodes applied to the declaration.
    pub annotations: Vec<DeclRef>,
    pub info: SymbolInfo,
}

impl Symbol {
    pub fn has_flags(&self, flags: u32) -> bool {
        self.flags & flags == flags
    }

    pub fn has_any_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }

    pub fn is_erroneous(&self) -> bool {
        self.flags & symbol_flags::ERRONEOUS != 0
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(ModifierFlags::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(ModifierFlags::PRIVATE)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags & symbol_flags::CONSTRUCTOR != 0
    }

    pub fn class_info(&self) -> Option<&ClassInfo> {
        match &self.info {
            SymbolInfo::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn class_info_mut(&mut self) -> Option<&mut ClassInfo> {
        match &mut self.info {
            SymbolInfo::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn method_info(&self) -> Option<&MethodInfo> {
        match &self.info {
            SymbolInfo::Method(info) => Some(info),
            _ => None,
        }
    }

    pub fn var_info(&self) -> Option<&VarInfo> {
        match &self.info {
            SymbolInfo::Var(info) => Some(info),
            _ => None,
        }
    }

    pub fn package_info(&self) -> Option<&PackageInfo> {
        match &self.info {
            SymbolInfo::Package(info) => Some(info),
            _ => None,
        }
    }
}

/// Arena for symbol storage.
#[derive(Clone, Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: SymbolKind, name: Atom, owner: SymbolId, info: SymbolInfo) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            kind,
            name,
            owner,
            flags: symbol_flags::NONE,
            modifiers: ModifierFlags::empty(),
            decl: None,
            annotations: Vec::new(),
            info,
        });
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn add_flags(&mut self, id: SymbolId, flags: u32) {
        if let Some(sym) = self.get_mut(id) {
            sym.flags |= flags;
        }
    }

    pub fn remove_flags(&mut self, id: SymbolId, flags: u32) {
        if let Some(sym) = self.get_mut(id) {
            sym.flags &= !flags;
        }
    }

    pub fn flags(&self, id: SymbolId) -> u32 {
        self.get(id).map_or(symbol_flags::NONE, |s| s.flags)
    }

    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.get(id).map(|s| s.kind)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_flags() {
        let mut arena = SymbolArena::new();
        let id = arena.alloc(
            SymbolKind::TypeVar,
            Atom::NONE,
            SymbolId::NONE,
            SymbolInfo::TypeVar(TypeVarInfo::default()),
        );
        assert_eq!(arena.len(), 1);
        arena.add_flags(id, symbol_flags::ERRONEOUS | symbol_flags::BINARY);
        assert!(arena.get(id).unwrap().is_erroneous());
        arena.remove_flags(id, symbol_flags::ERRONEOUS);
        assert_eq!(arena.flags(id), symbol_flags::BINARY);
        assert!(arena.get(SymbolId::NONE).is_none());
    }
}

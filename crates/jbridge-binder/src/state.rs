//! Symbol table state.
//!
//! `SymbolTable` is the front-end's shared table for one compile session:
//! packages, classes and members in a [`SymbolArena`], the parsed units they
//! were entered from, the classpath file manager, and the per-node
//! resolution records written by member entry and attribution.

use std::sync::Arc;

use jbridge_common::{Atom, SharedNames};
use jbridge_parser::{NodeData, NodeIndex, ParsedUnit};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::trace;

use crate::classpath::ClasspathError;
use crate::file_manager::FileManager;
use crate::symbols::{PackageInfo, Symbol, SymbolArena, SymbolId, SymbolInfo, SymbolKind};
use crate::types::Type;
use crate::units::{SourceUnit, UnitId, UnitOrigin};

/// A class could not be completed from the classpath.
#[derive(Debug, Error)]
#[error("cannot access {class_name}")]
pub struct CompletionFailure {
    pub class_name: String,
    #[source]
    pub source: ClasspathError,
}

/// Diagnostic produced while entering or completing source declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinderDiagnostic {
    pub unit: UnitId,
    pub start: u32,
    pub end: u32,
    pub code: &'static str,
    pub args: Vec<String>,
}

pub struct SymbolTable {
    pub names: SharedNames,
    pub symbols: SymbolArena,
    pub file_manager: FileManager,
    pub(crate) units: Vec<SourceUnit>,
    pub(crate) packages: FxHashMap<Arc<str>, SymbolId>,
    /// Classes by binary name.
    pub(crate) classes: FxHashMap<Arc<str>, SymbolId>,
    pub(crate) modules: FxHashMap<Arc<str>, SymbolId>,
    /// Qualified names known to be absent from the classpath.
    pub(crate) missing: FxHashSet<Arc<str>>,
    node_symbols: FxHashMap<(UnitId, NodeIndex), SymbolId>,
    node_types: FxHashMap<(UnitId, NodeIndex), Type>,
    pending: Vec<BinderDiagnostic>,
    pub(crate) init_name: Atom,
}

impl SymbolTable {
    pub fn new(names: SharedNames, file_manager: FileManager) -> Self {
        let init_name = names.intern("<init>");
        let mut table = SymbolTable {
            names,
            symbols: SymbolArena::new(),
            file_manager,
            units: Vec::new(),
            packages: FxHashMap::default(),
            classes: FxHashMap::default(),
            modules: FxHashMap::default(),
            missing: FxHashSet::default(),
            node_symbols: FxHashMap::default(),
            node_types: FxHashMap::default(),
            pending: Vec::new(),
            init_name,
        };
        table.enter_package("");
        table
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub fn intern(&self, text: &str) -> Atom {
        self.names.intern(text)
    }

    pub fn name(&self, atom: Atom) -> Arc<str> {
        self.names.resolve(atom)
    }

    pub fn symbol_name(&self, sym: SymbolId) -> Arc<str> {
        self.symbols
            .get(sym)
            .map(|s| self.name(s.name))
            .unwrap_or_else(|| Arc::from(""))
    }

    /// `<init>`, the name of every constructor.
    pub fn init_name(&self) -> Atom {
        self.init_name
    }

    pub fn symbol(&self, sym: SymbolId) -> Option<&Symbol> {
        self.symbols.get(sym)
    }

    // =========================================================================
    // Units
    // =========================================================================

    pub fn add_unit(&mut self, name: Arc<str>, origin: UnitOrigin, tree: ParsedUnit) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        trace!(unit = id.0, name = %name, "adding unit");
        self.units.push(SourceUnit::new(id, name, origin, tree));
        id
    }

    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units.get(id.0 as usize)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut SourceUnit> {
        self.units.get_mut(id.0 as usize)
    }

    pub fn tree(&self, id: UnitId) -> Option<Arc<ParsedUnit>> {
        self.unit(id).map(|u| u.tree.clone())
    }

    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter()
    }

    pub fn source_units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.iter().filter(|u| u.is_source())
    }

    pub fn is_source_unit(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(SourceUnit::is_source)
    }

    // =========================================================================
    // Packages and classes
    // =========================================================================

    /// Get or create the package `qualified` and its parents.
    pub fn enter_package(&mut self, qualified: &str) -> SymbolId {
        if let Some(&sym) = self.packages.get(qualified) {
            return sym;
        }
        let (owner, simple) = match qualified.rsplit_once('.') {
            Some((parent, simple)) => (self.enter_package(parent), simple),
            None if qualified.is_empty() => (SymbolId::NONE, ""),
            None => (self.enter_package(""), qualified),
        };
        let name = self.intern(simple);
        let qualified: Arc<str> = Arc::from(qualified);
        let sym = self.symbols.alloc(
            SymbolKind::Package,
            name,
            owner,
            SymbolInfo::Package(PackageInfo {
                qualified_name: qualified.clone(),
                classes: FxHashMap::default(),
            }),
        );
        self.packages.insert(qualified, sym);
        sym
    }

    pub fn package(&self, qualified: &str) -> Option<SymbolId> {
        self.packages.get(qualified).copied()
    }

    /// Whether `qualified` names a package with at least one class, on the
    /// classpath or among entered units.
    pub fn package_exists(&self, qualified: &str) -> bool {
        if qualified.is_empty() {
            return true;
        }
        let prefix = format!("{qualified}.");
        let entered = self.packages.iter().any(|(name, sym)| {
            (name.as_ref() == qualified || name.starts_with(&prefix))
                && self
                    .symbols
                    .get(*sym)
                    .and_then(Symbol::package_info)
                    .is_some_and(|p| !p.classes.is_empty())
        });
        entered || self.file_manager.has_package(&qualified.replace('.', "/"))
    }

    pub fn class_by_flat_name(&self, flat: &str) -> Option<SymbolId> {
        self.classes.get(flat).copied()
    }

    pub fn module(&self, qualified: &str) -> Option<SymbolId> {
        self.modules.get(qualified).copied()
    }

    pub fn package_name(&self, sym: SymbolId) -> Arc<str> {
        self.symbols
            .get(sym)
            .and_then(Symbol::package_info)
            .map(|p| p.qualified_name.clone())
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Canonical name of a class (`p.A.B`); the binary name for local and
    /// anonymous classes.
    pub fn class_name(&self, sym: SymbolId) -> Arc<str> {
        match self.symbols.get(sym).and_then(Symbol::class_info) {
            Some(info) if !info.qualified_name.is_empty() => info.qualified_name.clone(),
            Some(info) => info.flat_name.clone(),
            None => Arc::from(""),
        }
    }

    /// Package that (transitively) owns `sym`.
    pub fn package_of(&self, sym: SymbolId) -> SymbolId {
        let mut current = sym;
        let mut guard = 0;
        while let Some(s) = self.symbols.get(current) {
            if s.kind == SymbolKind::Package {
                return current;
            }
            if let Some(info) = s.class_info() {
                return info.package;
            }
            current = s.owner;
            guard += 1;
            if guard > 256 {
                break;
            }
        }
        SymbolId::NONE
    }

    /// Innermost class strictly enclosing `sym` (skipping methods).
    pub fn enclosing_class(&self, sym: SymbolId) -> SymbolId {
        let mut current = self.symbols.get(sym).map_or(SymbolId::NONE, |s| s.owner);
        while let Some(s) = self.symbols.get(current) {
            match s.kind {
                SymbolKind::Class => return current,
                SymbolKind::Package | SymbolKind::Module => return SymbolId::NONE,
                _ => current = s.owner,
            }
        }
        SymbolId::NONE
    }

    /// Outermost class containing `sym` (the class itself when top-level).
    pub fn outermost_class(&self, sym: SymbolId) -> SymbolId {
        let mut top = if self.symbols.kind(sym) == Some(SymbolKind::Class) {
            sym
        } else {
            self.enclosing_class(sym)
        };
        loop {
            let outer = self.enclosing_class(top);
            if outer.is_none() {
                return top;
            }
            top = outer;
        }
    }

    // =========================================================================
    // Resolution records
    // =========================================================================

    pub fn record_symbol(&mut self, unit: UnitId, node: NodeIndex, sym: SymbolId) {
        if node.is_some() && sym.is_some() {
            self.node_symbols.insert((unit, node), sym);
        }
    }

    pub fn record_type(&mut self, unit: UnitId, node: NodeIndex, ty: Type) {
        if node.is_some() {
            self.node_types.insert((unit, node), ty);
        }
    }

    pub fn symbol_at(&self, unit: UnitId, node: NodeIndex) -> Option<SymbolId> {
        self.node_symbols.get(&(unit, node)).copied()
    }

    pub fn type_at(&self, unit: UnitId, node: NodeIndex) -> Option<&Type> {
        self.node_types.get(&(unit, node))
    }

    /// Drop the records of `nodes` (a discarded attribution pass).
    pub fn forget_nodes(&mut self, unit: UnitId, nodes: &[NodeIndex]) {
        for &node in nodes {
            self.node_symbols.remove(&(unit, node));
            self.node_types.remove(&(unit, node));
        }
    }

    /// All symbol records of one unit, in node order.
    pub fn symbols_in_unit(&self, unit: UnitId) -> Vec<(NodeIndex, SymbolId)> {
        let mut out: Vec<_> = self
            .node_symbols
            .iter()
            .filter(|((u, _), _)| *u == unit)
            .map(|((_, node), sym)| (*node, *sym))
            .collect();
        out.sort_unstable();
        out
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Queue a diagnostic against a source unit. Diagnostics in classpath
    /// units are dropped.
    pub fn report(&mut self, unit: UnitId, start: u32, end: u32, code: &'static str, args: Vec<String>) {
        if !self.is_source_unit(unit) {
            return;
        }
        self.pending.push(BinderDiagnostic {
            unit,
            start,
            end,
            code,
            args,
        });
    }

    pub(crate) fn report_at_node(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        code: &'static str,
        args: Vec<String>,
    ) {
        let (start, end) = tree.arena.pos_end(node).unwrap_or((0, 0));
        self.report(unit, start, end, code, args);
    }

    pub fn take_diagnostics(&mut self) -> Vec<BinderDiagnostic> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_diagnostics(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Dotted text of an `Ident`/`FieldAccess` chain.
pub fn dotted_name(tree: &ParsedUnit, node: NodeIndex) -> Option<String> {
    match tree.arena.data(node)? {
        NodeData::Ident { name } => Some(tree.name_text(*name).to_string()),
        NodeData::FieldAccess { target, name, .. } => {
            let mut prefix = dotted_name(tree, *target)?;
            prefix.push('.');
            prefix.push_str(&tree.name_text(*name));
            Some(prefix)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbridge_common::NameTable;

    #[test]
    fn test_enter_package_creates_parents() {
        let mut table = SymbolTable::new(NameTable::shared(), FileManager::new(Vec::new()));
        let q = table.enter_package("a.b.c");
        let b = table.package("a.b").unwrap();
        assert_eq!(table.symbol(q).unwrap().owner, b);
        assert_eq!(table.package_name(q).as_ref(), "a.b.c");
        assert_eq!(table.enter_package("a.b.c"), q);
        assert!(table.package("").is_some());
    }

    #[test]
    fn test_platform_packages_exist() {
        let table = SymbolTable::new(NameTable::shared(), FileManager::new(Vec::new()));
        assert!(table.package_exists("java.util"));
        assert!(table.package_exists("java"));
        assert!(!table.package_exists("com.example"));
    }
}

//! Enter phase.
//!
//! Entering a unit creates its package, module and class symbols (top-level,
//! member and their type parameters) and records the unit's imports. Member
//! signatures are entered later, on completion.

use std::sync::Arc;

use jbridge_common::Atom;
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ClassKind, ModifierFlags, NodeData, NodeIndex, ParsedUnit};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::state::{SymbolTable, dotted_name};
use crate::symbols::{
    ClassInfo, DeclRef, ModuleInfo, SymbolId, SymbolInfo, SymbolKind, TypeVarInfo, symbol_flags,
};
use crate::units::{ImportEntry, UnitId};

/// Where a class declaration sits.
#[derive(Clone, Debug)]
pub enum ClassPlacement {
    TopLevel { package: SymbolId },
    Member { outer: SymbolId },
    /// Local or anonymous class, owned by a method or initializer's class.
    Local { owner: SymbolId, flat_name: Arc<str> },
}

/// Modifier flags and annotation nodes of a `Modifiers` node.
pub fn modifiers_of(tree: &ParsedUnit, modifiers: NodeIndex) -> (ModifierFlags, Vec<NodeIndex>) {
    match tree.arena.data(modifiers) {
        Some(NodeData::Modifiers { flags, annotations }) => (*flags, annotations.clone()),
        _ => (ModifierFlags::empty(), Vec::new()),
    }
}

/// Simple name of an annotation's type (`Deprecated` for
/// `@java.lang.Deprecated`).
pub fn annotation_name(tree: &ParsedUnit, annotation: NodeIndex) -> Option<Arc<str>> {
    let Some(NodeData::Annotation {
        annotation_type, ..
    }) = tree.arena.data(annotation)
    else {
        return None;
    };
    match tree.arena.data(*annotation_type)? {
        NodeData::Ident { name } => Some(tree.name_text(*name)),
        NodeData::FieldAccess { name, .. } => Some(tree.name_text(*name)),
        _ => None,
    }
}

pub fn has_annotation(tree: &ParsedUnit, annotations: &[NodeIndex], simple_name: &str) -> bool {
    annotations
        .iter()
        .any(|&a| annotation_name(tree, a).is_some_and(|n| n.as_ref() == simple_name))
}

impl SymbolTable {
    /// Enter the package, module, imports and classes declared by `unit`.
    /// Returns the unit's top-level classes.
    pub fn enter_unit(&mut self, unit: UnitId) -> Vec<SymbolId> {
        let Some(tree) = self.tree(unit) else {
            return Vec::new();
        };
        let Some(NodeData::CompilationUnit {
            package,
            imports,
            types,
            module,
        }) = tree.arena.data(tree.root)
        else {
            return Vec::new();
        };
        // Sources entered now may declare types that were looked up before.
        self.missing.clear();

        let package_name = match tree.arena.data(*package) {
            Some(NodeData::PackageDecl { name, .. }) => dotted_name(&tree, *name).unwrap_or_default(),
            _ => String::new(),
        };
        let package_sym = self.enter_package(&package_name);
        if let Some(NodeData::PackageDecl { name, .. }) = tree.arena.data(*package) {
            self.record_symbol(unit, *package, package_sym);
            self.record_package_name(unit, &tree, *name, &package_name);
        }

        let mut entries = Vec::with_capacity(imports.len());
        for &import in imports {
            if let Some(NodeData::Import {
                is_static,
                on_demand,
                name,
            }) = tree.arena.data(import)
                && let Some(text) = dotted_name(&tree, *name)
            {
                entries.push(ImportEntry {
                    node: import,
                    is_static: *is_static,
                    on_demand: *on_demand,
                    name: Arc::from(text),
                    target: SymbolId::NONE,
                });
            }
        }

        let module_sym = if let Some(NodeData::ModuleDecl { is_open, name, .. }) =
            tree.arena.data(*module)
        {
            let qualified = dotted_name(&tree, *name).unwrap_or_default();
            let atom = self.intern(&qualified);
            let sym = self.symbols.alloc(
                SymbolKind::Module,
                atom,
                SymbolId::NONE,
                SymbolInfo::Module(ModuleInfo {
                    qualified_name: Arc::from(qualified.as_str()),
                    is_open: *is_open,
                }),
            );
            if let Some(s) = self.symbols.get_mut(sym) {
                s.decl = Some(DeclRef { unit, node: *module });
            }
            self.modules.insert(Arc::from(qualified.as_str()), sym);
            self.record_symbol(unit, *module, sym);
            sym
        } else {
            SymbolId::NONE
        };

        let mut top_level = Vec::with_capacity(types.len());
        for &ty in types {
            if let Some(sym) =
                self.enter_class(unit, &tree, ty, ClassPlacement::TopLevel { package: package_sym })
            {
                top_level.push(sym);
            }
        }
        debug!(
            unit = unit.0,
            package = %package_name,
            classes = top_level.len(),
            "entered unit"
        );

        if let Some(u) = self.unit_mut(unit) {
            u.package = package_sym;
            u.module = module_sym;
            u.imports = entries;
            u.top_level = top_level.clone();
        }
        top_level
    }

    fn record_package_name(&mut self, unit: UnitId, tree: &ParsedUnit, node: NodeIndex, qualified: &str) {
        let Some(sym) = self.package(qualified) else {
            return;
        };
        self.record_symbol(unit, node, sym);
        if let Some(NodeData::FieldAccess { target, .. }) = tree.arena.data(node)
            && let Some((parent, _)) = qualified.rsplit_once('.')
        {
            self.record_package_name(unit, tree, *target, parent);
        }
    }

    /// Enter a class declaration and its member classes. Returns `None` for
    /// duplicates and for anonymous declarations outside a local placement.
    pub fn enter_class(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        placement: ClassPlacement,
    ) -> Option<SymbolId> {
        let Some(NodeData::ClassDecl {
            modifiers,
            kind,
            name,
            type_params,
            members,
            ..
        }) = tree.arena.data(node)
        else {
            return None;
        };
        let anonymous = name.is_none();
        let simple = tree.name_text(*name);

        let (owner, package, flat_name, qualified_name) = match &placement {
            ClassPlacement::TopLevel { package } => {
                if anonymous {
                    return None;
                }
                let pkg = self.package_name(*package);
                let qualified: Arc<str> = if pkg.is_empty() {
                    simple.clone()
                } else {
                    Arc::from(format!("{pkg}.{simple}"))
                };
                (*package, *package, qualified.clone(), qualified)
            }
            ClassPlacement::Member { outer } => {
                if anonymous {
                    return None;
                }
                let info = self.symbols.get(*outer).and_then(|s| s.class_info())?;
                let flat: Arc<str> = Arc::from(format!("{}${simple}", info.flat_name));
                let qualified: Arc<str> = if info.qualified_name.is_empty() {
                    Arc::from("")
                } else {
                    Arc::from(format!("{}.{simple}", info.qualified_name))
                };
                (*outer, info.package, flat, qualified)
            }
            ClassPlacement::Local { owner, flat_name } => {
                (*owner, self.package_of(*owner), flat_name.clone(), Arc::from(""))
            }
        };

        if self.classes.contains_key(&flat_name) {
            let location = match &placement {
                ClassPlacement::Member { outer } => format!("class {}", self.class_name(*outer)),
                _ => format!("package {}", self.package_name(package)),
            };
            let (start, end) = tree.arena.pos_end(node).unwrap_or((0, 0));
            trace!(flat = %flat_name, "duplicate class");
            self.report(
                unit,
                start,
                end,
                codes::ALREADY_DEFINED,
                vec![class_kind_word(*kind).to_string(), simple.to_string(), location],
            );
            return None;
        }

        let (mut mods, annotations) = modifiers_of(tree, *modifiers);
        let mut flags = symbol_flags::NONE;
        if has_annotation(tree, &annotations, "Deprecated") {
            flags |= symbol_flags::DEPRECATED;
            mods |= ModifierFlags::DEPRECATED;
        }
        if let ClassPlacement::Member { outer } = &placement {
            let outer_kind = self
                .symbols
                .get(*outer)
                .and_then(|s| s.class_info())
                .map(|i| i.class_kind);
            if matches!(outer_kind, Some(ClassKind::Interface | ClassKind::Annotation)) {
                mods |= ModifierFlags::PUBLIC | ModifierFlags::STATIC;
            }
            if *kind != ClassKind::Class {
                mods |= ModifierFlags::STATIC;
            }
        }
        if matches!(placement, ClassPlacement::Local { .. }) {
            flags |= symbol_flags::LOCAL;
            if anonymous {
                flags |= symbol_flags::ANONYMOUS;
            }
        }
        if *kind == ClassKind::Interface || *kind == ClassKind::Annotation {
            mods |= ModifierFlags::ABSTRACT;
        }

        let atom = if anonymous { Atom::NONE } else { *name };
        let sym = self.symbols.alloc(
            SymbolKind::Class,
            atom,
            owner,
            SymbolInfo::Class(Box::new(ClassInfo {
                class_kind: *kind,
                flat_name: flat_name.clone(),
                qualified_name,
                package,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                members: Vec::new(),
                member_types: FxHashMap::default(),
                entry: None,
            })),
        );
        let binary = !self.is_source_unit(unit);
        if let Some(s) = self.symbols.get_mut(sym) {
            s.flags |= flags;
            s.modifiers = mods;
            s.decl = Some(DeclRef { unit, node });
            s.annotations = annotations
                .iter()
                .map(|&a| DeclRef { unit, node: a })
                .collect();
        }
        if binary {
            let entry = match self.unit(unit).map(|u| u.origin) {
                Some(crate::units::UnitOrigin::Classpath { entry }) => Some(entry),
                _ => None,
            };
            self.symbols.add_flags(sym, symbol_flags::BINARY);
            if let Some(info) = self.symbols.get_mut(sym).and_then(|s| s.class_info_mut()) {
                info.entry = entry;
            }
        }
        self.record_symbol(unit, node, sym);
        self.classes.insert(flat_name, sym);

        match &placement {
            ClassPlacement::TopLevel { package } => {
                if let Some(SymbolInfo::Package(p)) = self.symbols.get_mut(*package).map(|s| &mut s.info) {
                    p.classes.insert(atom, sym);
                }
            }
            ClassPlacement::Member { outer } => {
                if let Some(info) = self.symbols.get_mut(*outer).and_then(|s| s.class_info_mut()) {
                    info.member_types.insert(atom, sym);
                }
            }
            ClassPlacement::Local { .. } => {}
        }

        let tvars = self.enter_type_params(unit, tree, type_params, sym);
        if let Some(info) = self.symbols.get_mut(sym).and_then(|s| s.class_info_mut()) {
            info.type_params = tvars;
        }

        for &member in members {
            if matches!(tree.arena.data(member), Some(NodeData::ClassDecl { .. })) {
                self.enter_class(unit, tree, member, ClassPlacement::Member { outer: sym });
            }
        }
        Some(sym)
    }

    pub(crate) fn enter_type_params(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        params: &[NodeIndex],
        owner: SymbolId,
    ) -> Vec<SymbolId> {
        let mut out = Vec::with_capacity(params.len());
        for &param in params {
            let Some(NodeData::TypeParameter { name, .. }) = tree.arena.data(param) else {
                continue;
            };
            let sym = self.symbols.alloc(
                SymbolKind::TypeVar,
                *name,
                owner,
                SymbolInfo::TypeVar(TypeVarInfo::default()),
            );
            if let Some(s) = self.symbols.get_mut(sym) {
                s.decl = Some(DeclRef { unit, node: param });
            }
            self.record_symbol(unit, param, sym);
            out.push(sym);
        }
        out
    }
}

/// Word used for a class kind in diagnostics.
pub fn class_kind_word(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::Class => "class",
        ClassKind::Interface => "interface",
        ClassKind::Enum => "enum",
        ClassKind::Annotation => "@interface",
        ClassKind::Record => "record",
    }
}

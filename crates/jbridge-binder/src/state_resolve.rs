//! Type name resolution.
//!
//! Resolves type nodes to [`Type`]s and simple names to class or type
//! variable symbols, in the order the language scopes them: local classes,
//! type variables and member types of the enclosing declarations, single-type
//! imports, the unit's own classes, the package, on-demand imports and
//! finally `java.lang`. Every resolved node is recorded in the table.

use jbridge_common::Atom;
use jbridge_common::diagnostics::codes;
use jbridge_common::limits::MAX_SUPERTYPE_DEPTH;
use jbridge_parser::{ERROR_NAME, NodeData, NodeIndex, ParsedUnit, WildcardBound};
use jbridge_scanner::SyntaxKind;
use tracing::trace;

use crate::state::{CompletionFailure, SymbolTable, dotted_name};
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{PrimitiveKind, Type};
use crate::units::UnitId;

/// Declarations visible when resolving a type name.
#[derive(Clone, Debug)]
pub struct TypeScope {
    pub unit: UnitId,
    /// Innermost enclosing class, or a method owning local classes.
    pub class: SymbolId,
    /// Type variables of enclosing generic methods, innermost last.
    pub type_vars: Vec<SymbolId>,
    /// Local classes declared in enclosing blocks, innermost last.
    pub local_types: Vec<(Atom, SymbolId)>,
}

impl TypeScope {
    pub fn for_unit(unit: UnitId) -> Self {
        TypeScope {
            unit,
            class: SymbolId::NONE,
            type_vars: Vec::new(),
            local_types: Vec::new(),
        }
    }

    pub fn for_class(unit: UnitId, class: SymbolId) -> Self {
        TypeScope {
            class,
            ..Self::for_unit(unit)
        }
    }
}

/// What the left side of a qualified type name denotes.
#[derive(Clone, Debug)]
pub enum Qualifier {
    Type(Type),
    Package(String),
    Error,
}

impl SymbolTable {
    // =========================================================================
    // Imports
    // =========================================================================

    /// Resolve the imports of `unit` once. Diagnostics are queued only when
    /// every import resolved without a completion failure.
    pub fn resolve_imports(&mut self, unit: UnitId) -> Result<(), CompletionFailure> {
        let Some(u) = self.unit_mut(unit) else {
            return Ok(());
        };
        if u.imports_resolved {
            return Ok(());
        }
        u.imports_resolved = true;
        let imports = u.imports.clone();
        let tree = u.tree.clone();

        let mut problems = Vec::new();
        let mut targets = Vec::with_capacity(imports.len());
        for import in &imports {
            match self.resolve_import(unit, &tree, import.node, import.is_static, import.on_demand, &import.name, &mut problems) {
                Ok(target) => targets.push(target),
                Err(failure) => {
                    if let Some(u) = self.unit_mut(unit) {
                        u.imports_resolved = false;
                    }
                    return Err(failure);
                }
            }
        }
        if let Some(u) = self.unit_mut(unit) {
            for (entry, target) in u.imports.iter_mut().zip(targets) {
                entry.target = target;
            }
        }
        for (node, code, args) in problems {
            self.report_at_node(unit, &tree, node, code, args);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_import(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        import: NodeIndex,
        is_static: bool,
        on_demand: bool,
        name: &str,
        problems: &mut Vec<(NodeIndex, &'static str, Vec<String>)>,
    ) -> Result<SymbolId, CompletionFailure> {
        let Some(NodeData::Import { name: name_node, .. }) = tree.arena.data(import) else {
            return Ok(SymbolId::NONE);
        };
        let name_node = *name_node;

        if on_demand && !is_static && self.package_exists(name) {
            let package = self.enter_package(name);
            self.record_name_chain(unit, tree, name_node, package);
            return Ok(SymbolId::NONE);
        }

        // The class named by the import, and the node that names it.
        let (class_name, class_node) = if is_static && !on_demand {
            let Some((class_name, _)) = name.rsplit_once('.') else {
                return Ok(SymbolId::NONE);
            };
            let target = match tree.arena.data(name_node) {
                Some(NodeData::FieldAccess { target, .. }) => *target,
                _ => NodeIndex::NONE,
            };
            (class_name, target)
        } else {
            (name, name_node)
        };

        match self.load_class(class_name)? {
            Some(class) => {
                self.record_name_chain(unit, tree, class_node, class);
                Ok(class)
            }
            None => {
                problems.push(self.missing_type_problem(class_name, class_node, tree));
                Ok(SymbolId::NONE)
            }
        }
    }

    /// `package p does not exist` or `cannot find symbol: class A in package p`.
    fn missing_type_problem(
        &self,
        qualified: &str,
        node: NodeIndex,
        tree: &ParsedUnit,
    ) -> (NodeIndex, &'static str, Vec<String>) {
        let Some((package, simple)) = qualified.rsplit_once('.') else {
            return (node, codes::CANT_RESOLVE, vec!["class".into(), qualified.to_string()]);
        };
        if self.package_exists(package) || self.class_by_flat_name(package).is_some() {
            (
                node,
                codes::CANT_RESOLVE_LOCATION,
                vec!["class".into(), simple.to_string(), format!("package {package}")],
            )
        } else {
            let target = match tree.arena.data(node) {
                Some(NodeData::FieldAccess { target, .. }) => *target,
                _ => node,
            };
            (target, codes::DOESNT_EXIST, vec![package.to_string()])
        }
    }

    /// Record `sym` for a qualified name node and its enclosing classes or
    /// packages for the qualifier nodes.
    pub fn record_name_chain(&mut self, unit: UnitId, tree: &ParsedUnit, node: NodeIndex, sym: SymbolId) {
        let mut node = node;
        let mut sym = sym;
        while node.is_some() && sym.is_some() {
            self.record_symbol(unit, node, sym);
            let Some(NodeData::FieldAccess { target, .. }) = tree.arena.data(node) else {
                break;
            };
            let Some(s) = self.symbols.get(sym) else {
                break;
            };
            sym = match s.kind {
                SymbolKind::Class | SymbolKind::Package => s.owner,
                _ => SymbolId::NONE,
            };
            // The unnamed package has no node.
            if self.symbols.kind(sym) == Some(SymbolKind::Package) && self.package_name(sym).is_empty() {
                break;
            }
            node = *target;
        }
    }

    // =========================================================================
    // Simple names
    // =========================================================================

    /// Find the class or type variable a simple type name denotes in `scope`.
    pub fn find_type(&mut self, scope: &TypeScope, name: Atom) -> Result<Option<SymbolId>, CompletionFailure> {
        if let Some((_, sym)) = scope.local_types.iter().rev().find(|(n, _)| *n == name) {
            return Ok(Some(*sym));
        }
        if let Some(&tv) = scope
            .type_vars
            .iter()
            .rev()
            .find(|&&tv| self.symbols.get(tv).is_some_and(|s| s.name == name))
        {
            return Ok(Some(tv));
        }

        let mut current = scope.class;
        let mut guard = 0;
        while current.is_some() && guard < MAX_SUPERTYPE_DEPTH {
            guard += 1;
            let Some(s) = self.symbols.get(current) else {
                break;
            };
            let owner = s.owner;
            match s.kind {
                SymbolKind::Class => {
                    if let Some(tv) = self.type_param_named(current, name) {
                        return Ok(Some(tv));
                    }
                    if self.symbols.get(current).is_some_and(|c| c.name == name) {
                        return Ok(Some(current));
                    }
                    if let Some(member) = self.find_member_type(current, name)? {
                        return Ok(Some(member));
                    }
                }
                SymbolKind::Method => {
                    if let Some(tv) = self.type_param_named(current, name) {
                        return Ok(Some(tv));
                    }
                }
                _ => break,
            }
            current = owner;
        }

        self.find_unit_type(scope.unit, name)
    }

    fn type_param_named(&self, owner: SymbolId, name: Atom) -> Option<SymbolId> {
        let s = self.symbols.get(owner)?;
        let params = match (s.class_info(), s.method_info()) {
            (Some(info), _) => &info.type_params,
            (_, Some(info)) => &info.type_params,
            _ => return None,
        };
        params
            .iter()
            .copied()
            .find(|&tv| self.symbols.get(tv).is_some_and(|t| t.name == name))
    }

    /// Resolve a simple name against the unit's imports, its own classes,
    /// its package and `java.lang`.
    pub fn find_unit_type(&mut self, unit: UnitId, name: Atom) -> Result<Option<SymbolId>, CompletionFailure> {
        self.resolve_imports(unit)?;
        let Some(u) = self.unit(unit) else {
            return Ok(None);
        };
        let imports = u.imports.clone();
        let top_level = u.top_level.clone();
        let package = self.package_name(u.package);
        let text = self.name(name);

        for import in imports.iter().filter(|i| !i.on_demand && !i.is_static) {
            if import.target.is_some() && self.symbols.get(import.target).is_some_and(|s| s.name == name) {
                return Ok(Some(import.target));
            }
        }
        // Static single imports may import member types.
        for import in imports.iter().filter(|i| !i.on_demand && i.is_static) {
            if import.name.rsplit('.').next() == Some(text.as_ref())
                && import.target.is_some()
                && let Some(member) = self.find_member_type(import.target, name)?
            {
                return Ok(Some(member));
            }
        }
        if let Some(&sym) = top_level.iter().find(|&&s| self.symbols.get(s).is_some_and(|c| c.name == name)) {
            return Ok(Some(sym));
        }
        let in_package = if package.is_empty() {
            text.to_string()
        } else {
            format!("{package}.{text}")
        };
        if let Some(sym) = self.load_class(&in_package)? {
            return Ok(Some(sym));
        }
        for import in imports.iter().filter(|i| i.on_demand) {
            let found = if import.target.is_some() {
                self.find_member_type(import.target, name)?
            } else if !import.is_static {
                self.load_class(&format!("{}.{text}", import.name))?
            } else {
                None
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        self.load_class(&format!("java.lang.{text}"))
    }

    /// Member class `name` of `class` or of one of its supertypes.
    pub fn find_member_type(&mut self, class: SymbolId, name: Atom) -> Result<Option<SymbolId>, CompletionFailure> {
        self.find_member_type_depth(class, name, 0)
    }

    fn find_member_type_depth(
        &mut self,
        class: SymbolId,
        name: Atom,
        depth: u32,
    ) -> Result<Option<SymbolId>, CompletionFailure> {
        if depth > MAX_SUPERTYPE_DEPTH {
            return Ok(None);
        }
        let Some(s) = self.symbols.get(class) else {
            return Ok(None);
        };
        let Some(info) = s.class_info() else {
            return Ok(None);
        };
        if let Some(&member) = info.member_types.get(&name) {
            return Ok(Some(member));
        }
        if s.has_flags(crate::symbols::symbol_flags::COMPLETING) {
            return Ok(None);
        }
        self.complete(class)?;
        for sup in self.direct_supertypes(class) {
            if let Some(sup_sym) = sup.class_symbol()
                && let Some(found) = self.find_member_type_depth(sup_sym, name, depth + 1)?
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    // =========================================================================
    // Type nodes
    // =========================================================================

    /// Resolve a type node, recording the type (and class symbols of names)
    /// for every node resolved along the way.
    pub fn resolve_type(&mut self, scope: &TypeScope, tree: &ParsedUnit, node: NodeIndex) -> Result<Type, CompletionFailure> {
        let ty = self.resolve_type_inner(scope, tree, node)?;
        self.record_type(scope.unit, node, ty.clone());
        Ok(ty)
    }

    fn resolve_type_inner(&mut self, scope: &TypeScope, tree: &ParsedUnit, node: NodeIndex) -> Result<Type, CompletionFailure> {
        let unit = scope.unit;
        let Some(data) = tree.arena.data(node) else {
            return Ok(Type::Unknown);
        };
        match data {
            NodeData::PrimitiveType { kind } => Ok(match PrimitiveKind::from_keyword(*kind) {
                Some(prim) => Type::Primitive(prim),
                None if *kind == SyntaxKind::VoidKeyword => Type::Void,
                None => Type::error(tree.node_text(node)),
            }),
            NodeData::ArrayType { elem } => {
                let elem = self.resolve_type(scope, tree, *elem)?;
                Ok(Type::Array(Box::new(elem)))
            }
            NodeData::Ident { name } => {
                let text = tree.name_text(*name);
                if text.as_ref() == ERROR_NAME {
                    return Ok(Type::error(&text));
                }
                match self.find_type(scope, *name)? {
                    Some(sym) => {
                        self.record_symbol(unit, node, sym);
                        Ok(self.type_of_symbol(sym))
                    }
                    None => {
                        trace!(name = %text, "unresolved type name");
                        self.report_at_node(unit, tree, node, codes::CANT_RESOLVE, vec!["class".into(), text.to_string()]);
                        Ok(Type::error(&text))
                    }
                }
            }
            NodeData::FieldAccess { target, name, name_pos } => {
                let text = tree.name_text(*name);
                let written = tree.node_text(node).to_string();
                match self.resolve_qualifier(scope, tree, *target)? {
                    Qualifier::Type(owner) => {
                        let found = match owner.class_symbol() {
                            Some(class) => self.find_member_type(class, *name)?,
                            None => None,
                        };
                        match found {
                            Some(member) => {
                                self.record_symbol(unit, node, member);
                                Ok(Type::class(member))
                            }
                            None => {
                                let location = match owner.class_symbol() {
                                    Some(class) => format!("class {}", self.class_name(class)),
                                    None => format!("type {}", self.type_display(&owner)),
                                };
                                let end = tree.arena.pos_end(node).map_or(*name_pos, |(_, end)| end);
                                self.report(unit, *name_pos, end, codes::CANT_RESOLVE_LOCATION, vec!["class".into(), text.to_string(), location]);
                                Ok(Type::error(&written))
                            }
                        }
                    }
                    Qualifier::Package(package) => {
                        let qualified = format!("{package}.{text}");
                        match self.load_class(&qualified)? {
                            Some(class) => {
                                self.record_name_chain(unit, tree, node, class);
                                Ok(Type::class(class))
                            }
                            None => {
                                let (at, code, args) = self.missing_type_problem(&qualified, node, tree);
                                self.report_at_node(unit, tree, at, code, args);
                                Ok(Type::error(&written))
                            }
                        }
                    }
                    Qualifier::Error => Ok(Type::error(&written)),
                }
            }
            NodeData::ParameterizedType { base, args } => {
                let base_ty = self.resolve_type(scope, tree, *base)?;
                let mut resolved = Vec::with_capacity(args.len());
                for &arg in args {
                    resolved.push(self.resolve_type(scope, tree, arg)?);
                }
                Ok(match base_ty {
                    Type::Class { sym, .. } => Type::Class { sym, args: resolved },
                    other => other,
                })
            }
            NodeData::Wildcard { bound_kind, bound } => {
                let bound = if bound.is_some() {
                    Some(Box::new(self.resolve_type(scope, tree, *bound)?))
                } else {
                    None
                };
                Ok(Type::Wildcard {
                    bound_kind: *bound_kind,
                    bound,
                })
            }
            NodeData::UnionType { alternatives: types } | NodeData::IntersectionType { bounds: types } => {
                let mut first = Type::Unknown;
                for (i, &t) in types.iter().enumerate() {
                    let ty = self.resolve_type(scope, tree, t)?;
                    if i == 0 {
                        first = ty;
                    }
                }
                Ok(first)
            }
            _ => Ok(Type::error(tree.node_text(node))),
        }
    }

    /// Resolve the qualifier of a qualified type name.
    pub fn resolve_qualifier(&mut self, scope: &TypeScope, tree: &ParsedUnit, node: NodeIndex) -> Result<Qualifier, CompletionFailure> {
        let unit = scope.unit;
        match tree.arena.data(node) {
            Some(NodeData::Ident { name }) => {
                if let Some(sym) = self.find_type(scope, *name)? {
                    self.record_symbol(unit, node, sym);
                    let ty = self.type_of_symbol(sym);
                    self.record_type(unit, node, ty.clone());
                    return Ok(Qualifier::Type(ty));
                }
                let text = tree.name_text(*name).to_string();
                if let Some(package) = self.package(&text) {
                    self.record_symbol(unit, node, package);
                }
                Ok(Qualifier::Package(text))
            }
            Some(NodeData::FieldAccess { target, name, name_pos }) => {
                let text = tree.name_text(*name);
                match self.resolve_qualifier(scope, tree, *target)? {
                    Qualifier::Type(owner) => {
                        let found = match owner.class_symbol() {
                            Some(class) => self.find_member_type(class, *name)?,
                            None => None,
                        };
                        match found {
                            Some(member) => {
                                self.record_symbol(unit, node, member);
                                let ty = Type::class(member);
                                self.record_type(unit, node, ty.clone());
                                Ok(Qualifier::Type(ty))
                            }
                            None => {
                                let location = owner
                                    .class_symbol()
                                    .map(|c| format!("class {}", self.class_name(c)))
                                    .unwrap_or_default();
                                let end = tree.arena.pos_end(node).map_or(*name_pos, |(_, end)| end);
                                self.report(unit, *name_pos, end, codes::CANT_RESOLVE_LOCATION, vec!["class".into(), text.to_string(), location]);
                                Ok(Qualifier::Error)
                            }
                        }
                    }
                    Qualifier::Package(package) => {
                        let qualified = format!("{package}.{text}");
                        if let Some(class) = self.load_class(&qualified)? {
                            self.record_name_chain(unit, tree, node, class);
                            let ty = Type::class(class);
                            self.record_type(unit, node, ty.clone());
                            return Ok(Qualifier::Type(ty));
                        }
                        if self.package_exists(&qualified) {
                            let package = self.enter_package(&qualified);
                            self.record_name_chain(unit, tree, node, package);
                        }
                        Ok(Qualifier::Package(qualified))
                    }
                    Qualifier::Error => Ok(Qualifier::Error),
                }
            }
            _ => Ok(match dotted_name(tree, node) {
                Some(text) => Qualifier::Package(text),
                None => Qualifier::Error,
            }),
        }
    }

    /// The type a class or type variable symbol denotes when named without
    /// arguments.
    pub fn type_of_symbol(&self, sym: SymbolId) -> Type {
        match self.symbols.kind(sym) {
            Some(SymbolKind::TypeVar) => Type::TypeVar(sym),
            Some(SymbolKind::Class) => Type::class(sym),
            _ => Type::error(&self.symbol_name(sym)),
        }
    }

    /// Source-like rendering of a type for messages (`List<String>`,
    /// `int[]`).
    pub fn type_display(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive(kind) => kind.name().to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "<nulltype>".to_string(),
            Type::Class { sym, args } => {
                let mut out = self.symbol_name(*sym).to_string();
                if !args.is_empty() {
                    let rendered: Vec<String> = args.iter().map(|a| self.type_display(a)).collect();
                    out.push('<');
                    out.push_str(&rendered.join(","));
                    out.push('>');
                }
                out
            }
            Type::Array(elem) => format!("{}[]", self.type_display(elem)),
            Type::TypeVar(sym) => self.symbol_name(*sym).to_string(),
            Type::Wildcard { bound_kind, bound } => match (bound_kind, bound) {
                (WildcardBound::Extends, Some(b)) => format!("? extends {}", self.type_display(b)),
                (WildcardBound::Super, Some(b)) => format!("? super {}", self.type_display(b)),
                _ => "?".to_string(),
            },
            Type::Error { name } => name.to_string(),
            Type::Unknown => "?".to_string(),
        }
    }
}

//! Class completion.
//!
//! Completing a class resolves its supertypes and enters its member
//! signatures: fields, methods, constructors, enum constants, record
//! components and the members the language implies (default constructor,
//! `values()`/`valueOf` for enums, record accessors). Classes that are not
//! declared by any entered unit are loaded from the classpath first.

use std::sync::Arc;

use jbridge_parser::{
    ClassKind, ModifierFlags, NodeData, NodeFlags, NodeIndex, ParseOptions, ParsedUnit, VarKind,
    parse_unit,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::state::{CompletionFailure, SymbolTable};
use crate::state_enter::{has_annotation, modifiers_of};
use crate::state_resolve::TypeScope;
use crate::symbols::{
    ClassInfo, DeclRef, MethodInfo, SymbolId, SymbolInfo, SymbolKind, VarInfo, symbol_flags,
};
use crate::types::{PrimitiveKind, Type};
use crate::units::{UnitId, UnitOrigin};

/// Supertypes and members computed for one class, committed only once the
/// whole class completed.
struct Completion {
    superclass: Option<Type>,
    interfaces: Vec<Type>,
    members: Vec<SymbolId>,
}

impl SymbolTable {
    /// Complete `sym` if it is a class that has not been completed yet.
    pub fn complete(&mut self, sym: SymbolId) -> Result<(), CompletionFailure> {
        let Some(s) = self.symbols.get(sym) else {
            return Ok(());
        };
        if s.kind != SymbolKind::Class
            || s.has_any_flags(symbol_flags::COMPLETED | symbol_flags::COMPLETING)
        {
            return Ok(());
        }
        let Some(decl) = s.decl else {
            self.symbols.add_flags(sym, symbol_flags::COMPLETED);
            return Ok(());
        };
        let Some(tree) = self.tree(decl.unit) else {
            self.symbols.add_flags(sym, symbol_flags::COMPLETED);
            return Ok(());
        };

        trace!(class = %self.class_name(sym), "completing");
        self.symbols.add_flags(sym, symbol_flags::COMPLETING);
        let result = self.complete_class(sym, decl.unit, &tree, decl.node);
        self.symbols.remove_flags(sym, symbol_flags::COMPLETING);
        let completion = result?;

        if let Some(info) = self.symbols.get_mut(sym).and_then(|s| s.class_info_mut()) {
            info.superclass = completion.superclass;
            info.interfaces = completion.interfaces;
            info.members = completion.members;
        }
        self.symbols.add_flags(sym, symbol_flags::COMPLETED);
        Ok(())
    }

    fn complete_class(
        &mut self,
        sym: SymbolId,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
    ) -> Result<Completion, CompletionFailure> {
        let Some(NodeData::ClassDecl {
            kind,
            type_params,
            extends,
            implements,
            components,
            members,
            ..
        }) = tree.arena.data(node)
        else {
            return Ok(Completion {
                superclass: None,
                interfaces: Vec::new(),
                members: Vec::new(),
            });
        };
        let kind = *kind;
        self.resolve_imports(unit)?;
        let scope = TypeScope::for_class(unit, sym);

        let tvars = self
            .symbols
            .get(sym)
            .and_then(|s| s.class_info())
            .map(|i| i.type_params.clone())
            .unwrap_or_default();
        self.resolve_type_var_bounds(&scope, tree, type_params, &tvars)?;

        // Anonymous classes get their supertype from the instance creation.
        let preset = self
            .symbols
            .get(sym)
            .and_then(|s| s.class_info())
            .map(|i| (i.superclass.clone(), i.interfaces.clone()))
            .unwrap_or_default();

        let superclass = if extends.is_some() {
            Some(self.resolve_type(&scope, tree, *extends)?)
        } else if preset.0.is_some() {
            preset.0
        } else {
            self.default_superclass(sym, kind)?
        };

        // Superinterfaces of an interface are parsed into `implements`.
        let mut interfaces = preset.1;
        for &iface in implements {
            interfaces.push(self.resolve_type(&scope, tree, iface)?);
        }
        if kind == ClassKind::Annotation
            && let Some(annotation) = self.load_class("java.lang.annotation.Annotation")?
        {
            interfaces.push(Type::class(annotation));
        }

        let class_mods = self.symbols.get(sym).map(|s| s.modifiers).unwrap_or_default();
        let in_interface = matches!(kind, ClassKind::Interface | ClassKind::Annotation);
        let mut out = Vec::with_capacity(members.len() + 2);

        if kind == ClassKind::Record {
            for &component in components {
                if let Some(field) = self.enter_record_component(unit, tree, component, sym, &scope)? {
                    out.push(field);
                }
            }
        }

        for &member in members {
            let Some(data) = tree.arena.data(member) else {
                continue;
            };
            match data {
                NodeData::VarDecl {
                    kind: VarKind::Field,
                    ..
                } => out.push(self.enter_field(unit, tree, member, sym, &scope, in_interface)?),
                NodeData::MethodDecl { .. } => {
                    out.push(self.enter_method(unit, tree, member, sym, &scope, kind)?)
                }
                NodeData::EnumConstant { .. } => {
                    out.push(self.enter_enum_constant(unit, tree, member, sym))
                }
                NodeData::ClassDecl { .. } => {
                    if let Some(nested) = self.symbol_at(unit, member) {
                        out.push(nested);
                    }
                }
                _ => {}
            }
        }

        let has_ctor = out
            .iter()
            .any(|&m| self.symbols.get(m).is_some_and(|s| s.is_constructor()));
        match kind {
            ClassKind::Class | ClassKind::Enum if !has_ctor => {
                let mods = if kind == ClassKind::Enum {
                    ModifierFlags::PRIVATE
                } else {
                    class_mods & (ModifierFlags::PUBLIC | ModifierFlags::PROTECTED | ModifierFlags::PRIVATE)
                };
                out.push(self.synthetic_method(sym, self.init_name, mods, Vec::new(), Type::Void, true));
            }
            ClassKind::Record => {
                self.add_record_members(sym, &mut out, has_ctor);
            }
            _ => {}
        }
        if kind == ClassKind::Enum {
            self.add_enum_members(sym, &mut out)?;
        }

        Ok(Completion {
            superclass,
            interfaces,
            members: out,
        })
    }

    fn default_superclass(&mut self, sym: SymbolId, kind: ClassKind) -> Result<Option<Type>, CompletionFailure> {
        Ok(match kind {
            ClassKind::Interface | ClassKind::Annotation => None,
            ClassKind::Enum => self.load_class("java.lang.Enum")?.map(|e| Type::Class {
                sym: e,
                args: vec![Type::class(sym)],
            }),
            ClassKind::Record => self.load_class("java.lang.Record")?.map(Type::class),
            ClassKind::Class => {
                if self.class_name(sym).as_ref() == "java.lang.Object" {
                    None
                } else {
                    self.load_class("java.lang.Object")?.map(Type::class)
                }
            }
        })
    }

    pub(crate) fn resolve_type_var_bounds(
        &mut self,
        scope: &TypeScope,
        tree: &ParsedUnit,
        params: &[NodeIndex],
        tvars: &[SymbolId],
    ) -> Result<(), CompletionFailure> {
        for (&param, &tvar) in params.iter().zip(tvars) {
            let Some(NodeData::TypeParameter { bounds, .. }) = tree.arena.data(param) else {
                continue;
            };
            let mut resolved = Vec::with_capacity(bounds.len());
            for &bound in bounds {
                resolved.push(self.resolve_type(scope, tree, bound)?);
            }
            if let Some(SymbolInfo::TypeVar(info)) = self.symbols.get_mut(tvar).map(|s| &mut s.info) {
                info.bounds = resolved;
            }
        }
        Ok(())
    }

    fn declared_type(
        &mut self,
        scope: &TypeScope,
        tree: &ParsedUnit,
        var_type: NodeIndex,
        extra_dims: u32,
        varargs: bool,
    ) -> Result<Type, CompletionFailure> {
        if var_type.is_none() {
            return Ok(Type::Unknown);
        }
        let ty = self.resolve_type(scope, tree, var_type)?;
        let ty = Type::array_of(ty, extra_dims);
        Ok(if varargs { Type::Array(Box::new(ty)) } else { ty })
    }

    fn enter_field(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        class: SymbolId,
        scope: &TypeScope,
        in_interface: bool,
    ) -> Result<SymbolId, CompletionFailure> {
        let Some(NodeData::VarDecl {
            modifiers,
            var_type,
            name,
            extra_dims,
            init,
            ..
        }) = tree.arena.data(node)
        else {
            return Ok(SymbolId::NONE);
        };
        let ty = self.declared_type(scope, tree, *var_type, *extra_dims, false)?;
        let (mut mods, annotations) = modifiers_of(tree, *modifiers);
        if in_interface {
            mods |= ModifierFlags::PUBLIC | ModifierFlags::STATIC | ModifierFlags::FINAL;
        }
        let constant = match tree.arena.data(*init) {
            Some(NodeData::Literal { value, .. }) if mods.contains(ModifierFlags::FINAL) => {
                Some(Arc::from(value.as_str()))
            }
            _ => None,
        };
        let sym = self.symbols.alloc(
            SymbolKind::Var,
            *name,
            class,
            SymbolInfo::Var(VarInfo {
                var_kind: VarKind::Field,
                ty,
                index: 0,
                constant,
            }),
        );
        self.finish_member(unit, tree, node, sym, mods, &annotations);
        Ok(sym)
    }

    fn enter_enum_constant(&mut self, unit: UnitId, tree: &ParsedUnit, node: NodeIndex, class: SymbolId) -> SymbolId {
        let Some(NodeData::EnumConstant { modifiers, name, .. }) = tree.arena.data(node) else {
            return SymbolId::NONE;
        };
        let (mods, annotations) = modifiers_of(tree, *modifiers);
        let sym = self.symbols.alloc(
            SymbolKind::Var,
            *name,
            class,
            SymbolInfo::Var(VarInfo {
                var_kind: VarKind::Field,
                ty: Type::class(class),
                index: 0,
                constant: None,
            }),
        );
        self.symbols.add_flags(sym, symbol_flags::ENUM_CONSTANT);
        self.finish_member(
            unit,
            tree,
            node,
            sym,
            mods | ModifierFlags::PUBLIC | ModifierFlags::STATIC | ModifierFlags::FINAL,
            &annotations,
        );
        sym
    }

    fn enter_method(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        class: SymbolId,
        class_scope: &TypeScope,
        class_kind: ClassKind,
    ) -> Result<SymbolId, CompletionFailure> {
        let Some(NodeData::MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            params,
            extra_dims,
            throws,
            body,
            default_value,
            is_constructor,
            ..
        }) = tree.arena.data(node)
        else {
            return Ok(SymbolId::NONE);
        };
        let (mut mods, annotations) = modifiers_of(tree, *modifiers);
        match class_kind {
            ClassKind::Annotation => mods |= ModifierFlags::PUBLIC | ModifierFlags::ABSTRACT,
            ClassKind::Interface => {
                if !mods.contains(ModifierFlags::PRIVATE) {
                    mods |= ModifierFlags::PUBLIC;
                }
                if body.is_none()
                    && !mods.intersects(ModifierFlags::STATIC | ModifierFlags::DEFAULT | ModifierFlags::PRIVATE)
                {
                    mods |= ModifierFlags::ABSTRACT;
                }
            }
            _ => {}
        }

        let method_name = if *is_constructor { self.init_name } else { *name };
        let sym = self.symbols.alloc(
            SymbolKind::Method,
            method_name,
            class,
            SymbolInfo::Method(MethodInfo {
                type_params: Vec::new(),
                params: Vec::new(),
                return_type: Type::Void,
                thrown: Vec::new(),
            }),
        );

        let tvars = self.enter_type_params(unit, tree, type_params, sym);
        let mut scope = class_scope.clone();
        scope.type_vars.extend(tvars.iter().copied());
        self.resolve_type_var_bounds(&scope, tree, type_params, &tvars)?;

        let mut param_syms = Vec::with_capacity(params.len());
        let mut varargs = false;
        for (index, &param) in params.iter().enumerate() {
            let Some(NodeData::VarDecl {
                modifiers,
                var_type,
                name,
                extra_dims,
                ..
            }) = tree.arena.data(param)
            else {
                continue;
            };
            let is_varargs = tree.arena.flags(param).contains(NodeFlags::VARARGS);
            varargs |= is_varargs;
            let ty = self.declared_type(&scope, tree, *var_type, *extra_dims, is_varargs)?;
            let (param_mods, param_annotations) = modifiers_of(tree, *modifiers);
            let psym = self.symbols.alloc(
                SymbolKind::Var,
                *name,
                sym,
                SymbolInfo::Var(VarInfo {
                    var_kind: VarKind::Param,
                    ty,
                    index: index as u32,
                    constant: None,
                }),
            );
            self.finish_member(unit, tree, param, psym, param_mods, &param_annotations);
            param_syms.push(psym);
        }

        let return_ty = if *is_constructor {
            Type::Void
        } else {
            self.declared_type(&scope, tree, *return_type, *extra_dims, false)?
        };
        let mut thrown = Vec::with_capacity(throws.len());
        for &t in throws {
            thrown.push(self.resolve_type(&scope, tree, t)?);
        }

        if let Some(SymbolInfo::Method(info)) = self.symbols.get_mut(sym).map(|s| &mut s.info) {
            info.type_params = tvars;
            info.params = param_syms;
            info.return_type = return_ty;
            info.thrown = thrown;
        }
        let mut flags = symbol_flags::NONE;
        if *is_constructor {
            flags |= symbol_flags::CONSTRUCTOR;
        }
        if varargs {
            flags |= symbol_flags::VARARGS;
        }
        if default_value.is_some() {
            flags |= symbol_flags::HAS_DEFAULT;
        }
        self.symbols.add_flags(sym, flags);
        self.finish_member(unit, tree, node, sym, mods, &annotations);
        Ok(sym)
    }

    /// Record a member's declaration, modifiers and annotations.
    fn finish_member(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        sym: SymbolId,
        mut mods: ModifierFlags,
        annotations: &[NodeIndex],
    ) {
        let deprecated = has_annotation(tree, annotations, "Deprecated");
        if deprecated {
            mods |= ModifierFlags::DEPRECATED;
            self.symbols.add_flags(sym, symbol_flags::DEPRECATED);
        }
        if !self.is_source_unit(unit) {
            self.symbols.add_flags(sym, symbol_flags::BINARY);
        }
        if let Some(s) = self.symbols.get_mut(sym) {
            s.modifiers |= mods;
            s.decl = Some(DeclRef { unit, node });
            s.annotations = annotations.iter().map(|&a| DeclRef { unit, node: a }).collect();
        }
        self.record_symbol(unit, node, sym);
    }

    fn enter_record_component(
        &mut self,
        unit: UnitId,
        tree: &ParsedUnit,
        node: NodeIndex,
        class: SymbolId,
        scope: &TypeScope,
    ) -> Result<Option<SymbolId>, CompletionFailure> {
        let Some(NodeData::VarDecl {
            modifiers,
            var_type,
            name,
            extra_dims,
            ..
        }) = tree.arena.data(node)
        else {
            return Ok(None);
        };
        let varargs = tree.arena.flags(node).contains(NodeFlags::VARARGS);
        let ty = self.declared_type(scope, tree, *var_type, *extra_dims, varargs)?;
        let (_, annotations) = modifiers_of(tree, *modifiers);
        let sym = self.symbols.alloc(
            SymbolKind::Var,
            *name,
            class,
            SymbolInfo::Var(VarInfo {
                var_kind: VarKind::Field,
                ty,
                index: 0,
                constant: None,
            }),
        );
        self.symbols.add_flags(sym, symbol_flags::RECORD_COMPONENT);
        self.finish_member(
            unit,
            tree,
            node,
            sym,
            ModifierFlags::PRIVATE | ModifierFlags::FINAL,
            &annotations,
        );
        Ok(Some(sym))
    }

    /// Accessors and the canonical constructor of a record.
    fn add_record_members(&mut self, class: SymbolId, out: &mut Vec<SymbolId>, has_ctor: bool) {
        let components: Vec<(SymbolId, jbridge_common::Atom, Type)> = out
            .iter()
            .filter_map(|&m| {
                let s = self.symbols.get(m)?;
                if !s.has_flags(symbol_flags::RECORD_COMPONENT) {
                    return None;
                }
                Some((m, s.name, s.var_info()?.ty.clone()))
            })
            .collect();
        for (_, name, ty) in &components {
            let declared = out.iter().any(|&m| {
                self.symbols.get(m).is_some_and(|s| {
                    s.kind == SymbolKind::Method
                        && s.name == *name
                        && s.method_info().is_some_and(|i| i.params.is_empty())
                })
            });
            if !declared {
                out.push(self.synthetic_method(class, *name, ModifierFlags::PUBLIC, Vec::new(), ty.clone(), false));
            }
        }
        if !has_ctor {
            let params = components
                .iter()
                .map(|(_, name, ty)| (*name, ty.clone()))
                .collect();
            let mods = self
                .symbols
                .get(class)
                .map(|s| s.modifiers & ModifierFlags::PUBLIC)
                .unwrap_or_default();
            out.push(self.synthetic_method(class, self.init_name, mods, params, Type::Void, true));
        }
    }

    fn add_enum_members(&mut self, class: SymbolId, out: &mut Vec<SymbolId>) -> Result<(), CompletionFailure> {
        let statics = ModifierFlags::PUBLIC | ModifierFlags::STATIC;
        let values = self.intern("values");
        out.push(self.synthetic_method(
            class,
            values,
            statics,
            Vec::new(),
            Type::Array(Box::new(Type::class(class))),
            false,
        ));
        let string = self
            .load_class("java.lang.String")?
            .map_or_else(|| Type::error("String"), Type::class);
        let value_of = self.intern("valueOf");
        let name = self.intern("name");
        out.push(self.synthetic_method(
            class,
            value_of,
            statics,
            vec![(name, string)],
            Type::class(class),
            false,
        ));
        Ok(())
    }

    fn synthetic_method(
        &mut self,
        class: SymbolId,
        name: jbridge_common::Atom,
        mods: ModifierFlags,
        params: Vec<(jbridge_common::Atom, Type)>,
        return_type: Type,
        constructor: bool,
    ) -> SymbolId {
        let sym = self.symbols.alloc(
            SymbolKind::Method,
            name,
            class,
            SymbolInfo::Method(MethodInfo {
                type_params: Vec::new(),
                params: Vec::new(),
                return_type,
                thrown: Vec::new(),
            }),
        );
        let param_syms = params
            .into_iter()
            .enumerate()
            .map(|(index, (pname, ty))| {
                self.symbols.alloc(
                    SymbolKind::Var,
                    pname,
                    sym,
                    SymbolInfo::Var(VarInfo {
                        var_kind: VarKind::Param,
                        ty,
                        index: index as u32,
                        constant: None,
                    }),
                )
            })
            .collect();
        let binary = self.symbols.flags(class) & symbol_flags::BINARY;
        let mut flags = symbol_flags::SYNTHETIC | binary;
        if constructor {
            flags |= symbol_flags::CONSTRUCTOR;
        }
        if let Some(s) = self.symbols.get_mut(sym) {
            s.flags |= flags;
            s.modifiers = mods;
            if let SymbolInfo::Method(info) = &mut s.info {
                info.params = param_syms;
            }
        }
        sym
    }

    // =========================================================================
    // Classpath loading
    // =========================================================================

    /// Find the class with canonical name `qualified`, loading it from the
    /// classpath when no entered unit declares it.
    pub fn load_class(&mut self, qualified: &str) -> Result<Option<SymbolId>, CompletionFailure> {
        if let Some(&sym) = self.classes.get(qualified) {
            return Ok(Some(sym));
        }
        if qualified.is_empty() || self.missing.contains(qualified) {
            return Ok(None);
        }
        let segments: Vec<&str> = qualified.split('.').collect();
        // Prefer the longest package prefix: `p.A.B` is `p/A/B.java` before
        // member `B` of `p/A.java`.
        for top in (0..segments.len()).rev() {
            let top_name = segments[..=top].join(".");
            let found = match self.classes.get(top_name.as_str()) {
                Some(&sym) => Some(sym),
                None => self.load_top_level(&segments[..top], segments[top])?,
            };
            let Some(mut current) = found else {
                continue;
            };
            for segment in &segments[top + 1..] {
                let atom = self.intern(segment);
                match self.find_member_type(current, atom)? {
                    Some(member) => current = member,
                    None => {
                        self.missing.insert(Arc::from(qualified));
                        return Ok(None);
                    }
                }
            }
            return Ok(Some(current));
        }
        self.missing.insert(Arc::from(qualified));
        Ok(None)
    }

    fn load_top_level(&mut self, package: &[&str], name: &str) -> Result<Option<SymbolId>, CompletionFailure> {
        let rel = if package.is_empty() {
            format!("{name}.java")
        } else {
            format!("{}/{name}.java", package.join("/"))
        };
        let qualified = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", package.join("."))
        };
        match self.file_manager.find_source(&rel) {
            Ok(None) => Ok(None),
            Ok(Some(loaded)) => {
                debug!(path = %rel, entry = loaded.entry, "loading class from classpath");
                let tree = parse_unit(
                    loaded.text.clone(),
                    self.names.clone(),
                    ParseOptions { ignore_bodies: true },
                );
                let unit = self.add_unit(
                    Arc::from(rel.as_str()),
                    UnitOrigin::Classpath { entry: loaded.entry },
                    tree,
                );
                self.enter_unit(unit);
                Ok(self.classes.get(qualified.as_str()).copied())
            }
            Err(source) => {
                warn!(path = %rel, error = %source, "cannot read classpath file");
                self.placeholder_class(&package.join("."), name);
                Err(CompletionFailure {
                    class_name: qualified,
                    source,
                })
            }
        }
    }

    /// Erroneous stand-in for a class whose file could not be read, so that
    /// later lookups resolve to an error type instead of failing again.
    fn placeholder_class(&mut self, package: &str, name: &str) -> SymbolId {
        let package_sym = self.enter_package(package);
        let qualified: Arc<str> = if package.is_empty() {
            Arc::from(name)
        } else {
            Arc::from(format!("{package}.{name}"))
        };
        let atom = self.intern(name);
        let sym = self.symbols.alloc(
            SymbolKind::Class,
            atom,
            package_sym,
            SymbolInfo::Class(Box::new(ClassInfo {
                class_kind: ClassKind::Class,
                flat_name: qualified.clone(),
                qualified_name: qualified.clone(),
                package: package_sym,
                type_params: Vec::new(),
                superclass: None,
                interfaces: Vec::new(),
                members: Vec::new(),
                member_types: FxHashMap::default(),
                entry: None,
            })),
        );
        self.symbols.add_flags(
            sym,
            symbol_flags::ERRONEOUS | symbol_flags::BINARY | symbol_flags::COMPLETED,
        );
        self.classes.insert(qualified, sym);
        if let Some(SymbolInfo::Package(p)) = self.symbols.get_mut(package_sym).map(|s| &mut s.info) {
            p.classes.insert(atom, sym);
        }
        sym
    }

    /// Box class of a primitive type.
    pub fn box_class(&mut self, kind: PrimitiveKind) -> Result<Option<SymbolId>, CompletionFailure> {
        self.load_class(kind.box_class())
    }
}

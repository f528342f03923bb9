//! Name lookup, member selection and assignability.
//!
//! Simple names are looked up innermost class first: the locals declared in
//! that class's methods, then its fields (declared or inherited), then the
//! next enclosing class, then static imports. Type and package meanings are
//! only tried where the use site allows them.

use std::sync::Arc;

use bitflags::bitflags;
use jbridge_binder::{
    PrimitiveKind, Substitution, SymbolId, SymbolKind, Type, substitute, symbol_flags,
};
use jbridge_common::Atom;
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ERROR_NAME, NodeData, NodeIndex};
use smallvec::SmallVec;

use crate::context::LintFlags;
use crate::state::{AttrResult, CheckerState};

bitflags! {
    /// What a name may denote at its use site.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct NameKinds: u8 {
        const VALUE = 1 << 0;
        const TYPE = 1 << 1;
        const PACKAGE = 1 << 2;
    }
}

/// Meaning of a resolved name.
#[derive(Clone, Debug)]
pub(crate) enum Res {
    Value(Type),
    Type(Type),
    Package(Arc<str>),
    Error,
}

impl CheckerState<'_> {
    // =========================================================================
    // Names
    // =========================================================================

    /// Resolve an `Ident`/`FieldAccess` chain. Other expressions are
    /// attributed as values.
    pub(crate) fn resolve_name(&mut self, node: NodeIndex, kinds: NameKinds) -> AttrResult<Res> {
        match self.tree.arena.data(node).cloned() {
            Some(NodeData::Ident { name }) => self.resolve_ident(node, name, kinds),
            Some(NodeData::FieldAccess {
                target,
                name,
                name_pos,
            }) => self.resolve_select(node, target, name, name_pos, kinds),
            _ => Ok(Res::Value(self.attrib_expr(node)?)),
        }
    }

    fn resolve_ident(&mut self, node: NodeIndex, name: Atom, kinds: NameKinds) -> AttrResult<Res> {
        let text = self.name_text(name);
        if text.as_ref() == ERROR_NAME {
            return Ok(Res::Error);
        }
        if kinds.contains(NameKinds::VALUE) {
            match text.as_ref() {
                "this" => return Ok(self.this_value(node)),
                "super" => return Ok(self.super_value(node)),
                _ => {}
            }
            if let Some(res) = self.find_var(node, name)? {
                return Ok(res);
            }
        }
        if kinds.contains(NameKinds::TYPE) {
            let scope = self.type_scope();
            if let Some(sym) = self.ctx.table.find_type(&scope, name)? {
                let ty = self.ctx.table.type_of_symbol(sym);
                self.record(node, sym, &ty);
                self.check_deprecated(node, sym)?;
                return Ok(Res::Type(ty));
            }
        }
        if kinds.contains(NameKinds::PACKAGE) && self.ctx.table.package_exists(&text) {
            let package = self.ctx.table.enter_package(&text);
            self.ctx.table.record_symbol(self.unit, node, package);
            return Ok(Res::Package(text));
        }
        let kind = if kinds.contains(NameKinds::VALUE) {
            "variable"
        } else {
            "class"
        };
        self.report_node(node, codes::CANT_RESOLVE, vec![kind.into(), text.to_string()]);
        Ok(Res::Error)
    }

    fn this_value(&mut self, node: NodeIndex) -> Res {
        let class = self.current_class();
        if class.is_none() {
            return Res::Error;
        }
        if self.in_static_context() {
            self.report_node(
                node,
                codes::NON_STATIC_CANT_BE_REF,
                vec!["variable".into(), "this".into()],
            );
        }
        let ty = self.this_type(class);
        self.record(node, class, &ty);
        Res::Value(ty)
    }

    fn super_value(&mut self, node: NodeIndex) -> Res {
        let class = self.current_class();
        let superclass = self
            .ctx
            .table
            .symbol(class)
            .and_then(|s| s.class_info())
            .and_then(|i| i.superclass.clone());
        match superclass {
            Some(ty) => {
                if let Some(sym) = ty.class_symbol() {
                    self.record(node, sym, &ty);
                }
                Res::Value(ty)
            }
            None => Res::Error,
        }
    }

    /// Type of `this` inside `class`: the class applied to its own type
    /// parameters.
    pub(crate) fn this_type(&self, class: SymbolId) -> Type {
        let args = self
            .ctx
            .table
            .symbol(class)
            .and_then(|s| s.class_info())
            .map(|i| i.type_params.iter().map(|&tv| Type::TypeVar(tv)).collect())
            .unwrap_or_default();
        Type::Class { sym: class, args }
    }

    /// Whether code at the current position cannot use instance members of
    /// the class at `level`.
    pub(crate) fn static_from(&self, level: usize) -> bool {
        self.classes
            .get(level..)
            .is_some_and(|envs| envs.iter().any(|c| c.static_ctx))
    }

    fn local_in_level(&self, level: usize, name: Atom) -> Option<SymbolId> {
        let lo = self.classes[level].scope_base;
        let hi = self
            .classes
            .get(level + 1)
            .map_or(self.scopes.len(), |c| c.scope_base);
        self.scopes[lo.min(hi)..hi]
            .iter()
            .rev()
            .flat_map(|s| s.vars.iter().rev())
            .find(|(n, _)| *n == name)
            .map(|(_, sym)| *sym)
    }

    fn find_var(&mut self, node: NodeIndex, name: Atom) -> AttrResult<Option<Res>> {
        for level in (0..self.classes.len()).rev() {
            if let Some(local) = self.local_in_level(level, name) {
                let ty = self.ctx.table.var_type(local);
                self.record(node, local, &ty);
                return Ok(Some(Res::Value(ty)));
            }
            let class = self.classes[level].sym;
            if let Some(field) = self.ctx.table.find_field(class, name)? {
                let site = self.this_type(class);
                let ty = self.field_type_in(&site, field)?;
                if !self.is_static_symbol(field) && self.static_from(level) {
                    let text = self.name_text(name).to_string();
                    self.report_node(
                        node,
                        codes::NON_STATIC_CANT_BE_REF,
                        vec!["variable".into(), text],
                    );
                }
                self.record(node, field, &ty);
                self.check_deprecated(node, field)?;
                return Ok(Some(Res::Value(ty)));
            }
        }
        for class in self.static_import_classes(name)? {
            if let Some(field) = self.ctx.table.find_field(class, name)?
                && self.is_static_symbol(field)
            {
                let ty = self.ctx.table.var_type(field);
                self.record(node, field, &ty);
                self.check_deprecated(node, field)?;
                return Ok(Some(Res::Value(ty)));
            }
        }
        Ok(None)
    }

    /// Classes whose static members named `name` are imported: single
    /// static imports first, then on-demand ones.
    fn static_import_classes(&mut self, name: Atom) -> AttrResult<SmallVec<[SymbolId; 4]>> {
        self.ctx.table.resolve_imports(self.unit)?;
        let text = self.name_text(name);
        let Some(unit) = self.ctx.table.unit(self.unit) else {
            return Ok(SmallVec::new());
        };
        let mut single = SmallVec::new();
        let mut on_demand: SmallVec<[SymbolId; 4]> = SmallVec::new();
        for import in unit.imports.iter().filter(|i| i.is_static && i.target.is_some()) {
            if import.on_demand {
                on_demand.push(import.target);
            } else if import.name.rsplit('.').next() == Some(text.as_ref()) {
                single.push(import.target);
            }
        }
        single.extend(on_demand);
        Ok(single)
    }

    pub(crate) fn is_static_symbol(&self, sym: SymbolId) -> bool {
        self.ctx.table.symbol(sym).is_some_and(|s| s.is_static())
    }

    fn field_type_in(&mut self, site: &Type, field: SymbolId) -> AttrResult<Type> {
        let declared = self.ctx.table.var_type(field);
        if site.class_symbol().is_some() {
            self.ctx.table.member_type_in(site, field, &declared)
        } else {
            Ok(declared)
        }
    }

    // =========================================================================
    // Selections
    // =========================================================================

    fn resolve_select(
        &mut self,
        node: NodeIndex,
        target: NodeIndex,
        name: Atom,
        name_pos: u32,
        kinds: NameKinds,
    ) -> AttrResult<Res> {
        let text = self.name_text(name);
        let end = self.tree.arena.pos_end(node).map_or(name_pos, |(_, end)| end);
        if text.as_ref() == ERROR_NAME {
            self.quietly(|s| s.resolve_name(target, NameKinds::all()))?;
            return Ok(Res::Error);
        }
        // `Outer.this` and `Outer.super`
        if text.as_ref() == "this" || text.as_ref() == "super" {
            return match self.resolve_name(target, NameKinds::TYPE)? {
                Res::Type(ty) => {
                    let Some(class) = ty.class_symbol() else {
                        return Ok(Res::Error);
                    };
                    let ty = if text.as_ref() == "this" {
                        self.this_type(class)
                    } else {
                        self.ctx
                            .table
                            .symbol(class)
                            .and_then(|s| s.class_info())
                            .and_then(|i| i.superclass.clone())
                            .unwrap_or(Type::Unknown)
                    };
                    self.record(node, class, &ty);
                    Ok(Res::Value(ty))
                }
                _ => Ok(Res::Error),
            };
        }

        let qualifier_kinds = if kinds.contains(NameKinds::VALUE) {
            NameKinds::all()
        } else {
            NameKinds::TYPE | NameKinds::PACKAGE
        };
        match self.resolve_name(target, qualifier_kinds)? {
            Res::Error => Ok(Res::Error),
            Res::Package(package) => {
                let qualified = format!("{package}.{text}");
                if let Some(class) = self.ctx.table.load_class(&qualified)? {
                    let tree = self.tree.clone();
                    self.ctx.table.record_name_chain(self.unit, &tree, node, class);
                    let ty = Type::class(class);
                    self.record_type(node, &ty);
                    self.check_deprecated(node, class)?;
                    return Ok(Res::Type(ty));
                }
                if kinds.contains(NameKinds::PACKAGE) && self.ctx.table.package_exists(&qualified) {
                    let sym = self.ctx.table.enter_package(&qualified);
                    let tree = self.tree.clone();
                    self.ctx.table.record_name_chain(self.unit, &tree, node, sym);
                    return Ok(Res::Package(Arc::from(qualified)));
                }
                self.report_missing_in_package(target, &package, &text, name_pos, end);
                Ok(Res::Error)
            }
            Res::Type(owner) => {
                let Some(class) = owner.class_symbol() else {
                    return Ok(Res::Error);
                };
                if kinds.contains(NameKinds::VALUE)
                    && let Some(field) = self.ctx.table.find_field(class, name)?
                {
                    let ty = self.ctx.table.var_type(field);
                    if !self.is_static_symbol(field) {
                        self.report(
                            name_pos,
                            end,
                            codes::NON_STATIC_CANT_BE_REF,
                            vec!["variable".into(), text.to_string()],
                        );
                    }
                    self.record(node, field, &ty);
                    self.check_deprecated(node, field)?;
                    return Ok(Res::Value(ty));
                }
                if kinds.contains(NameKinds::TYPE)
                    && let Some(member) = self.ctx.table.find_member_type(class, name)?
                {
                    let ty = Type::class(member);
                    self.record(node, member, &ty);
                    self.check_deprecated(node, member)?;
                    return Ok(Res::Type(ty));
                }
                let kind = if kinds.contains(NameKinds::VALUE) {
                    "variable"
                } else {
                    "class"
                };
                let location = self.location_of(class);
                self.report(
                    name_pos,
                    end,
                    codes::CANT_RESOLVE_LOCATION,
                    vec![kind.into(), text.to_string(), location],
                );
                Ok(Res::Error)
            }
            Res::Value(receiver) => self.select_field(node, target, &receiver, name, name_pos, end),
        }
    }

    fn select_field(
        &mut self,
        node: NodeIndex,
        target: NodeIndex,
        receiver: &Type,
        name: Atom,
        name_pos: u32,
        end: u32,
    ) -> AttrResult<Res> {
        let text = self.name_text(name);
        if receiver.is_erroneous() || matches!(receiver, Type::Null) {
            return Ok(Res::Error);
        }
        if let Type::Array(_) = receiver
            && text.as_ref() == "length"
        {
            let ty = Type::Primitive(PrimitiveKind::Int);
            self.record_type(node, &ty);
            return Ok(Res::Value(ty));
        }
        if receiver.is_primitive() || matches!(receiver, Type::Void) {
            let shown = self.display(receiver);
            self.report_node(target, codes::CANT_DEREF, vec![shown]);
            return Ok(Res::Error);
        }
        let Some(class) = self.site_class(receiver)? else {
            return Ok(Res::Error);
        };
        if let Some(field) = self.ctx.table.find_field(class, name)? {
            let ty = self.field_type_in(receiver, field)?;
            self.record(node, field, &ty);
            self.check_deprecated(node, field)?;
            return Ok(Res::Value(ty));
        }
        let location = self.location_of(class);
        self.report(
            name_pos,
            end,
            codes::CANT_RESOLVE_LOCATION,
            vec!["variable".into(), text.to_string(), location],
        );
        Ok(Res::Error)
    }

    fn report_missing_in_package(&mut self, target: NodeIndex, package: &str, name: &str, start: u32, end: u32) {
        if self.ctx.table.package_exists(package) {
            self.report(
                start,
                end,
                codes::CANT_RESOLVE_LOCATION,
                vec!["class".into(), name.to_string(), format!("package {package}")],
            );
        } else {
            self.report_node(target, codes::DOESNT_EXIST, vec![package.to_string()]);
        }
    }

    /// Class whose members a receiver of type `ty` has.
    pub(crate) fn site_class(&mut self, ty: &Type) -> AttrResult<Option<SymbolId>> {
        Ok(match ty {
            Type::Class { sym, .. } => Some(*sym),
            Type::Array(_) => self.ctx.table.load_class("java.lang.Object")?,
            Type::TypeVar(_) | Type::Wildcard { .. } => {
                let erased = self.ctx.table.erase(ty);
                erased.class_symbol()
            }
            _ => None,
        })
    }

    /// `class X` / `interface X` location text for messages.
    pub(crate) fn location_of(&self, class: SymbolId) -> String {
        let kind = self
            .ctx
            .table
            .symbol(class)
            .and_then(|s| s.class_info())
            .map_or("class", |i| jbridge_binder::class_kind_word(i.class_kind));
        format!("{kind} {}", self.ctx.table.class_name(class))
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// Attribute a method invocation.
    pub(crate) fn attrib_method_call(&mut self, node: NodeIndex, callee: NodeIndex, args: &[NodeIndex]) -> AttrResult<Type> {
        let arg_types = self.attrib_args(args)?;
        match self.tree.arena.data(callee).cloned() {
            Some(NodeData::Ident { name }) => {
                let text = self.name_text(name);
                if text.as_ref() == ERROR_NAME {
                    return Ok(Type::Unknown);
                }
                if text.as_ref() == "this" || text.as_ref() == "super" {
                    return self.attrib_ctor_call(node, callee, text.as_ref() == "super", &arg_types);
                }
                for level in (0..self.classes.len()).rev() {
                    let class = self.classes[level].sym;
                    let found = self.ctx.table.find_methods(class, name)?;
                    if !found.is_empty() {
                        let site = self.this_type(class);
                        return self.apply_method(node, callee, &found, &site, &arg_types, Some(level));
                    }
                }
                for class in self.static_import_classes(name)? {
                    let found: Vec<SymbolId> = self
                        .ctx
                        .table
                        .find_methods(class, name)?
                        .into_iter()
                        .filter(|&m| self.is_static_symbol(m))
                        .collect();
                    if !found.is_empty() {
                        let site = Type::class(class);
                        return self.apply_method(node, callee, &found, &site, &arg_types, None);
                    }
                }
                let sig = self.call_signature(&text, &arg_types);
                self.report_node(callee, codes::CANT_RESOLVE, vec!["method".into(), sig]);
                Ok(Type::error(&text))
            }
            Some(NodeData::FieldAccess {
                target,
                name,
                name_pos,
            }) => {
                let text = self.name_text(name);
                let end = self.tree.arena.pos_end(callee).map_or(name_pos, |(_, end)| end);
                let site = match self.resolve_name(target, NameKinds::all())? {
                    Res::Value(ty) | Res::Type(ty) => ty,
                    Res::Package(package) => {
                        let sig = self.call_signature(&text, &arg_types);
                        self.report(
                            name_pos,
                            end,
                            codes::CANT_RESOLVE_LOCATION,
                            vec!["method".into(), sig, format!("package {package}")],
                        );
                        return Ok(Type::Unknown);
                    }
                    Res::Error => return Ok(Type::Unknown),
                };
                if site.is_erroneous() || text.as_ref() == ERROR_NAME {
                    return Ok(Type::Unknown);
                }
                if site.is_primitive() {
                    let shown = self.display(&site);
                    self.report_node(target, codes::CANT_DEREF, vec![shown]);
                    return Ok(Type::Unknown);
                }
                let Some(class) = self.site_class(&site)? else {
                    return Ok(Type::Unknown);
                };
                let found = self.ctx.table.find_methods(class, name)?;
                if found.is_empty() {
                    let sig = self.call_signature(&text, &arg_types);
                    let location = self.location_of(class);
                    self.report(
                        name_pos,
                        end,
                        codes::CANT_RESOLVE_LOCATION,
                        vec!["method".into(), sig, location],
                    );
                    return Ok(Type::error(&text));
                }
                self.apply_method(node, callee, &found, &site, &arg_types, None)
            }
            _ => {
                self.quietly(|s| s.attrib_expr(callee))?;
                Ok(Type::Unknown)
            }
        }
    }

    pub(crate) fn attrib_args(&mut self, args: &[NodeIndex]) -> AttrResult<Vec<Type>> {
        let mut out = Vec::with_capacity(args.len());
        for &arg in args {
            out.push(self.attrib_expr(arg)?);
        }
        Ok(out)
    }

    fn apply_method(
        &mut self,
        node: NodeIndex,
        callee: NodeIndex,
        candidates: &[SymbolId],
        site: &Type,
        arg_types: &[Type],
        level: Option<usize>,
    ) -> AttrResult<Type> {
        match self.select_method(candidates, arg_types)? {
            Some(method) => {
                if let Some(level) = level
                    && !self.is_static_symbol(method)
                    && self.static_from(level)
                {
                    let sig = self.method_signature(method);
                    self.report_node(callee, codes::NON_STATIC_CANT_BE_REF, vec!["method".into(), sig]);
                }
                let ty = self.method_result(site, method, arg_types)?;
                self.record(node, method, &ty);
                self.ctx.table.record_symbol(self.unit, callee, method);
                self.check_deprecated(callee, method)?;
                Ok(ty)
            }
            None => {
                self.report_inapplicable(callee, candidates, arg_types);
                Ok(Type::Unknown)
            }
        }
    }

    fn report_inapplicable(&mut self, at: NodeIndex, candidates: &[SymbolId], arg_types: &[Type]) {
        let Some(&first) = candidates.first() else {
            return;
        };
        if candidates.len() == 1 {
            self.ctx.table.record_symbol(self.unit, at, first);
        }
        if arg_types.iter().any(Type::is_erroneous) {
            return;
        }
        let Some(symbol) = self.ctx.table.symbol(first) else {
            return;
        };
        let owner = symbol.owner;
        let (kind, name) = if symbol.is_constructor() {
            ("constructor", self.ctx.table.symbol_name(owner).to_string())
        } else {
            ("method", self.ctx.table.symbol_name(first).to_string())
        };
        let required = self.type_list(&self.ctx.table.param_types(first));
        let found = self.type_list(arg_types);
        let location = self.location_of(owner);
        self.report_node(
            at,
            codes::CANT_APPLY_SYMBOL,
            vec![kind.into(), name, location, required, found],
        );
    }

    /// Explicit constructor invocation (`this(...)`, `super(...)`).
    fn attrib_ctor_call(&mut self, node: NodeIndex, callee: NodeIndex, is_super: bool, arg_types: &[Type]) -> AttrResult<Type> {
        let current = self.current_class();
        let class = if is_super {
            self.ctx
                .table
                .symbol(current)
                .and_then(|s| s.class_info())
                .and_then(|i| i.superclass.as_ref())
                .and_then(Type::class_symbol)
        } else {
            Some(current)
        };
        let Some(class) = class else {
            return Ok(Type::Void);
        };
        if let Some(ctor) = self.select_constructor(callee, class, arg_types)? {
            self.ctx.table.record_symbol(self.unit, node, ctor);
            self.ctx.table.record_symbol(self.unit, callee, ctor);
        }
        self.record_type(node, &Type::Void);
        Ok(Type::Void)
    }

    /// Pick the constructor of `class` applicable to `arg_types`, reporting
    /// at `at` when none is. The caller records the result.
    pub(crate) fn select_constructor(&mut self, at: NodeIndex, class: SymbolId, arg_types: &[Type]) -> AttrResult<Option<SymbolId>> {
        let ctors = self.ctx.table.constructors(class)?;
        if ctors.is_empty() {
            return Ok(None);
        }
        match self.select_method(&ctors, arg_types)? {
            Some(ctor) => {
                self.check_deprecated(at, ctor)?;
                Ok(Some(ctor))
            }
            None => {
                self.report_inapplicable(at, &ctors, arg_types);
                Ok(None)
            }
        }
    }

    /// Most applicable candidate: fixed arity first, then variable arity.
    fn select_method(&mut self, candidates: &[SymbolId], arg_types: &[Type]) -> AttrResult<Option<SymbolId>> {
        for varargs_phase in [false, true] {
            for &method in candidates {
                let is_varargs = self
                    .ctx
                    .table
                    .symbol(method)
                    .is_some_and(|s| s.has_flags(symbol_flags::VARARGS));
                if varargs_phase && !is_varargs {
                    continue;
                }
                let params = self.ctx.table.param_types(method);
                if self.applicable(&params, varargs_phase, arg_types)? {
                    return Ok(Some(method));
                }
            }
        }
        Ok(None)
    }

    fn applicable(&mut self, params: &[Type], varargs: bool, args: &[Type]) -> AttrResult<bool> {
        if !varargs {
            if params.len() != args.len() {
                return Ok(false);
            }
            for (arg, param) in args.iter().zip(params) {
                if !self.is_assignable(arg, param)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        let Some((last, fixed)) = params.split_last() else {
            return Ok(false);
        };
        if args.len() < fixed.len() {
            return Ok(false);
        }
        for (arg, param) in args.iter().zip(fixed) {
            if !self.is_assignable(arg, param)? {
                return Ok(false);
            }
        }
        let elem = last.element_type().cloned().unwrap_or(Type::Unknown);
        for arg in &args[fixed.len()..] {
            if !self.is_assignable(arg, &elem)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Return type of `method` invoked on `site` with `arg_types`. Method
    /// type parameters are inferred from parameters typed exactly by them;
    /// the rest are erased.
    fn method_result(&mut self, site: &Type, method: SymbolId, arg_types: &[Type]) -> AttrResult<Type> {
        let declared = self.ctx.table.return_type(method);
        let mut ty = if site.class_symbol().is_some() {
            self.ctx.table.member_type_in(site, method, &declared)?
        } else {
            declared
        };
        let type_params = self
            .ctx
            .table
            .symbol(method)
            .and_then(|s| s.method_info())
            .map(|i| i.type_params.clone())
            .unwrap_or_default();
        if type_params.is_empty() {
            return Ok(ty);
        }
        let mut map = Substitution::default();
        let params = self.ctx.table.param_types(method);
        for (param, arg) in params.iter().zip(arg_types) {
            if let Type::TypeVar(tv) = param
                && type_params.contains(tv)
                && !arg.is_erroneous()
                && !map.contains_key(tv)
            {
                let boxed = self.boxed(arg)?;
                map.insert(*tv, boxed);
            }
        }
        ty = substitute(&ty, &map);
        if mentions_any(&ty, &type_params) {
            ty = self.ctx.table.erase(&ty);
        }
        Ok(ty)
    }

    fn boxed(&mut self, ty: &Type) -> AttrResult<Type> {
        Ok(match ty {
            Type::Primitive(kind) => match self.ctx.table.box_class(*kind)? {
                Some(sym) => Type::class(sym),
                None => ty.clone(),
            },
            other => other.clone(),
        })
    }

    /// `name(int,String)` for unresolved-method messages.
    fn call_signature(&self, name: &str, arg_types: &[Type]) -> String {
        let args: Vec<String> = arg_types.iter().map(|t| self.display(t)).collect();
        format!("{name}({})", args.join(","))
    }

    pub(crate) fn method_signature(&self, method: SymbolId) -> String {
        let name = self.ctx.table.symbol_name(method);
        let params = self.ctx.table.param_types(method);
        self.call_signature(&name, &params)
    }

    fn type_list(&self, types: &[Type]) -> String {
        if types.is_empty() {
            return "no arguments".to_string();
        }
        types
            .iter()
            .map(|t| self.display(t))
            .collect::<Vec<_>>()
            .join(",")
    }

    // =========================================================================
    // Assignability
    // =========================================================================

    /// Assignment compatibility. Erroneous, unknown and type variable types
    /// are compatible with everything.
    pub(crate) fn is_assignable(&mut self, from: &Type, to: &Type) -> AttrResult<bool> {
        if from.is_erroneous() || to.is_erroneous() {
            return Ok(true);
        }
        Ok(match (from, to) {
            (Type::TypeVar(_) | Type::Wildcard { .. }, _) | (_, Type::TypeVar(_) | Type::Wildcard { .. }) => true,
            (Type::Void, _) | (_, Type::Void) => false,
            (Type::Null, _) => to.is_reference(),
            (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(*b),
            (Type::Primitive(a), Type::Class { sym, .. }) => match self.ctx.table.box_class(*a)? {
                Some(boxed) => self.ctx.table.is_subclass(boxed, *sym)?,
                None => true,
            },
            (Type::Class { sym, .. }, Type::Primitive(b)) => self.unboxed(*sym).is_some_and(|p| p.widens_to(*b)),
            (Type::Class { sym: a, .. }, Type::Class { sym: b, .. }) => {
                self.ctx.table.symbol(*a).is_some_and(|s| s.is_erroneous())
                    || self.ctx.table.is_subclass(*a, *b)?
            }
            (Type::Array(a), Type::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_assignable(a, b)?
                }
            }
            (Type::Array(_), Type::Class { sym, .. }) => matches!(
                self.ctx.table.class_name(*sym).as_ref(),
                "java.lang.Object" | "java.lang.Cloneable" | "java.io.Serializable"
            ),
            _ => false,
        })
    }

    pub(crate) fn unboxed(&self, class: SymbolId) -> Option<PrimitiveKind> {
        const ALL: [PrimitiveKind; 8] = [
            PrimitiveKind::Boolean,
            PrimitiveKind::Byte,
            PrimitiveKind::Short,
            PrimitiveKind::Char,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        let name = self.ctx.table.class_name(class);
        ALL.into_iter().find(|p| p.box_class() == name.as_ref())
    }

    // =========================================================================
    // Lint
    // =========================================================================

    /// Warn about a use of a deprecated symbol from outside its outermost
    /// class.
    pub(crate) fn check_deprecated(&mut self, node: NodeIndex, sym: SymbolId) -> AttrResult<()> {
        if !self.ctx.lint(LintFlags::DEPRECATION) {
            return Ok(());
        }
        let Some(symbol) = self.ctx.table.symbol(sym) else {
            return Ok(());
        };
        if !symbol.has_flags(symbol_flags::DEPRECATED) {
            return Ok(());
        }
        let kind = symbol.kind;
        let owner = symbol.owner;
        let table = &self.ctx.table;
        if table.outermost_class(sym) == table.outermost_class(self.current_class()) {
            return Ok(());
        }
        let (what, location) = match kind {
            SymbolKind::Class => {
                let package = table.package_of(sym);
                (table.class_name(sym).to_string(), table.package_name(package).to_string())
            }
            SymbolKind::Method => (self.method_signature(sym), table.class_name(owner).to_string()),
            _ => (table.symbol_name(sym).to_string(), table.class_name(owner).to_string()),
        };
        self.report_node(node, codes::DEPRECATED, vec![what, location]);
        Ok(())
    }

    /// Warn about a raw use of a generic class.
    pub(crate) fn check_raw(&mut self, node: NodeIndex, ty: &Type) {
        if !self.ctx.lint(LintFlags::RAWTYPES) {
            return;
        }
        let Type::Class { sym, args } = ty.leaf_type() else {
            return;
        };
        let generic = self
            .ctx
            .table
            .symbol(*sym)
            .and_then(|s| s.class_info())
            .is_some_and(|i| !i.type_params.is_empty());
        if generic && args.is_empty() {
            let shown = self.display(ty.leaf_type());
            self.report_node(node, codes::RAW_CLASS_USE, vec![shown]);
        }
    }

    /// Deprecation check for a resolved type node.
    pub(crate) fn check_type_use(&mut self, node: NodeIndex, ty: &Type) -> AttrResult<()> {
        if let Some(sym) = ty.leaf_type().class_symbol() {
            self.check_deprecated(node, sym)?;
        }
        Ok(())
    }
}

fn mentions_any(ty: &Type, vars: &[SymbolId]) -> bool {
    match ty {
        Type::TypeVar(tv) => vars.contains(tv),
        Type::Class { args, .. } => args.iter().any(|a| mentions_any(a, vars)),
        Type::Array(elem) => mentions_any(elem, vars),
        Type::Wildcard { bound: Some(b), .. } => mentions_any(b, vars),
        _ => false,
    }
}

//! Class, member and annotation attribution.

use std::sync::Arc;

use jbridge_binder::{ClassPlacement, SymbolId, Type, modifiers_of};
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ClassKind, NodeData, NodeIndex, VarKind};
use tracing::{debug_span, trace};

use crate::state::{AttrResult, CheckerState, ClassEnv, MethodEnv};

impl CheckerState<'_> {
    /// Attribute one top-level class declaration of the unit.
    pub fn check_top_level(&mut self, class: SymbolId, node: NodeIndex) -> AttrResult<()> {
        let name = self.ctx.table.class_name(class);
        let _span = debug_span!("attribute", class = %name).entered();
        self.mark(node);
        self.ctx.table.resolve_imports(self.unit)?;
        self.settle_binder_diagnostics();
        self.attrib_class(class, node)?;
        self.settle_binder_diagnostics();
        Ok(())
    }

    pub(crate) fn is_interface(&self, class: SymbolId) -> bool {
        self.ctx
            .table
            .symbol(class)
            .and_then(|s| s.class_info())
            .is_some_and(|i| matches!(i.class_kind, ClassKind::Interface | ClassKind::Annotation))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Attribute a class body (named, local or anonymous).
    pub(crate) fn attrib_class(&mut self, class: SymbolId, node: NodeIndex) -> AttrResult<()> {
        self.ctx.table.complete(class)?;
        self.settle_binder_diagnostics();
        let scope_base = self.scopes.len();
        self.classes.push(ClassEnv {
            sym: class,
            static_ctx: false,
            scope_base,
        });
        let saved_method = self.method.take();
        let saved_counts = std::mem::take(&mut self.local_counts);
        let saved_breakable = std::mem::replace(&mut self.breakable, 0);

        let result = self.attrib_class_body(class, node);

        self.breakable = saved_breakable;
        self.local_counts = saved_counts;
        self.method = saved_method;
        self.classes.pop();
        result
    }

    fn attrib_class_body(&mut self, class: SymbolId, node: NodeIndex) -> AttrResult<()> {
        let tree = self.tree.clone();
        let Some(NodeData::ClassDecl {
            modifiers,
            extends,
            implements,
            members,
            ..
        }) = tree.arena.data(node)
        else {
            return Ok(());
        };
        self.attrib_modifiers(*modifiers)?;
        for &supertype in std::iter::once(extends).chain(implements.iter()) {
            if let Some(ty) = self.ctx.table.type_at(self.unit, supertype).cloned() {
                self.check_raw(supertype, &ty);
                self.check_type_use(supertype, &ty)?;
            }
        }
        self.check_doc_comment(node)?;

        for &member in members {
            self.mark(member);
            match tree.arena.data(member) {
                Some(NodeData::VarDecl { .. }) => self.attrib_field(member)?,
                Some(NodeData::MethodDecl { .. }) => self.attrib_method(member)?,
                Some(NodeData::EnumConstant { .. }) => self.attrib_enum_constant(class, member)?,
                Some(NodeData::Block { is_static, .. }) => self.attrib_initializer(member, *is_static)?,
                Some(NodeData::ClassDecl { .. }) => {
                    let Some(nested) = self.ctx.table.symbol_at(self.unit, member) else {
                        continue;
                    };
                    let nested_static = self.is_static_symbol(nested);
                    self.with_member_context(nested_static, None, |s| s.attrib_class(nested, member))?;
                }
                Some(NodeData::Erroneous { .. }) => self.attrib_stmt(member)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Run `f` with the current class's static flag and method set for one
    /// member.
    fn with_member_context<T>(
        &mut self,
        is_static: bool,
        method: Option<MethodEnv>,
        f: impl FnOnce(&mut Self) -> AttrResult<T>,
    ) -> AttrResult<T> {
        let saved_static = self.classes.last().is_some_and(|c| c.static_ctx);
        if let Some(env) = self.classes.last_mut() {
            env.static_ctx = is_static;
        }
        let saved_method = std::mem::replace(&mut self.method, method);
        self.local_counts.clear();
        self.push_scope();
        let result = f(self);
        self.pop_scope();
        self.method = saved_method;
        if let Some(env) = self.classes.last_mut() {
            env.static_ctx = saved_static;
        }
        result
    }

    /// Enter an anonymous class body extending or implementing `super_ty`.
    /// A body entered by an earlier pass is reused.
    pub(crate) fn enter_anonymous(&mut self, body: NodeIndex, super_ty: &Type) -> AttrResult<Option<SymbolId>> {
        if let Some(sym) = self.ctx.table.symbol_at(self.unit, body) {
            return Ok(Some(sym));
        }
        let super_class = super_ty.class_symbol();
        let implements_interface = super_class.is_some_and(|c| self.is_interface(c));
        let object = if implements_interface {
            self.ctx.table.load_class("java.lang.Object")?.map(Type::class)
        } else {
            None
        };
        let flat_name = self.local_flat_name("");
        let owner = self.local_owner();
        let tree = self.tree.clone();
        let entered = self
            .ctx
            .table
            .enter_class(self.unit, &tree, body, ClassPlacement::Local { owner, flat_name });
        self.settle_binder_diagnostics();
        let Some(sym) = entered else {
            return Ok(None);
        };
        if let Some(info) = self.ctx.table.symbols.get_mut(sym).and_then(|s| s.class_info_mut()) {
            if implements_interface {
                info.superclass = object;
                info.interfaces = vec![super_ty.clone()];
            } else if super_class.is_some() {
                info.superclass = Some(super_ty.clone());
            }
        }
        trace!(sym = sym.0, "anonymous class entered");
        Ok(Some(sym))
    }

    /// Flat name for a local class `name` (`Outer$1Name`) or, with an empty
    /// name, an anonymous class (`Outer$1`): the smallest unused index.
    pub(crate) fn local_flat_name(&self, name: &str) -> Arc<str> {
        let outer = self.current_class();
        let base = self
            .ctx
            .table
            .symbol(outer)
            .and_then(|s| s.class_info())
            .map_or_else(|| Arc::from("$"), |i| i.flat_name.clone());
        let mut index = 1u32;
        loop {
            let candidate = format!("{base}${index}{name}");
            if self.ctx.table.class_by_flat_name(&candidate).is_none() {
                return Arc::from(candidate);
            }
            index += 1;
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn attrib_field(&mut self, node: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::VarDecl {
            modifiers,
            var_type,
            init,
            kind,
            ..
        }) = self.tree.arena.data(node).cloned()
        else {
            return Ok(());
        };
        if kind != VarKind::Field {
            return Ok(());
        }
        self.attrib_modifiers(modifiers)?;
        if let Some(ty) = self.ctx.table.type_at(self.unit, var_type).cloned() {
            self.check_raw(var_type, &ty);
            self.check_type_use(var_type, &ty)?;
        }
        self.check_doc_comment(node)?;
        if init.is_none() {
            return Ok(());
        }
        let Some(field) = self.ctx.table.symbol_at(self.unit, node) else {
            return self.quietly(|s| s.attrib_expr(init).map(|_| ()));
        };
        let is_static = self.is_static_symbol(field);
        let env = MethodEnv {
            sym: SymbolId::NONE,
            return_type: Type::Void,
        };
        self.with_member_context(is_static, Some(env), |s| {
            s.attrib_expr(init)?;
            let target = s.ctx.table.var_type(field);
            s.check_literal_assignment(init, &target);
            Ok(())
        })
    }

    fn attrib_method(&mut self, node: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::MethodDecl {
            modifiers,
            return_type,
            params,
            throws,
            body,
            default_value,
            is_constructor,
            ..
        }) = self.tree.arena.data(node).cloned()
        else {
            return Ok(());
        };
        self.attrib_modifiers(modifiers)?;
        for &type_node in std::iter::once(&return_type).chain(throws.iter()) {
            if let Some(ty) = self.ctx.table.type_at(self.unit, type_node).cloned() {
                self.check_raw(type_node, &ty);
                self.check_type_use(type_node, &ty)?;
            }
        }
        self.check_doc_comment(node)?;
        let Some(method) = self.ctx.table.symbol_at(self.unit, node) else {
            return self.quietly(|s| s.attrib_stmt(body));
        };
        let env = MethodEnv {
            sym: method,
            return_type: if is_constructor {
                Type::Void
            } else {
                self.ctx.table.return_type(method)
            },
        };
        let is_static = self.is_static_symbol(method);
        trace!(method = %self.ctx.table.symbol_name(method), "attribute method");
        self.with_member_context(is_static, Some(env), |s| {
            for &param in &params {
                s.declare_param(param)?;
            }
            if default_value.is_some() {
                s.attrib_annotation_value(default_value)?;
            }
            s.attrib_stmt(body)
        })
    }

    fn declare_param(&mut self, param: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::VarDecl {
            modifiers,
            var_type,
            name,
            ..
        }) = self.tree.arena.data(param).cloned()
        else {
            return Ok(());
        };
        self.attrib_modifiers(modifiers)?;
        if let Some(ty) = self.ctx.table.type_at(self.unit, var_type).cloned() {
            self.check_raw(var_type, &ty);
            self.check_type_use(var_type, &ty)?;
        }
        if let Some(sym) = self.ctx.table.symbol_at(self.unit, param) {
            self.declare_var(name, sym);
        }
        Ok(())
    }

    fn attrib_initializer(&mut self, block: NodeIndex, is_static: bool) -> AttrResult<()> {
        let env = MethodEnv {
            sym: SymbolId::NONE,
            return_type: Type::Void,
        };
        self.with_member_context(is_static, Some(env), |s| s.attrib_stmt(block))
    }

    fn attrib_enum_constant(&mut self, enum_class: SymbolId, node: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::EnumConstant {
            modifiers, args, body, ..
        }) = self.tree.arena.data(node).cloned()
        else {
            return Ok(());
        };
        self.attrib_modifiers(modifiers)?;
        self.check_doc_comment(node)?;
        let env = MethodEnv {
            sym: SymbolId::NONE,
            return_type: Type::Void,
        };
        self.with_member_context(true, Some(env), |s| {
            let arg_types = s.attrib_args(&args)?;
            let anon = if body.is_some() {
                s.enter_anonymous(body, &Type::class(enum_class))?
            } else {
                None
            };
            s.select_constructor(node, enum_class, &arg_types)?;
            if let Some(anon) = anon {
                s.attrib_class(anon, body)?;
            }
            Ok(())
        })
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    /// Attribute the annotations of a `Modifiers` node.
    pub(crate) fn attrib_modifiers(&mut self, modifiers: NodeIndex) -> AttrResult<()> {
        if modifiers.is_none() {
            return Ok(());
        }
        let (_, annotations) = modifiers_of(&self.tree, modifiers);
        for annotation in annotations {
            self.attrib_annotation(annotation)?;
        }
        Ok(())
    }

    fn attrib_annotation(&mut self, node: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::Annotation {
            annotation_type,
            args,
            ..
        }) = self.tree.arena.data(node).cloned()
        else {
            return Ok(());
        };
        self.mark(node);
        let ty = self.resolve_type_node(annotation_type)?;
        let class = ty.class_symbol();
        if let Some(class) = class {
            self.ctx.table.record_symbol(self.unit, node, class);
        }
        for arg in args {
            match self.tree.arena.data(arg).cloned() {
                Some(NodeData::Assign { target, value, .. }) => {
                    if let Some(class) = class
                        && let Some(NodeData::Ident { name }) = self.tree.arena.data(target).cloned()
                    {
                        match self.ctx.table.find_methods(class, name)?.first() {
                            Some(&element) => {
                                let ty = self.ctx.table.return_type(element);
                                self.record(target, element, &ty);
                                self.ctx.table.record_symbol(self.unit, arg, element);
                            }
                            None => {
                                let text = self.name_text(name).to_string();
                                let location = self.location_of(class);
                                self.report_node(
                                    target,
                                    codes::CANT_RESOLVE_LOCATION,
                                    vec!["method".into(), format!("{text}()"), location],
                                );
                            }
                        }
                    }
                    self.attrib_annotation_value(value)?;
                }
                _ => self.attrib_annotation_value(arg)?,
            }
        }
        Ok(())
    }

    /// Element value: a nested annotation, an array initializer or a
    /// constant expression.
    fn attrib_annotation_value(&mut self, value: NodeIndex) -> AttrResult<()> {
        match self.tree.arena.data(value).cloned() {
            Some(NodeData::Annotation { .. }) => self.attrib_annotation(value),
            Some(NodeData::NewArray {
                elem_type, elements, ..
            }) if elem_type.is_none() => {
                for element in elements {
                    self.attrib_annotation_value(element)?;
                }
                Ok(())
            }
            _ => self.attrib_expr(value).map(|_| ()),
        }
    }
}

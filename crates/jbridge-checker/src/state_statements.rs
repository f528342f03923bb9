//! Statement attribution and local declarations.

use jbridge_binder::{
    ClassPlacement, DeclRef, PrimitiveKind, SymbolId, SymbolInfo, SymbolKind, Type, VarInfo,
    modifiers_of, symbol_flags,
};
use jbridge_common::Atom;
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ClassKind, ERROR_NAME, ModifierFlags, NodeData, NodeFlags, NodeIndex, VarKind};
use jbridge_scanner::SyntaxKind;
use tracing::trace;

use crate::state::{AttrResult, CheckerState};

impl CheckerState<'_> {
    /// Attribute a statement.
    pub(crate) fn attrib_stmt(&mut self, node: NodeIndex) -> AttrResult<()> {
        if node.is_none() || !self.enter_depth() {
            return Ok(());
        }
        self.mark(node);
        let result = if self.is_recovered_stmt(node) {
            self.quietly(|s| s.attrib_stmt_inner(node))
        } else {
            self.attrib_stmt_inner(node)
        };
        self.leave_depth();
        result
    }

    /// Recovered expression statements and unnamed recovered declarations
    /// are attributed without reporting.
    fn is_recovered_stmt(&self, node: NodeIndex) -> bool {
        if !self.tree.arena.flags(node).contains(NodeFlags::RECOVERED) {
            return false;
        }
        match self.tree.arena.data(node) {
            Some(NodeData::ExprStatement { .. }) => true,
            Some(NodeData::VarDecl { name, .. }) => {
                name.is_none() || self.name_text(*name).as_ref() == ERROR_NAME
            }
            _ => false,
        }
    }

    fn attrib_stmt_inner(&mut self, node: NodeIndex) -> AttrResult<()> {
        let tree = self.tree.clone();
        let Some(data) = tree.arena.data(node) else {
            return Ok(());
        };
        match data {
            NodeData::Block { statements, .. } => {
                self.push_scope();
                for &stmt in statements {
                    self.attrib_stmt(stmt)?;
                }
                self.pop_scope();
            }
            NodeData::ExprStatement { expr } => {
                self.attrib_expr(*expr)?;
            }
            NodeData::VarDecl { .. } => {
                self.attrib_local_var(node)?;
            }
            NodeData::ClassDecl { .. } => self.attrib_local_class(node)?,
            NodeData::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                self.attrib_expr(*cond)?;
                self.attrib_scoped(*then_stmt)?;
                self.attrib_scoped(*else_stmt)?;
            }
            NodeData::While { cond, body } | NodeData::DoWhile { body, cond } => {
                self.attrib_expr(*cond)?;
                self.attrib_loop_body(*body)?;
            }
            NodeData::For {
                init,
                cond,
                update,
                body,
            } => {
                self.push_scope();
                for &stmt in init {
                    self.attrib_stmt(stmt)?;
                }
                self.attrib_expr(*cond)?;
                for &stmt in update {
                    self.attrib_stmt(stmt)?;
                }
                self.attrib_loop_body(*body)?;
                self.pop_scope();
            }
            NodeData::ForEach { var, expr, body } => {
                self.push_scope();
                let iterated = self.attrib_expr(*expr)?;
                let elem = self.iterated_element(&iterated)?;
                self.attrib_local_var_as(*var, elem)?;
                self.attrib_loop_body(*body)?;
                self.pop_scope();
            }
            NodeData::Return { expr } => self.attrib_return(node, *expr)?,
            NodeData::Throw { expr } | NodeData::Yield { expr } => {
                self.attrib_expr(*expr)?;
            }
            NodeData::Break { label } => {
                if label.is_none() && self.breakable == 0 {
                    self.report_node(node, codes::BREAK_OUTSIDE_SWITCH_LOOP, Vec::new());
                }
            }
            NodeData::Continue { .. } | NodeData::Empty => {}
            NodeData::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                self.push_scope();
                for &resource in resources {
                    match tree.arena.data(resource) {
                        Some(NodeData::VarDecl { .. }) => {
                            self.attrib_local_var(resource)?;
                        }
                        _ => {
                            self.attrib_expr(resource)?;
                        }
                    }
                }
                self.attrib_stmt(*body)?;
                self.pop_scope();
                for &catch in catches {
                    if let Some(NodeData::Catch { param, body }) = tree.arena.data(catch) {
                        self.push_scope();
                        self.attrib_local_var(*param)?;
                        self.attrib_stmt(*body)?;
                        self.pop_scope();
                    }
                }
                self.attrib_stmt(*finally)?;
            }
            NodeData::Switch { selector, cases } => self.attrib_switch(*selector, cases)?,
            NodeData::Synchronized { lock, body } => {
                self.attrib_expr(*lock)?;
                self.attrib_stmt(*body)?;
            }
            NodeData::Labeled { body, .. } => self.attrib_stmt(*body)?,
            NodeData::Assert { cond, detail } => {
                self.attrib_expr(*cond)?;
                self.attrib_expr(*detail)?;
            }
            NodeData::Erroneous { children } => {
                let children = children.clone();
                self.quietly(|s| {
                    for child in children {
                        let is_stmt = s.tree.arena.data(child).is_some_and(NodeData::is_statement);
                        if is_stmt {
                            s.attrib_stmt(child)?;
                        } else {
                            s.attrib_expr(child)?;
                        }
                    }
                    Ok(())
                })?;
            }
            _ => {
                self.attrib_expr(node)?;
            }
        }
        Ok(())
    }

    /// Branch of an `if`: a declaration there gets its own scope.
    fn attrib_scoped(&mut self, node: NodeIndex) -> AttrResult<()> {
        if node.is_none() {
            return Ok(());
        }
        self.push_scope();
        let result = self.attrib_stmt(node);
        self.pop_scope();
        result
    }

    fn attrib_loop_body(&mut self, body: NodeIndex) -> AttrResult<()> {
        self.breakable += 1;
        let result = self.attrib_scoped(body);
        self.breakable -= 1;
        result
    }

    fn attrib_return(&mut self, node: NodeIndex, expr: NodeIndex) -> AttrResult<()> {
        if expr.is_some() {
            let ty = self.attrib_expr(expr)?;
            let expected = self.method.as_ref().map(|m| m.return_type.clone());
            if let Some(expected) = expected
                && !ty.is_erroneous()
                && !matches!(expected, Type::Unknown | Type::Void)
            {
                self.check_literal_assignment(expr, &expected);
            }
            return Ok(());
        }
        let expected = self.method.as_ref().map(|m| m.return_type.clone());
        if let Some(expected) = expected
            && !matches!(expected, Type::Void | Type::Unknown)
            && !expected.is_erroneous()
        {
            self.report_node(node, codes::MISSING_RET_VAL, Vec::new());
        }
        Ok(())
    }

    /// Element type of an enhanced-`for` expression: the component type of
    /// an array, or the type argument of `Iterable`.
    fn iterated_element(&mut self, iterated: &Type) -> AttrResult<Type> {
        if let Some(elem) = iterated.element_type() {
            return Ok(elem.clone());
        }
        if iterated.class_symbol().is_none() {
            return Ok(Type::Unknown);
        }
        let Some(iterable) = self.ctx.table.load_class("java.lang.Iterable")? else {
            return Ok(Type::Unknown);
        };
        let view = self.ctx.table.as_super(iterated, iterable)?;
        Ok(match view.as_ref().map(Type::type_args) {
            Some([arg, ..]) => match arg {
                Type::Wildcard { bound: Some(bound), .. } => (**bound).clone(),
                Type::Wildcard { .. } => Type::Unknown,
                other => other.clone(),
            },
            _ => Type::Unknown,
        })
    }

    // =========================================================================
    // Switch
    // =========================================================================

    /// Attribute a switch statement or expression. Case labels on an enum
    /// selector name constants of that enum.
    pub(crate) fn attrib_switch(&mut self, selector: NodeIndex, cases: &[NodeIndex]) -> AttrResult<()> {
        let selector_ty = self.attrib_expr(selector)?;
        let enum_class = selector_ty.class_symbol().filter(|&sym| {
            self.ctx
                .table
                .symbol(sym)
                .and_then(|s| s.class_info())
                .is_some_and(|i| i.class_kind == ClassKind::Enum)
        });
        let tree = self.tree.clone();
        self.breakable += 1;
        self.push_scope();
        let mut result = Ok(());
        for &case in cases {
            let Some(NodeData::Case {
                labels,
                statements,
                is_arrow,
                ..
            }) = tree.arena.data(case)
            else {
                continue;
            };
            result = self.attrib_case(enum_class, labels, statements, *is_arrow);
            if result.is_err() {
                break;
            }
        }
        self.pop_scope();
        self.breakable -= 1;
        result
    }

    fn attrib_case(
        &mut self,
        enum_class: Option<SymbolId>,
        labels: &[NodeIndex],
        statements: &[NodeIndex],
        is_arrow: bool,
    ) -> AttrResult<()> {
        for &label in labels {
            match (enum_class, self.tree.arena.data(label).cloned()) {
                (Some(class), Some(NodeData::Ident { name })) => self.attrib_enum_label(label, class, name)?,
                _ => {
                    self.attrib_expr(label)?;
                }
            }
        }
        if is_arrow {
            self.push_scope();
        }
        let mut result = Ok(());
        for &stmt in statements {
            result = self.attrib_stmt(stmt);
            if result.is_err() {
                break;
            }
        }
        if is_arrow {
            self.pop_scope();
        }
        result
    }

    fn attrib_enum_label(&mut self, label: NodeIndex, class: SymbolId, name: Atom) -> AttrResult<()> {
        self.mark(label);
        match self.ctx.table.find_field(class, name)? {
            Some(constant) => {
                let ty = Type::class(class);
                self.record(label, constant, &ty);
                self.check_deprecated(label, constant)?;
            }
            None => {
                let text = self.name_text(name).to_string();
                let location = self.location_of(class);
                self.report_node(
                    label,
                    codes::CANT_RESOLVE_LOCATION,
                    vec!["variable".into(), text, location],
                );
            }
        }
        Ok(())
    }

    // =========================================================================
    // Locals
    // =========================================================================

    /// Attribute a local variable, parameter, catch parameter, resource or
    /// pattern binding and declare it in the innermost scope.
    pub(crate) fn attrib_local_var(&mut self, node: NodeIndex) -> AttrResult<SymbolId> {
        self.attrib_local_var_as(node, Type::Unknown)
    }

    /// As [`attrib_local_var`](Self::attrib_local_var); `implied` is the
    /// type of a declaration without a type (`var`, implicit lambda
    /// parameters, enhanced-`for` variables).
    fn attrib_local_var_as(&mut self, node: NodeIndex, implied: Type) -> AttrResult<SymbolId> {
        let tree = self.tree.clone();
        let Some(NodeData::VarDecl {
            kind,
            modifiers,
            var_type,
            name,
            name_pos,
            extra_dims,
            init,
        }) = tree.arena.data(node)
        else {
            return Ok(SymbolId::NONE);
        };
        self.mark(node);
        self.attrib_modifiers(*modifiers)?;
        let declared = if var_type.is_some() {
            let ty = self.resolve_type_node(*var_type)?;
            self.check_raw(*var_type, &ty);
            let mut dims = *extra_dims;
            if tree.arena.flags(node).contains(NodeFlags::VARARGS) {
                dims += 1;
            }
            Some(Type::array_of(ty, dims))
        } else {
            None
        };
        let ty = declared.clone().unwrap_or(implied);
        let sym = self.declare_local(node, *kind, *name, *name_pos, ty);
        if init.is_some() {
            let init_ty = self.attrib_expr(*init)?;
            match &declared {
                Some(target) => self.check_literal_assignment(*init, target),
                None if !matches!(init_ty, Type::Null) => self.set_var_type(sym, init_ty),
                None => {}
            }
        }
        if sym.is_some() {
            let ty = self.ctx.table.var_type(sym);
            self.record_type(node, &ty);
        }
        Ok(sym)
    }

    /// Create (or, on a retried pass, reuse) the symbol of a local and
    /// declare it. Reports a name already used by a local of the same
    /// method.
    fn declare_local(&mut self, node: NodeIndex, kind: VarKind, name: Atom, name_pos: u32, ty: Type) -> SymbolId {
        if name.is_none() {
            return SymbolId::NONE;
        }
        let text = self.name_text(name);
        if text.as_ref() == ERROR_NAME {
            return SymbolId::NONE;
        }
        if self.lookup_local_in_method(name).is_some() {
            let location = self.owner_location();
            self.report(
                name_pos,
                name_pos + text.len() as u32,
                codes::ALREADY_DEFINED,
                vec!["variable".into(), text.to_string(), location],
            );
        }

        let sym = match self.ctx.table.symbol_at(self.unit, node) {
            Some(existing) => {
                self.set_var_type(existing, ty);
                existing
            }
            None => {
                let count = self.local_counts.entry(name).or_insert(0);
                let index = *count;
                *count += 1;
                let owner = self.local_owner();
                let sym = self.ctx.table.symbols.alloc(
                    SymbolKind::Var,
                    name,
                    owner,
                    SymbolInfo::Var(VarInfo {
                        var_kind: kind,
                        ty,
                        index,
                        constant: None,
                    }),
                );
                let modifiers = match self.tree.arena.data(node) {
                    Some(NodeData::VarDecl { modifiers, .. }) => modifiers_of(&self.tree, *modifiers).0,
                    _ => ModifierFlags::empty(),
                };
                if let Some(symbol) = self.ctx.table.symbols.get_mut(sym) {
                    symbol.decl = Some(DeclRef { unit: self.unit, node });
                    symbol.modifiers = modifiers;
                    symbol.flags |= symbol_flags::LOCAL;
                }
                self.ctx.table.record_symbol(self.unit, node, sym);
                trace!(name = %text, index, "local entered");
                sym
            }
        };
        self.declare_var(name, sym);
        sym
    }

    fn set_var_type(&mut self, sym: SymbolId, ty: Type) {
        if let Some(SymbolInfo::Var(info)) = self.ctx.table.symbols.get_mut(sym).map(|s| &mut s.info) {
            info.ty = ty;
        }
    }

    /// `method m(int)`, `constructor A()` or the class location of the
    /// member being attributed.
    fn owner_location(&self) -> String {
        let class = self.current_class();
        let Some(method) = self.method.as_ref().map(|m| m.sym).filter(|m| m.is_some()) else {
            return self.location_of(class);
        };
        let is_ctor = self.ctx.table.symbol(method).is_some_and(|s| s.is_constructor());
        if is_ctor {
            let name = self.ctx.table.symbol_name(class);
            let params: Vec<String> = self
                .ctx
                .table
                .param_types(method)
                .iter()
                .map(|t| self.display(t))
                .collect();
            return format!("constructor {name}({})", params.join(","));
        }
        if self.ctx.table.symbol(method).is_some_and(|s| s.kind == SymbolKind::Method) {
            return format!("method {}", self.method_signature(method));
        }
        self.location_of(class)
    }

    fn attrib_local_class(&mut self, node: NodeIndex) -> AttrResult<()> {
        let Some(NodeData::ClassDecl { name, .. }) = self.tree.arena.data(node) else {
            return Ok(());
        };
        let name = *name;
        let sym = match self.ctx.table.symbol_at(self.unit, node) {
            Some(sym) => Some(sym),
            None => {
                let text = self.name_text(name);
                let flat_name = self.local_flat_name(&text);
                let owner = self.local_owner();
                let tree = self.tree.clone();
                let entered = self.ctx.table.enter_class(
                    self.unit,
                    &tree,
                    node,
                    ClassPlacement::Local { owner, flat_name },
                );
                self.settle_binder_diagnostics();
                entered
            }
        };
        let Some(sym) = sym else {
            return Ok(());
        };
        self.declare_type(name, sym);
        self.attrib_class(sym, node)
    }

    // =========================================================================
    // Literal conversions
    // =========================================================================

    /// Report a literal that cannot be assigned to a primitive target.
    /// Integer literals narrow to `byte`, `short` and `char` when they fit.
    pub(crate) fn check_literal_assignment(&mut self, value: NodeIndex, target: &Type) {
        let Type::Primitive(to) = target else {
            return;
        };
        let mut node = value;
        while let Some(NodeData::Parens { expr }) = self.tree.arena.data(node) {
            node = *expr;
        }
        let Some(NodeData::Literal { kind, value: text }) = self.tree.arena.data(node) else {
            return;
        };
        let from = match kind {
            SyntaxKind::IntLiteral => PrimitiveKind::Int,
            SyntaxKind::LongLiteral => PrimitiveKind::Long,
            SyntaxKind::FloatLiteral => PrimitiveKind::Float,
            SyntaxKind::DoubleLiteral => PrimitiveKind::Double,
            SyntaxKind::CharLiteral => PrimitiveKind::Char,
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => PrimitiveKind::Boolean,
            SyntaxKind::NullKeyword => {
                self.report_node(
                    value,
                    codes::INCOMPATIBLE_TYPES,
                    vec!["<null>".into(), to.name().into()],
                );
                return;
            }
            SyntaxKind::StringLiteral | SyntaxKind::TextBlock => {
                self.report_node(
                    value,
                    codes::INCOMPATIBLE_TYPES,
                    vec!["String".into(), to.name().into()],
                );
                return;
            }
            _ => return,
        };
        let narrows = match from {
            PrimitiveKind::Int => {
                matches!(to, PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char)
                    && int_literal_fits(text, *to)
            }
            PrimitiveKind::Char => matches!(to, PrimitiveKind::Byte | PrimitiveKind::Short),
            _ => false,
        };
        if !from.widens_to(*to) && !narrows {
            self.report_node(
                value,
                codes::INCOMPATIBLE_TYPES,
                vec![from.name().into(), to.name().into()],
            );
        }
    }
}

/// Whether the int literal `text` is representable in `to`. Unparsable
/// text is accepted; the scanner has already reported it.
fn int_literal_fits(text: &str, to: PrimitiveKind) -> bool {
    let Some(value) = parse_int_literal(text) else {
        return true;
    };
    let (lo, hi) = match to {
        PrimitiveKind::Byte => (i8::MIN as i64, i8::MAX as i64),
        PrimitiveKind::Short => (i16::MIN as i64, i16::MAX as i64),
        PrimitiveKind::Char => (0, u16::MAX as i64),
        _ => return true,
    };
    (lo..=hi).contains(&value)
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok();
    }
    if lower.len() > 1 && lower.starts_with('0') {
        return i64::from_str_radix(&lower[1..], 8).ok();
    }
    lower.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_literal_fits() {
        assert!(int_literal_fits("127", PrimitiveKind::Byte));
        assert!(!int_literal_fits("128", PrimitiveKind::Byte));
        assert!(int_literal_fits("0x7F", PrimitiveKind::Byte));
        assert!(int_literal_fits("65_535", PrimitiveKind::Char));
        assert!(!int_literal_fits("40000", PrimitiveKind::Short));
        assert!(int_literal_fits("017", PrimitiveKind::Byte));
    }

    #[test]
    fn test_parse_int_literal_radixes() {
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("010"), Some(8));
        assert_eq!(parse_int_literal("0"), Some(0));
        assert_eq!(parse_int_literal("1_000"), Some(1000));
    }
}

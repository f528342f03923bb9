//! Expression attribution.

use jbridge_binder::{PrimitiveKind, Type};
use jbridge_parser::{NodeData, NodeFlags, NodeIndex};
use jbridge_scanner::SyntaxKind;

use crate::state::{AttrResult, CheckerState, MethodEnv};
use crate::state_lookup::{NameKinds, Res};

impl CheckerState<'_> {
    /// Attribute an expression and record its type.
    pub(crate) fn attrib_expr(&mut self, node: NodeIndex) -> AttrResult<Type> {
        if node.is_none() {
            return Ok(Type::Unknown);
        }
        if !self.enter_depth() {
            return Ok(Type::Unknown);
        }
        self.mark(node);
        let recovered = self.tree.arena.flags(node).contains(NodeFlags::RECOVERED);
        let result = if recovered {
            self.quietly(|s| s.attrib_expr_inner(node))
        } else {
            self.attrib_expr_inner(node)
        };
        self.leave_depth();
        let ty = result?;
        self.record_type(node, &ty);
        Ok(ty)
    }

    fn attrib_expr_inner(&mut self, node: NodeIndex) -> AttrResult<Type> {
        let tree = self.tree.clone();
        let Some(data) = tree.arena.data(node) else {
            return Ok(Type::Unknown);
        };
        match data {
            NodeData::Ident { .. } | NodeData::FieldAccess { .. } => {
                Ok(match self.resolve_name(node, NameKinds::VALUE)? {
                    Res::Value(ty) => ty,
                    _ => Type::Unknown,
                })
            }
            NodeData::Literal { kind, .. } => self.literal_type(*kind),
            NodeData::MethodCall {
                type_args,
                callee,
                args,
            } => {
                for &arg in type_args {
                    self.resolve_type_node(arg)?;
                }
                self.attrib_method_call(node, *callee, args)
            }
            NodeData::NewClass {
                outer,
                type_args,
                class_type,
                args,
                body,
            } => {
                if outer.is_some() {
                    self.attrib_expr(*outer)?;
                }
                for &arg in type_args {
                    self.resolve_type_node(arg)?;
                }
                self.attrib_new_class(node, *class_type, args, *body)
            }
            NodeData::NewArray {
                elem_type,
                dims,
                extra_dims,
                elements,
                ..
            } => {
                let elem = self.resolve_type_node(*elem_type)?;
                for &dim in dims {
                    self.attrib_expr(dim)?;
                }
                for &element in elements {
                    self.attrib_expr(element)?;
                }
                if elem_type.is_none() {
                    return Ok(Type::Unknown);
                }
                Ok(Type::array_of(elem, dims.len() as u32 + extra_dims))
            }
            NodeData::ArrayAccess { array, index } => {
                let array_ty = self.attrib_expr(*array)?;
                self.attrib_expr(*index)?;
                Ok(array_ty.element_type().cloned().unwrap_or(Type::Unknown))
            }
            NodeData::Unary { op, operand, .. } => {
                let ty = self.attrib_expr(*operand)?;
                Ok(self.unary_type(*op, &ty))
            }
            NodeData::Binary { op, left, right } => {
                let lhs = self.attrib_expr(*left)?;
                let rhs = self.attrib_expr(*right)?;
                self.binary_type(*op, &lhs, &rhs)
            }
            NodeData::Assign { op, target, value } => {
                let target_ty = self.attrib_expr(*target)?;
                self.attrib_expr(*value)?;
                if *op == SyntaxKind::Eq {
                    self.check_literal_assignment(*value, &target_ty);
                }
                Ok(target_ty)
            }
            NodeData::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                self.attrib_expr(*cond)?;
                let a = self.attrib_expr(*when_true)?;
                let b = self.attrib_expr(*when_false)?;
                Ok(self.conditional_type(a, b))
            }
            NodeData::InstanceOf {
                expr,
                target_type,
                binding,
            } => {
                self.attrib_expr(*expr)?;
                if binding.is_some() {
                    self.attrib_local_var(*binding)?;
                } else {
                    self.resolve_type_node(*target_type)?;
                }
                Ok(Type::Primitive(PrimitiveKind::Boolean))
            }
            NodeData::Cast { target_type, expr } => {
                let ty = self.resolve_type_node(*target_type)?;
                self.attrib_expr(*expr)?;
                Ok(ty)
            }
            NodeData::Parens { expr } => self.attrib_expr(*expr),
            NodeData::ClassLiteral { target_type } => {
                let ty = self.resolve_type_node(*target_type)?;
                self.class_literal_type(ty)
            }
            NodeData::Lambda { params, body, .. } => {
                self.attrib_lambda(params, *body)?;
                Ok(Type::Unknown)
            }
            NodeData::MethodRef { target, name, .. } => {
                let site = match self.resolve_name(*target, NameKinds::all())? {
                    Res::Value(ty) | Res::Type(ty) => ty,
                    _ => return Ok(Type::Unknown),
                };
                let text = self.name_text(*name);
                if text.as_ref() != "new"
                    && let Some(class) = self.site_class(&site)?
                    && let Some(&method) = self.ctx.table.find_methods(class, *name)?.first()
                {
                    self.ctx.table.record_symbol(self.unit, node, method);
                }
                Ok(Type::Unknown)
            }
            NodeData::Switch { selector, cases } => {
                self.attrib_switch(*selector, cases)?;
                Ok(Type::Unknown)
            }
            NodeData::Erroneous { children } => {
                let children = children.clone();
                self.quietly(|s| {
                    for child in children {
                        s.attrib_expr(child)?;
                    }
                    Ok(())
                })?;
                Ok(Type::Unknown)
            }
            NodeData::PrimitiveType { .. }
            | NodeData::ArrayType { .. }
            | NodeData::ParameterizedType { .. } => self.resolve_type_node(node),
            _ => Ok(Type::Unknown),
        }
    }

    pub(crate) fn literal_type(&mut self, kind: SyntaxKind) -> AttrResult<Type> {
        Ok(match kind {
            SyntaxKind::IntLiteral => Type::Primitive(PrimitiveKind::Int),
            SyntaxKind::LongLiteral => Type::Primitive(PrimitiveKind::Long),
            SyntaxKind::FloatLiteral => Type::Primitive(PrimitiveKind::Float),
            SyntaxKind::DoubleLiteral => Type::Primitive(PrimitiveKind::Double),
            SyntaxKind::CharLiteral => Type::Primitive(PrimitiveKind::Char),
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => Type::Primitive(PrimitiveKind::Boolean),
            SyntaxKind::NullKeyword => Type::Null,
            SyntaxKind::StringLiteral | SyntaxKind::TextBlock => self.string_type()?,
            _ => Type::Unknown,
        })
    }

    pub(crate) fn string_type(&mut self) -> AttrResult<Type> {
        Ok(self
            .ctx
            .table
            .load_class("java.lang.String")?
            .map_or_else(|| Type::error("String"), Type::class))
    }

    /// Primitive view of a numeric or boolean operand (unboxing classes).
    fn operand_primitive(&self, ty: &Type) -> Option<PrimitiveKind> {
        match ty {
            Type::Primitive(kind) => Some(*kind),
            Type::Class { sym, .. } => self.unboxed(*sym),
            _ => None,
        }
    }

    fn unary_type(&self, op: SyntaxKind, ty: &Type) -> Type {
        let Some(kind) = self.operand_primitive(ty) else {
            return if op == SyntaxKind::Bang {
                Type::Primitive(PrimitiveKind::Boolean)
            } else {
                Type::Unknown
            };
        };
        match op {
            SyntaxKind::Bang => Type::Primitive(PrimitiveKind::Boolean),
            SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => ty.clone(),
            _ => Type::Primitive(kind.promote(kind)),
        }
    }

    fn binary_type(&mut self, op: SyntaxKind, lhs: &Type, rhs: &Type) -> AttrResult<Type> {
        let boolean = Type::Primitive(PrimitiveKind::Boolean);
        match op {
            SyntaxKind::EqEq
            | SyntaxKind::BangEq
            | SyntaxKind::Lt
            | SyntaxKind::LtEq
            | SyntaxKind::Gt
            | SyntaxKind::GtEq
            | SyntaxKind::AmpAmp
            | SyntaxKind::BarBar => return Ok(boolean),
            SyntaxKind::Plus if self.is_string(lhs) || self.is_string(rhs) => return self.string_type(),
            _ => {}
        }
        let (Some(a), Some(b)) = (self.operand_primitive(lhs), self.operand_primitive(rhs)) else {
            return Ok(Type::Unknown);
        };
        Ok(match op {
            SyntaxKind::Amp | SyntaxKind::Bar | SyntaxKind::Caret
                if a == PrimitiveKind::Boolean && b == PrimitiveKind::Boolean =>
            {
                boolean
            }
            SyntaxKind::LtLt | SyntaxKind::GtGt | SyntaxKind::GtGtGt => Type::Primitive(a.promote(a)),
            _ if a.is_numeric() && b.is_numeric() => Type::Primitive(a.promote(b)),
            _ => Type::Unknown,
        })
    }

    fn is_string(&self, ty: &Type) -> bool {
        ty.class_symbol()
            .is_some_and(|sym| self.ctx.table.class_name(sym).as_ref() == "java.lang.String")
    }

    fn conditional_type(&self, a: Type, b: Type) -> Type {
        if a == b {
            return a;
        }
        match (&a, &b) {
            (Type::Null, _) => b,
            (_, Type::Null) => a,
            (Type::Primitive(x), Type::Primitive(y)) if x.is_numeric() && y.is_numeric() => {
                Type::Primitive(x.promote(*y))
            }
            _ => a,
        }
    }

    fn class_literal_type(&mut self, ty: Type) -> AttrResult<Type> {
        let arg = match ty {
            Type::Primitive(kind) => match self.ctx.table.box_class(kind)? {
                Some(sym) => Type::class(sym),
                None => Type::Unknown,
            },
            Type::Void => self
                .ctx
                .table
                .load_class("java.lang.Void")?
                .map_or(Type::Unknown, Type::class),
            other => other,
        };
        Ok(match self.ctx.table.load_class("java.lang.Class")? {
            Some(class) => Type::Class {
                sym: class,
                args: vec![arg],
            },
            None => Type::error("Class"),
        })
    }

    fn attrib_new_class(&mut self, node: NodeIndex, class_type: NodeIndex, args: &[NodeIndex], body: NodeIndex) -> AttrResult<Type> {
        let ty = self.resolve_type_node(class_type)?;
        let arg_types = self.attrib_args(args)?;
        let Some(class) = ty.class_symbol() else {
            if body.is_some() {
                let object = self
                    .ctx
                    .table
                    .load_class("java.lang.Object")?
                    .map_or(Type::Unknown, Type::class);
                if let Some(anon) = self.enter_anonymous(body, &object)? {
                    self.quietly(|s| s.attrib_class(anon, body))?;
                }
            }
            return Ok(ty);
        };
        if body.is_none() {
            if let Some(ctor) = self.select_constructor(node, class, &arg_types)? {
                self.ctx.table.record_symbol(self.unit, node, ctor);
            }
            return Ok(ty);
        }
        let Some(anon) = self.enter_anonymous(body, &ty)? else {
            return Ok(ty);
        };
        if !self.is_interface(class)
            && let Some(ctor) = self.select_constructor(node, class, &arg_types)?
        {
            self.ctx.table.record_symbol(self.unit, node, ctor);
        }
        self.attrib_class(anon, body)?;
        let anon_ty = Type::class(anon);
        self.record_type(body, &anon_ty);
        Ok(anon_ty)
    }

    /// Lambda parameters and body. Returns inside the body belong to the
    /// lambda, not to the enclosing method.
    fn attrib_lambda(&mut self, params: &[NodeIndex], body: NodeIndex) -> AttrResult<()> {
        let owner = self.local_owner();
        let saved_method = self.method.replace(MethodEnv {
            sym: owner,
            return_type: Type::Unknown,
        });
        let saved_breakable = std::mem::replace(&mut self.breakable, 0);
        self.push_scope();
        let result = self.attrib_lambda_body(params, body);
        self.pop_scope();
        self.breakable = saved_breakable;
        self.method = saved_method;
        result
    }

    fn attrib_lambda_body(&mut self, params: &[NodeIndex], body: NodeIndex) -> AttrResult<()> {
        for &param in params {
            self.attrib_local_var(param)?;
        }
        match self.tree.arena.data(body) {
            Some(NodeData::Block { .. }) => self.attrib_stmt(body),
            _ => self.attrib_expr(body).map(|_| ()),
        }
    }
}

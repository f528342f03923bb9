//! Parser state - expressions.
//!
//! Binary operators are parsed by precedence climbing; casts and lambdas are
//! recognised with token look-ahead before falling back to parenthesised
//! expressions.

use jbridge_common::diagnostics::codes;
use jbridge_scanner::SyntaxKind;

use super::node::{ClassKind, NodeData, NodeFlags, NodeIndex, NodeList, VarKind};
use super::state::ParserState;

/// Binary operator precedence; 0 means "not a binary operator".
fn binary_precedence(kind: SyntaxKind) -> u8 {
    match kind {
        SyntaxKind::BarBar => 1,
        SyntaxKind::AmpAmp => 2,
        SyntaxKind::Bar => 3,
        SyntaxKind::Caret => 4,
        SyntaxKind::Amp => 5,
        SyntaxKind::EqEq | SyntaxKind::BangEq => 6,
        SyntaxKind::Lt
        | SyntaxKind::Gt
        | SyntaxKind::LtEq
        | SyntaxKind::GtEq
        | SyntaxKind::InstanceofKeyword => 7,
        SyntaxKind::LtLt | SyntaxKind::GtGt | SyntaxKind::GtGtGt => 8,
        SyntaxKind::Plus | SyntaxKind::Minus => 9,
        SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 10,
        _ => 0,
    }
}

impl ParserState {
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        if !self.enter_recursion() {
            return self.erroneous(pos, Vec::new());
        }
        let expr = self.parse_assignment_expression();
        self.exit_recursion();
        expr
    }

    fn parse_assignment_expression(&mut self) -> NodeIndex {
        if self.is_lambda_start() {
            return self.parse_lambda();
        }
        let pos = self.token_pos();
        let target = self.parse_conditional_expression();
        let op = self.token();
        if op.is_assignment_operator() {
            self.next_token();
            let value = if self.is_token(SyntaxKind::OpenBrace) {
                self.parse_array_initializer()
            } else {
                self.parse_expression()
            };
            return self.finish_node(pos, NodeData::Assign { op, target, value });
        }
        target
    }

    pub(crate) fn parse_conditional_expression(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let cond = self.parse_binary_expression(1);
        if !self.parse_optional(SyntaxKind::Question) {
            return cond;
        }
        let when_true = self.parse_ternary_operand();
        self.parse_expected(SyntaxKind::Colon);
        let when_false = if self.is_lambda_start() {
            self.parse_lambda()
        } else {
            self.parse_conditional_expression()
        };
        self.finish_node(
            pos,
            NodeData::Conditional {
                cond,
                when_true,
                when_false,
            },
        )
    }

    /// Operand position that cannot contain a top-level assignment
    /// (`case` labels, the middle of `?:`).
    pub(crate) fn parse_ternary_operand(&mut self) -> NodeIndex {
        if self.is_lambda_start() {
            return self.parse_lambda();
        }
        self.parse_conditional_expression()
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let pos = self.token_pos();
        let mut left = self.parse_unary_expression();
        loop {
            let op = self.token();
            let precedence = binary_precedence(op);
            if precedence == 0 || precedence < min_precedence {
                return left;
            }
            self.next_token();
            if op == SyntaxKind::InstanceofKeyword {
                let final_modifier = self.parse_optional(SyntaxKind::FinalKeyword);
                let target_type = self.parse_type();
                let mut binding = NodeIndex::NONE;
                if self.is_token(SyntaxKind::Identifier) {
                    let binding_pos = self.token_pos();
                    let (name, name_pos, _) = self.parse_identifier();
                    let modifiers = self.arena.add(
                        binding_pos,
                        binding_pos,
                        NodeData::Modifiers {
                            flags: if final_modifier {
                                super::node::ModifierFlags::FINAL
                            } else {
                                super::node::ModifierFlags::empty()
                            },
                            annotations: NodeList::new(),
                        },
                    );
                    binding = self.finish_node(
                        binding_pos,
                        NodeData::VarDecl {
                            kind: VarKind::Local,
                            modifiers,
                            var_type: NodeIndex::NONE,
                            name,
                            name_pos,
                            extra_dims: 0,
                            init: NodeIndex::NONE,
                        },
                    );
                    self.arena.add_flags(binding, NodeFlags::IMPLICIT_TYPE);
                }
                left = self.finish_node(
                    pos,
                    NodeData::InstanceOf {
                        expr: left,
                        target_type,
                        binding,
                    },
                );
                continue;
            }
            let right = self.parse_binary_expression(precedence + 1);
            left = self.finish_node(pos, NodeData::Binary { op, left, right });
        }
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        match self.token() {
            SyntaxKind::PlusPlus
            | SyntaxKind::MinusMinus
            | SyntaxKind::Plus
            | SyntaxKind::Minus
            | SyntaxKind::Bang
            | SyntaxKind::Tilde => {
                let op = self.token();
                self.next_token();
                if !self.enter_recursion() {
                    return self.erroneous(pos, Vec::new());
                }
                let operand = self.parse_unary_expression();
                self.exit_recursion();
                self.finish_node(
                    pos,
                    NodeData::Unary {
                        op,
                        postfix: false,
                        operand,
                    },
                )
            }
            SyntaxKind::OpenParen if self.is_cast() => {
                self.next_token();
                let first = self.parse_type();
                let target_type = if self.is_token(SyntaxKind::Amp) {
                    let mut bounds = vec![first];
                    while self.parse_optional(SyntaxKind::Amp) {
                        bounds.push(self.parse_type());
                    }
                    self.finish_node(pos + 1, NodeData::IntersectionType { bounds })
                } else {
                    first
                };
                self.parse_expected(SyntaxKind::CloseParen);
                if !self.enter_recursion() {
                    return self.erroneous(pos, Vec::new());
                }
                let expr = if self.is_lambda_start() {
                    self.parse_lambda()
                } else {
                    self.parse_unary_expression()
                };
                self.exit_recursion();
                self.finish_node(pos, NodeData::Cast { target_type, expr })
            }
            _ => {
                let primary = self.parse_primary();
                self.parse_postfix(pos, primary)
            }
        }
    }

    /// `(Type) operand` versus a parenthesised expression.
    fn is_cast(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            if p.token().is_primitive_type() {
                return p.skip_type() && p.is_token(SyntaxKind::CloseParen);
            }
            if !p.skip_type() {
                return false;
            }
            while p.parse_optional(SyntaxKind::Amp) {
                if !p.skip_type() {
                    return false;
                }
            }
            if !p.parse_optional(SyntaxKind::CloseParen) {
                return false;
            }
            matches!(
                p.token(),
                SyntaxKind::Identifier
                    | SyntaxKind::OpenParen
                    | SyntaxKind::ThisKeyword
                    | SyntaxKind::SuperKeyword
                    | SyntaxKind::NewKeyword
                    | SyntaxKind::Bang
                    | SyntaxKind::Tilde
                    | SyntaxKind::IntLiteral
                    | SyntaxKind::LongLiteral
                    | SyntaxKind::FloatLiteral
                    | SyntaxKind::DoubleLiteral
                    | SyntaxKind::CharLiteral
                    | SyntaxKind::StringLiteral
                    | SyntaxKind::TextBlock
                    | SyntaxKind::TrueKeyword
                    | SyntaxKind::FalseKeyword
                    | SyntaxKind::NullKeyword
            ) || p.token().is_primitive_type()
        })
    }

    fn is_lambda_start(&mut self) -> bool {
        match self.token() {
            SyntaxKind::Identifier => self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::Arrow)
            }),
            SyntaxKind::OpenParen => self.look_ahead(|p| {
                p.skip_balanced_parens() && p.is_token(SyntaxKind::Arrow)
            }),
            _ => false,
        }
    }

    fn parse_lambda(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let mut params = NodeList::new();
        let has_parens = self.is_token(SyntaxKind::OpenParen);
        if has_parens {
            self.next_token();
            while !self.is_token(SyntaxKind::CloseParen) && !self.is_token(SyntaxKind::EndOfFile) {
                let implicit = self.is_token(SyntaxKind::Identifier)
                    && self.look_ahead(|p| {
                        p.next_token();
                        p.is_token(SyntaxKind::Comma) || p.is_token(SyntaxKind::CloseParen)
                    });
                if implicit {
                    params.push(self.implicit_lambda_param());
                } else {
                    params.push(self.parse_formal_parameter(VarKind::Param));
                }
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseParen);
        } else {
            params.push(self.implicit_lambda_param());
        }
        self.parse_expected(SyntaxKind::Arrow);
        let body = if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_block()
        } else {
            self.parse_expression()
        };
        self.finish_node(
            pos,
            NodeData::Lambda {
                params,
                body,
                has_parens,
            },
        )
    }

    fn implicit_lambda_param(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let modifiers = self.arena.add(
            pos,
            pos,
            NodeData::Modifiers {
                flags: super::node::ModifierFlags::empty(),
                annotations: NodeList::new(),
            },
        );
        let (name, name_pos, _) = self.parse_identifier();
        let idx = self.finish_node(
            pos,
            NodeData::VarDecl {
                kind: VarKind::Param,
                modifiers,
                var_type: NodeIndex::NONE,
                name,
                name_pos,
                extra_dims: 0,
                init: NodeIndex::NONE,
            },
        );
        self.arena.add_flags(idx, NodeFlags::IMPLICIT_TYPE);
        idx
    }

    fn parse_literal(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let kind = self.token();
        let value = self.scanner.token_value();
        self.next_token();
        self.finish_node(pos, NodeData::Literal { kind, value })
    }

    fn parse_primary(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        match self.token() {
            kind if kind.is_literal() => self.parse_literal(),
            SyntaxKind::ThisKeyword | SyntaxKind::SuperKeyword => {
                let name = self.intern(self.token().text());
                self.next_token();
                let ident = self.finish_node(pos, NodeData::Ident { name });
                if self.is_token(SyntaxKind::OpenParen) {
                    // this(...) / super(...) constructor call
                    let args = self.parse_arguments();
                    return self.finish_node(
                        pos,
                        NodeData::MethodCall {
                            type_args: NodeList::new(),
                            callee: ident,
                            args,
                        },
                    );
                }
                ident
            }
            SyntaxKind::OpenParen => {
                self.next_token();
                let expr = self.parse_expression();
                let closed = self.parse_expected(SyntaxKind::CloseParen);
                let idx = self.finish_node(pos, NodeData::Parens { expr });
                if !closed {
                    self.mark_recovered(idx);
                }
                idx
            }
            SyntaxKind::NewKeyword => self.parse_new(pos, NodeIndex::NONE),
            SyntaxKind::Identifier => {
                // `String[].class`, `List<String>::new` and `A.B::m` are types
                // used in expression position.
                if self.look_ahead(|p| {
                    p.skip_type() && p.is_token(SyntaxKind::ColonColon)
                }) && self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::Lt) || p.is_token(SyntaxKind::OpenBracket)
                }) {
                    return self.parse_type();
                }
                if self.look_ahead(|p| {
                    p.next_token();
                    if !p.is_token(SyntaxKind::OpenBracket) {
                        return false;
                    }
                    p.next_token();
                    p.is_token(SyntaxKind::CloseBracket)
                }) {
                    let ty = self.parse_type();
                    return self.parse_class_literal(pos, ty);
                }
                let (name, _, _) = self.parse_identifier();
                let ident = self.finish_node(pos, NodeData::Ident { name });
                if self.is_token(SyntaxKind::OpenParen) {
                    let args = self.parse_arguments();
                    return self.finish_node(
                        pos,
                        NodeData::MethodCall {
                            type_args: NodeList::new(),
                            callee: ident,
                            args,
                        },
                    );
                }
                ident
            }
            kind if kind.is_primitive_type() || kind == SyntaxKind::VoidKeyword => {
                let ty = self.parse_type();
                if self.is_token(SyntaxKind::ColonColon) {
                    return ty;
                }
                self.parse_class_literal(pos, ty)
            }
            SyntaxKind::SwitchKeyword => {
                // Switch expression: reuse the statement form.
                self.parse_statement()
            }
            SyntaxKind::At => {
                self.parse_annotation();
                self.parse_primary()
            }
            _ => {
                self.error_at_current(codes::ILLEGAL_START_OF_EXPR, Vec::new());
                let name = self.error_name();
                let idx = self.arena.add(pos, pos, NodeData::Ident { name });
                self.mark_recovered(idx);
                idx
            }
        }
    }

    fn parse_class_literal(&mut self, pos: u32, target_type: NodeIndex) -> NodeIndex {
        self.parse_expected(SyntaxKind::Dot);
        if !self.parse_optional(SyntaxKind::ClassKeyword) {
            self.error_expected("'class'");
            let idx = self.finish_node(pos, NodeData::ClassLiteral { target_type });
            self.mark_recovered(idx);
            return idx;
        }
        self.finish_node(pos, NodeData::ClassLiteral { target_type })
    }

    /// Selectors and postfix operators after a primary.
    fn parse_postfix(&mut self, pos: u32, mut expr: NodeIndex) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::Dot => {
                    self.next_token();
                    let type_args = if self.is_token(SyntaxKind::Lt) {
                        self.parse_type_arguments()
                    } else {
                        NodeList::new()
                    };
                    match self.token() {
                        SyntaxKind::NewKeyword => {
                            expr = self.parse_new(pos, expr);
                        }
                        SyntaxKind::ClassKeyword => {
                            self.next_token();
                            expr = self.finish_node(pos, NodeData::ClassLiteral { target_type: expr });
                        }
                        SyntaxKind::ThisKeyword | SyntaxKind::SuperKeyword => {
                            let name_pos = self.token_pos();
                            let name = self.intern(self.token().text());
                            self.next_token();
                            expr = self.finish_node(
                                pos,
                                NodeData::FieldAccess {
                                    target: expr,
                                    name,
                                    name_pos,
                                },
                            );
                        }
                        _ => {
                            let (name, name_pos, named) = self.parse_identifier();
                            expr = self.finish_node(
                                pos,
                                NodeData::FieldAccess {
                                    target: expr,
                                    name,
                                    name_pos,
                                },
                            );
                            if !named {
                                self.mark_recovered(expr);
                                return expr;
                            }
                            if self.is_token(SyntaxKind::OpenParen) {
                                let args = self.parse_arguments();
                                expr = self.finish_node(
                                    pos,
                                    NodeData::MethodCall {
                                        type_args,
                                        callee: expr,
                                        args,
                                    },
                                );
                            }
                        }
                    }
                }
                SyntaxKind::OpenBracket => {
                    self.next_token();
                    let index = self.parse_expression();
                    self.parse_expected(SyntaxKind::CloseBracket);
                    expr = self.finish_node(pos, NodeData::ArrayAccess { array: expr, index });
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    let op = self.token();
                    self.next_token();
                    expr = self.finish_node(
                        pos,
                        NodeData::Unary {
                            op,
                            postfix: true,
                            operand: expr,
                        },
                    );
                }
                SyntaxKind::ColonColon => {
                    self.next_token();
                    let type_args = if self.is_token(SyntaxKind::Lt) {
                        self.parse_type_arguments()
                    } else {
                        NodeList::new()
                    };
                    let name = if self.parse_optional(SyntaxKind::NewKeyword) {
                        self.intern("new")
                    } else {
                        self.parse_identifier().0
                    };
                    expr = self.finish_node(
                        pos,
                        NodeData::MethodRef {
                            target: expr,
                            type_args,
                            name,
                        },
                    );
                }
                _ => return expr,
            }
        }
    }

    /// `new T(args) [body]`, `new T[n][]`, `new T[] {..}`; `outer.new T()`.
    fn parse_new(&mut self, pos: u32, outer: NodeIndex) -> NodeIndex {
        self.next_token();
        let type_args = if self.is_token(SyntaxKind::Lt) {
            self.parse_type_arguments()
        } else {
            NodeList::new()
        };
        let type_pos = self.token_pos();
        let elem_type = if self.token().is_primitive_type() {
            let kind = self.token();
            self.next_token();
            self.finish_node(type_pos, NodeData::PrimitiveType { kind })
        } else {
            self.parse_class_type()
        };

        if self.is_token(SyntaxKind::OpenBracket) {
            let mut dims = NodeList::new();
            let mut extra_dims = 0;
            while self.parse_optional(SyntaxKind::OpenBracket) {
                if self.parse_optional(SyntaxKind::CloseBracket) {
                    extra_dims += 1;
                    continue;
                }
                if extra_dims > 0 {
                    self.error_expected("']'");
                }
                dims.push(self.parse_expression());
                self.parse_expected(SyntaxKind::CloseBracket);
            }
            let mut elements = NodeList::new();
            let mut has_initializer = false;
            if dims.is_empty() && self.is_token(SyntaxKind::OpenBrace) {
                has_initializer = true;
                elements = self.parse_array_initializer_elements();
            } else if dims.is_empty() {
                self.error_expected("array dimension");
            }
            return self.finish_node(
                pos,
                NodeData::NewArray {
                    elem_type,
                    dims,
                    extra_dims,
                    elements,
                    has_initializer,
                },
            );
        }

        let args = if self.is_token(SyntaxKind::OpenParen) {
            self.parse_arguments()
        } else {
            self.error_expected("'(' or '['");
            NodeList::new()
        };
        let body = if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_anonymous_body(ClassKind::Class)
        } else {
            NodeIndex::NONE
        };
        self.finish_node(
            pos,
            NodeData::NewClass {
                outer,
                type_args,
                class_type: elem_type,
                args,
                body,
            },
        )
    }

    /// `{a, b, {c}}` as a `NewArray` without element type.
    pub(crate) fn parse_array_initializer(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let elements = self.parse_array_initializer_elements();
        self.finish_node(
            pos,
            NodeData::NewArray {
                elem_type: NodeIndex::NONE,
                dims: NodeList::new(),
                extra_dims: 0,
                elements,
                has_initializer: true,
            },
        )
    }

    fn parse_array_initializer_elements(&mut self) -> NodeList {
        let mut elements = NodeList::new();
        self.parse_expected(SyntaxKind::OpenBrace);
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            let element = if self.is_token(SyntaxKind::OpenBrace) {
                self.parse_array_initializer()
            } else {
                self.parse_expression()
            };
            elements.push(element);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        elements
    }

    /// `(a, b, c)`
    pub(crate) fn parse_arguments(&mut self) -> NodeList {
        let mut args = NodeList::new();
        self.parse_expected(SyntaxKind::OpenParen);
        while !self.is_token(SyntaxKind::CloseParen) && !self.is_token(SyntaxKind::EndOfFile) {
            args.push(self.parse_expression());
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParen);
        args
    }
}

//! Parser state - blocks and statements.

use jbridge_common::diagnostics::codes;
use jbridge_scanner::SyntaxKind;

use super::node::{NodeData, NodeFlags, NodeIndex, NodeList, VarKind};
use super::state::ParserState;

impl ParserState {
    /// Parse a block statement
    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        if !self.enter_recursion() {
            return self.erroneous(pos, Vec::new());
        }
        let opened = self.parse_expected(SyntaxKind::OpenBrace);
        let mut statements = NodeList::new();
        if opened {
            self.parse_block_statements(&mut statements, false);
        }
        let closed = opened && self.parse_expected(SyntaxKind::CloseBrace);
        self.exit_recursion();
        let idx = self.finish_node(
            pos,
            NodeData::Block {
                statements,
                is_static: false,
            },
        );
        if !closed {
            self.mark_recovered(idx);
        }
        idx
    }

    /// Statements up to `}` (or `case`/`default` inside a switch).
    fn parse_block_statements(&mut self, out: &mut NodeList, in_switch: bool) {
        loop {
            match self.token() {
                SyntaxKind::CloseBrace | SyntaxKind::EndOfFile => return,
                SyntaxKind::CaseKeyword | SyntaxKind::DefaultKeyword if in_switch => return,
                _ => {}
            }
            let start = self.token_pos();
            self.parse_block_statement(out);
            if self.token_pos() == start && !self.is_token(SyntaxKind::EndOfFile) {
                // No progress: drop the offending token.
                self.error_at_current(codes::ILLEGAL_START_OF_EXPR, Vec::new());
                let pos = self.token_pos();
                self.next_token();
                out.push(self.erroneous(pos, Vec::new()));
            }
        }
    }

    fn parse_block_statement(&mut self, out: &mut NodeList) {
        let pos = self.token_pos();
        match self.token() {
            SyntaxKind::ClassKeyword | SyntaxKind::InterfaceKeyword | SyntaxKind::EnumKeyword => {
                let modifiers = self.parse_modifiers();
                out.push(self.parse_class_declaration(pos, modifiers));
                return;
            }
            SyntaxKind::FinalKeyword | SyntaxKind::AbstractKeyword | SyntaxKind::At
            | SyntaxKind::StaticKeyword => {
                let modifiers = self.parse_modifiers();
                if matches!(
                    self.token(),
                    SyntaxKind::ClassKeyword | SyntaxKind::InterfaceKeyword | SyntaxKind::EnumKeyword
                ) || self.is_contextual("record")
                {
                    out.push(self.parse_class_declaration(pos, modifiers));
                } else {
                    self.parse_local_variable_rest(pos, modifiers, out);
                }
                return;
            }
            SyntaxKind::Identifier
                if self.token_text() == "record"
                    && self.look_ahead(|p| {
                        p.next_token();
                        p.parse_optional(SyntaxKind::Identifier)
                            && (p.is_token(SyntaxKind::OpenParen) || p.is_token(SyntaxKind::Lt))
                    }) =>
            {
                let modifiers = self.parse_modifiers();
                out.push(self.parse_class_declaration(pos, modifiers));
                return;
            }
            _ => {}
        }
        if self.is_local_variable_start() {
            let modifiers = self.parse_modifiers();
            self.parse_local_variable_rest(pos, modifiers, out);
            return;
        }
        out.push(self.parse_statement());
    }

    /// Whether the tokens at the cursor start a local variable declaration.
    fn is_local_variable_start(&mut self) -> bool {
        if self.token().is_primitive_type() {
            // `int.class` is an expression.
            return self.look_ahead(|p| {
                p.next_token();
                !p.is_token(SyntaxKind::Dot)
            });
        }
        if !self.is_token(SyntaxKind::Identifier) {
            return false;
        }
        self.look_ahead(|p| p.skip_type() && p.is_token(SyntaxKind::Identifier))
    }

    fn parse_local_variable_rest(&mut self, pos: u32, modifiers: NodeIndex, out: &mut NodeList) {
        let (var_type, implicit) = self.parse_local_type();
        let (name, name_pos, named) = self.parse_identifier();
        let first = out.len();
        self.parse_variable_fragments(
            pos,
            VarKind::Local,
            modifiers,
            var_type,
            name,
            name_pos,
            out,
        );
        for idx in &out[first..] {
            if implicit {
                self.arena.add_flags(*idx, NodeFlags::IMPLICIT_TYPE);
            }
            if !named {
                self.arena.add_flags(*idx, NodeFlags::RECOVERED);
            }
        }
    }

    /// A declared type, or `NONE` for `var`.
    fn parse_local_type(&mut self) -> (NodeIndex, bool) {
        if self.is_contextual("var")
            && self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::Identifier)
            })
        {
            self.next_token();
            return (NodeIndex::NONE, true);
        }
        (self.parse_type(), false)
    }

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        if !self.enter_recursion() {
            return self.erroneous(pos, Vec::new());
        }
        let stmt = match self.token() {
            SyntaxKind::OpenBrace => self.parse_block(),
            SyntaxKind::Semicolon => {
                self.next_token();
                self.finish_node(pos, NodeData::Empty)
            }
            SyntaxKind::IfKeyword => self.parse_if(pos),
            SyntaxKind::WhileKeyword => {
                self.next_token();
                let cond = self.parse_paren_condition();
                let body = self.parse_statement();
                self.finish_node(pos, NodeData::While { cond, body })
            }
            SyntaxKind::DoKeyword => {
                self.next_token();
                let body = self.parse_statement();
                self.parse_expected(SyntaxKind::WhileKeyword);
                let cond = self.parse_paren_condition();
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let idx = self.finish_node(pos, NodeData::DoWhile { body, cond });
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::ForKeyword => self.parse_for(pos),
            SyntaxKind::ReturnKeyword => {
                self.next_token();
                let expr = if self.is_token(SyntaxKind::Semicolon) {
                    NodeIndex::NONE
                } else {
                    self.parse_expression()
                };
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let idx = self.finish_node(pos, NodeData::Return { expr });
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::ThrowKeyword => {
                self.next_token();
                let expr = self.parse_expression();
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let idx = self.finish_node(pos, NodeData::Throw { expr });
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::BreakKeyword | SyntaxKind::ContinueKeyword => {
                let is_break = self.is_token(SyntaxKind::BreakKeyword);
                self.next_token();
                let label = if self.is_token(SyntaxKind::Identifier) {
                    let atom = self.scanner.token_atom();
                    self.next_token();
                    atom
                } else {
                    jbridge_common::Atom::NONE
                };
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let data = if is_break {
                    NodeData::Break { label }
                } else {
                    NodeData::Continue { label }
                };
                let idx = self.finish_node(pos, data);
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::TryKeyword => self.parse_try(pos),
            SyntaxKind::SwitchKeyword => self.parse_switch(pos),
            SyntaxKind::SynchronizedKeyword => {
                self.next_token();
                let lock = self.parse_paren_condition();
                let body = self.parse_block();
                self.finish_node(pos, NodeData::Synchronized { lock, body })
            }
            SyntaxKind::AssertKeyword => {
                self.next_token();
                let cond = self.parse_expression();
                let detail = if self.parse_optional(SyntaxKind::Colon) {
                    self.parse_expression()
                } else {
                    NodeIndex::NONE
                };
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let idx = self.finish_node(pos, NodeData::Assert { cond, detail });
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::Identifier if self.token_text() == "yield" && self.is_yield_statement() => {
                self.next_token();
                let expr = self.parse_expression();
                let complete = self.parse_expected(SyntaxKind::Semicolon);
                let idx = self.finish_node(pos, NodeData::Yield { expr });
                self.recovered_unless(idx, complete)
            }
            SyntaxKind::Identifier
                if self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::Colon)
                }) =>
            {
                let label = self.scanner.token_atom();
                self.next_token();
                self.next_token();
                let body = self.parse_statement();
                self.finish_node(pos, NodeData::Labeled { label, body })
            }
            SyntaxKind::ElseKeyword
            | SyntaxKind::CatchKeyword
            | SyntaxKind::FinallyKeyword
            | SyntaxKind::CaseKeyword
            | SyntaxKind::DefaultKeyword => {
                self.error_at_current(codes::ILLEGAL_START_OF_EXPR, Vec::new());
                self.next_token();
                self.erroneous(pos, Vec::new())
            }
            _ => self.parse_expression_statement(pos),
        };
        self.exit_recursion();
        stmt
    }

    fn recovered_unless(&mut self, idx: NodeIndex, complete: bool) -> NodeIndex {
        if !complete {
            self.mark_recovered(idx);
        }
        idx
    }

    fn is_yield_statement(&mut self) -> bool {
        self.look_ahead(|p| {
            p.next_token();
            !matches!(
                p.token(),
                SyntaxKind::Eq | SyntaxKind::Dot | SyntaxKind::OpenParen | SyntaxKind::Semicolon
            ) && !p.token().is_assignment_operator()
        })
    }

    /// An expression followed by `;`. A missing `;` flags the statement as
    /// recovered and suppresses the "not a statement" check.
    fn parse_expression_statement(&mut self, pos: u32) -> NodeIndex {
        let expr = self.parse_expression();
        let complete = self.parse_expected(SyntaxKind::Semicolon);
        let idx = self.finish_node(pos, NodeData::ExprStatement { expr });
        if !complete {
            self.mark_recovered(idx);
            return idx;
        }
        let is_statement_expression = self.arena.get(expr).is_some_and(|n| {
            n.is_recovered()
                || matches!(
                    n.data,
                    NodeData::Assign { .. }
                        | NodeData::MethodCall { .. }
                        | NodeData::NewClass { .. }
                        | NodeData::Erroneous { .. }
                ) || matches!(
                    n.data,
                    NodeData::Unary { op, .. }
                        if op == SyntaxKind::PlusPlus || op == SyntaxKind::MinusMinus
                )
        });
        if !is_statement_expression {
            let (start, end) = self.arena.pos_end(expr).unwrap_or((pos, pos));
            self.error_at(start, end - start, codes::NOT_STMT, Vec::new());
            self.mark_recovered(idx);
        }
        idx
    }

    fn parse_paren_condition(&mut self) -> NodeIndex {
        self.parse_expected(SyntaxKind::OpenParen);
        let expr = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParen);
        expr
    }

    fn parse_if(&mut self, pos: u32) -> NodeIndex {
        self.next_token();
        let cond = self.parse_paren_condition();
        let then_stmt = self.parse_statement();
        let else_stmt = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statement()
        } else {
            NodeIndex::NONE
        };
        self.finish_node(
            pos,
            NodeData::If {
                cond,
                then_stmt,
                else_stmt,
            },
        )
    }

    fn parse_for(&mut self, pos: u32) -> NodeIndex {
        self.next_token();
        self.parse_expected(SyntaxKind::OpenParen);

        let foreach = self.look_ahead(|p| {
            p.parse_modifiers();
            if p.is_contextual("var") {
                p.next_token();
            } else if !p.skip_type() {
                return false;
            }
            p.parse_optional(SyntaxKind::Identifier) && p.is_token(SyntaxKind::Colon)
        });
        if foreach {
            let var_pos = self.token_pos();
            let modifiers = self.parse_modifiers();
            let (var_type, implicit) = self.parse_local_type();
            let (name, name_pos, _) = self.parse_identifier();
            let var = self.finish_node(
                var_pos,
                NodeData::VarDecl {
                    kind: VarKind::ForEach,
                    modifiers,
                    var_type,
                    name,
                    name_pos,
                    extra_dims: 0,
                    init: NodeIndex::NONE,
                },
            );
            if implicit {
                self.arena.add_flags(var, NodeFlags::IMPLICIT_TYPE);
            }
            self.parse_expected(SyntaxKind::Colon);
            let expr = self.parse_expression();
            self.parse_expected(SyntaxKind::CloseParen);
            let body = self.parse_statement();
            return self.finish_node(pos, NodeData::ForEach { var, expr, body });
        }

        let mut init = NodeList::new();
        if !self.is_token(SyntaxKind::Semicolon) {
            let init_pos = self.token_pos();
            if self.is_local_variable_start()
                || self.is_token(SyntaxKind::FinalKeyword)
                || self.is_token(SyntaxKind::At)
            {
                // The fragments consume the `;`.
                let modifiers = self.parse_modifiers();
                self.parse_local_variable_rest(init_pos, modifiers, &mut init);
            } else {
                init = self.parse_expression_list(SyntaxKind::Semicolon);
                self.parse_expected(SyntaxKind::Semicolon);
            }
        } else {
            self.next_token();
        }
        let cond = if self.is_token(SyntaxKind::Semicolon) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::Semicolon);
        let update = if self.is_token(SyntaxKind::CloseParen) {
            NodeList::new()
        } else {
            self.parse_expression_list(SyntaxKind::CloseParen)
        };
        self.parse_expected(SyntaxKind::CloseParen);
        let body = self.parse_statement();
        self.finish_node(
            pos,
            NodeData::For {
                init,
                cond,
                update,
                body,
            },
        )
    }

    /// Comma-separated expression statements (for-loop init/update).
    fn parse_expression_list(&mut self, terminator: SyntaxKind) -> NodeList {
        let mut out = NodeList::new();
        loop {
            let pos = self.token_pos();
            let expr = self.parse_expression();
            out.push(self.finish_node(pos, NodeData::ExprStatement { expr }));
            if self.is_token(terminator) || !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        out
    }

    fn parse_try(&mut self, pos: u32) -> NodeIndex {
        self.next_token();
        let mut resources = NodeList::new();
        if self.parse_optional(SyntaxKind::OpenParen) {
            while !self.is_token(SyntaxKind::CloseParen) && !self.is_token(SyntaxKind::EndOfFile) {
                let res_pos = self.token_pos();
                let is_decl = self.look_ahead(|p| {
                    p.parse_modifiers();
                    if p.is_contextual("var") {
                        p.next_token();
                    } else if !p.skip_type() {
                        return false;
                    }
                    p.parse_optional(SyntaxKind::Identifier) && p.is_token(SyntaxKind::Eq)
                });
                if is_decl {
                    let modifiers = self.parse_modifiers();
                    let (var_type, implicit) = self.parse_local_type();
                    let (name, name_pos, _) = self.parse_identifier();
                    self.parse_expected(SyntaxKind::Eq);
                    let init = self.parse_expression();
                    let res = self.finish_node(
                        res_pos,
                        NodeData::VarDecl {
                            kind: VarKind::Resource,
                            modifiers,
                            var_type,
                            name,
                            name_pos,
                            extra_dims: 0,
                            init,
                        },
                    );
                    if implicit {
                        self.arena.add_flags(res, NodeFlags::IMPLICIT_TYPE);
                    }
                    resources.push(res);
                } else {
                    resources.push(self.parse_expression());
                }
                if !self.parse_optional(SyntaxKind::Semicolon) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseParen);
        }
        let body = self.parse_block();
        let mut catches = NodeList::new();
        while self.is_token(SyntaxKind::CatchKeyword) {
            let catch_pos = self.token_pos();
            self.next_token();
            self.parse_expected(SyntaxKind::OpenParen);
            let param_pos = self.token_pos();
            let modifiers = self.parse_modifiers();
            let type_pos = self.token_pos();
            let first = self.parse_type();
            let var_type = if self.is_token(SyntaxKind::Bar) {
                let mut alternatives = vec![first];
                while self.parse_optional(SyntaxKind::Bar) {
                    alternatives.push(self.parse_type());
                }
                self.finish_node(type_pos, NodeData::UnionType { alternatives })
            } else {
                first
            };
            let (name, name_pos, _) = self.parse_identifier();
            let param = self.finish_node(
                param_pos,
                NodeData::VarDecl {
                    kind: VarKind::CatchParam,
                    modifiers,
                    var_type,
                    name,
                    name_pos,
                    extra_dims: 0,
                    init: NodeIndex::NONE,
                },
            );
            self.parse_expected(SyntaxKind::CloseParen);
            let catch_body = self.parse_block();
            catches.push(self.finish_node(
                catch_pos,
                NodeData::Catch {
                    param,
                    body: catch_body,
                },
            ));
        }
        let finally = if self.parse_optional(SyntaxKind::FinallyKeyword) {
            self.parse_block()
        } else {
            NodeIndex::NONE
        };
        let idx = self.finish_node(
            pos,
            NodeData::Try {
                resources,
                body,
                catches,
                finally,
            },
        );
        if catches_missing(&self.arena, idx) {
            self.error_expected("'catch' or 'finally'");
            self.mark_recovered(idx);
        }
        idx
    }

    fn parse_switch(&mut self, pos: u32) -> NodeIndex {
        self.next_token();
        let selector = self.parse_paren_condition();
        let mut cases = NodeList::new();
        let opened = self.parse_expected(SyntaxKind::OpenBrace);
        while opened && !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            let case_pos = self.token_pos();
            let mut labels = NodeList::new();
            let is_default = if self.parse_optional(SyntaxKind::DefaultKeyword) {
                true
            } else if self.parse_optional(SyntaxKind::CaseKeyword) {
                loop {
                    if self.is_token(SyntaxKind::DefaultKeyword) {
                        self.next_token();
                        break;
                    }
                    labels.push(self.parse_ternary_operand());
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
                false
            } else {
                self.error_expected("'case', 'default', or '}'");
                self.next_token();
                continue;
            };
            let is_arrow = self.parse_optional(SyntaxKind::Arrow);
            if !is_arrow {
                self.parse_expected(SyntaxKind::Colon);
            }
            let mut statements = NodeList::new();
            if is_arrow {
                if self.is_token(SyntaxKind::OpenBrace) || self.is_token(SyntaxKind::ThrowKeyword) {
                    statements.push(self.parse_statement());
                } else {
                    let expr_pos = self.token_pos();
                    statements.push(self.parse_expression_statement(expr_pos));
                }
            } else {
                self.parse_block_statements(&mut statements, true);
            }
            cases.push(self.finish_node(
                case_pos,
                NodeData::Case {
                    labels,
                    statements,
                    is_default,
                    is_arrow,
                },
            ));
        }
        let closed = opened && self.parse_expected(SyntaxKind::CloseBrace);
        let idx = self.finish_node(pos, NodeData::Switch { selector, cases });
        self.recovered_unless(idx, closed)
    }
}

fn catches_missing(arena: &super::NodeArena, idx: NodeIndex) -> bool {
    matches!(
        arena.data(idx),
        Some(NodeData::Try { resources, catches, finally, .. })
            if resources.is_empty() && catches.is_empty() && finally.is_none()
    )
}

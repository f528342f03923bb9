//! Parser state - compilation units, type declarations and members.

use jbridge_common::diagnostics::codes;
use jbridge_scanner::SyntaxKind;

use super::node::{
    ClassKind, DirectiveKind, ModifierFlags, NodeData, NodeFlags, NodeIndex, NodeList, VarKind,
};
use super::state::ParserState;

impl ParserState {
    // =========================================================================
    // Compilation unit
    // =========================================================================

    pub fn parse_compilation_unit(&mut self) -> NodeIndex {
        self.next_token();

        let mut package = NodeIndex::NONE;
        let mut imports = NodeList::new();
        let mut types = NodeList::new();
        let mut module = NodeIndex::NONE;

        // Annotations before `package` belong to the package declaration.
        let leading = self.save();
        let doc = self.scanner.doc_comment().cloned();
        let annotations = self.parse_annotations();
        if self.is_token(SyntaxKind::PackageKeyword) {
            let pos = leading_pos(&annotations, self);
            package = self.parse_package_decl(pos, annotations);
            if let Some(doc) = doc {
                self.arena.set_doc_comment(package, doc);
            }
        } else {
            self.restore(leading);
        }

        while self.is_token(SyntaxKind::ImportKeyword) {
            imports.push(self.parse_import());
            while self.parse_optional(SyntaxKind::Semicolon) {}
        }

        while !self.is_token(SyntaxKind::EndOfFile) {
            if self.parse_optional(SyntaxKind::Semicolon) {
                continue;
            }
            if self.is_token(SyntaxKind::ImportKeyword) {
                // Misplaced import: keep it so names still resolve.
                self.error_at_current(codes::TYPE_DECL_EXPECTED, Vec::new());
                imports.push(self.parse_import());
                continue;
            }
            if module.is_none() && self.at_module_declaration() {
                module = self.parse_module_decl();
                continue;
            }
            let start = self.token_pos();
            let decl = self.parse_type_declaration();
            if decl.is_some() {
                types.push(decl);
            }
            if self.token_pos() == start && !self.is_token(SyntaxKind::EndOfFile) {
                self.next_token();
            }
        }

        let end = self.token_pos();
        let root = self.arena.add(
            0,
            end,
            NodeData::CompilationUnit {
                package,
                imports,
                types,
                module,
            },
        );
        self.arena.link_parents(root);
        root
    }

    fn parse_package_decl(&mut self, pos: u32, annotations: NodeList) -> NodeIndex {
        self.next_token();
        let name = self.parse_qualified_name();
        self.parse_expected(SyntaxKind::Semicolon);
        self.finish_node(pos, NodeData::PackageDecl { annotations, name })
    }

    fn parse_import(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let is_static = self.parse_optional(SyntaxKind::StaticKeyword);
        let name_pos = self.token_pos();
        let (first, _, _) = self.parse_identifier();
        let mut name = self.finish_node(name_pos, NodeData::Ident { name: first });
        let mut on_demand = false;
        while self.parse_optional(SyntaxKind::Dot) {
            if self.parse_optional(SyntaxKind::Star) {
                on_demand = true;
                break;
            }
            let (member, member_pos, _) = self.parse_identifier();
            name = self.finish_node(
                name_pos,
                NodeData::FieldAccess {
                    target: name,
                    name: member,
                    name_pos: member_pos,
                },
            );
        }
        let complete = self.parse_expected(SyntaxKind::Semicolon);
        let idx = self.finish_node(
            pos,
            NodeData::Import {
                is_static,
                on_demand,
                name,
            },
        );
        if !complete {
            self.mark_recovered(idx);
        }
        idx
    }

    /// `a.b.c` as an `Ident`/`FieldAccess` chain.
    pub(crate) fn parse_qualified_name(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let (first, _, _) = self.parse_identifier();
        let mut name = self.finish_node(pos, NodeData::Ident { name: first });
        while self.is_token(SyntaxKind::Dot) {
            self.next_token();
            let (member, member_pos, _) = self.parse_identifier();
            name = self.finish_node(
                pos,
                NodeData::FieldAccess {
                    target: name,
                    name: member,
                    name_pos: member_pos,
                },
            );
        }
        name
    }

    // =========================================================================
    // Modifiers and annotations
    // =========================================================================

    pub(crate) fn parse_annotations(&mut self) -> NodeList {
        let mut out = NodeList::new();
        while self.is_token(SyntaxKind::At)
            && !self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::InterfaceKeyword)
            })
        {
            out.push(self.parse_annotation());
        }
        out
    }

    pub(crate) fn parse_annotation(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.next_token();
        let annotation_type = self.parse_qualified_name();
        let mut args = NodeList::new();
        let has_parens = self.parse_optional(SyntaxKind::OpenParen);
        if has_parens {
            if !self.is_token(SyntaxKind::CloseParen) {
                let named = self.is_token(SyntaxKind::Identifier)
                    && self.look_ahead(|p| {
                        p.next_token();
                        p.is_token(SyntaxKind::Eq)
                    });
                if named {
                    loop {
                        let pair_pos = self.token_pos();
                        let (name, _, _) = self.parse_identifier();
                        let target = self.finish_node(pair_pos, NodeData::Ident { name });
                        self.parse_expected(SyntaxKind::Eq);
                        let value = self.parse_element_value();
                        args.push(self.finish_node(
                            pair_pos,
                            NodeData::Assign {
                                op: SyntaxKind::Eq,
                                target,
                                value,
                            },
                        ));
                        if !self.parse_optional(SyntaxKind::Comma) {
                            break;
                        }
                    }
                } else {
                    args.push(self.parse_element_value());
                }
            }
            self.parse_expected(SyntaxKind::CloseParen);
        }
        self.finish_node(
            pos,
            NodeData::Annotation {
                annotation_type,
                args,
                has_parens,
            },
        )
    }

    fn parse_element_value(&mut self) -> NodeIndex {
        match self.token() {
            SyntaxKind::At => self.parse_annotation(),
            SyntaxKind::OpenBrace => {
                let pos = self.token_pos();
                self.next_token();
                let mut elements = NodeList::new();
                while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
                    elements.push(self.parse_element_value());
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseBrace);
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
            _ => self.parse_conditional_expression(),
        }
    }

    /// Modifier keywords and annotations in any order. Always returns a
    /// `Modifiers` node; an empty one is zero-width at the current token.
    pub(crate) fn parse_modifiers(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let mut flags = ModifierFlags::empty();
        let mut annotations = NodeList::new();
        loop {
            let kind = self.token();
            if let Some(flag) = ModifierFlags::from_keyword(kind) {
                // `default` inside a switch is not a modifier, but switch
                // bodies never reach here.
                flags |= flag;
                self.next_token();
                continue;
            }
            if kind == SyntaxKind::At
                && !self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::InterfaceKeyword)
                })
            {
                annotations.push(self.parse_annotation());
                continue;
            }
            if self.is_contextual("sealed") && self.look_ahead(|p| {
                p.next_token();
                p.at_type_declaration_start() || p.token().is_modifier()
            }) {
                flags |= ModifierFlags::SEALED;
                self.next_token();
                continue;
            }
            if self.is_contextual("non")
                && self.look_ahead(|p| {
                    p.next_token();
                    if !p.parse_optional(SyntaxKind::Minus) {
                        return false;
                    }
                    p.is_contextual("sealed")
                })
            {
                self.next_token();
                self.next_token();
                self.next_token();
                flags |= ModifierFlags::NON_SEALED;
                continue;
            }
            break;
        }
        let end = if flags.is_empty() && annotations.is_empty() {
            pos
        } else {
            self.prev_end()
        };
        self.arena.add(pos, end, NodeData::Modifiers { flags, annotations })
    }

    fn at_type_declaration_start(&mut self) -> bool {
        match self.token() {
            SyntaxKind::ClassKeyword | SyntaxKind::InterfaceKeyword | SyntaxKind::EnumKeyword => true,
            SyntaxKind::At => self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::InterfaceKeyword)
            }),
            SyntaxKind::Identifier if self.token_text() == "record" => self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::Identifier)
            }),
            _ => false,
        }
    }

    // =========================================================================
    // Type declarations
    // =========================================================================

    /// Parse a top-level type declaration. Returns `NONE` (after reporting)
    /// when no declaration starts here.
    fn parse_type_declaration(&mut self) -> NodeIndex {
        let doc = self.scanner.doc_comment().cloned();
        let pos = self.token_pos();
        let modifiers = self.parse_modifiers();
        if !self.at_type_declaration_start() {
            self.error_at_current(codes::TYPE_DECL_EXPECTED, Vec::new());
            self.skip_to_type_declaration();
            return NodeIndex::NONE;
        }
        let decl = self.parse_class_declaration(pos, modifiers);
        if let Some(doc) = doc {
            self.arena.set_doc_comment(decl, doc);
        }
        decl
    }

    fn skip_to_type_declaration(&mut self) {
        loop {
            if self.is_token(SyntaxKind::EndOfFile)
                || self.token().is_modifier()
                || self.at_type_declaration_start()
            {
                return;
            }
            if self.is_token(SyntaxKind::OpenBrace) {
                self.skip_braces();
                continue;
            }
            self.next_token();
        }
    }

    /// Parse a class, interface, enum, annotation type or record after its
    /// modifiers.
    pub(crate) fn parse_class_declaration(&mut self, pos: u32, modifiers: NodeIndex) -> NodeIndex {
        let kind = match self.token() {
            SyntaxKind::ClassKeyword => ClassKind::Class,
            SyntaxKind::InterfaceKeyword => ClassKind::Interface,
            SyntaxKind::EnumKeyword => ClassKind::Enum,
            SyntaxKind::At => {
                self.next_token();
                ClassKind::Annotation
            }
            _ => ClassKind::Record,
        };
        self.next_token();
        let (name, name_pos, named) = self.parse_identifier();
        let type_params = self.parse_type_parameters();

        let mut components = NodeList::new();
        if kind == ClassKind::Record && self.parse_optional(SyntaxKind::OpenParen) {
            if !self.is_token(SyntaxKind::CloseParen) {
                loop {
                    components.push(self.parse_formal_parameter(VarKind::Field));
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
            }
            self.parse_expected(SyntaxKind::CloseParen);
        }

        let mut extends = NodeIndex::NONE;
        let mut implements = NodeList::new();
        if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            if kind == ClassKind::Interface {
                implements = self.parse_type_list();
            } else {
                extends = self.parse_type();
            }
        }
        if self.parse_optional(SyntaxKind::ImplementsKeyword) {
            implements.extend(self.parse_type_list());
        }
        let mut permits = NodeList::new();
        if self.is_contextual("permits") {
            self.next_token();
            permits = self.parse_type_list();
        }

        let (members, complete) = self.parse_class_body(kind, name);
        let idx = self.finish_node(
            pos,
            NodeData::ClassDecl {
                modifiers,
                kind,
                name,
                name_pos,
                type_params,
                extends,
                implements,
                permits,
                components,
                members,
            },
        );
        if !named || !complete {
            self.mark_recovered(idx);
        }
        idx
    }

    /// `{ members }`. Returns the members and whether the closing brace was found.
    pub(crate) fn parse_class_body(
        &mut self,
        kind: ClassKind,
        class_name: jbridge_common::Atom,
    ) -> (NodeList, bool) {
        let mut members = NodeList::new();
        if !self.parse_expected(SyntaxKind::OpenBrace) {
            return (members, false);
        }
        if !self.enter_recursion() {
            return (members, false);
        }
        if kind == ClassKind::Enum {
            self.parse_enum_constants(&mut members);
        }
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            if self.parse_optional(SyntaxKind::Semicolon) {
                continue;
            }
            let start = self.token_pos();
            self.parse_member(kind, class_name, &mut members);
            if self.token_pos() == start {
                self.error_at_current(codes::ILLEGAL_START_OF_TYPE, Vec::new());
                self.next_token();
            }
        }
        self.exit_recursion();
        let complete = self.parse_expected(SyntaxKind::CloseBrace);
        (members, complete)
    }

    fn parse_enum_constants(&mut self, members: &mut NodeList) {
        while self.is_token(SyntaxKind::Identifier) || self.is_token(SyntaxKind::At) {
            let doc = self.scanner.doc_comment().cloned();
            let pos = self.token_pos();
            let modifiers = self.parse_modifiers();
            let (name, name_pos, _) = self.parse_identifier();
            let mut args = NodeList::new();
            let has_args = self.is_token(SyntaxKind::OpenParen);
            if has_args {
                args = self.parse_arguments();
            }
            let mut body = NodeIndex::NONE;
            if self.is_token(SyntaxKind::OpenBrace) {
                body = self.parse_anonymous_body(ClassKind::Class);
            }
            let constant = self.finish_node(
                pos,
                NodeData::EnumConstant {
                    modifiers,
                    name,
                    name_pos,
                    args,
                    has_args,
                    body,
                },
            );
            if let Some(doc) = doc {
                self.arena.set_doc_comment(constant, doc);
            }
            members.push(constant);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        if !self.is_token(SyntaxKind::CloseBrace) {
            self.parse_expected(SyntaxKind::Semicolon);
        }
    }

    /// An anonymous class body as a nameless `ClassDecl`.
    pub(crate) fn parse_anonymous_body(&mut self, kind: ClassKind) -> NodeIndex {
        let pos = self.token_pos();
        let modifiers = self.arena.add(
            pos,
            pos,
            NodeData::Modifiers {
                flags: ModifierFlags::empty(),
                annotations: NodeList::new(),
            },
        );
        let name = jbridge_common::Atom::NONE;
        let (members, complete) = self.parse_class_body(kind, name);
        let idx = self.finish_node(
            pos,
            NodeData::ClassDecl {
                modifiers,
                kind,
                name,
                name_pos: pos,
                type_params: NodeList::new(),
                extends: NodeIndex::NONE,
                implements: NodeList::new(),
                permits: NodeList::new(),
                components: NodeList::new(),
                members,
            },
        );
        if !complete {
            self.mark_recovered(idx);
        }
        idx
    }

    fn parse_member(
        &mut self,
        owner_kind: ClassKind,
        class_name: jbridge_common::Atom,
        members: &mut NodeList,
    ) {
        let doc = self.scanner.doc_comment().cloned();
        let pos = self.token_pos();
        let modifiers = self.parse_modifiers();

        let member = if self.is_token(SyntaxKind::OpenBrace) {
            let is_static = self
                .arena
                .data(modifiers)
                .is_some_and(|d| matches!(d, NodeData::Modifiers { flags, .. } if flags.contains(ModifierFlags::STATIC)));
            self.parse_initializer(pos, is_static)
        } else if self.at_type_declaration_start() {
            self.parse_class_declaration(pos, modifiers)
        } else {
            let type_params = self.parse_type_parameters();
            if self.is_token(SyntaxKind::Identifier)
                && self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::OpenParen)
                })
            {
                let (name, name_pos, _) = self.parse_identifier();
                if name != class_name && !class_name.is_none() {
                    // Method without a return type.
                    let len = self.prev_end() - name_pos;
                    self.error_at(
                        name_pos,
                        len,
                        codes::EXPECTED,
                        vec!["<identifier>".to_string()],
                    );
                }
                self.parse_method_rest(
                    pos,
                    modifiers,
                    type_params,
                    NodeIndex::NONE,
                    name,
                    name_pos,
                    true,
                    owner_kind,
                )
            } else if self.token().is_primitive_type()
                || self.is_token(SyntaxKind::VoidKeyword)
                || self.is_token(SyntaxKind::Identifier)
                || self.is_token(SyntaxKind::At)
            {
                let member_type = self.parse_type();
                let (name, name_pos, named) = self.parse_identifier();
                if self.is_token(SyntaxKind::OpenParen) {
                    self.parse_method_rest(
                        pos,
                        modifiers,
                        type_params,
                        member_type,
                        name,
                        name_pos,
                        false,
                        owner_kind,
                    )
                } else {
                    let first = members.len();
                    self.parse_variable_fragments(
                        pos,
                        VarKind::Field,
                        modifiers,
                        member_type,
                        name,
                        name_pos,
                        members,
                    );
                    if !named {
                        for idx in &members[first..] {
                            self.arena.add_flags(*idx, NodeFlags::RECOVERED);
                        }
                    }
                    if let Some(doc) = doc
                        && let Some(first) = members.get(first)
                    {
                        self.arena.set_doc_comment(*first, doc);
                    }
                    return;
                }
            } else {
                return;
            }
        };
        if let Some(doc) = doc {
            self.arena.set_doc_comment(member, doc);
        }
        members.push(member);
    }

    fn parse_initializer(&mut self, pos: u32, is_static: bool) -> NodeIndex {
        let block = self.parse_body_block();
        if let Some(node) = self.arena.get_mut(block) {
            node.pos = pos;
            if let NodeData::Block { is_static: s, .. } = &mut node.data {
                *s = is_static;
            }
        }
        block
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_method_rest(
        &mut self,
        pos: u32,
        modifiers: NodeIndex,
        type_params: NodeList,
        return_type: NodeIndex,
        name: jbridge_common::Atom,
        name_pos: u32,
        is_constructor: bool,
        owner_kind: ClassKind,
    ) -> NodeIndex {
        let params = self.parse_formal_parameters();
        let extra_dims = self.parse_extra_dims();
        let throws = if self.parse_optional(SyntaxKind::ThrowsKeyword) {
            self.parse_type_list()
        } else {
            NodeList::new()
        };
        let mut default_value = NodeIndex::NONE;
        if owner_kind == ClassKind::Annotation && self.parse_optional(SyntaxKind::DefaultKeyword) {
            default_value = self.parse_element_value();
        }
        let mut complete = true;
        let body = if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_body_block()
        } else {
            complete = self.parse_expected(SyntaxKind::Semicolon);
            NodeIndex::NONE
        };
        let idx = self.finish_node(
            pos,
            NodeData::MethodDecl {
                modifiers,
                type_params,
                return_type,
                name,
                name_pos,
                params,
                extra_dims,
                throws,
                body,
                default_value,
                is_constructor,
            },
        );
        if !complete {
            self.mark_recovered(idx);
        }
        idx
    }

    /// A method or initializer body, skipped in bodies-ignored mode.
    fn parse_body_block(&mut self) -> NodeIndex {
        if !self.options.ignore_bodies {
            return self.parse_block();
        }
        let pos = self.token_pos();
        self.skip_braces();
        let idx = self.finish_node(
            pos,
            NodeData::Block {
                statements: NodeList::new(),
                is_static: false,
            },
        );
        self.arena.add_flags(idx, NodeFlags::BODY_SKIPPED);
        idx
    }

    pub(crate) fn parse_formal_parameters(&mut self) -> NodeList {
        let mut params = NodeList::new();
        self.parse_expected(SyntaxKind::OpenParen);
        if !self.is_token(SyntaxKind::CloseParen) {
            loop {
                if self.is_token(SyntaxKind::CloseParen) || self.is_token(SyntaxKind::EndOfFile) {
                    break;
                }
                params.push(self.parse_formal_parameter(VarKind::Param));
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::CloseParen);
        params
    }

    pub(crate) fn parse_formal_parameter(&mut self, kind: VarKind) -> NodeIndex {
        let pos = self.token_pos();
        let modifiers = self.parse_modifiers();
        let var_type = self.parse_type();
        let varargs = self.parse_optional(SyntaxKind::Ellipsis);
        // `this` receiver parameter
        let (name, name_pos, named) = if self.is_token(SyntaxKind::ThisKeyword) {
            let name_pos = self.token_pos();
            self.next_token();
            (self.intern("this"), name_pos, true)
        } else {
            self.parse_identifier()
        };
        let extra_dims = self.parse_extra_dims();
        let idx = self.finish_node(
            pos,
            NodeData::VarDecl {
                kind,
                modifiers,
                var_type,
                name,
                name_pos,
                extra_dims,
                init: NodeIndex::NONE,
            },
        );
        if varargs {
            self.arena.add_flags(idx, NodeFlags::VARARGS);
        }
        if !named {
            self.mark_recovered(idx);
        }
        idx
    }

    /// Parse `name [= init] (, name [= init])* ;` after the type. Each
    /// fragment becomes a `VarDecl` sharing `modifiers` and `var_type`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn parse_variable_fragments(
        &mut self,
        pos: u32,
        kind: VarKind,
        modifiers: NodeIndex,
        var_type: NodeIndex,
        first_name: jbridge_common::Atom,
        first_name_pos: u32,
        out: &mut NodeList,
    ) {
        let mut fragment_pos = pos;
        let mut name = first_name;
        let mut name_pos = first_name_pos;
        let mut follows = false;
        loop {
            let extra_dims = self.parse_extra_dims();
            let init = if self.parse_optional(SyntaxKind::Eq) {
                if self.is_token(SyntaxKind::OpenBrace) {
                    self.parse_array_initializer()
                } else {
                    self.parse_expression()
                }
            } else {
                NodeIndex::NONE
            };
            let idx = self.finish_node(
                fragment_pos,
                NodeData::VarDecl {
                    kind,
                    modifiers,
                    var_type,
                    name,
                    name_pos,
                    extra_dims,
                    init,
                },
            );
            if follows {
                self.arena.add_flags(idx, NodeFlags::FOLLOWS_FRAGMENT);
            }
            out.push(idx);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
            follows = true;
            fragment_pos = self.token_pos();
            let (next, next_pos, _) = self.parse_identifier();
            name = next;
            name_pos = next_pos;
        }
        if !self.parse_expected(SyntaxKind::Semicolon) {
            if let Some(last) = out.last() {
                self.mark_recovered(*last);
            }
        } else if let Some(last) = out.last() {
            let end = self.prev_end();
            self.arena.set_end(*last, end);
        }
    }

    // =========================================================================
    // Modules
    // =========================================================================

    fn at_module_declaration(&mut self) -> bool {
        self.look_ahead(|p| {
            p.parse_annotations();
            if p.is_contextual("open") {
                p.next_token();
            }
            if !p.is_contextual("module") {
                return false;
            }
            p.next_token();
            p.is_token(SyntaxKind::Identifier)
        })
    }

    fn parse_module_decl(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let annotations = self.parse_annotations();
        let is_open = self.is_contextual("open");
        if is_open {
            self.next_token();
        }
        self.next_token(); // module
        let name = self.parse_qualified_name();
        let mut directives = NodeList::new();
        self.parse_expected(SyntaxKind::OpenBrace);
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_token(SyntaxKind::EndOfFile) {
            let start = self.token_pos();
            if let Some(directive) = self.parse_module_directive() {
                directives.push(directive);
            }
            if self.token_pos() == start {
                self.error_at_current(codes::EXPECTED, vec!["'}'".to_string()]);
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace);
        self.finish_node(
            pos,
            NodeData::ModuleDecl {
                annotations,
                is_open,
                name,
                directives,
            },
        )
    }

    fn parse_module_directive(&mut self) -> Option<NodeIndex> {
        let pos = self.token_pos();
        let kind = match self.token_text() {
            "requires" => DirectiveKind::Requires,
            "exports" => DirectiveKind::Exports,
            "opens" => DirectiveKind::Opens,
            "uses" => DirectiveKind::Uses,
            "provides" => DirectiveKind::Provides,
            _ => return None,
        };
        if !self.is_token(SyntaxKind::Identifier) {
            return None;
        }
        self.next_token();
        let mut flags = ModifierFlags::empty();
        if kind == DirectiveKind::Requires {
            loop {
                if self.is_token(SyntaxKind::StaticKeyword) {
                    flags |= ModifierFlags::STATIC;
                    self.next_token();
                } else if self.is_contextual("transitive")
                    && self.look_ahead(|p| {
                        p.next_token();
                        p.is_token(SyntaxKind::Identifier)
                    })
                {
                    flags |= ModifierFlags::TRANSITIVE;
                    self.next_token();
                } else {
                    break;
                }
            }
        }
        let name = self.parse_qualified_name();
        let mut targets = NodeList::new();
        let separator = match kind {
            DirectiveKind::Exports | DirectiveKind::Opens => Some("to"),
            DirectiveKind::Provides => Some("with"),
            _ => None,
        };
        if let Some(word) = separator
            && self.is_contextual(word)
        {
            self.next_token();
            targets.push(self.parse_qualified_name());
            while self.parse_optional(SyntaxKind::Comma) {
                targets.push(self.parse_qualified_name());
            }
        }
        self.parse_expected(SyntaxKind::Semicolon);
        Some(self.finish_node(
            pos,
            NodeData::ModuleDirective {
                kind,
                flags,
                name,
                targets,
            },
        ))
    }
}

fn leading_pos(annotations: &NodeList, parser: &ParserState) -> u32 {
    annotations
        .first()
        .and_then(|idx| parser.arena.pos_end(*idx))
        .map_or_else(|| parser.token_pos(), |(pos, _)| pos)
}

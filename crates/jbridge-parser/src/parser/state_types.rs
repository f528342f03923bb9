//! Parser state - types, type arguments and type parameters.

use jbridge_common::diagnostics::codes;
use jbridge_scanner::SyntaxKind;

use super::node::{NodeData, NodeIndex, NodeList, WildcardBound};
use super::state::ParserState;

impl ParserState {
    /// Parse a type, including array dimensions.
    pub(crate) fn parse_type(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.skip_type_annotations();
        let base = if self.token().is_primitive_type() || self.is_token(SyntaxKind::VoidKeyword) {
            let kind = self.token();
            self.next_token();
            self.finish_node(pos, NodeData::PrimitiveType { kind })
        } else if self.is_token(SyntaxKind::Identifier) {
            self.parse_class_type()
        } else {
            self.error_at_current(codes::ILLEGAL_START_OF_TYPE, Vec::new());
            let name = self.error_name();
            let idx = self.arena.add(pos, pos, NodeData::Ident { name });
            self.mark_recovered(idx);
            return idx;
        };
        self.parse_array_dims(pos, base)
    }

    /// Wrap `base` in one `ArrayType` per `[]` pair.
    pub(crate) fn parse_array_dims(&mut self, pos: u32, mut base: NodeIndex) -> NodeIndex {
        while self.is_token(SyntaxKind::OpenBracket)
            && self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::CloseBracket)
            })
        {
            self.next_token();
            self.next_token();
            base = self.finish_node(pos, NodeData::ArrayType { elem: base });
        }
        base
    }

    /// Count trailing `[]` pairs (C-style dimensions after a name).
    pub(crate) fn parse_extra_dims(&mut self) -> u32 {
        let mut dims = 0;
        while self.is_token(SyntaxKind::OpenBracket) {
            self.next_token();
            self.parse_expected(SyntaxKind::CloseBracket);
            dims += 1;
        }
        dims
    }

    /// `A.B<C>.D` as an `Ident`/`FieldAccess` chain with parameterized parts.
    pub(crate) fn parse_class_type(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        let (name, _, _) = self.parse_identifier();
        let mut current = self.finish_node(pos, NodeData::Ident { name });
        loop {
            if self.is_token(SyntaxKind::Lt) {
                let args = self.parse_type_arguments();
                current = self.finish_node(pos, NodeData::ParameterizedType { base: current, args });
            }
            if self.is_token(SyntaxKind::Dot)
                && self.look_ahead(|p| {
                    p.next_token();
                    p.is_token(SyntaxKind::Identifier) || p.is_token(SyntaxKind::At)
                })
            {
                self.next_token();
                self.skip_type_annotations();
                let (name, name_pos, _) = self.parse_identifier();
                current = self.finish_node(
                    pos,
                    NodeData::FieldAccess {
                        target: current,
                        name,
                        name_pos,
                    },
                );
                continue;
            }
            return current;
        }
    }

    /// `<T, ? extends U>`; an empty list is the diamond.
    pub(crate) fn parse_type_arguments(&mut self) -> NodeList {
        let mut args = NodeList::new();
        self.parse_expected(SyntaxKind::Lt);
        if self.is_token(SyntaxKind::Gt) {
            self.next_token();
            return args;
        }
        loop {
            args.push(self.parse_type_argument());
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected_gt();
        args
    }

    fn parse_type_argument(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.skip_type_annotations();
        if !self.is_token(SyntaxKind::Question) {
            return self.parse_type();
        }
        self.next_token();
        let (bound_kind, bound) = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            (WildcardBound::Extends, self.parse_type())
        } else if self.parse_optional(SyntaxKind::SuperKeyword) {
            (WildcardBound::Super, self.parse_type())
        } else {
            (WildcardBound::Unbound, NodeIndex::NONE)
        };
        self.finish_node(pos, NodeData::Wildcard { bound_kind, bound })
    }

    /// `<T extends A & B, U>`
    pub(crate) fn parse_type_parameters(&mut self) -> NodeList {
        let mut params = NodeList::new();
        if !self.is_token(SyntaxKind::Lt) {
            return params;
        }
        self.next_token();
        loop {
            let pos = self.token_pos();
            let annotations = self.parse_annotations();
            let (name, name_pos, _) = self.parse_identifier();
            let mut bounds = NodeList::new();
            if self.parse_optional(SyntaxKind::ExtendsKeyword) {
                bounds.push(self.parse_type());
                while self.parse_optional(SyntaxKind::Amp) {
                    bounds.push(self.parse_type());
                }
            }
            params.push(self.finish_node(
                pos,
                NodeData::TypeParameter {
                    annotations,
                    name,
                    name_pos,
                    bounds,
                },
            ));
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected_gt();
        params
    }

    /// Comma-separated list of class types (`implements`, `throws`).
    pub(crate) fn parse_type_list(&mut self) -> NodeList {
        let mut types = vec![self.parse_type()];
        while self.parse_optional(SyntaxKind::Comma) {
            types.push(self.parse_type());
        }
        types
    }

    /// Type-use annotations are accepted and dropped.
    fn skip_type_annotations(&mut self) {
        while self.is_token(SyntaxKind::At)
            && !self.look_ahead(|p| {
                p.next_token();
                p.is_token(SyntaxKind::InterfaceKeyword)
            })
        {
            self.parse_annotation();
        }
    }
}

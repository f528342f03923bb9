//! Doc comment references.
//!
//! Only the reference-bearing tags are understood: `{@link}`,
//! `{@linkplain}`, `@see`, `@throws` and `@exception`. A reference has the
//! form `Type`, `Type#member`, `#member` or `Type#member(T1, T2)`.

use jbridge_binder::{SymbolId, TypeScope};
use jbridge_common::diagnostics::codes;
use jbridge_parser::{NodeData, NodeIndex};
use tracing::trace;

use crate::context::DocLint;
use crate::state::{AttrResult, CheckerState};

/// Tag introducing a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocTag {
    Link,
    LinkPlain,
    See,
    Throws,
}

/// One reference found in a doc comment. Offsets are absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocReference {
    pub tag: DocTag,
    pub text: String,
    pub start: u32,
    pub end: u32,
    /// Type part and its start offset.
    pub type_name: Option<(String, u32)>,
    /// Member part (after `#`) and its start offset.
    pub member: Option<(String, u32)>,
    /// Parameter count when the member has a parameter list.
    pub param_count: Option<usize>,
}

const TAGS: &[(&str, DocTag)] = &[
    ("{@linkplain", DocTag::LinkPlain),
    ("{@link", DocTag::Link),
    ("@see", DocTag::See),
    ("@throws", DocTag::Throws),
    ("@exception", DocTag::Throws),
];

/// Find the references in the text of a doc comment starting at `base`.
pub fn parse_doc_references(text: &str, base: u32) -> Vec<DocReference> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let Some(&(tag_text, tag)) = TAGS.iter().find(|(t, _)| bytes[i..].starts_with(t.as_bytes())) else {
            i += 1;
            continue;
        };
        let after = i + tag_text.len();
        let preceded_ok = tag_text.starts_with('{') || i == 0 || !is_ident_byte(bytes[i - 1]);
        let followed_ok = bytes.get(after).is_some_and(|b| b.is_ascii_whitespace());
        i = after;
        if !preceded_ok || !followed_ok {
            continue;
        }
        let mut start = after;
        while start < bytes.len() && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        // `@see "text"` and `@see <a href>` carry no reference.
        if matches!(bytes.get(start), Some(b'"' | b'<') | None) {
            continue;
        }
        let end = reference_end(bytes, start);
        if end > start {
            out.push(split_reference(tag, &text[start..end], base + start as u32));
        }
        i = end.max(i);
    }
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// End of a reference: whitespace or `}` outside a parameter list.
fn reference_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0u32;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            b'}' if depth == 0 => return i,
            b if b.is_ascii_whitespace() && depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    i
}

fn split_reference(tag: DocTag, text: &str, start: u32) -> DocReference {
    let (type_part, member_part) = match text.split_once('#') {
        Some((ty, member)) => (ty, Some(member)),
        None => (text, None),
    };
    let type_name = (!type_part.is_empty()).then(|| (type_part.to_string(), start));
    let mut param_count = None;
    let member = member_part.map(|member| {
        let offset = start + type_part.len() as u32 + 1;
        match member.split_once('(') {
            Some((name, params)) => {
                let params = params.trim_end_matches(')').trim();
                param_count = Some(if params.is_empty() {
                    0
                } else {
                    params.split(',').count()
                });
                (name.to_string(), offset)
            }
            None => (member.to_string(), offset),
        }
    });
    DocReference {
        tag,
        text: text.to_string(),
        start,
        end: start + text.len() as u32,
        type_name,
        member,
        param_count,
    }
}

impl CheckerState<'_> {
    /// Check the references of a declaration's doc comment when doc
    /// comment checking is on.
    pub(crate) fn check_doc_comment(&mut self, decl: NodeIndex) -> AttrResult<()> {
        if self.ctx.options.doclint == DocLint::None {
            return Ok(());
        }
        self.attrib_doc_references(decl, true)
    }

    /// Resolve the references of the doc comment attached to `decl`,
    /// recording their symbols. Unresolved references are reported only
    /// when `report` is set.
    pub fn attrib_doc_references(&mut self, decl: NodeIndex, report: bool) -> AttrResult<()> {
        let tree = self.tree.clone();
        let Some(comment) = tree.arena.doc_comment(decl) else {
            return Ok(());
        };
        let refs = parse_doc_references(comment.get_text(&tree.source), comment.pos);
        if refs.is_empty() {
            return Ok(());
        }
        let context = self.doc_context_class(decl);
        let scope = TypeScope::for_class(self.unit, context);
        for reference in refs {
            let class = match &reference.type_name {
                Some((name, pos)) => match self.resolve_doc_type(&scope, name)? {
                    Some(sym) => {
                        self.ctx.record_doc_symbol(self.unit, *pos, sym);
                        Some(sym)
                    }
                    None => {
                        if report {
                            self.report_doc_ref(&reference);
                        }
                        continue;
                    }
                },
                None => context.is_some().then_some(context),
            };
            let (Some((member, pos)), Some(class)) = (&reference.member, class) else {
                continue;
            };
            match self.resolve_doc_member(class, member, reference.param_count)? {
                Some(sym) => self.ctx.record_doc_symbol(self.unit, *pos, sym),
                None if report => self.report_doc_ref(&reference),
                None => {}
            }
        }
        Ok(())
    }

    /// Attribute the doc comment containing `offset`, if any, without
    /// reporting. Returns whether one was found.
    pub fn attrib_doc_comment_at(&mut self, offset: u32) -> AttrResult<bool> {
        let tree = self.tree.clone();
        let found = tree
            .arena
            .doc_comments()
            .into_iter()
            .find(|(_, c)| c.pos < offset && offset < c.end)
            .map(|(decl, _)| decl);
        let Some(decl) = found else {
            return Ok(false);
        };
        trace!(offset, "attributing doc comment at focal point");
        self.attrib_doc_references(decl, false)?;
        Ok(true)
    }

    fn report_doc_ref(&mut self, reference: &DocReference) {
        self.report(
            reference.start,
            reference.end,
            codes::DOC_REF_NOT_FOUND,
            vec![reference.text.clone()],
        );
    }

    /// Class in whose scope a doc comment's names are resolved: the
    /// documented class itself, or the class declaring the member.
    fn doc_context_class(&self, decl: NodeIndex) -> SymbolId {
        let arena = &self.tree.arena;
        let class_node = if matches!(arena.data(decl), Some(NodeData::ClassDecl { .. })) {
            Some(decl)
        } else {
            arena.find_ancestor(decl, |n| matches!(n.data, NodeData::ClassDecl { .. }))
        };
        class_node
            .and_then(|n| self.ctx.table.symbol_at(self.unit, n))
            .unwrap_or(SymbolId::NONE)
    }

    fn resolve_doc_type(&mut self, scope: &TypeScope, name: &str) -> AttrResult<Option<SymbolId>> {
        let mut segments = name.split('.');
        let first = segments.next().unwrap_or_default();
        let atom = self.ctx.table.intern(first);
        if let Some(mut sym) = self.ctx.table.find_type(scope, atom)? {
            for segment in segments {
                let atom = self.ctx.table.intern(segment);
                match self.ctx.table.find_member_type(sym, atom)? {
                    Some(member) => sym = member,
                    None => return Ok(None),
                }
            }
            return Ok(Some(sym));
        }
        if name.contains('.') {
            return self.ctx.table.load_class(name);
        }
        Ok(None)
    }

    fn resolve_doc_member(&mut self, class: SymbolId, member: &str, param_count: Option<usize>) -> AttrResult<Option<SymbolId>> {
        let atom = self.ctx.table.intern(member);
        if param_count.is_none()
            && let Some(field) = self.ctx.table.find_field(class, atom)?
        {
            return Ok(Some(field));
        }
        let is_ctor = self.ctx.table.symbol_name(class).as_ref() == member;
        let candidates = if is_ctor {
            self.ctx.table.constructors(class)?
        } else {
            self.ctx.table.find_methods(class, atom)?
        };
        Ok(candidates
            .into_iter()
            .find(|&m| param_count.is_none_or(|n| self.ctx.table.param_types(m).len() == n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_and_see() {
        let text = "/** Uses {@link List#add(Object, int)} and\n * @see Map\n */";
        let refs = parse_doc_references(text, 100);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].tag, DocTag::Link);
        assert_eq!(refs[0].text, "List#add(Object, int)");
        assert_eq!(refs[0].type_name, Some(("List".to_string(), 116)));
        assert_eq!(refs[0].member, Some(("add".to_string(), 121)));
        assert_eq!(refs[0].param_count, Some(2));
        assert_eq!(refs[1].tag, DocTag::See);
        assert_eq!(refs[1].text, "Map");
    }

    #[test]
    fn test_member_only_and_plain_text_see() {
        let refs = parse_doc_references("/** @see \"The book\" {@link #size} @throws IOException if bad */", 0);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].type_name, None);
        assert_eq!(refs[0].member.as_ref().map(|(m, _)| m.as_str()), Some("size"));
        assert_eq!(refs[0].param_count, None);
        assert_eq!(refs[1].tag, DocTag::Throws);
        assert_eq!(refs[1].text, "IOException");
    }

    #[test]
    fn test_tag_inside_word_is_ignored() {
        assert!(parse_doc_references("/** mail@seeker.org */", 0).is_empty());
    }
}

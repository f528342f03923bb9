//! Comment nodes of a host compilation unit.

use jbridge_common::{CommentRange, CommentStyle};
use serde::Serialize;

use crate::node::AstId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CommentKind {
    Line,
    Block,
    /// `/** ... */`
    Javadoc,
}

impl From<CommentStyle> for CommentKind {
    fn from(style: CommentStyle) -> Self {
        match style {
            CommentStyle::Line => CommentKind::Line,
            CommentStyle::Block => CommentKind::Block,
            CommentStyle::DocBlock | CommentStyle::DocLine => CommentKind::Javadoc,
        }
    }
}

/// A comment with its owning node: the innermost node whose range encloses
/// it, or the declaration a doc comment documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub kind: CommentKind,
    pub start: u32,
    pub length: u32,
    pub owner: AstId,
}

impl Comment {
    pub fn from_range(range: &CommentRange, owner: AstId) -> Self {
        Comment {
            kind: CommentKind::from(range.style),
            start: range.pos,
            length: range.end.saturating_sub(range.pos),
            owner,
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn is_doc(&self) -> bool {
        self.kind == CommentKind::Javadoc
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start as usize..self.end() as usize)
            .unwrap_or("")
    }
}

//! Working-copy overlay.
//!
//! Open, modified editor buffers shadow the files they belong to. Before a
//! batch is compiled the open copies are matched against the batch's units:
//!
//! - a file unit with exactly one matching copy is compiled from that copy;
//! - a unit carrying its own text (a buffer or a virtual source) keeps it,
//!   and copies with the same identity are dropped;
//! - when several copies claim the same identity, all of them are dropped
//!   and the unit is read from disk.
//!
//! Copies that match no unit are served to the session from an in-memory
//! classpath entry placed ahead of every other entry.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use jbridge_binder::{ClasspathEntry, EntryKind};
use tracing::{debug, warn};

use crate::project::Project;
use crate::source::{SourceDescriptor, SourceId, normalize_path};

/// Name of the classpath entry serving unmatched working copies.
pub const WORKING_COPY_ENTRY: &str = "<working copies>";

/// An open, possibly unsaved buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingCopy {
    pub path: PathBuf,
    pub text: Arc<str>,
}

impl WorkingCopy {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        WorkingCopy {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> SourceId {
        Arc::from(normalize_path(&self.path))
    }
}

/// Working copies after matching against one batch.
#[derive(Debug, Default)]
pub struct Overlay {
    /// Text to compile for file units shadowed by exactly one copy.
    shadowed: IndexMap<SourceId, Arc<str>>,
    /// Copies of files outside the batch, by classpath-relative path.
    extra: IndexMap<String, Arc<str>>,
}

impl Overlay {
    pub fn build(copies: &[WorkingCopy], units: &[SourceDescriptor], project: Option<&Project>) -> Overlay {
        let mut by_id: IndexMap<SourceId, Vec<&WorkingCopy>> = IndexMap::new();
        for copy in copies {
            by_id.entry(copy.id()).or_default().push(copy);
        }

        let mut overlay = Overlay::default();
        for unit in units {
            let id = unit.id();
            let Some(matching) = by_id.shift_remove(&id) else {
                continue;
            };
            if unit.own_text().is_some() {
                debug!(unit = %id, copies = matching.len(), "unit text wins over working copies");
                continue;
            }
            match matching.as_slice() {
                [only] => {
                    overlay.shadowed.insert(id, only.text.clone());
                }
                many => {
                    warn!(unit = %id, copies = many.len(), "ambiguous working copies dropped");
                }
            }
        }

        for (id, matching) in by_id {
            if matching.len() > 1 {
                warn!(path = %id, copies = matching.len(), "ambiguous working copies dropped");
                continue;
            }
            let relative = project.and_then(|p| p.relative_path(&matching[0].path));
            match relative {
                Some(rel) => {
                    overlay.extra.insert(rel, matching[0].text.clone());
                }
                None => debug!(path = %id, "working copy outside every source root ignored"),
            }
        }
        overlay
    }

    /// Text a file unit is compiled from, when a working copy shadows it.
    pub fn text_for(&self, id: &str) -> Option<&Arc<str>> {
        self.shadowed.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.shadowed.is_empty() && self.extra.is_empty()
    }

    /// In-memory entry serving the copies that shadow files outside the
    /// batch.
    pub fn classpath_entry(&self) -> Option<ClasspathEntry> {
        if self.extra.is_empty() {
            return None;
        }
        let files = self.extra.iter().map(|(k, v)| (k.clone(), v.clone()));
        Some(ClasspathEntry::in_memory(WORKING_COPY_ENTRY, files).with_kind(EntryKind::Project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_copy_shadows_file_unit() {
        let units = [SourceDescriptor::file("src/p/A.java")];
        let copies = [WorkingCopy::new("src/p/A.java", "class A { int edited; }")];
        let overlay = Overlay::build(&copies, &units, None);
        assert_eq!(
            overlay.text_for("src/p/A.java").map(|t| t.as_ref()),
            Some("class A { int edited; }")
        );
    }

    #[test]
    fn test_ambiguous_copies_are_dropped() {
        let units = [SourceDescriptor::file("src/p/A.java")];
        let copies = [
            WorkingCopy::new("src/p/A.java", "class A { int one; }"),
            WorkingCopy::new("./src/p/A.java", "class A { int two; }"),
        ];
        let overlay = Overlay::build(&copies, &units, None);
        assert!(overlay.text_for("src/p/A.java").is_none());
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_buffer_unit_wins_and_others_become_classpath() {
        let project = Project::new("app").with_source_root("src");
        let units = [SourceDescriptor::buffer("src/p/A.java", "class A { B b; }")];
        let copies = [
            WorkingCopy::new("src/p/A.java", "class A {}"),
            WorkingCopy::new("src/p/B.java", "package p; class B {}"),
        ];
        let overlay = Overlay::build(&copies, &units, Some(&project));
        assert!(overlay.text_for("src/p/A.java").is_none());
        let entry = overlay.classpath_entry().unwrap();
        assert!(entry.contains("p/B.java"));
        assert!(!entry.contains("p/A.java"));
    }
}

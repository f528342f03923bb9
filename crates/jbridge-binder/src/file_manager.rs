//! File manager and name environment.
//!
//! The file manager owns the ordered classpath of one session, with the
//! embedded platform library always first. The [`NameEnvironment`] answers
//! type lookups against a classpath without any session state.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::classpath::{AccessRestriction, ClasspathEntry, ClasspathError, EntryKind};

/// Where a type was found, and under which restriction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeAnswer {
    pub entry_name: String,
    pub entry_kind: EntryKind,
    pub restriction: Option<AccessRestriction>,
}

/// Classpath lookup independent of a compile session.
#[derive(Clone, Debug)]
pub struct NameEnvironment {
    entries: Arc<[ClasspathEntry]>,
}

impl NameEnvironment {
    pub fn new(entries: Vec<ClasspathEntry>) -> Self {
        NameEnvironment {
            entries: entries.into(),
        }
    }

    /// Find the entry providing the type named by `compound`
    /// (`["p", "Type"]`). Nested names are looked up, and restricted, through
    /// their enclosing top-level type.
    pub fn find_type(&self, compound: &[&str]) -> Option<TypeAnswer> {
        for top in (1..=compound.len()).rev() {
            let path = compound[..top].join("/");
            let file = format!("{path}.java");
            if let Some(entry) = self.entries.iter().find(|e| e.contains(&file)) {
                return Some(TypeAnswer {
                    entry_name: entry.name().to_string(),
                    entry_kind: entry.kind(),
                    restriction: entry.restriction_for(&path),
                });
            }
        }
        None
    }

    pub fn is_package(&self, compound: &[&str]) -> bool {
        let dir = compound.join("/");
        self.entries.iter().any(|e| e.has_package(&dir))
    }
}

/// Source of a completed classpath file.
#[derive(Clone, Debug)]
pub struct LoadedSource {
    pub entry: usize,
    pub path: String,
    pub text: Arc<str>,
}

pub struct FileManager {
    entries: Vec<ClasspathEntry>,
    closed: bool,
}

impl FileManager {
    /// A file manager over `classpath`, preceded by the platform library.
    pub fn new(classpath: Vec<ClasspathEntry>) -> Self {
        let mut entries = Vec::with_capacity(classpath.len() + 1);
        entries.push(ClasspathEntry::platform());
        entries.extend(classpath);
        FileManager {
            entries,
            closed: false,
        }
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ClasspathEntry> {
        self.entries.get(index)
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Release the classpath. Later reads fail with
    /// [`ClasspathError::Closed`].
    pub fn close(&mut self) {
        if !self.closed {
            debug!(entries = self.entries.len(), "closing file manager");
        }
        self.closed = true;
    }

    /// Find and read the first entry providing `rel_path`.
    pub fn find_source(&self, rel_path: &str) -> Result<Option<LoadedSource>, ClasspathError> {
        if self.closed {
            return Err(ClasspathError::Closed);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.contains(rel_path) {
                continue;
            }
            return Ok(entry.read(rel_path)?.map(|text| LoadedSource {
                entry: index,
                path: rel_path.to_string(),
                text,
            }));
        }
        Ok(None)
    }

    pub fn has_package(&self, dir: &str) -> bool {
        !self.closed && self.entries.iter().any(|e| e.has_package(dir))
    }

    pub fn name_environment(&self) -> NameEnvironment {
        NameEnvironment::new(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{AccessRule, RuleKind};

    fn manager() -> FileManager {
        let lib = ClasspathEntry::in_memory(
            "lib",
            [("p/Type.java", "package p; public class Type { public static class Inner {} }")],
        )
        .with_kind(EntryKind::Project)
        .with_rule(AccessRule::new("p/*", RuleKind::Forbidden))
        .unwrap();
        FileManager::new(vec![lib])
    }

    #[test]
    fn test_platform_comes_first() {
        let fm = manager();
        let loaded = fm.find_source("java/lang/Object.java").unwrap().unwrap();
        assert_eq!(loaded.entry, 0);
        assert_eq!(fm.find_source("p/Type.java").unwrap().unwrap().entry, 1);
        assert!(fm.find_source("p/Missing.java").unwrap().is_none());
    }

    #[test]
    fn test_name_environment_answers() {
        let env = manager().name_environment();
        let answer = env.find_type(&["p", "Type"]).unwrap();
        assert_eq!(answer.entry_name, "lib");
        assert_eq!(answer.restriction.unwrap().kind, RuleKind::Forbidden);
        let nested = env.find_type(&["p", "Type", "Inner"]).unwrap();
        assert_eq!(nested.restriction.unwrap().kind, RuleKind::Forbidden);
        assert!(env.find_type(&["java", "lang", "String"]).unwrap().restriction.is_none());
        assert!(env.find_type(&["q", "Nope"]).is_none());
        assert!(env.is_package(&["java", "util"]));
    }

    #[test]
    fn test_closed_manager() {
        let mut fm = manager();
        fm.close();
        assert!(matches!(
            fm.find_source("p/Type.java"),
            Err(ClasspathError::Closed)
        ));
        assert!(!fm.has_package("p"));
    }
}

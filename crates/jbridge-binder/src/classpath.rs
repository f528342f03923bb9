//! Classpath entries and access rules.
//!
//! An entry is a root of source files addressed by slash-separated relative
//! paths (`p/q/A.java`): a directory on disk, an in-memory map, or the
//! embedded platform library. Each entry carries ordered access rules matched
//! against a type's path without extension (`p/q/A`); the first matching rule
//! wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobMatcher};
use indexmap::IndexMap;
use jbridge_common::limits::MAX_CLASSPATH_FILE_SIZE;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;

use crate::platform::{self, PLATFORM_ENTRY_NAME};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is too large ({size} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64 },
    #[error("invalid access rule pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("the file manager has been closed")]
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    /// The embedded platform library.
    Platform,
    Library,
    /// Sources of another project the compiled project depends on.
    Project,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    Accessible,
    Discouraged,
    Forbidden,
}

impl RuleKind {
    /// Parse the `+`, `~`, `-` shorthand used on the command line.
    pub fn from_sigil(sigil: &str) -> Option<RuleKind> {
        match sigil {
            "+" => Some(RuleKind::Accessible),
            "~" => Some(RuleKind::Discouraged),
            "-" => Some(RuleKind::Forbidden),
            _ => None,
        }
    }
}

/// An access rule as configured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessRule {
    pub pattern: String,
    pub kind: RuleKind,
}

impl AccessRule {
    pub fn new(pattern: impl Into<String>, kind: RuleKind) -> Self {
        AccessRule {
            pattern: pattern.into(),
            kind,
        }
    }
}

/// The restriction that applies to one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessRestriction {
    pub kind: RuleKind,
    pub pattern: String,
    /// Display name of the entry that declared the rule.
    pub entry_name: String,
    pub entry_kind: EntryKind,
}

#[derive(Clone, Debug)]
struct CompiledRule {
    rule: AccessRule,
    matcher: GlobMatcher,
}

#[derive(Clone, Debug)]
pub enum EntryRoot {
    Directory(PathBuf),
    Memory(IndexMap<String, Arc<str>>),
    Platform,
}

#[derive(Clone, Debug)]
pub struct ClasspathEntry {
    name: String,
    kind: EntryKind,
    root: EntryRoot,
    rules: Vec<CompiledRule>,
}

impl ClasspathEntry {
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ClasspathEntry {
            name: name.into(),
            kind: EntryKind::Library,
            root: EntryRoot::Directory(path.into()),
            rules: Vec::new(),
        }
    }

    pub fn in_memory<K, V>(name: impl Into<String>, files: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let files = files
            .into_iter()
            .map(|(path, text)| (path.into(), Arc::from(text.as_ref())))
            .collect();
        ClasspathEntry {
            name: name.into(),
            kind: EntryKind::Library,
            root: EntryRoot::Memory(files),
            rules: Vec::new(),
        }
    }

    pub fn platform() -> Self {
        ClasspathEntry {
            name: PLATFORM_ENTRY_NAME.to_string(),
            kind: EntryKind::Platform,
            root: EntryRoot::Platform,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append an access rule. Rules are matched in insertion order.
    pub fn with_rule(mut self, rule: AccessRule) -> Result<Self, ClasspathError> {
        let matcher = GlobBuilder::new(&rule.pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ClasspathError::InvalidPattern {
                pattern: rule.pattern.clone(),
                source,
            })?
            .compile_matcher();
        self.rules.push(CompiledRule { rule, matcher });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn root(&self) -> &EntryRoot {
        &self.root
    }

    pub fn rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.rules.iter().map(|r| &r.rule)
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Whether a file exists at `rel_path` (`p/A.java`).
    pub fn contains(&self, rel_path: &str) -> bool {
        match &self.root {
            EntryRoot::Directory(dir) => dir.join(rel_path).is_file(),
            EntryRoot::Memory(files) => files.contains_key(rel_path),
            EntryRoot::Platform => platform::get_class(rel_path).is_some(),
        }
    }

    /// Read the file at `rel_path`; `Ok(None)` when the entry has no such
    /// file.
    pub fn read(&self, rel_path: &str) -> Result<Option<Arc<str>>, ClasspathError> {
        match &self.root {
            EntryRoot::Directory(dir) => {
                let path = dir.join(rel_path);
                if !path.exists() {
                    return Ok(None);
                }
                read_source_file(&path).map(Some)
            }
            EntryRoot::Memory(files) => Ok(files.get(rel_path).cloned()),
            EntryRoot::Platform => Ok(platform::get_class(rel_path).map(|c| Arc::from(c.content))),
        }
    }

    /// Whether the entry has a package directory `dir` (`p/q`).
    pub fn has_package(&self, dir: &str) -> bool {
        match &self.root {
            EntryRoot::Directory(root) => root.join(dir).is_dir(),
            EntryRoot::Memory(files) => files
                .keys()
                .any(|path| path.starts_with(dir) && path[dir.len()..].starts_with('/')),
            EntryRoot::Platform => platform::has_package(dir),
        }
    }

    /// Relative paths of every source file in the entry.
    pub fn list_sources(&self) -> Vec<String> {
        match &self.root {
            EntryRoot::Directory(root) => WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
                .filter_map(|e| {
                    e.path()
                        .strip_prefix(root)
                        .ok()
                        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                })
                .collect(),
            EntryRoot::Memory(files) => files.keys().cloned().collect(),
            EntryRoot::Platform => platform::PLATFORM_CLASSES
                .iter()
                .map(|c| c.path.to_string())
                .collect(),
        }
    }

    /// First matching access rule for `type_path` (`p/q/A`), if any rule
    /// other than `Accessible` applies.
    pub fn restriction_for(&self, type_path: &str) -> Option<AccessRestriction> {
        let rule = self.rules.iter().find(|r| r.matcher.is_match(type_path))?;
        trace!(entry = %self.name, type_path, pattern = %rule.rule.pattern, "access rule matched");
        if rule.rule.kind == RuleKind::Accessible {
            return None;
        }
        Some(AccessRestriction {
            kind: rule.rule.kind,
            pattern: rule.rule.pattern.clone(),
            entry_name: self.name.clone(),
            entry_kind: self.kind,
        })
    }
}

fn read_source_file(path: &Path) -> Result<Arc<str>, ClasspathError> {
    let io_err = |source| ClasspathError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_CLASSPATH_FILE_SIZE {
        return Err(ClasspathError::TooLarge {
            path: path.to_path_buf(),
            size,
        });
    }
    fs::read_to_string(path).map(Arc::from).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let entry = ClasspathEntry::in_memory("lib", [("p/Type.java", "package p; class Type {}")])
            .with_rule(AccessRule::new("p/Type", RuleKind::Discouraged))
            .unwrap()
            .with_rule(AccessRule::new("p/*", RuleKind::Forbidden))
            .unwrap();
        let restriction = entry.restriction_for("p/Type").unwrap();
        assert_eq!(restriction.kind, RuleKind::Discouraged);
        assert_eq!(entry.restriction_for("p/Other").unwrap().kind, RuleKind::Forbidden);
        assert!(entry.restriction_for("q/Other").is_none());
    }

    #[test]
    fn test_star_does_not_cross_packages() {
        let entry = ClasspathEntry::in_memory("lib", Vec::<(String, String)>::new())
            .with_rule(AccessRule::new("p/*", RuleKind::Forbidden))
            .unwrap()
            .with_rule(AccessRule::new("**/internal/**", RuleKind::Discouraged))
            .unwrap();
        assert!(entry.restriction_for("p/sub/Type").is_none());
        assert_eq!(
            entry.restriction_for("a/internal/b/C").map(|r| r.kind),
            Some(RuleKind::Discouraged)
        );
    }

    #[test]
    fn test_accessible_rule_shadows_later_rules() {
        let entry = ClasspathEntry::in_memory("lib", Vec::<(String, String)>::new())
            .with_rule(AccessRule::new("p/Api", RuleKind::Accessible))
            .unwrap()
            .with_rule(AccessRule::new("p/*", RuleKind::Forbidden))
            .unwrap();
        assert!(entry.restriction_for("p/Api").is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ClasspathEntry::in_memory("lib", Vec::<(String, String)>::new())
            .with_rule(AccessRule::new("p/[", RuleKind::Forbidden))
            .unwrap_err();
        assert!(matches!(err, ClasspathError::InvalidPattern { .. }));
    }

    #[test]
    fn test_memory_packages() {
        let entry = ClasspathEntry::in_memory("lib", [("a/b/C.java", "")]);
        assert!(entry.has_package("a"));
        assert!(entry.has_package("a/b"));
        assert!(!entry.has_package("a/bc"));
        assert!(entry.contains("a/b/C.java"));
    }

    #[test]
    fn test_directory_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("p")).unwrap();
        fs::write(dir.path().join("p/A.java"), "package p; public class A {}").unwrap();
        let entry = ClasspathEntry::directory("dir", dir.path());
        assert!(entry.contains("p/A.java"));
        assert!(entry.read("p/A.java").unwrap().unwrap().contains("class A"));
        assert!(entry.read("p/B.java").unwrap().is_none());
        assert_eq!(entry.list_sources(), vec!["p/A.java".to_string()]);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("p")).unwrap();
        fs::write(dir.path().join("p/Bad.java"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let entry = ClasspathEntry::directory("dir", dir.path());
        assert!(matches!(
            entry.read("p/Bad.java"),
            Err(ClasspathError::Io { .. })
        ));
    }
}

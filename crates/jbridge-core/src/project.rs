//! Project context of a resolve request.
//!
//! A project names the batch its units belong to, the classpath they are
//! compiled against and the source roots its own files live under. Source
//! roots become a `Project` classpath entry so that units can see the
//! project's other files.

use std::path::{Path, PathBuf};

use jbridge_binder::{ClasspathEntry, EntryKind};

use crate::source::normalize_path;

#[derive(Clone, Debug)]
pub struct Project {
    name: String,
    classpath: Vec<ClasspathEntry>,
    source_roots: Vec<PathBuf>,
    annotation_processing: bool,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            name: name.into(),
            classpath: Vec::new(),
            source_roots: Vec::new(),
            annotation_processing: false,
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: ClasspathEntry) -> Self {
        self.classpath.push(entry);
        self
    }

    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    /// Annotation processors are configured for this project.
    #[must_use]
    pub fn with_annotation_processing(mut self, enabled: bool) -> Self {
        self.annotation_processing = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classpath(&self) -> &[ClasspathEntry] {
        &self.classpath
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn annotation_processing(&self) -> bool {
        self.annotation_processing
    }

    /// Classpath of a session: the project's own source roots, then its
    /// configured entries.
    pub fn session_classpath(&self) -> Vec<ClasspathEntry> {
        let mut entries: Vec<ClasspathEntry> = self
            .source_roots
            .iter()
            .map(|root| ClasspathEntry::directory(self.name.clone(), root.clone()).with_kind(EntryKind::Project))
            .collect();
        entries.extend(self.classpath.iter().cloned());
        entries
    }

    /// Path of `file` relative to the source root containing it
    /// (`p/A.java`).
    pub fn relative_path(&self, file: &Path) -> Option<String> {
        let file = normalize_path(file);
        self.source_roots.iter().find_map(|root| {
            let root = normalize_path(root);
            let rest = file.strip_prefix(&root)?.strip_prefix('/')?;
            (!rest.is_empty()).then(|| rest.to_string())
        })
    }

    /// Source root containing `file`.
    pub fn source_root_of(&self, file: &Path) -> Option<&Path> {
        let file = normalize_path(file);
        self.source_roots
            .iter()
            .find(|root| {
                let root = normalize_path(root);
                file.strip_prefix(&root).is_some_and(|rest| rest.starts_with('/'))
            })
            .map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths() {
        let project = Project::new("app").with_source_root("work/app/src");
        assert_eq!(
            project.relative_path(Path::new("work/app/src/p/A.java")).as_deref(),
            Some("p/A.java")
        );
        assert_eq!(project.relative_path(Path::new("work/app/srcx/A.java")), None);
        assert!(project.source_root_of(Path::new("./work/app/src/A.java")).is_some());
        assert_eq!(project.session_classpath()[0].kind(), EntryKind::Project);
    }
}

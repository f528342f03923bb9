//! The string-keyed configuration map.
//!
//! Callers pass compiler settings as a flat `key -> value` map (severities,
//! source/target levels, doc-comment handling, annotation processing).
//! `CompilerOptions` keeps the map as given and answers typed questions about
//! it; unknown keys are preserved and ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Well-known keys
// =============================================================================

pub const UNUSED_IMPORT: &str = "compiler.problem.unusedImport";
pub const UNUSED_PRIVATE_MEMBER: &str = "compiler.problem.unusedPrivateMember";
pub const UNUSED_LOCAL: &str = "compiler.problem.unusedLocal";
pub const FORBIDDEN_REFERENCE: &str = "compiler.problem.forbiddenReference";
pub const DISCOURAGED_REFERENCE: &str = "compiler.problem.discouragedReference";
pub const UNUSED_WARNING_TOKEN: &str = "compiler.problem.unusedWarningToken";
pub const MISSING_OVERRIDE: &str = "compiler.problem.missingOverrideAnnotation";
pub const MISSING_OVERRIDE_FOR_INTERFACE: &str =
    "compiler.problem.missingOverrideAnnotationForInterfaceMethodImplementation";
pub const DEPRECATION: &str = "compiler.problem.deprecation";
pub const RAW_TYPE_REFERENCE: &str = "compiler.problem.rawTypeReference";
pub const UNCHECKED_TYPE_OPERATION: &str = "compiler.problem.uncheckedTypeOperation";
pub const DOC_COMMENT_SUPPORT: &str = "compiler.doc.comment.support";
pub const SOURCE: &str = "compiler.source";
pub const COMPLIANCE: &str = "compiler.compliance";
pub const TARGET_PLATFORM: &str = "compiler.codegen.targetPlatform";
pub const PREVIEW: &str = "compiler.preview";
pub const PROCESS_ANNOTATIONS: &str = "compiler.processAnnotations";
pub const LINT: &str = "compiler.lint";

pub const ENABLED: &str = "enabled";
pub const DISABLED: &str = "disabled";

/// Default source level when none is configured.
pub const DEFAULT_SOURCE_LEVEL: &str = "21";

// =============================================================================
// Severity
// =============================================================================

/// Host-side severity of a problem category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Ignore,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Severity> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            "ignore" => Some(Severity::Ignore),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Ignore => "ignore",
        }
    }

    pub fn is_ignored(self) -> bool {
        self == Severity::Ignore
    }
}

/// Default severity for a configurable key when the map has no entry.
fn default_severity(key: &str) -> Severity {
    match key {
        FORBIDDEN_REFERENCE => Severity::Error,
        DISCOURAGED_REFERENCE
        | UNUSED_IMPORT
        | UNUSED_PRIVATE_MEMBER
        | UNUSED_LOCAL
        | UNUSED_WARNING_TOKEN
        | DEPRECATION
        | RAW_TYPE_REFERENCE
        | UNCHECKED_TYPE_OPERATION => Severity::Warning,
        MISSING_OVERRIDE | MISSING_OVERRIDE_FOR_INTERFACE => Severity::Ignore,
        _ => Severity::Warning,
    }
}

// =============================================================================
// CompilerOptions
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerOptions {
    entries: IndexMap<String, String>,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: IndexMap<String, String>) -> Self {
        CompilerOptions { entries }
    }

    /// Parse a JSON object of string values.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Configured severity for a problem category key.
    pub fn severity(&self, key: &str) -> Severity {
        self.get(key)
            .and_then(Severity::parse)
            .unwrap_or_else(|| default_severity(key))
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.severity(key).is_ignored()
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case(ENABLED))
    }

    pub fn doc_comment_support(&self) -> bool {
        self.is_enabled(DOC_COMMENT_SUPPORT)
    }

    pub fn source_level(&self) -> &str {
        self.get(SOURCE)
            .or_else(|| self.get(COMPLIANCE))
            .unwrap_or(DEFAULT_SOURCE_LEVEL)
    }

    pub fn preview_enabled(&self) -> bool {
        self.is_enabled(PREVIEW)
    }

    pub fn annotation_processing_enabled(&self) -> bool {
        self.is_enabled(PROCESS_ANNOTATIONS)
    }

    /// Configured lint spec, `"all"` when unset.
    pub fn lint(&self) -> &str {
        self.get(LINT).unwrap_or("all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_fall_back_to_defaults() {
        let options = CompilerOptions::new().with(UNUSED_IMPORT, "ignore");
        assert_eq!(options.severity(UNUSED_IMPORT), Severity::Ignore);
        assert_eq!(options.severity(FORBIDDEN_REFERENCE), Severity::Error);
        assert_eq!(options.severity(DISCOURAGED_REFERENCE), Severity::Warning);
        assert!(options.is_ignored(MISSING_OVERRIDE));
    }

    #[test]
    fn parses_json_map() {
        let options = CompilerOptions::from_json(
            r#"{"compiler.problem.unusedLocal": "error", "compiler.doc.comment.support": "enabled"}"#,
        )
        .unwrap();
        assert_eq!(options.severity(UNUSED_LOCAL), Severity::Error);
        assert!(options.doc_comment_support());
        assert_eq!(options.source_level(), DEFAULT_SOURCE_LEVEL);
    }
}

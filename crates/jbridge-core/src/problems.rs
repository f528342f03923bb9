//! Front-end diagnostic to host problem conversion.
//!
//! Every front-end diagnostic passes through [`DiagnosticConverter`]. Its
//! code selects a [`ProblemId`]; the severity comes from the configuration
//! when the id has an option key, otherwise from the front-end's kind. A
//! diagnostic whose configured severity is `ignore` produces no problem.

use jbridge_checker::JavaDiagnostic;
use jbridge_common::diagnostics::codes;
use jbridge_common::{CompilerOptions, DiagnosticKind, Severity};
use jbridge_dom::{CompilationUnit, Problem, ProblemFactory, ProblemId};

/// A problem found by one of the bridge's own scanners, not yet
/// converted. `end` is exclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub id: ProblemId,
    pub args: Vec<String>,
    pub start: u32,
    pub end: u32,
}

impl Finding {
    pub fn new(id: ProblemId, args: Vec<String>, start: u32, end: u32) -> Self {
        Finding { id, args, start, end }
    }
}

pub struct DiagnosticConverter<'a> {
    options: &'a CompilerOptions,
}

impl<'a> DiagnosticConverter<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        DiagnosticConverter { options }
    }

    /// Severity for `id`, given the front-end's own kind.
    pub fn severity(&self, id: ProblemId, kind: DiagnosticKind) -> Severity {
        match id.option_key() {
            Some(key) => self.options.severity(key),
            None => match kind {
                DiagnosticKind::Error => Severity::Error,
                DiagnosticKind::Warning => Severity::Warning,
                DiagnosticKind::Note => Severity::Info,
            },
        }
    }

    /// Convert `diag` for `unit`. `in_import` tells whether the diagnostic
    /// lies inside an import declaration.
    pub fn convert(&self, diag: &JavaDiagnostic, unit: &CompilationUnit, in_import: bool) -> Option<Problem> {
        let id = problem_id(diag, in_import);
        let severity = self.severity(id, diag.kind);
        if severity.is_ignored() {
            return None;
        }
        let factory = ProblemFactory {
            source_file: unit.source_id.clone(),
            source: &unit.source,
            line_map: &unit.line_map,
        };
        Some(factory.create(id, severity, diag.args.clone(), diag.message(), diag.start, diag.end))
    }

    /// Convert a scanner finding. Findings are warnings unless configured
    /// otherwise.
    pub fn convert_finding(&self, finding: &Finding, unit: &CompilationUnit) -> Option<Problem> {
        let severity = self.severity(finding.id, DiagnosticKind::Warning);
        if severity.is_ignored() {
            return None;
        }
        let factory = ProblemFactory {
            source_file: unit.source_id.clone(),
            source: &unit.source,
            line_map: &unit.line_map,
        };
        Some(factory.synthesized(finding.id, severity, finding.args.clone(), finding.start, finding.end))
    }

    /// At least one of `keys` is not configured as `ignore`.
    pub fn any_enabled(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| !self.options.is_ignored(key))
    }
}

/// Host problem id of a front-end diagnostic.
pub fn problem_id(diag: &JavaDiagnostic, in_import: bool) -> ProblemId {
    let arg = |i: usize| diag.args.get(i).map_or("", String::as_str);
    match diag.code {
        codes::ILLEGAL_CHAR => ProblemId::InvalidCharacter,
        codes::UNCLOSED_STR_LIT => ProblemId::UnterminatedString,
        codes::UNCLOSED_CHAR_LIT => ProblemId::InvalidCharacterConstant,
        codes::UNCLOSED_COMMENT => ProblemId::UnterminatedComment,
        codes::MALFORMED_NUMBER => ProblemId::InvalidNumber,
        codes::EXPECTED => ProblemId::ParsingErrorInsertToComplete,
        codes::ILLEGAL_START_OF_EXPR | codes::ILLEGAL_START_OF_TYPE | codes::TYPE_DECL_EXPECTED => {
            ProblemId::ParsingError
        }
        codes::NOT_STMT => ProblemId::InvalidExpressionAsStatement,
        codes::PREMATURE_EOF => ProblemId::ParsingErrorUnexpectedEof,
        codes::CANT_RESOLVE | codes::CANT_RESOLVE_LOCATION => {
            let located = diag.code == codes::CANT_RESOLVE_LOCATION;
            match arg(0) {
                "class" | "interface" | "enum" | "type" if in_import => ProblemId::ImportNotFound,
                "class" | "interface" | "enum" | "type" => ProblemId::UndefinedType,
                "variable" if located => ProblemId::UndefinedField,
                "variable" => ProblemId::UndefinedName,
                "method" => ProblemId::UndefinedMethod,
                "constructor" => ProblemId::UndefinedConstructor,
                _ => ProblemId::Unclassified,
            }
        }
        codes::DOESNT_EXIST if in_import => ProblemId::ImportNotFound,
        codes::DOESNT_EXIST => ProblemId::PackageDoesNotExist,
        codes::CANT_APPLY_SYMBOL => match arg(0) {
            "constructor" => ProblemId::UndefinedConstructor,
            _ => ProblemId::ParameterMismatch,
        },
        codes::ALREADY_DEFINED => match arg(0) {
            "variable" if arg(2).starts_with("method") || arg(2).starts_with("constructor") => {
                ProblemId::RedefinedLocal
            }
            "variable" => ProblemId::DuplicateField,
            "method" | "constructor" => ProblemId::DuplicateMethod,
            _ => ProblemId::DuplicateTypes,
        },
        codes::INCOMPATIBLE_TYPES => ProblemId::TypeMismatch,
        codes::MISSING_RET_VAL => ProblemId::ShouldReturnValue,
        codes::BREAK_OUTSIDE_SWITCH_LOOP => ProblemId::InvalidBreak,
        codes::NON_STATIC_CANT_BE_REF => ProblemId::NonStaticAccessFromStaticContext,
        codes::CANT_DEREF => ProblemId::NoMessageSendOnBaseType,
        codes::COMPLETION_FAILURE => ProblemId::IsClassPathCorrect,
        codes::DOC_REF_NOT_FOUND => ProblemId::JavadocUndefinedType,
        codes::DEPRECATED => deprecated_id(arg(0)),
        codes::RAW_CLASS_USE => ProblemId::RawTypeReference,
        _ => ProblemId::Unclassified,
    }
}

/// Deprecated methods are reported by signature; type names are
/// capitalized by convention.
fn deprecated_id(what: &str) -> ProblemId {
    if what.contains('(') {
        ProblemId::UsingDeprecatedMethod
    } else if what.chars().next().is_some_and(char::is_uppercase) {
        ProblemId::UsingDeprecatedType
    } else {
        ProblemId::UsingDeprecatedField
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_common::options::DEPRECATION;

    use super::*;

    fn diag(code: &'static str, kind: DiagnosticKind, args: &[&str]) -> JavaDiagnostic {
        JavaDiagnostic {
            unit: None,
            code,
            kind,
            start: 10,
            end: 13,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_problem_ids() {
        let missing_class = diag(codes::CANT_RESOLVE, DiagnosticKind::Error, &["class", "Foo"]);
        assert_eq!(problem_id(&missing_class, false), ProblemId::UndefinedType);
        assert_eq!(problem_id(&missing_class, true), ProblemId::ImportNotFound);
        let located = diag(codes::CANT_RESOLVE_LOCATION, DiagnosticKind::Error, &["variable", "x", "A"]);
        assert_eq!(problem_id(&located, false), ProblemId::UndefinedField);
        let deprecated = diag(codes::DEPRECATED, DiagnosticKind::Warning, &["m()", "A"]);
        assert_eq!(problem_id(&deprecated, false), ProblemId::UsingDeprecatedMethod);
        let expected = diag(codes::EXPECTED, DiagnosticKind::Error, &["';'"]);
        assert_eq!(problem_id(&expected, false), ProblemId::ParsingErrorInsertToComplete);
    }

    #[test]
    fn test_configured_severity_and_ignore() {
        let unit = CompilationUnit::new(Arc::from("A.java"), Arc::from("class A { void m() { old(); } }"));
        let deprecated = diag(codes::DEPRECATED, DiagnosticKind::Warning, &["old()", "B"]);

        let defaults = CompilerOptions::new();
        let problem = DiagnosticConverter::new(&defaults).convert(&deprecated, &unit, false).unwrap();
        assert_eq!(problem.severity, Severity::Warning);
        assert_eq!((problem.start, problem.end), (10, 12));

        let errors = CompilerOptions::new().with(DEPRECATION, "error");
        let problem = DiagnosticConverter::new(&errors).convert(&deprecated, &unit, false).unwrap();
        assert!(problem.is_error());

        let ignored = CompilerOptions::new().with(DEPRECATION, "ignore");
        assert!(DiagnosticConverter::new(&ignored).convert(&deprecated, &unit, false).is_none());

        let syntax = diag(codes::EXPECTED, DiagnosticKind::Error, &["';'"]);
        assert!(DiagnosticConverter::new(&ignored).convert(&syntax, &unit, false).unwrap().is_error());
    }

    #[test]
    fn test_findings_use_configured_severity() {
        let unit = CompilationUnit::new(Arc::from("A.java"), Arc::from("import p.Q;\nclass A {}\n"));
        let finding = Finding::new(ProblemId::UnusedImport, vec!["p.Q".into()], 7, 10);

        let defaults = CompilerOptions::new();
        let problem = DiagnosticConverter::new(&defaults).convert_finding(&finding, &unit).unwrap();
        assert_eq!(problem.severity, Severity::Warning);
        assert_eq!(problem.message, "The import p.Q is never used");
        assert_eq!((problem.start, problem.end, problem.line), (7, 9, 1));

        let ignored = CompilerOptions::new().with(jbridge_common::options::UNUSED_IMPORT, "ignore");
        assert!(DiagnosticConverter::new(&ignored).convert_finding(&finding, &unit).is_none());
    }
}

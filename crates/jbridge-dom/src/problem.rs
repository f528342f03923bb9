//! Problems reported against a host compilation unit.
//!
//! Problem ids follow the host numbering: a category base ORed with a
//! running number, so `UndefinedType` is `TYPE_RELATED + 2`. Ids of problems
//! the bridge synthesizes itself (unused code, access restrictions, missing
//! `@Override`) carry their own message templates; converted front-end
//! diagnostics keep the front-end's message text.

use std::sync::Arc;

use jbridge_common::format_message;
use jbridge_common::options::{self, Severity};
use serde::Serialize;

const TYPE_RELATED: u32 = 0x0100_0000;
const FIELD_RELATED: u32 = 0x0200_0000;
const METHOD_RELATED: u32 = 0x0400_0000;
const CONSTRUCTOR_RELATED: u32 = 0x0800_0000;
const IMPORT_RELATED: u32 = 0x1000_0000;
const INTERNAL: u32 = 0x2000_0000;
const SYNTAX: u32 = 0x4000_0000;
const JAVADOC: u32 = 0x8000_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProblemCategory {
    Syntax,
    Type,
    Import,
    Member,
    Internal,
    Javadoc,
    Restriction,
    UnnecessaryCode,
    PotentialProgrammingProblem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProblemId {
    Unclassified,
    // Syntax
    ParsingError,
    ParsingErrorInsertToComplete,
    ParsingErrorUnexpectedEof,
    InvalidCharacter,
    UnterminatedString,
    InvalidCharacterConstant,
    UnterminatedComment,
    InvalidNumber,
    InvalidExpressionAsStatement,
    // Types and imports
    UndefinedType,
    ImportNotFound,
    PackageDoesNotExist,
    TypeMismatch,
    IsClassPathCorrect,
    RawTypeReference,
    UsingDeprecatedType,
    ForbiddenReference,
    DiscouragedReference,
    UnusedImport,
    DuplicateTypes,
    // Members
    UndefinedName,
    UndefinedField,
    UndefinedMethod,
    UndefinedConstructor,
    ParameterMismatch,
    DuplicateField,
    DuplicateMethod,
    RedefinedLocal,
    NonStaticAccessFromStaticContext,
    NoMessageSendOnBaseType,
    UsingDeprecatedMethod,
    UsingDeprecatedField,
    ShouldReturnValue,
    InvalidBreak,
    UnusedPrivateField,
    UnusedPrivateMethod,
    UnusedPrivateConstructor,
    UnusedPrivateType,
    LocalVariableIsNeverUsed,
    UnusedWarningToken,
    MissingOverrideAnnotation,
    MissingOverrideAnnotationForInterfaceMethodImplementation,
    // Doc comments
    JavadocUndefinedType,
}

impl ProblemId {
    /// Numeric id in the host numbering.
    pub fn value(self) -> u32 {
        use ProblemId::*;
        match self {
            Unclassified => 0,
            ParsingError => SYNTAX | INTERNAL | 204,
            ParsingErrorInsertToComplete => SYNTAX | INTERNAL | 240,
            ParsingErrorUnexpectedEof => SYNTAX | INTERNAL | 209,
            InvalidCharacter => SYNTAX | INTERNAL | 253,
            UnterminatedString => SYNTAX | INTERNAL | 258,
            InvalidCharacterConstant => SYNTAX | INTERNAL | 252,
            UnterminatedComment => SYNTAX | INTERNAL | 259,
            InvalidNumber => SYNTAX | INTERNAL | 250,
            InvalidExpressionAsStatement => SYNTAX | INTERNAL | 211,
            UndefinedType => TYPE_RELATED | 2,
            ImportNotFound => IMPORT_RELATED | 390,
            PackageDoesNotExist => TYPE_RELATED | 3,
            TypeMismatch => TYPE_RELATED | 17,
            IsClassPathCorrect => TYPE_RELATED | 324,
            RawTypeReference => TYPE_RELATED | 595,
            UsingDeprecatedType => TYPE_RELATED | 108,
            ForbiddenReference => TYPE_RELATED | 307,
            DiscouragedReference => TYPE_RELATED | 280,
            UnusedImport => IMPORT_RELATED | 388,
            DuplicateTypes => TYPE_RELATED | 323,
            UndefinedName => INTERNAL | FIELD_RELATED | 50,
            UndefinedField => FIELD_RELATED | 70,
            UndefinedMethod => METHOD_RELATED | 100,
            UndefinedConstructor => CONSTRUCTOR_RELATED | 130,
            ParameterMismatch => METHOD_RELATED | 101,
            DuplicateField => FIELD_RELATED | 60,
            DuplicateMethod => METHOD_RELATED | 355,
            RedefinedLocal => INTERNAL | 55,
            NonStaticAccessFromStaticContext => INTERNAL | FIELD_RELATED | 53,
            NoMessageSendOnBaseType => METHOD_RELATED | 114,
            UsingDeprecatedMethod => METHOD_RELATED | 102,
            UsingDeprecatedField => FIELD_RELATED | 61,
            ShouldReturnValue => INTERNAL | 330,
            InvalidBreak => INTERNAL | 166,
            UnusedPrivateField => INTERNAL | FIELD_RELATED | 77,
            UnusedPrivateMethod => INTERNAL | METHOD_RELATED | 118,
            UnusedPrivateConstructor => INTERNAL | CONSTRUCTOR_RELATED | 117,
            UnusedPrivateType => INTERNAL | TYPE_RELATED | 70,
            LocalVariableIsNeverUsed => INTERNAL | 61,
            UnusedWarningToken => INTERNAL | 635,
            MissingOverrideAnnotation => METHOD_RELATED | 623,
            MissingOverrideAnnotationForInterfaceMethodImplementation => METHOD_RELATED | 634,
            JavadocUndefinedType => JAVADOC | INTERNAL | 480,
        }
    }

    pub fn category(self) -> ProblemCategory {
        use ProblemId::*;
        match self {
            ParsingError
            | ParsingErrorInsertToComplete
            | ParsingErrorUnexpectedEof
            | InvalidCharacter
            | UnterminatedString
            | InvalidCharacterConstant
            | UnterminatedComment
            | InvalidNumber
            | InvalidExpressionAsStatement => ProblemCategory::Syntax,
            UndefinedType | PackageDoesNotExist | TypeMismatch | DuplicateTypes
            | UsingDeprecatedType | RawTypeReference => ProblemCategory::Type,
            ImportNotFound => ProblemCategory::Import,
            ForbiddenReference | DiscouragedReference => ProblemCategory::Restriction,
            UnusedImport
            | UnusedPrivateField
            | UnusedPrivateMethod
            | UnusedPrivateConstructor
            | UnusedPrivateType
            | LocalVariableIsNeverUsed
            | UnusedWarningToken => ProblemCategory::UnnecessaryCode,
            UndefinedName
            | UndefinedField
            | UndefinedMethod
            | UndefinedConstructor
            | ParameterMismatch
            | DuplicateField
            | DuplicateMethod
            | RedefinedLocal
            | NonStaticAccessFromStaticContext
            | NoMessageSendOnBaseType
            | UsingDeprecatedMethod
            | UsingDeprecatedField => ProblemCategory::Member,
            ShouldReturnValue | InvalidBreak => ProblemCategory::Internal,
            MissingOverrideAnnotation | MissingOverrideAnnotationForInterfaceMethodImplementation => {
                ProblemCategory::PotentialProgrammingProblem
            }
            JavadocUndefinedType => ProblemCategory::Javadoc,
            IsClassPathCorrect | Unclassified => ProblemCategory::Internal,
        }
    }

    /// Configuration key controlling this problem's severity. Problems
    /// without one are always errors or always warnings.
    pub fn option_key(self) -> Option<&'static str> {
        use ProblemId::*;
        match self {
            UnusedImport => Some(options::UNUSED_IMPORT),
            UnusedPrivateField | UnusedPrivateMethod | UnusedPrivateConstructor | UnusedPrivateType => {
                Some(options::UNUSED_PRIVATE_MEMBER)
            }
            LocalVariableIsNeverUsed => Some(options::UNUSED_LOCAL),
            ForbiddenReference => Some(options::FORBIDDEN_REFERENCE),
            DiscouragedReference => Some(options::DISCOURAGED_REFERENCE),
            UnusedWarningToken => Some(options::UNUSED_WARNING_TOKEN),
            MissingOverrideAnnotation => Some(options::MISSING_OVERRIDE),
            MissingOverrideAnnotationForInterfaceMethodImplementation => {
                Some(options::MISSING_OVERRIDE_FOR_INTERFACE)
            }
            UsingDeprecatedType | UsingDeprecatedMethod | UsingDeprecatedField => Some(options::DEPRECATION),
            RawTypeReference => Some(options::RAW_TYPE_REFERENCE),
            _ => None,
        }
    }

    /// Suppression token accepted by `@SuppressWarnings` for this problem.
    pub fn suppress_token(self) -> Option<&'static str> {
        use ProblemId::*;
        match self {
            UnusedImport
            | UnusedPrivateField
            | UnusedPrivateMethod
            | UnusedPrivateConstructor
            | UnusedPrivateType
            | LocalVariableIsNeverUsed => Some("unused"),
            ForbiddenReference | DiscouragedReference => Some("restriction"),
            UsingDeprecatedType | UsingDeprecatedMethod | UsingDeprecatedField => Some("deprecation"),
            RawTypeReference => Some("rawtypes"),
            _ => None,
        }
    }

    /// Message template for problems the bridge synthesizes.
    pub fn message_template(self) -> Option<&'static str> {
        use ProblemId::*;
        let template = match self {
            UnusedImport => "The import {0} is never used",
            UnusedPrivateField => "The value of the field {0}.{1} is not used",
            UnusedPrivateMethod => "The method {1}({2}) from the type {0} is never used locally",
            UnusedPrivateConstructor => "The constructor {0}({1}) is never used locally",
            UnusedPrivateType => "The type {0} is never used locally",
            LocalVariableIsNeverUsed => "The value of the local variable {0} is not used",
            UnusedWarningToken => "Unnecessary @SuppressWarnings(\"{0}\")",
            ForbiddenReference => "Access restriction: The {0} '{1}' is not API (restriction on required {2} '{3}')",
            DiscouragedReference => "Discouraged access: The {0} '{1}' is not API (restriction on required {2} '{3}')",
            MissingOverrideAnnotation => {
                "The method {0}({1}) of type {2} should be tagged with @Override since it actually overrides a superclass method"
            }
            MissingOverrideAnnotationForInterfaceMethodImplementation => {
                "The method {0}({1}) of type {2} should be tagged with @Override since it actually overrides a superinterface method"
            }
            _ => return None,
        };
        Some(template)
    }

    /// Format this problem's message, or `None` when it has no template.
    pub fn format(self, args: &[String]) -> Option<String> {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.message_template().map(|t| format_message(t, &refs))
    }
}

/// An immutable problem record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub id: ProblemId,
    pub category: ProblemCategory,
    pub severity: Severity,
    pub args: Vec<String>,
    pub message: String,
    pub source_file: Arc<str>,
    /// First offset (inclusive).
    pub start: u32,
    /// Last offset (inclusive).
    pub end: u32,
    /// 1-based.
    pub line: u32,
    /// 1-based.
    pub column: u32,
}

impl Problem {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Numeric id in the host numbering.
    pub fn id_value(&self) -> u32 {
        self.id.value()
    }
}

/// Builds [`Problem`]s for one source, converting exclusive end offsets to
/// the inclusive form and computing line and column.
pub struct ProblemFactory<'a> {
    pub source_file: Arc<str>,
    pub source: &'a str,
    pub line_map: &'a jbridge_common::LineMap,
}

impl ProblemFactory<'_> {
    /// `end_exclusive` equal to `start` gives a one-character range.
    pub fn create(
        &self,
        id: ProblemId,
        severity: Severity,
        args: Vec<String>,
        message: String,
        start: u32,
        end_exclusive: u32,
    ) -> Problem {
        let end = end_exclusive.max(start + 1).saturating_sub(1);
        Problem {
            id,
            category: id.category(),
            severity,
            args,
            message,
            source_file: self.source_file.clone(),
            start,
            end,
            line: self.line_map.line_number(start),
            column: self.line_map.column_number(start, self.source),
        }
    }

    /// A synthesized problem whose message comes from its id's template.
    pub fn synthesized(&self, id: ProblemId, severity: Severity, args: Vec<String>, start: u32, end_exclusive: u32) -> Problem {
        let message = id.format(&args).unwrap_or_default();
        self.create(id, severity, args, message, start, end_exclusive)
    }
}

#[cfg(test)]
mod tests {
    use jbridge_common::LineMap;

    use super::*;

    #[test]
    fn test_problem_id_values() {
        assert_eq!(ProblemId::UndefinedType.value(), 16_777_218);
        assert_eq!(ProblemId::UnusedImport.value(), 268_435_844);
        assert_eq!(ProblemId::ForbiddenReference.value(), 16_777_523);
        assert_eq!(ProblemId::UnusedImport.category(), ProblemCategory::UnnecessaryCode);
        assert_eq!(ProblemId::DiscouragedReference.category(), ProblemCategory::Restriction);
        assert_eq!(ProblemId::LocalVariableIsNeverUsed.option_key(), Some(options::UNUSED_LOCAL));
    }

    #[test]
    fn test_factory_ranges_and_positions() {
        let source = "class A {\n  int x;\n}\n";
        let line_map = LineMap::build(source);
        let factory = ProblemFactory {
            source_file: Arc::from("A.java"),
            source,
            line_map: &line_map,
        };
        let x = source.find('x').unwrap_or_default() as u32;
        let problem = factory.synthesized(
            ProblemId::UnusedPrivateField,
            Severity::Warning,
            vec!["A".to_string(), "x".to_string()],
            x,
            x + 1,
        );
        assert_eq!(problem.start, x);
        assert_eq!(problem.end, x);
        assert_eq!(problem.line, 2);
        assert_eq!(problem.column, 7);
        assert_eq!(problem.message, "The value of the field A.x is not used");
        assert!(!problem.is_error());

        let empty = factory.create(ProblemId::ParsingError, Severity::Error, Vec::new(), String::new(), 3, 3);
        assert_eq!((empty.start, empty.end), (3, 3));
    }
}

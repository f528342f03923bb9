//! Front-end diagnostic codes and message templates.

use super::{DiagnosticKind, DiagnosticMessage};

pub mod codes {
    // Lexical
    pub const ILLEGAL_CHAR: &str = "compiler.err.illegal.char";
    pub const UNCLOSED_STR_LIT: &str = "compiler.err.unclosed.str.lit";
    pub const UNCLOSED_CHAR_LIT: &str = "compiler.err.unclosed.char.lit";
    pub const UNCLOSED_COMMENT: &str = "compiler.err.unclosed.comment";
    pub const MALFORMED_NUMBER: &str = "compiler.err.malformed.number";

    // Syntax
    pub const EXPECTED: &str = "compiler.err.expected";
    pub const ILLEGAL_START_OF_EXPR: &str = "compiler.err.illegal.start.of.expr";
    pub const ILLEGAL_START_OF_TYPE: &str = "compiler.err.illegal.start.of.type";
    pub const NOT_STMT: &str = "compiler.err.not.stmt";
    pub const TYPE_DECL_EXPECTED: &str = "compiler.err.expected.type.decl";
    pub const PREMATURE_EOF: &str = "compiler.err.premature.eof";

    // Attribution
    pub const CANT_RESOLVE: &str = "compiler.err.cant.resolve";
    pub const CANT_RESOLVE_LOCATION: &str = "compiler.err.cant.resolve.location";
    pub const DOESNT_EXIST: &str = "compiler.err.doesnt.exist";
    pub const CANT_APPLY_SYMBOL: &str = "compiler.err.cant.apply.symbol";
    pub const ALREADY_DEFINED: &str = "compiler.err.already.defined";
    pub const INCOMPATIBLE_TYPES: &str = "compiler.err.prob.found.req";
    pub const MISSING_RET_VAL: &str = "compiler.err.missing.ret.val";
    pub const BREAK_OUTSIDE_SWITCH_LOOP: &str = "compiler.err.break.outside.switch.loop";
    pub const NON_STATIC_CANT_BE_REF: &str = "compiler.err.non-static.cant.be.ref";
    pub const CANT_DEREF: &str = "compiler.err.cant.deref";
    pub const COMPLETION_FAILURE: &str = "compiler.err.cant.access";

    // Doc comments
    pub const DOC_REF_NOT_FOUND: &str = "compiler.err.doc.ref.not.found";

    // Lint
    pub const DEPRECATED: &str = "compiler.warn.has.been.deprecated";
    pub const RAW_CLASS_USE: &str = "compiler.warn.raw.class.use";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::ILLEGAL_CHAR,
        kind: DiagnosticKind::Error,
        message: "illegal character: '{0}'",
    },
    DiagnosticMessage {
        code: codes::UNCLOSED_STR_LIT,
        kind: DiagnosticKind::Error,
        message: "unclosed string literal",
    },
    DiagnosticMessage {
        code: codes::UNCLOSED_CHAR_LIT,
        kind: DiagnosticKind::Error,
        message: "unclosed character literal",
    },
    DiagnosticMessage {
        code: codes::UNCLOSED_COMMENT,
        kind: DiagnosticKind::Error,
        message: "unclosed comment",
    },
    DiagnosticMessage {
        code: codes::MALFORMED_NUMBER,
        kind: DiagnosticKind::Error,
        message: "malformed number: {0}",
    },
    DiagnosticMessage {
        code: codes::EXPECTED,
        kind: DiagnosticKind::Error,
        message: "{0} expected",
    },
    DiagnosticMessage {
        code: codes::ILLEGAL_START_OF_EXPR,
        kind: DiagnosticKind::Error,
        message: "illegal start of expression",
    },
    DiagnosticMessage {
        code: codes::ILLEGAL_START_OF_TYPE,
        kind: DiagnosticKind::Error,
        message: "illegal start of type",
    },
    DiagnosticMessage {
        code: codes::NOT_STMT,
        kind: DiagnosticKind::Error,
        message: "not a statement",
    },
    DiagnosticMessage {
        code: codes::TYPE_DECL_EXPECTED,
        kind: DiagnosticKind::Error,
        message: "class, interface, or enum expected",
    },
    DiagnosticMessage {
        code: codes::PREMATURE_EOF,
        kind: DiagnosticKind::Error,
        message: "reached end of file while parsing",
    },
    DiagnosticMessage {
        code: codes::CANT_RESOLVE,
        kind: DiagnosticKind::Error,
        message: "cannot find symbol: {0} {1}",
    },
    DiagnosticMessage {
        code: codes::CANT_RESOLVE_LOCATION,
        kind: DiagnosticKind::Error,
        message: "cannot find symbol: {0} {1} in {2}",
    },
    DiagnosticMessage {
        code: codes::DOESNT_EXIST,
        kind: DiagnosticKind::Error,
        message: "package {0} does not exist",
    },
    DiagnosticMessage {
        code: codes::CANT_APPLY_SYMBOL,
        kind: DiagnosticKind::Error,
        message: "{0} {1} in {2} cannot be applied to given types: required {3}, found {4}",
    },
    DiagnosticMessage {
        code: codes::ALREADY_DEFINED,
        kind: DiagnosticKind::Error,
        message: "{0} {1} is already defined in {2}",
    },
    DiagnosticMessage {
        code: codes::INCOMPATIBLE_TYPES,
        kind: DiagnosticKind::Error,
        message: "incompatible types: {0} cannot be converted to {1}",
    },
    DiagnosticMessage {
        code: codes::MISSING_RET_VAL,
        kind: DiagnosticKind::Error,
        message: "missing return value",
    },
    DiagnosticMessage {
        code: codes::BREAK_OUTSIDE_SWITCH_LOOP,
        kind: DiagnosticKind::Error,
        message: "break outside switch or loop",
    },
    DiagnosticMessage {
        code: codes::NON_STATIC_CANT_BE_REF,
        kind: DiagnosticKind::Error,
        message: "non-static {0} {1} cannot be referenced from a static context",
    },
    DiagnosticMessage {
        code: codes::CANT_DEREF,
        kind: DiagnosticKind::Error,
        message: "{0} cannot be dereferenced",
    },
    DiagnosticMessage {
        code: codes::COMPLETION_FAILURE,
        kind: DiagnosticKind::Error,
        message: "cannot access {0}: {1}",
    },
    DiagnosticMessage {
        code: codes::DOC_REF_NOT_FOUND,
        kind: DiagnosticKind::Error,
        message: "reference not found: {0}",
    },
    DiagnosticMessage {
        code: codes::DEPRECATED,
        kind: DiagnosticKind::Warning,
        message: "{0} in {1} has been deprecated",
    },
    DiagnosticMessage {
        code: codes::RAW_CLASS_USE,
        kind: DiagnosticKind::Warning,
        message: "found raw type: {0}",
    },
];

//! Diagnostic values shared by every compilation stage.
//!
//! Errors are values, not panics: the analyzer and the TAC generator both
//! push into a `Vec<Diagnostic>` and keep going. Only `ok`-ness of the
//! whole compile is derived from the collected list.

use serde::Serialize;
use thiserror::Error;

use crate::token::Span;

// ── Kind & severity ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Lex,
    Syntax,
    Semantic,
    Tac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────

/// One reported problem. `line` is 1-based, `column` 0-based, `length` the
/// width in bytes of the offending span.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
    #[serde(skip)]
    pub severity: Severity,
    #[serde(skip)]
    pub code: &'static str,
}

impl Diagnostic {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Lex,
            message: message.into(),
            line: span.line,
            column: span.column,
            length: span.length,
            severity: Severity::Error,
            code: "Lex",
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            line: span.line,
            column: span.column,
            length: span.length,
            severity: Severity::Error,
            code: "Syntax",
        }
    }

    pub fn semantic(err: SemanticDiag, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Semantic,
            message: err.to_string(),
            line: span.line,
            column: span.column,
            length: span.length,
            severity: err.severity(),
            code: err.code(),
        }
    }

    pub fn tac(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Tac,
            message: message.into(),
            line: 0,
            column: 0,
            length: 0,
            severity: Severity::Error,
            code: "TACValidation",
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ── Semantic error catalogue ─────────────────────────────────────────

/// Every static rule the analyzer enforces, with its human-readable
/// rendering. The `code` is the stable category name surfaced to tests
/// and tooling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticDiag {
    #[error("redeclaration of '{0}' in the same scope")]
    DuplicateName(String),

    #[error("'{0}' is a built-in name and cannot be redefined")]
    BuiltinClash(String),

    #[error("use of undeclared identifier '{0}'")]
    UndeclaredName(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("array literal mixes incompatible element types '{0}' and '{1}'")]
    HeterogeneousArray(String, String),

    #[error("cannot infer the element type of an empty array literal here")]
    EmptyArrayLiteral,

    #[error("'{callee}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("{construct} condition must be boolean, found {found}")]
    InvalidCondition {
        construct: &'static str,
        found: String,
    },

    #[error("break outside of loop or switch")]
    BreakOutsideLoop,

    #[error("continue outside of loop")]
    ContinueOutsideLoop,

    #[error("return outside of function")]
    ReturnOutsideFunction,

    #[error("'{0}' is not callable")]
    NonCallable(String),

    #[error("indexed access on non-array type {0}")]
    NonIndexable(String),

    #[error("member '{member}' does not exist in class '{class}'")]
    MemberNotFound { class: String, member: String },

    #[error("member access on non-class type {0}")]
    PropertyOnPrimitive(String),

    #[error("inheritance cycle detected through class '{0}'")]
    InheritanceCycle(String),

    #[error("incompatible override of '{class}.{method}': {detail}")]
    OverrideIncompatible {
        class: String,
        method: String,
        detail: &'static str,
    },

    #[error("constant '{0}' must be initialized")]
    ConstWithoutInit(String),

    #[error("cannot assign to constant '{0}'")]
    ConstReassigned(String),

    #[error("'{0}' is not an assignable location")]
    InvalidAssignTarget(String),

    #[error("declaration of '{0}' needs a type annotation or an initializer")]
    MissingType(String),

    #[error("'this' can only be used inside class methods")]
    ThisOutsideMethod,

    #[error("unreachable statement after return/break/continue")]
    DeadCode,
}

impl SemanticDiag {
    pub fn code(&self) -> &'static str {
        match self {
            SemanticDiag::DuplicateName(_) => "DuplicateName",
            SemanticDiag::BuiltinClash(_) => "BuiltinClash",
            SemanticDiag::UndeclaredName(_) => "UndeclaredName",
            SemanticDiag::TypeMismatch { .. } => "TypeMismatch",
            // Heterogeneous and unresolved-empty array literals are typing
            // failures; they share the TypeMismatch category.
            SemanticDiag::HeterogeneousArray(_, _) => "TypeMismatch",
            SemanticDiag::EmptyArrayLiteral => "TypeMismatch",
            SemanticDiag::ArityMismatch { .. } => "ArityMismatch",
            SemanticDiag::InvalidCondition { .. } => "InvalidCondition",
            SemanticDiag::BreakOutsideLoop => "InvalidJump",
            SemanticDiag::ContinueOutsideLoop => "InvalidJump",
            SemanticDiag::ReturnOutsideFunction => "InvalidJump",
            SemanticDiag::NonCallable(_) => "NonCallable",
            SemanticDiag::NonIndexable(_) => "NonIndexable",
            SemanticDiag::MemberNotFound { .. } => "MemberNotFound",
            SemanticDiag::PropertyOnPrimitive(_) => "PropertyOnPrimitive",
            SemanticDiag::InheritanceCycle(_) => "InheritanceCycle",
            SemanticDiag::OverrideIncompatible { .. } => "OverrideIncompatible",
            SemanticDiag::ConstWithoutInit(_) => "ConstWithoutInit",
            SemanticDiag::ConstReassigned(_) => "ConstReassigned",
            SemanticDiag::InvalidAssignTarget(_) => "InvalidAssignTarget",
            SemanticDiag::MissingType(_) => "MissingType",
            SemanticDiag::ThisOutsideMethod => "ThisOutsideMethod",
            SemanticDiag::DeadCode => "DeadCode",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SemanticDiag::DeadCode => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

//! The exception hierarchy and the deprecation channel (spec §7).

use crate::span::FileSpan;
use std::fmt;
use thiserror::Error;

/// Parse failure: a single offending span.
#[derive(Debug, Error, Clone)]
#[error("Error: {message}\n  ,\n{span} |\n  '")]
pub struct SassFormatException {
    pub message: String,
    pub span: FileSpan,
}

impl SassFormatException {
    pub fn new(message: impl Into<String>, span: FileSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Semantic failure: the call-chain of spans active when it was raised.
#[derive(Debug, Error, Clone)]
pub struct SassRuntimeException {
    pub message: String,
    /// Innermost frame first.
    pub trace: Vec<FileSpan>,
}

impl fmt::Display for SassRuntimeException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.message)?;
        for frame in &self.trace {
            writeln!(f, "    at {}", frame)?;
        }
        Ok(())
    }
}

impl SassRuntimeException {
    pub fn new(message: impl Into<String>, span: FileSpan) -> Self {
        Self {
            message: message.into(),
            trace: vec![span],
        }
    }

    /// Called by the evaluator as it unwinds past each enclosing node.
    pub fn push_frame(mut self, span: FileSpan) -> Self {
        self.trace.push(span);
        self
    }
}

/// Errors raised by built-in functions or arithmetic, before they have been
/// attached to a call-site span. Converted to [`SassRuntimeException`] the
/// moment they cross a statement/expression boundary.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct SassScriptException(pub String);

impl SassScriptException {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn at(self, span: FileSpan) -> SassRuntimeException {
        SassRuntimeException::new(self.0, span)
    }
}

/// Top-level compile error, covering both parse and runtime failures.
#[derive(Debug, Error, Clone)]
pub enum SassError {
    #[error(transparent)]
    Format(#[from] SassFormatException),
    #[error(transparent)]
    Runtime(#[from] SassRuntimeException),
}

pub type SassResult<T> = Result<T, SassError>;

/// Stable identifiers for deprecation warnings (spec §7). Promoted to a
/// hard error when present in [`crate::options::CompileOptions::fatal_deprecations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeprecationId {
    CallString,
    ElseIf,
    MozDocument,
    NewGlobal,
    ColorModuleCompat,
    SlashDiv,
    BogusCombinators,
    StrictUnary,
    FunctionUnits,
    ImporterWithoutUrl,
    CompileStringRelativeUrl,
}

impl DeprecationId {
    pub fn id(self) -> &'static str {
        match self {
            DeprecationId::CallString => "call-string",
            DeprecationId::ElseIf => "elseif",
            DeprecationId::MozDocument => "moz-document",
            DeprecationId::NewGlobal => "new-global",
            DeprecationId::ColorModuleCompat => "color-module-compat",
            DeprecationId::SlashDiv => "slash-div",
            DeprecationId::BogusCombinators => "bogus-combinators",
            DeprecationId::StrictUnary => "strict-unary",
            DeprecationId::FunctionUnits => "function-units",
            DeprecationId::ImporterWithoutUrl => "importer-without-url",
            DeprecationId::CompileStringRelativeUrl => "compile-string-relative-url",
        }
    }

    /// Spec §6 `futureDeprecations`: deprecations not yet active by default,
    /// silent unless opted into explicitly. Only the two host-boundary
    /// deprecations (no default importer behavior to preserve, unlike the
    /// in-language ones) are future-gated; the rest warn unconditionally.
    pub fn is_future(self) -> bool {
        matches!(self, DeprecationId::ImporterWithoutUrl | DeprecationId::CompileStringRelativeUrl)
    }
}

impl fmt::Display for DeprecationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A warning, debug, or deprecation message bound for the injected logger.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<FileSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Warning,
    Debug,
    Deprecation(DeprecationId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{SourceFile, Span};

    fn span() -> FileSpan {
        FileSpan::new(SourceFile::new("test.scss", "a { b: c; }"), Span::new(4, 5))
    }

    #[test]
    fn a_script_exception_attached_to_a_span_becomes_a_one_frame_runtime_exception() {
        let exc = SassScriptException::new("bad value").at(span());
        assert_eq!(exc.message, "bad value");
        assert_eq!(exc.trace.len(), 1);
    }

    #[test]
    fn push_frame_prepends_the_innermost_call_site_first() {
        let exc = SassRuntimeException::new("boom", span()).push_frame(span());
        assert_eq!(exc.trace.len(), 2);
    }

    #[test]
    fn a_format_exception_converts_into_the_closed_error_enum() {
        // spec §8 invariant #10: every failure surfaces as one of the two
        // closed `SassError` variants, never a bare panic.
        let err: SassError = SassFormatException::new("unexpected token", span()).into();
        assert!(matches!(err, SassError::Format(_)));
    }

    #[test]
    fn a_runtime_exception_converts_into_the_closed_error_enum() {
        let err: SassError = SassRuntimeException::new("division by zero", span()).into();
        assert!(matches!(err, SassError::Runtime(_)));
    }

    #[test]
    fn deprecation_ids_round_trip_through_their_stable_string_id() {
        assert_eq!(DeprecationId::SlashDiv.id(), "slash-div");
        assert_eq!(DeprecationId::SlashDiv.to_string(), "slash-div");
    }

    #[test]
    fn only_the_host_boundary_deprecations_are_future_gated() {
        assert!(DeprecationId::ImporterWithoutUrl.is_future());
        assert!(DeprecationId::CompileStringRelativeUrl.is_future());
        assert!(!DeprecationId::SlashDiv.is_future());
        assert!(!DeprecationId::BogusCombinators.is_future());
    }
}

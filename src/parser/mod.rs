//! One recursive-descent parser shared between both surface syntaxes (spec
//! §4.1, §9 "Parser shared between two syntaxes").
//!
//! The teacher's `Css3` parser was a single struct with one method per
//! grammar production, driven by a `Tokenizer`; this parser keeps that
//! shape (`parse_if`, `parse_each`, ...) but is driven directly off a
//! [`Scanner`] because Sass's indentation-significant syntax can't be
//! tokenized ahead of parse context. The brace/indentation difference is
//! isolated to a single trait, [`BlockPolicy`], answering "is this
//! position a statement boundary?" — everything else (expression parsing,
//! selector/value capture, at-rule bodies) is single-source.

pub mod expression;
pub mod indented;
pub mod interpolation;
pub mod keyframes;
pub mod media;
pub mod scss;
pub mod statement;
pub mod supports;
pub mod url;

use crate::ast::sass::Stylesheet;
use crate::error::SassScriptException;
use crate::span::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Scss,
    Indented,
    Css,
}

pub type ParseResult<T> = std::result::Result<T, SassScriptException>;

/// Parses a complete stylesheet in the given syntax.
pub fn parse_stylesheet(file: SourceFile, syntax: Syntax) -> ParseResult<Stylesheet> {
    match syntax {
        Syntax::Scss | Syntax::Css => scss::parse(file, syntax),
        Syntax::Indented => indented::parse(file),
    }
}

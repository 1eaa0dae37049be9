//! Entry point for the brace-and-semicolon syntax (`.scss`/plain `.css`).
//! The grammar itself lives in [`super::statement`]; this module only
//! wires a [`Scanner`] over the source file into it.

use super::statement::parse_root;
use super::{ParseResult, Syntax};
use crate::ast::sass::Stylesheet;
use crate::scanner::Scanner;
use crate::span::SourceFile;

pub fn parse(file: SourceFile, _syntax: Syntax) -> ParseResult<Stylesheet> {
    let mut scanner = Scanner::new(file);
    let statements = parse_root(&mut scanner)?;
    Ok(Stylesheet { statements })
}

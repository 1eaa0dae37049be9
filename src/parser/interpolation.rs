//! Captures interpolation (`#{...}`) inside strings, selectors, and
//! at-rule preludes as an alternating list of literal text and expression
//! nodes (spec §4.1 "Interpolation"). Evaluation flattens the result to a
//! string; the sub-parsers in [`crate::selector::parser`], [`super::media`]
//! and [`super::supports`] are re-invoked over that flattened text.

use super::expression::parse_expression_str;
use super::ParseResult;
use crate::ast::sass::{Interpolation, InterpolationPart};
use crate::error::SassScriptException;
use crate::scanner::Scanner;
use crate::span::Span;

/// Scans characters into `out`, honoring nested `()`/`[]`/`{}` and quoted
/// strings, until `stop` matches a character at bracket depth 0 outside
/// any string or interpolation. The stop character itself is not consumed.
pub fn scan_chunk(scanner: &mut Scanner, stop: impl Fn(char) -> bool) -> ParseResult<(Interpolation, Span)> {
    let start = scanner.position();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut depth: i32 = 0;

    loop {
        let Some(c) = scanner.peek_char() else { break };
        if depth == 0 && stop(c) {
            break;
        }
        match c {
            '"' | '\'' => {
                literal.push(c);
                scanner.next_char();
                scan_quoted_into(scanner, c, &mut literal)?;
            }
            '(' | '[' => {
                depth += 1;
                literal.push(c);
                scanner.next_char();
            }
            ')' | ']' => {
                depth -= 1;
                literal.push(c);
                scanner.next_char();
            }
            '#' if scanner.peek_char_at(1) == Some('{') => {
                if !literal.is_empty() {
                    parts.push(InterpolationPart::Literal(std::mem::take(&mut literal)));
                }
                scanner.next_char();
                scanner.next_char();
                let expr_text = scan_balanced_braces(scanner)?;
                let expr = parse_expression_str(&expr_text)?;
                parts.push(InterpolationPart::Expr(expr));
            }
            _ => {
                literal.push(c);
                scanner.next_char();
            }
        }
    }
    if !literal.is_empty() || parts.is_empty() {
        parts.push(InterpolationPart::Literal(literal));
    }
    let span = scanner.span_from(start);
    Ok((Interpolation { parts }, span))
}

fn scan_quoted_into(scanner: &mut Scanner, quote: char, out: &mut String) -> ParseResult<()> {
    loop {
        match scanner.next_char() {
            Some(c) if c == quote => {
                out.push(c);
                return Ok(());
            }
            Some('\\') => {
                out.push('\\');
                if let Some(escaped) = scanner.next_char() {
                    out.push(escaped);
                }
            }
            Some(c) => out.push(c),
            None => return Err(SassScriptException::new("unterminated string")),
        }
    }
}

fn scan_balanced_braces(scanner: &mut Scanner) -> ParseResult<String> {
    let mut depth = 1;
    let mut out = String::new();
    loop {
        match scanner.next_char() {
            Some('{') => {
                depth += 1;
                out.push('{');
            }
            Some('}') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(out);
                }
                out.push('}');
            }
            Some(c) => out.push(c),
            None => return Err(SassScriptException::new("unterminated interpolation")),
        }
    }
}

/// Flattens an already-evaluated interpolation, for the (common) case
/// where every expression part has already been stringified by the
/// evaluator into a literal.
pub fn flatten_literal(interp: &Interpolation) -> Option<String> {
    let mut out = String::new();
    for part in &interp.parts {
        match part {
            InterpolationPart::Literal(s) => out.push_str(s),
            InterpolationPart::Expr(_) => return None,
        }
    }
    Some(out)
}

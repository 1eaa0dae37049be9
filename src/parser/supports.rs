//! `@supports` condition parser (spec §4.1): produces a tree of
//! `and`/`or`/`not` over declaration or interpolation leaves, structurally
//! parsed at parse time (unlike selectors/media queries, which are
//! captured as raw text and re-parsed after evaluation).

use super::interpolation::scan_chunk;
use super::ParseResult;
use crate::ast::sass::SupportsCondition;
use crate::error::SassScriptException;
use crate::scanner::{scan_keyword, Scanner};

pub fn parse_condition(scanner: &mut Scanner) -> ParseResult<SupportsCondition> {
    parse_or(scanner)
}

fn parse_or(scanner: &mut Scanner) -> ParseResult<SupportsCondition> {
    let mut left = parse_and(scanner)?;
    loop {
        scanner.consume_whitespace();
        if scan_keyword(scanner, "or") {
            scanner.consume_whitespace();
            let right = parse_and(scanner)?;
            left = match left {
                SupportsCondition::Or(mut items) => {
                    items.push(right);
                    SupportsCondition::Or(items)
                }
                other => SupportsCondition::Or(vec![other, right]),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_and(scanner: &mut Scanner) -> ParseResult<SupportsCondition> {
    let mut left = parse_unary(scanner)?;
    loop {
        scanner.consume_whitespace();
        if scan_keyword(scanner, "and") {
            scanner.consume_whitespace();
            let right = parse_unary(scanner)?;
            left = match left {
                SupportsCondition::And(mut items) => {
                    items.push(right);
                    SupportsCondition::And(items)
                }
                other => SupportsCondition::And(vec![other, right]),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_unary(scanner: &mut Scanner) -> ParseResult<SupportsCondition> {
    scanner.consume_whitespace();
    if scan_keyword(scanner, "not") {
        scanner.consume_whitespace();
        let inner = parse_unary(scanner)?;
        return Ok(SupportsCondition::Not(Box::new(inner)));
    }
    parse_primary(scanner)
}

fn parse_primary(scanner: &mut Scanner) -> ParseResult<SupportsCondition> {
    scanner.consume_whitespace();
    if scanner.peek_char() == Some('#') && scanner.peek_char_at(1) == Some('{') {
        let (interp, _) = scan_chunk(scanner, |c| matches!(c, ')' | '{' | ';'))?;
        return Ok(SupportsCondition::Interpolation(interp));
    }
    if scanner.scan_char('(') {
        scanner.consume_whitespace();
        let checkpoint = scanner.position();
        let (name, _) = scan_chunk(scanner, |c| matches!(c, ':' | ')'))?;
        if scanner.peek_char() == Some(':') {
            scanner.next_char();
            scanner.consume_whitespace();
            let (value, _) = scan_chunk(scanner, |c| c == ')')?;
            if !scanner.scan_char(')') {
                return Err(SassScriptException::new("expected ')' in @supports declaration"));
            }
            return Ok(SupportsCondition::Declaration { property: name, value });
        }
        scanner.set_position(checkpoint);
        let inner = parse_or(scanner)?;
        scanner.consume_whitespace();
        if !scanner.scan_char(')') {
            return Err(SassScriptException::new("expected ')' closing @supports condition"));
        }
        Ok(inner)
    } else {
        Err(SassScriptException::new("expected @supports condition"))
    }
}

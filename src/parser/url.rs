//! Bare `url(...)` parsing (spec §4.1): unlike every other function call,
//! `url()`'s argument may be unquoted text containing characters — `:`,
//! `/`, `.` — that aren't valid expression syntax, so it needs its own
//! lookahead before falling back to an ordinary function call.

use super::interpolation::scan_chunk;
use super::ParseResult;
use crate::ast::sass::{Expression, ExpressionKind};
use crate::error::SassScriptException;
use crate::scanner::{is_whitespace, Scanner};

/// Scanner is positioned at the `(` right after the `url` identifier.
/// Returns `Ok(None)` when the contents start with a quote or `#{`, in
/// which case the caller should fall back to parsing an ordinary
/// argument list (the value is a plain string expression).
pub fn try_parse_bare_url(scanner: &mut Scanner, start: u32) -> ParseResult<Option<Expression>> {
    let checkpoint = scanner.position();
    scanner.next_char(); // '('
    let mut probe = scanner.position();
    while scanner.peek_char().map(is_whitespace).unwrap_or(false) {
        scanner.next_char();
        probe = scanner.position();
    }
    let _ = probe;
    match scanner.peek_char() {
        Some('"') | Some('\'') | None => {
            scanner.set_position(checkpoint);
            Ok(None)
        }
        Some('#') if scanner.peek_char_at(1) == Some('{') => {
            scanner.set_position(checkpoint);
            Ok(None)
        }
        _ => {
            let (interp, _) = scan_chunk(scanner, |c| c == ')')?;
            if !scanner.scan_char(')') {
                return Err(SassScriptException::new("expected ')' closing url()"));
            }
            Ok(Some(Expression::new(ExpressionKind::Interpolated(interp), scanner.span_from(start))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceFile;

    fn scanner_at(text: &str, offset: usize) -> Scanner {
        let mut scanner = Scanner::new(SourceFile::new("test.scss", text));
        for _ in 0..offset {
            scanner.next_char();
        }
        scanner
    }

    #[test]
    fn an_unquoted_url_is_parsed_as_a_bare_interpolated_expression() {
        let mut scanner = scanner_at("(foo/bar.png)", 0);
        let expr = try_parse_bare_url(&mut scanner, 0).unwrap();
        assert!(expr.is_some());
        assert!(scanner.is_done());
    }

    #[test]
    fn a_double_quoted_url_defers_to_the_ordinary_argument_parser() {
        let mut scanner = scanner_at(r#"("foo.png")"#, 0);
        let start = scanner.position();
        let result = try_parse_bare_url(&mut scanner, 0).unwrap();
        assert!(result.is_none());
        assert_eq!(scanner.position(), start);
    }

    #[test]
    fn an_interpolated_url_defers_to_the_ordinary_argument_parser() {
        let mut scanner = scanner_at("(#{$name}.png)", 0);
        let start = scanner.position();
        let result = try_parse_bare_url(&mut scanner, 0).unwrap();
        assert!(result.is_none());
        assert_eq!(scanner.position(), start);
    }

    #[test]
    fn leading_whitespace_inside_the_parens_is_skipped() {
        let mut scanner = scanner_at("(   foo.png)", 0);
        let expr = try_parse_bare_url(&mut scanner, 0).unwrap();
        assert!(expr.is_some());
    }

    #[test]
    fn an_unclosed_url_is_an_error() {
        let mut scanner = scanner_at("(foo.png", 0);
        assert!(try_parse_bare_url(&mut scanner, 0).is_err());
    }
}

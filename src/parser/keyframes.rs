//! Keyframe selector parser (spec §4.3, `@keyframes`). A keyframe block's
//! header is a comma-separated list of `from`, `to`, or percentage tokens
//! rather than an ordinary selector list — parsed separately once the
//! evaluator knows it's inside a `@keyframes`/vendor-prefixed-keyframes
//! body (mirrors [`super::media::parse_query_list`]'s "flatten, then
//! re-parse the plain text" shape).

use super::ParseResult;
use crate::ast::css::KeyframeSelector;
use crate::error::SassScriptException;
use crate::scanner::Scanner;
use crate::span::SourceFile;

pub fn parse_keyframe_selector_list(text: &str) -> ParseResult<Vec<KeyframeSelector>> {
    let mut scanner = Scanner::new(SourceFile::new("keyframes", text));
    let mut selectors = Vec::new();
    loop {
        scanner.consume_whitespace();
        selectors.push(parse_one(&mut scanner)?);
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
    }
    Ok(selectors)
}

fn parse_one(scanner: &mut Scanner) -> ParseResult<KeyframeSelector> {
    scanner.consume_whitespace();
    if let Some(c) = scanner.peek_char() {
        if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' {
            let digits = scanner.consume_while(|c| c.is_ascii_digit() || c == '.' || c == '+' || c == '-');
            if !scanner.scan_char('%') {
                return Err(SassScriptException::new(format!("expected '%' after keyframe percentage \"{}\"", digits)));
            }
            return Ok(KeyframeSelector { value: format!("{}%", digits) });
        }
    }
    let word = scanner.consume_while(|c| c.is_ascii_alphabetic());
    match word.as_str() {
        "from" => Ok(KeyframeSelector { value: "from".to_string() }),
        "to" => Ok(KeyframeSelector { value: "to".to_string() }),
        other => Err(SassScriptException::new(format!("expected \"from\", \"to\", or a percentage, got \"{}\"", other))),
    }
}

//! Media query parser (spec §4.1). Statements capture the raw,
//! interpolated prelude at parse time; the evaluator flattens it and
//! invokes [`parse_query_list`] over the resulting plain text (spec §9
//! "Interpolation re-parsing").

use super::ParseResult;
use crate::ast::css::{MediaFeature, MediaQuery};
use crate::error::SassScriptException;
use crate::scanner::{is_name, Scanner};
use crate::span::SourceFile;

pub fn parse_query_list(text: &str) -> ParseResult<Vec<MediaQuery>> {
    let mut scanner = Scanner::new(SourceFile::new("media", text));
    let mut queries = Vec::new();
    loop {
        scanner.consume_whitespace();
        queries.push(parse_one(&mut scanner)?);
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
    }
    Ok(queries)
}

fn scan_ident(scanner: &mut Scanner) -> String {
    scanner.consume_while(is_name)
}

fn parse_one(scanner: &mut Scanner) -> ParseResult<MediaQuery> {
    scanner.consume_whitespace();
    if scanner.peek_char() == Some('(') {
        let features = parse_features(scanner)?;
        return Ok(MediaQuery { modifier: None, media_type: None, features });
    }
    let first = scan_ident(scanner);
    if first.is_empty() {
        return Err(SassScriptException::new("expected media query"));
    }
    let (modifier, media_type) = if first.eq_ignore_ascii_case("not") || first.eq_ignore_ascii_case("only") {
        scanner.consume_whitespace();
        (Some(first), Some(scan_ident(scanner)))
    } else {
        (None, Some(first))
    };
    let mut features = Vec::new();
    loop {
        scanner.consume_whitespace();
        let checkpoint = scanner.position();
        let word = scan_ident(scanner);
        if word.eq_ignore_ascii_case("and") {
            scanner.consume_whitespace();
            features.extend(parse_features(scanner)?);
        } else {
            scanner.set_position(checkpoint);
            break;
        }
    }
    Ok(MediaQuery { modifier, media_type, features })
}

fn parse_features(scanner: &mut Scanner) -> ParseResult<Vec<MediaFeature>> {
    let mut out = Vec::new();
    loop {
        scanner.consume_whitespace();
        if !scanner.scan_char('(') {
            break;
        }
        scanner.consume_whitespace();
        let name = scan_ident(scanner);
        scanner.consume_whitespace();
        let value = if scanner.scan_char(':') {
            scanner.consume_whitespace();
            let raw = scanner.consume_while(|c| c != ')');
            Some(raw.trim().to_string())
        } else {
            None
        };
        if !scanner.scan_char(')') {
            return Err(SassScriptException::new("expected ')' in media feature"));
        }
        out.push(MediaFeature { name, value });
        scanner.consume_whitespace();
        let checkpoint = scanner.position();
        let word = scan_ident(scanner);
        if !word.eq_ignore_ascii_case("and") {
            scanner.set_position(checkpoint);
            break;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_bare_media_type_has_no_modifier_or_features() {
        let queries = parse_query_list("screen").unwrap();
        assert_eq!(queries, vec![MediaQuery { modifier: None, media_type: Some("screen".to_string()), features: vec![] }]);
    }

    #[test]
    fn a_feature_only_query_has_no_media_type() {
        let queries = parse_query_list("(min-width: 768px)").unwrap();
        assert_eq!(
            queries,
            vec![MediaQuery {
                modifier: None,
                media_type: None,
                features: vec![MediaFeature { name: "min-width".to_string(), value: Some("768px".to_string()) }],
            }]
        );
    }

    #[test]
    fn not_and_only_are_captured_as_the_modifier() {
        let queries = parse_query_list("not screen").unwrap();
        assert_eq!(queries[0].modifier, Some("not".to_string()));
        assert_eq!(queries[0].media_type, Some("screen".to_string()));
    }

    #[test]
    fn and_chains_multiple_features_onto_one_query() {
        let queries = parse_query_list("screen and (min-width: 100px) and (max-width: 200px)").unwrap();
        assert_eq!(queries[0].features.len(), 2);
    }

    #[test]
    fn comma_separates_independent_queries() {
        let queries = parse_query_list("screen, print").unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].media_type, Some("print".to_string()));
    }

    #[test]
    fn a_feature_without_a_value_has_no_colon() {
        let queries = parse_query_list("(color)").unwrap();
        assert_eq!(queries[0].features[0], MediaFeature { name: "color".to_string(), value: None });
    }

    #[test]
    fn an_empty_query_is_an_error() {
        assert!(parse_query_list("").is_err());
    }
}

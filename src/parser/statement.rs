//! The statement grammar, shared by both surface syntaxes (spec §4.1,
//! §9 "Parser shared between two syntaxes"). [`scss`] parses its syntax's
//! braces directly; [`indented`] first rewrites indentation into the same
//! brace-and-semicolon shape and reuses every production here. Either way,
//! by the time these functions run, block boundaries are already
//! braces — the only thing specific to a syntax is how those braces got
//! there.

use super::expression::ExpressionParser;
use super::interpolation::scan_chunk;
use super::supports;
use super::ParseResult;
use crate::ast::sass::{
    ArgumentList, Configuration, ConfiguredVariable, FunctionDecl, IfClause, ImportTarget, MemberFilter, MixinDecl,
    Parameter, ParameterList, Statement, StatementKind,
};
use crate::error::SassScriptException;
use crate::scanner::{is_name, is_name_start, is_whitespace, scan_keyword, Scanner};
use std::rc::Rc;

pub fn parse_root(scanner: &mut Scanner) -> ParseResult<Vec<Statement>> {
    parse_statements(scanner, true)
}

fn parse_statements(scanner: &mut Scanner, top_level: bool) -> ParseResult<Vec<Statement>> {
    let mut statements = Vec::new();
    loop {
        scanner.consume_whitespace();
        if scanner.is_done() {
            break;
        }
        if !top_level && scanner.peek_char() == Some('}') {
            break;
        }
        statements.push(parse_statement(scanner)?);
    }
    Ok(statements)
}

fn parse_block(scanner: &mut Scanner) -> ParseResult<Vec<Statement>> {
    expect_char(scanner, '{')?;
    let body = parse_statements(scanner, false)?;
    scanner.consume_whitespace();
    expect_char(scanner, '}')?;
    Ok(body)
}

fn parse_statement(scanner: &mut Scanner) -> ParseResult<Statement> {
    let start = scanner.position();
    match scanner.peek_char() {
        Some('/') if scanner.peek_char_at(1) == Some('/') => parse_silent_comment(scanner, start),
        Some('/') if scanner.peek_char_at(1) == Some('*') => parse_loud_comment(scanner, start),
        Some('$') => parse_variable_decl(scanner, start),
        Some('@') => parse_at_rule(scanner, start),
        _ => parse_style_rule_or_declaration(scanner, start),
    }
}

fn mk(node: StatementKind, scanner: &Scanner, start: u32) -> Statement {
    Statement::new(node, scanner.span_from(start))
}

fn expect_char(scanner: &mut Scanner, c: char) -> ParseResult<()> {
    if scanner.scan_char(c) {
        Ok(())
    } else {
        Err(SassScriptException::new(format!("expected '{}'", c)))
    }
}

fn scan_name(scanner: &mut Scanner) -> ParseResult<String> {
    let name = scanner.consume_while(is_name);
    if name.is_empty() {
        return Err(SassScriptException::new("expected identifier"));
    }
    Ok(name)
}

fn consume_statement_end(scanner: &mut Scanner) {
    scanner.consume_whitespace();
    scanner.scan_char(';');
}

fn parse_expr(scanner: &mut Scanner) -> ParseResult<crate::ast::sass::Expression> {
    ExpressionParser::new(scanner).parse_list()
}

// ---- comments ----

fn parse_silent_comment(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.next_char();
    scanner.next_char();
    let text = scanner.consume_while(|c| c != '\n');
    Ok(mk(StatementKind::SilentComment(text.trim().to_string()), scanner, start))
}

fn parse_loud_comment(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.next_char();
    scanner.next_char();
    let mut parts = Vec::new();
    let mut literal = String::from("/*");
    loop {
        if scanner.scan_str("*/") {
            literal.push_str("*/");
            break;
        }
        match scanner.peek_char() {
            None => return Err(SassScriptException::new("unterminated comment")),
            Some('#') if scanner.peek_char_at(1) == Some('{') => {
                if !literal.is_empty() {
                    parts.push(crate::ast::sass::InterpolationPart::Literal(std::mem::take(&mut literal)));
                }
                scanner.next_char();
                scanner.next_char();
                let (interp, _) = scan_chunk(scanner, |c| c == '}')?;
                scanner.scan_char('}');
                parts.extend(interp.parts);
            }
            Some(c) => {
                literal.push(c);
                scanner.next_char();
            }
        }
    }
    if !literal.is_empty() {
        parts.push(crate::ast::sass::InterpolationPart::Literal(literal));
    }
    Ok(mk(StatementKind::LoudComment(crate::ast::sass::Interpolation { parts }), scanner, start))
}

// ---- variables ----

fn parse_variable_decl(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.next_char();
    let name = scan_name(scanner)?;
    scanner.consume_whitespace();
    expect_char(scanner, ':')?;
    scanner.consume_whitespace();
    let value = parse_expr(scanner)?;
    let (guarded, global) = parse_flags(scanner)?;
    consume_statement_end(scanner);
    Ok(mk(
        StatementKind::VariableDecl { namespace: None, name, value, guarded, global },
        scanner,
        start,
    ))
}

fn parse_flags(scanner: &mut Scanner) -> ParseResult<(bool, bool)> {
    let mut guarded = false;
    let mut global = false;
    loop {
        scanner.consume_whitespace();
        let checkpoint = scanner.position();
        if scanner.scan_char('!') {
            let word = scanner.consume_while(is_name);
            match word.as_str() {
                "default" => guarded = true,
                "global" => global = true,
                _ => {
                    scanner.set_position(checkpoint);
                    break;
                }
            }
        } else {
            break;
        }
    }
    Ok((guarded, global))
}

// ---- selector / declaration disambiguation ----

fn parse_style_rule_or_declaration(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let checkpoint = scanner.position();
    let (prelude, _) = scan_chunk(scanner, |c| matches!(c, ':' | '{' | ';' | '}'))?;
    if scanner.peek_char() == Some(':') {
        let after = scanner.peek_char_at(1);
        let looks_like_value = after.map(is_whitespace).unwrap_or(true) || after == Some('{');
        if looks_like_value {
            scanner.next_char();
            return parse_declaration_tail(scanner, start, prelude);
        }
    }
    scanner.set_position(checkpoint);
    parse_style_rule(scanner, start)
}

fn parse_style_rule(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let (selector, _) = scan_chunk(scanner, |c| c == '{')?;
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::StyleRule { selector, body }, scanner, start))
}

fn parse_declaration_tail(
    scanner: &mut Scanner,
    start: u32,
    name: crate::ast::sass::Interpolation,
) -> ParseResult<Statement> {
    scanner.consume_whitespace();
    let value = if matches!(scanner.peek_char(), Some('{') | Some(';') | Some('}') | None) {
        None
    } else if is_custom_property_name(&name) {
        Some(parse_custom_property_value(scanner)?)
    } else {
        Some(parse_expr(scanner)?)
    };
    scanner.consume_whitespace();
    let body = if scanner.peek_char() == Some('{') { parse_block(scanner)? } else { Vec::new() };
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Declaration { name, value, body }, scanner, start))
}

/// A declaration whose name starts with `--` is a custom property (spec
/// §3): its value is CSS-wide syntax, not SassScript, so everything outside
/// a `#{...}` span is kept byte-for-byte rather than parsed as an
/// expression — only the name is interpolation-aware.
fn is_custom_property_name(name: &crate::ast::sass::Interpolation) -> bool {
    matches!(name.parts.first(), Some(crate::ast::sass::InterpolationPart::Literal(s)) if s.starts_with("--"))
}

fn parse_custom_property_value(scanner: &mut Scanner) -> ParseResult<crate::ast::sass::Expression> {
    let (mut interp, span) = scan_chunk(scanner, |c| matches!(c, ';' | '{' | '}'))?;
    if let Some(crate::ast::sass::InterpolationPart::Literal(last)) = interp.parts.last_mut() {
        let trimmed = last.trim_end();
        if trimmed.len() != last.len() {
            *last = trimmed.to_string();
        }
    }
    Ok(crate::ast::sass::Expression::new(crate::ast::sass::ExpressionKind::Interpolated(interp), span))
}

// ---- at-rules ----

fn parse_at_rule(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.next_char();
    let name = scan_name(scanner)?;
    scanner.consume_whitespace();
    match name.as_str() {
        "if" => parse_if(scanner, start),
        "each" => parse_each(scanner, start),
        "for" => parse_for(scanner, start),
        "while" => parse_while(scanner, start),
        "function" => parse_function(scanner, start),
        "mixin" => parse_mixin(scanner, start),
        "include" => parse_include(scanner, start),
        "content" => parse_content(scanner, start),
        "return" => parse_simple_expr_stmt(scanner, start, StatementKind::Return),
        "error" => parse_simple_expr_stmt(scanner, start, StatementKind::Error),
        "warn" => parse_simple_expr_stmt(scanner, start, StatementKind::Warn),
        "debug" => parse_simple_expr_stmt(scanner, start, StatementKind::Debug),
        "at-root" => parse_at_root(scanner, start),
        "media" => parse_media(scanner, start),
        "supports" => parse_supports(scanner, start),
        "extend" => parse_extend(scanner, start),
        "import" => parse_import(scanner, start),
        "use" => parse_use(scanner, start),
        "forward" => parse_forward(scanner, start),
        "else" => Err(SassScriptException::new("@else with no preceding @if")),
        _ => parse_unknown_at_rule(scanner, start, name),
    }
}

fn parse_simple_expr_stmt(
    scanner: &mut Scanner,
    start: u32,
    ctor: fn(crate::ast::sass::Expression) -> StatementKind,
) -> ParseResult<Statement> {
    let expr = parse_expr(scanner)?;
    consume_statement_end(scanner);
    Ok(mk(ctor(expr), scanner, start))
}

fn parse_if(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let mut clauses = vec![parse_if_clause(scanner)?];
    let mut else_clause = None;
    loop {
        let checkpoint = scanner.position();
        scanner.consume_whitespace();
        if scanner.scan_char('@') && scan_keyword(scanner, "else") {
            scanner.consume_whitespace();
            if scan_keyword(scanner, "if") {
                scanner.consume_whitespace();
                clauses.push(parse_if_clause(scanner)?);
                continue;
            }
            let body = parse_block(scanner)?;
            else_clause = Some(body);
            break;
        }
        scanner.set_position(checkpoint);
        break;
    }
    Ok(mk(StatementKind::If { clauses, else_clause }, scanner, start))
}

fn parse_if_clause(scanner: &mut Scanner) -> ParseResult<IfClause> {
    let condition = parse_expr(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    let declares_bindings = body.iter().any(|s| {
        matches!(
            s.node,
            StatementKind::VariableDecl { .. } | StatementKind::FunctionDecl(_) | StatementKind::MixinDecl(_)
        ) || matches!(&s.node, StatementKind::Import(targets) if targets.iter().any(|t| matches!(t, ImportTarget::DynamicUrl(_))))
    });
    Ok(IfClause { condition, body, declares_bindings })
}

fn parse_each(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let mut variables = vec![parse_dollar_name(scanner)?];
    scanner.consume_whitespace();
    while scanner.scan_char(',') {
        scanner.consume_whitespace();
        variables.push(parse_dollar_name(scanner)?);
        scanner.consume_whitespace();
    }
    if !scan_keyword(scanner, "in") {
        return Err(SassScriptException::new("expected 'in' in @each"));
    }
    scanner.consume_whitespace();
    let list = parse_expr(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::Each { variables, list, body }, scanner, start))
}

fn parse_for(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let variable = parse_dollar_name(scanner)?;
    scanner.consume_whitespace();
    if !scan_keyword(scanner, "from") {
        return Err(SassScriptException::new("expected 'from' in @for"));
    }
    scanner.consume_whitespace();
    let from = parse_expr(scanner)?;
    scanner.consume_whitespace();
    let inclusive = if scan_keyword(scanner, "through") {
        true
    } else if scan_keyword(scanner, "to") {
        false
    } else {
        return Err(SassScriptException::new("expected 'to' or 'through' in @for"));
    };
    scanner.consume_whitespace();
    let to = parse_expr(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::For { variable, from, to, inclusive, body }, scanner, start))
}

fn parse_while(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let condition = parse_expr(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::While { condition, body }, scanner, start))
}

fn parse_dollar_name(scanner: &mut Scanner) -> ParseResult<String> {
    if !scanner.scan_char('$') {
        return Err(SassScriptException::new("expected variable"));
    }
    scan_name(scanner)
}

fn parse_parameter_list(scanner: &mut Scanner) -> ParseResult<ParameterList> {
    expect_char(scanner, '(')?;
    let mut parameters = Vec::new();
    let mut rest = None;
    scanner.consume_whitespace();
    while scanner.peek_char() != Some(')') {
        let name = parse_dollar_name(scanner)?;
        scanner.consume_whitespace();
        if scanner.scan_str("...") {
            rest = Some(name);
            scanner.consume_whitespace();
            break;
        }
        let default = if scanner.scan_char(':') {
            scanner.consume_whitespace();
            Some(parse_expr(scanner)?)
        } else {
            None
        };
        parameters.push(Parameter { name, default });
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
        scanner.consume_whitespace();
    }
    expect_char(scanner, ')')?;
    Ok(ParameterList { parameters, rest })
}

fn parse_function(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let name = scan_name(scanner)?;
    scanner.consume_whitespace();
    let parameters = parse_parameter_list(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    Ok(mk(
        StatementKind::FunctionDecl(Rc::new(FunctionDecl { name, parameters, body })),
        scanner,
        start,
    ))
}

fn parse_mixin(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let name = scan_name(scanner)?;
    scanner.consume_whitespace();
    let parameters = if scanner.peek_char() == Some('(') { parse_parameter_list(scanner)? } else { ParameterList::default() };
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    let has_content = contains_content_call(&body);
    Ok(mk(
        StatementKind::MixinDecl(Rc::new(MixinDecl { name, parameters, body, has_content })),
        scanner,
        start,
    ))
}

fn contains_content_call(body: &[Statement]) -> bool {
    body.iter().any(|s| match &s.node {
        StatementKind::Content { .. } => true,
        StatementKind::If { clauses, else_clause } => {
            clauses.iter().any(|c| contains_content_call(&c.body)) || else_clause.as_deref().map(contains_content_call).unwrap_or(false)
        }
        StatementKind::Each { body, .. }
        | StatementKind::For { body, .. }
        | StatementKind::While { body, .. }
        | StatementKind::AtRoot { body, .. }
        | StatementKind::Media { body, .. }
        | StatementKind::Supports { body, .. } => contains_content_call(body),
        _ => false,
    })
}

fn parse_include(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let first = scan_name(scanner)?;
    let (namespace, name) = maybe_namespaced(scanner, first)?;
    scanner.consume_whitespace();
    let arguments = if scanner.peek_char() == Some('(') {
        scanner.next_char();
        let args = ExpressionParser::new(scanner).parse_argument_list()?;
        expect_char(scanner, ')')?;
        args
    } else {
        ArgumentList::default()
    };
    scanner.consume_whitespace();
    let content = if scanner.peek_char() == Some('{') {
        let body = parse_block(scanner)?;
        Some(Rc::new(MixinDecl { name: format!("{}-content", name), parameters: ParameterList::default(), body, has_content: false }))
    } else {
        consume_statement_end(scanner);
        None
    };
    Ok(mk(StatementKind::Include { namespace, name, arguments, content }, scanner, start))
}

fn maybe_namespaced(scanner: &mut Scanner, first: String) -> ParseResult<(Option<String>, String)> {
    if scanner.peek_char() == Some('.') && scanner.peek_char_at(1).map(is_name_start).unwrap_or(false) {
        scanner.next_char();
        let second = scan_name(scanner)?;
        Ok((Some(first), second))
    } else {
        Ok((None, first))
    }
}

fn parse_content(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.consume_whitespace();
    let arguments = if scanner.peek_char() == Some('(') {
        scanner.next_char();
        let args = ExpressionParser::new(scanner).parse_argument_list()?;
        expect_char(scanner, ')')?;
        args
    } else {
        ArgumentList::default()
    };
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Content { arguments }, scanner, start))
}

fn parse_at_root(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    scanner.consume_whitespace();
    let query = if scanner.peek_char() == Some('(') {
        scanner.next_char();
        let (q, _) = scan_chunk(scanner, |c| c == ')')?;
        expect_char(scanner, ')')?;
        Some(q)
    } else {
        None
    };
    scanner.consume_whitespace();
    let body = if scanner.peek_char() == Some('{') { parse_block(scanner)? } else { vec![parse_statement(scanner)?] };
    Ok(mk(StatementKind::AtRoot { query, body }, scanner, start))
}

fn parse_media(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let (query, _) = scan_chunk(scanner, |c| c == '{')?;
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::Media { query, body }, scanner, start))
}

fn parse_supports(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let condition = supports::parse_condition(scanner)?;
    scanner.consume_whitespace();
    let body = parse_block(scanner)?;
    Ok(mk(StatementKind::Supports { condition, body }, scanner, start))
}

fn parse_extend(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let (selector, _) = scan_chunk(scanner, |c| matches!(c, '!' | ';' | '}'))?;
    scanner.consume_whitespace();
    let optional = scanner.scan_char('!') && scan_keyword(scanner, "optional");
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Extend { selector, optional }, scanner, start))
}

fn parse_unknown_at_rule(scanner: &mut Scanner, start: u32, name: String) -> ParseResult<Statement> {
    scanner.consume_whitespace();
    let (prelude, _) = scan_chunk(scanner, |c| matches!(c, '{' | ';' | '}'))?;
    scanner.consume_whitespace();
    let body = if scanner.peek_char() == Some('{') {
        Some(parse_block(scanner)?)
    } else {
        consume_statement_end(scanner);
        None
    };
    Ok(mk(StatementKind::UnknownAtRule { name, prelude, body }, scanner, start))
}

fn parse_quoted_string(scanner: &mut Scanner) -> ParseResult<String> {
    let quote = scanner.peek_char().filter(|c| matches!(c, '"' | '\'')).ok_or_else(|| SassScriptException::new("expected string"))?;
    scanner.next_char();
    let mut out = String::new();
    loop {
        match scanner.next_char() {
            Some(c) if c == quote => break,
            Some('\\') => {
                if let Some(escaped) = scanner.next_char() {
                    out.push(escaped);
                }
            }
            Some(c) => out.push(c),
            None => return Err(SassScriptException::new("unterminated string")),
        }
    }
    Ok(out)
}

fn parse_import(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let mut targets = Vec::new();
    loop {
        scanner.consume_whitespace();
        targets.push(parse_import_target(scanner)?);
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
    }
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Import(targets), scanner, start))
}

fn parse_import_target(scanner: &mut Scanner) -> ParseResult<ImportTarget> {
    if scan_keyword(scanner, "url") && scanner.peek_char() == Some('(') {
        let span_start = scanner.position() - 3;
        if let Some(expr) = super::url::try_parse_bare_url(scanner, span_start)? {
            if let crate::ast::sass::ExpressionKind::Interpolated(interp) = expr.node {
                return Ok(ImportTarget::StaticUrl(interp));
            }
        }
    }
    let text = parse_quoted_string(scanner)?;
    if text.ends_with(".css") || text.starts_with("http://") || text.starts_with("https://") || text.starts_with("//") {
        Ok(ImportTarget::StaticUrl(crate::ast::sass::Interpolation::literal(text)))
    } else {
        Ok(ImportTarget::DynamicUrl(text))
    }
}

fn parse_configuration(scanner: &mut Scanner) -> ParseResult<Configuration> {
    scanner.consume_whitespace();
    if !scan_keyword(scanner, "with") {
        return Ok(Configuration::default());
    }
    scanner.consume_whitespace();
    expect_char(scanner, '(')?;
    let mut variables = Vec::new();
    loop {
        scanner.consume_whitespace();
        if scanner.peek_char() == Some(')') {
            break;
        }
        let name = parse_dollar_name(scanner)?;
        scanner.consume_whitespace();
        expect_char(scanner, ':')?;
        scanner.consume_whitespace();
        let value = parse_expr(scanner)?;
        scanner.consume_whitespace();
        let guarded = scanner.scan_str("!default");
        variables.push(ConfiguredVariable { name, value, guarded });
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
    }
    expect_char(scanner, ')')?;
    Ok(Configuration { variables })
}

fn parse_use(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let url = parse_quoted_string(scanner)?;
    scanner.consume_whitespace();
    let namespace = if scan_keyword(scanner, "as") {
        scanner.consume_whitespace();
        if scanner.scan_char('*') {
            None
        } else {
            Some(scan_name(scanner)?)
        }
    } else {
        default_namespace(&url)
    };
    let configuration = parse_configuration(scanner)?;
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Use { url, namespace, configuration }, scanner, start))
}

fn default_namespace(url: &str) -> Option<String> {
    let base = url.rsplit('/').next().unwrap_or(url);
    let base = base.strip_prefix('_').unwrap_or(base);
    let base = base.split('.').next().unwrap_or(base);
    if base == "*" || base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

fn parse_forward(scanner: &mut Scanner, start: u32) -> ParseResult<Statement> {
    let url = parse_quoted_string(scanner)?;
    scanner.consume_whitespace();
    let prefix = if scan_keyword(scanner, "as") {
        scanner.consume_whitespace();
        let p = scan_name(scanner)?;
        expect_char(scanner, '*')?;
        Some(p)
    } else {
        None
    };
    scanner.consume_whitespace();
    let filter = if scan_keyword(scanner, "show") {
        scanner.consume_whitespace();
        Some(parse_member_filter(scanner, true)?)
    } else if scan_keyword(scanner, "hide") {
        scanner.consume_whitespace();
        Some(parse_member_filter(scanner, false)?)
    } else {
        None
    };
    let configuration = parse_configuration(scanner)?;
    consume_statement_end(scanner);
    Ok(mk(StatementKind::Forward { url, prefix, filter, configuration }, scanner, start))
}

fn parse_member_filter(scanner: &mut Scanner, is_show: bool) -> ParseResult<MemberFilter> {
    let mut names = Vec::new();
    loop {
        scanner.consume_whitespace();
        scanner.scan_char('$');
        names.push(scan_name(scanner)?);
        scanner.consume_whitespace();
        if !scanner.scan_char(',') {
            break;
        }
    }
    Ok(MemberFilter { names, is_show, active: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::sass::{ExpressionKind, InterpolationPart};
    use crate::span::SourceFile;

    fn statements(text: &str) -> Vec<Statement> {
        let mut scanner = Scanner::new(SourceFile::new("test.scss", text));
        parse_root(&mut scanner).unwrap()
    }

    #[test]
    fn a_custom_property_value_is_captured_as_literal_interpolation_not_an_expression() {
        let stmts = statements("a { --gap: 1px   2px; }");
        let StatementKind::StyleRule { body, .. } = &stmts[0].node else { panic!("expected a style rule") };
        let StatementKind::Declaration { name, value, .. } = &body[0].node else { panic!("expected a declaration") };
        assert_eq!(name.parts, vec![InterpolationPart::Literal("--gap".to_string())]);
        let Some(value) = value else { panic!("expected a value") };
        match &value.node {
            ExpressionKind::Interpolated(interp) => {
                assert_eq!(interp.parts, vec![InterpolationPart::Literal("1px   2px".to_string())]);
            }
            other => panic!("expected a literal interpolation, got {:?}", other),
        }
    }

    #[test]
    fn a_custom_property_value_still_evaluates_interpolation_spans() {
        let stmts = statements("a { --gap: #{1 + 1}px; }");
        let StatementKind::StyleRule { body, .. } = &stmts[0].node else { panic!("expected a style rule") };
        let StatementKind::Declaration { value, .. } = &body[0].node else { panic!("expected a declaration") };
        let ExpressionKind::Interpolated(interp) = &value.as_ref().unwrap().node else { panic!("expected an interpolation") };
        assert!(matches!(interp.parts.as_slice(), [InterpolationPart::Expr(_), InterpolationPart::Literal(s)] if s == "px"));
    }

    #[test]
    fn an_ordinary_declaration_value_is_still_parsed_as_an_expression() {
        let stmts = statements("a { color: red; }");
        let StatementKind::StyleRule { body, .. } = &stmts[0].node else { panic!("expected a style rule") };
        let StatementKind::Declaration { value, .. } = &body[0].node else { panic!("expected a declaration") };
        assert!(matches!(value.as_ref().unwrap().node, ExpressionKind::Identifier(_)));
    }
}

//! Expression parsing via operator-precedence climbing (spec §4.1,
//! "Operator precedence"): `or` < `and` < `not` < equality < relational <
//! additive < multiplicative < unary < call. One function per level, the
//! same shape as the teacher's per-production parser methods.

use super::interpolation::scan_chunk;
use super::url;
use super::ParseResult;
use crate::ast::sass::{
    Argument, ArgumentList, BinaryOp, Expression, ExpressionKind, Interpolation, InterpolationPart, ListSeparatorSyntax,
    StringQuoting, UnaryOp,
};
use crate::error::SassScriptException;
use crate::scanner::{is_digit, is_name, is_name_start, is_whitespace, scan_keyword, Scanner};
use crate::span::{SourceFile, Span};

pub struct ExpressionParser<'a> {
    pub scanner: &'a mut Scanner,
    /// True while inside a parenthesized group, which makes `/` division
    /// rather than a slash-separated list (spec §4.1).
    in_parens: bool,
}

pub fn parse_expression_str(text: &str) -> ParseResult<Expression> {
    let mut scanner = Scanner::new(SourceFile::new("expr", text));
    let mut parser = ExpressionParser::new(&mut scanner);
    let expr = parser.parse_list()?;
    scanner.consume_whitespace();
    Ok(expr)
}

impl<'a> ExpressionParser<'a> {
    pub fn new(scanner: &'a mut Scanner) -> Self {
        Self { scanner, in_parens: false }
    }

    fn ws(&mut self) {
        self.scanner.consume_whitespace();
    }

    fn mk(&self, node: ExpressionKind, start: u32) -> Expression {
        Expression::new(node, self.scanner.span_from(start))
    }

    /// Top-level entry: a comma-separated list, which may itself contain
    /// space-separated sub-lists (spec "list (comma/space/slash
    /// separator, optional brackets)").
    pub fn parse_list(&mut self) -> ParseResult<Expression> {
        self.ws();
        let start = self.scanner.position();
        let bracketed = self.scanner.scan_char('[');
        if bracketed {
            self.ws();
        }
        let list = self.parse_comma_list(start, bracketed)?;
        if bracketed {
            self.ws();
            if !self.scanner.scan_char(']') {
                return Err(SassScriptException::new("expected ']'"));
            }
        }
        Ok(list)
    }

    fn parse_comma_list(&mut self, start: u32, bracketed: bool) -> ParseResult<Expression> {
        let mut elements = vec![self.parse_space_list()?];
        let mut saw_comma = false;
        loop {
            self.ws();
            if self.scanner.peek_char() == Some(',') {
                saw_comma = true;
                self.scanner.next_char();
                self.ws();
                if self.at_list_end(bracketed) {
                    break;
                }
                elements.push(self.parse_space_list()?);
            } else {
                break;
            }
        }
        if !saw_comma && !bracketed {
            return Ok(elements.into_iter().next().unwrap());
        }
        if !saw_comma && elements.len() == 1 && !bracketed {
            return Ok(elements.into_iter().next().unwrap());
        }
        Ok(self.mk(
            ExpressionKind::ListLiteral {
                separator: ListSeparatorSyntax::Comma,
                bracketed,
                elements,
            },
            start,
        ))
    }

    fn at_list_end(&self, bracketed: bool) -> bool {
        match self.scanner.peek_char() {
            None => true,
            Some(']') if bracketed => true,
            Some(')' | ';' | '{' | '}') => true,
            _ => false,
        }
    }

    fn parse_space_list(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut elements = vec![self.parse_slash_list()?];
        loop {
            let before = self.scanner.position();
            self.ws();
            if self.scanner.position() == before || self.at_space_list_end() {
                self.scanner.set_position(before);
                break;
            }
            elements.push(self.parse_slash_list()?);
        }
        if elements.len() == 1 {
            return Ok(elements.into_iter().next().unwrap());
        }
        Ok(self.mk(
            ExpressionKind::ListLiteral {
                separator: ListSeparatorSyntax::Space,
                bracketed: false,
                elements,
            },
            start,
        ))
    }

    fn at_space_list_end(&self) -> bool {
        matches!(self.scanner.peek_char(), None | Some(',' | ')' | ']' | ';' | '{' | '}'))
    }

    /// `/` outside parens builds a slash-separated list rather than
    /// performing division (spec §4.1, the slash-div deprecation path).
    fn parse_slash_list(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut elements = vec![self.parse_or()?];
        loop {
            let before = self.scanner.position();
            self.ws();
            if self.in_parens || self.scanner.peek_char() != Some('/') {
                self.scanner.set_position(before);
                break;
            }
            self.scanner.next_char();
            self.ws();
            elements.push(self.parse_or()?);
        }
        if elements.len() == 1 {
            return Ok(elements.into_iter().next().unwrap());
        }
        Ok(self.mk(
            ExpressionKind::ListLiteral {
                separator: ListSeparatorSyntax::Slash,
                bracketed: false,
                elements,
            },
            start,
        ))
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_and()?;
        loop {
            self.ws();
            if scan_keyword(self.scanner, "or") {
                self.ws();
                let right = self.parse_and()?;
                left = self.mk(ExpressionKind::Binary { op: BinaryOp::Or, left: Box::new(left), right: Box::new(right) }, start);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_not()?;
        loop {
            self.ws();
            if scan_keyword(self.scanner, "and") {
                self.ws();
                let right = self.parse_not()?;
                left = self.mk(ExpressionKind::Binary { op: BinaryOp::And, left: Box::new(left), right: Box::new(right) }, start);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        if scan_keyword(self.scanner, "not") {
            self.ws();
            let operand = self.parse_not()?;
            return Ok(self.mk(ExpressionKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) }, start));
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_relational()?;
        loop {
            self.ws();
            let op = if self.scanner.scan_str("==") {
                BinaryOp::Eq
            } else if self.scanner.scan_str("!=") {
                BinaryOp::Neq
            } else {
                break;
            };
            self.ws();
            let right = self.parse_relational()?;
            left = self.mk(ExpressionKind::Binary { op, left: Box::new(left), right: Box::new(right) }, start);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_additive()?;
        loop {
            self.ws();
            let op = if self.scanner.scan_str("<=") {
                BinaryOp::Lte
            } else if self.scanner.scan_str(">=") {
                BinaryOp::Gte
            } else if self.scanner.peek_char() == Some('<') {
                self.scanner.next_char();
                BinaryOp::Lt
            } else if self.scanner.peek_char() == Some('>') {
                self.scanner.next_char();
                BinaryOp::Gt
            } else {
                break;
            };
            self.ws();
            let right = self.parse_additive()?;
            left = self.mk(ExpressionKind::Binary { op, left: Box::new(left), right: Box::new(right) }, start);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_multiplicative()?;
        loop {
            let before = self.scanner.position();
            self.ws();
            let op = match self.scanner.peek_char() {
                Some('+') => BinaryOp::Add,
                Some('-') => {
                    // `1-2` (no space) is still subtraction; `1 -2` is
                    // unary per the strict-unary deprecation, handled in
                    // parse_unary when it's a prefix, not here.
                    BinaryOp::Sub
                }
                _ => {
                    self.scanner.set_position(before);
                    break;
                }
            };
            self.scanner.next_char();
            self.ws();
            let right = self.parse_multiplicative()?;
            left = self.mk(ExpressionKind::Binary { op, left: Box::new(left), right: Box::new(right) }, start);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        let mut left = self.parse_unary()?;
        loop {
            self.ws();
            let op = match self.scanner.peek_char() {
                Some('*') => BinaryOp::Mul,
                Some('%') => BinaryOp::Mod,
                Some('/') if self.in_parens => BinaryOp::Div,
                _ => break,
            };
            self.scanner.next_char();
            self.ws();
            let right = self.parse_unary()?;
            left = self.mk(ExpressionKind::Binary { op, left: Box::new(left), right: Box::new(right) }, start);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        match self.scanner.peek_char() {
            Some('-') => {
                self.scanner.next_char();
                let operand = self.parse_unary()?;
                Ok(self.mk(ExpressionKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }, start))
            }
            Some('+') => {
                self.scanner.next_char();
                let operand = self.parse_unary()?;
                Ok(self.mk(ExpressionKind::Unary { op: UnaryOp::Plus, operand: Box::new(operand) }, start))
            }
            _ => self.parse_call_or_primary(),
        }
    }

    fn parse_call_or_primary(&mut self) -> ParseResult<Expression> {
        let start = self.scanner.position();
        match self.scanner.peek_char() {
            Some('$') => self.parse_variable(start),
            Some('"') | Some('\'') => self.parse_quoted_string(start),
            Some('#') if self.scanner.peek_char_at(1) == Some('{') => self.parse_interpolated(start),
            Some(c) if is_digit(c) || (c == '.' && self.scanner.peek_char_at(1).map(is_digit).unwrap_or(false)) => {
                self.parse_number(start)
            }
            Some('(') => self.parse_parens(start),
            Some(c) if is_name_start(c) || c == '-' => self.parse_identifier_like(start),
            other => Err(SassScriptException::new(format!("expected expression, found {:?}", other))),
        }
    }

    fn parse_variable(&mut self, start: u32) -> ParseResult<Expression> {
        self.scanner.next_char(); // '$'
        let name = self.parse_name()?;
        let (namespace, name) = self.maybe_namespaced(name)?;
        Ok(self.mk(ExpressionKind::Variable { namespace, name }, start))
    }

    fn maybe_namespaced(&mut self, first: String) -> ParseResult<(Option<String>, String)> {
        if self.scanner.peek_char() == Some('.') && self.scanner.peek_char_at(1).map(is_name_start).unwrap_or(false) {
            self.scanner.next_char();
            let second = self.parse_name()?;
            Ok((Some(first), second))
        } else {
            Ok((None, first))
        }
    }

    fn parse_name(&mut self) -> ParseResult<String> {
        let name = self.scanner.consume_while(is_name);
        if name.is_empty() {
            return Err(SassScriptException::new("expected identifier"));
        }
        Ok(name)
    }

    fn parse_quoted_string(&mut self, start: u32) -> ParseResult<Expression> {
        let quote = self.scanner.next_char().unwrap();
        let (interp, _) = scan_chunk(self.scanner, |c| c == quote)?;
        self.scanner.scan_char(quote);
        Ok(self.mk(ExpressionKind::Str(interp, StringQuoting::Quoted), start))
    }

    fn parse_interpolated(&mut self, start: u32) -> ParseResult<Expression> {
        let (interp, _) = scan_chunk(self.scanner, |c| is_whitespace(c) || matches!(c, ',' | ')' | ']' | ';' | '{' | '}'))?;
        Ok(self.mk(ExpressionKind::Interpolated(interp), start))
    }

    fn parse_number(&mut self, start: u32) -> ParseResult<Expression> {
        let mut text = self.scanner.consume_while(is_digit);
        if self.scanner.peek_char() == Some('.') && self.scanner.peek_char_at(1).map(is_digit).unwrap_or(false) {
            text.push('.');
            self.scanner.next_char();
            text.push_str(&self.scanner.consume_while(is_digit));
        }
        if matches!(self.scanner.peek_char(), Some('e' | 'E'))
            && (self.scanner.peek_char_at(1).map(is_digit).unwrap_or(false)
                || (matches!(self.scanner.peek_char_at(1), Some('+' | '-')) && self.scanner.peek_char_at(2).map(is_digit).unwrap_or(false)))
        {
            text.push(self.scanner.next_char().unwrap());
            if matches!(self.scanner.peek_char(), Some('+' | '-')) {
                text.push(self.scanner.next_char().unwrap());
            }
            text.push_str(&self.scanner.consume_while(is_digit));
        }
        let value: f64 = text.parse().map_err(|_| SassScriptException::new("invalid number"))?;
        let unit = if self.scanner.peek_char() == Some('%') {
            self.scanner.next_char();
            Some("%".to_string())
        } else if self.scanner.peek_char().map(is_name_start).unwrap_or(false) {
            Some(self.scanner.consume_while(is_name))
        } else {
            None
        };
        Ok(self.mk(ExpressionKind::Number { value, unit }, start))
    }

    fn parse_parens(&mut self, start: u32) -> ParseResult<Expression> {
        self.scanner.next_char(); // '('
        self.ws();
        if self.scanner.peek_char() == Some(')') {
            self.scanner.next_char();
            return Ok(self.mk(ExpressionKind::MapLiteral { pairs: Vec::new() }, start));
        }
        let was_in_parens = self.in_parens;
        self.in_parens = true;
        let first_key = self.parse_space_list()?;
        self.ws();
        let result = if self.scanner.peek_char() == Some(':') {
            self.scanner.next_char();
            self.ws();
            let first_value = self.parse_space_list()?;
            let mut pairs = vec![(first_key, first_value)];
            loop {
                self.ws();
                if !self.scanner.scan_char(',') {
                    break;
                }
                self.ws();
                if self.scanner.peek_char() == Some(')') {
                    break;
                }
                let key = self.parse_space_list()?;
                self.ws();
                if !self.scanner.scan_char(':') {
                    return Err(SassScriptException::new("expected ':' in map"));
                }
                self.ws();
                let value = self.parse_space_list()?;
                pairs.push((key, value));
            }
            self.mk(ExpressionKind::MapLiteral { pairs }, start)
        } else {
            let mut elements = vec![first_key];
            loop {
                self.ws();
                if self.scanner.scan_char(',') {
                    self.ws();
                    if self.scanner.peek_char() == Some(')') {
                        break;
                    }
                    elements.push(self.parse_space_list()?);
                } else {
                    break;
                }
            }
            if elements.len() == 1 {
                self.mk(ExpressionKind::Paren(Box::new(elements.into_iter().next().unwrap())), start)
            } else {
                self.mk(ExpressionKind::ListLiteral { separator: ListSeparatorSyntax::Comma, bracketed: false, elements }, start)
            }
        };
        self.in_parens = was_in_parens;
        self.ws();
        if !self.scanner.scan_char(')') {
            return Err(SassScriptException::new("expected ')'"));
        }
        Ok(result)
    }

    fn parse_identifier_like(&mut self, start: u32) -> ParseResult<Expression> {
        let ident = self.parse_dashed_identifier()?;
        match ident.as_str() {
            "true" => return Ok(self.mk(ExpressionKind::Bool(true), start)),
            "false" => return Ok(self.mk(ExpressionKind::Bool(false), start)),
            "null" => return Ok(self.mk(ExpressionKind::Null, start)),
            "if" if self.scanner.peek_char() == Some('(') => {
                return self.parse_if_call(start);
            }
            "calc" | "min" | "max" | "clamp" if self.scanner.peek_char() == Some('(') => {
                return self.parse_calculation(ident, start);
            }
            "url" if self.scanner.peek_char() == Some('(') => {
                if let Some(expr) = url::try_parse_bare_url(self.scanner, start)? {
                    return Ok(expr);
                }
            }
            _ => {}
        }
        if self.scanner.peek_char() == Some('(') {
            return self.parse_call(None, ident, start);
        }
        if self.scanner.peek_char() == Some('.') && self.scanner.peek_char_at(1).map(is_name_start).unwrap_or(false) {
            let before_dot = self.scanner.position();
            self.scanner.next_char();
            let member = self.parse_dashed_identifier()?;
            if self.scanner.peek_char() == Some('(') {
                return self.parse_call(Some(ident), member, start);
            }
            self.scanner.set_position(before_dot);
        }
        Ok(self.mk(ExpressionKind::Identifier(ident), start))
    }

    fn parse_dashed_identifier(&mut self) -> ParseResult<String> {
        let mut out = String::new();
        while matches!(self.scanner.peek_char(), Some('-')) {
            out.push(self.scanner.next_char().unwrap());
        }
        out.push_str(&self.parse_name()?);
        Ok(out)
    }

    fn parse_call(&mut self, namespace: Option<String>, name: String, start: u32) -> ParseResult<Expression> {
        self.scanner.next_char(); // '('
        let was_in_parens = self.in_parens;
        self.in_parens = true;
        let arguments = self.parse_argument_list()?;
        self.in_parens = was_in_parens;
        if !self.scanner.scan_char(')') {
            return Err(SassScriptException::new("expected ')' closing call"));
        }
        Ok(self.mk(ExpressionKind::Call { namespace, name, arguments }, start))
    }

    pub(crate) fn parse_argument_list(&mut self) -> ParseResult<ArgumentList> {
        let mut arguments = Vec::new();
        self.ws();
        if self.scanner.peek_char() == Some(')') {
            return Ok(ArgumentList { arguments });
        }
        loop {
            self.ws();
            arguments.push(self.parse_argument()?);
            self.ws();
            if self.scanner.scan_char(',') {
                self.ws();
                if self.scanner.peek_char() == Some(')') {
                    break;
                }
            } else {
                break;
            }
        }
        Ok(ArgumentList { arguments })
    }

    fn parse_argument(&mut self) -> ParseResult<Argument> {
        let checkpoint = self.scanner.position();
        if self.scanner.peek_char() == Some('$') {
            self.scanner.next_char();
            if let Ok(name) = self.parse_name() {
                self.ws();
                if self.scanner.scan_char(':') {
                    self.ws();
                    let value = self.parse_space_list()?;
                    return Ok(Argument::Named(name, value));
                }
            }
            self.scanner.set_position(checkpoint);
        }
        let value = self.parse_space_list()?;
        self.ws();
        if self.scanner.scan_str("...") {
            return Ok(match &value.node {
                ExpressionKind::MapLiteral { .. } => Argument::RestKeyword(value),
                _ => Argument::RestPositional(value),
            });
        }
        Ok(Argument::Positional(value))
    }

    fn parse_if_call(&mut self, start: u32) -> ParseResult<Expression> {
        self.scanner.next_char(); // '('
        let was_in_parens = self.in_parens;
        self.in_parens = true;
        self.ws();
        let condition = self.parse_space_list()?;
        self.ws();
        self.expect_char(',')?;
        self.ws();
        let if_true = self.parse_space_list()?;
        self.ws();
        self.expect_char(',')?;
        self.ws();
        let if_false = self.parse_space_list()?;
        self.ws();
        self.in_parens = was_in_parens;
        self.expect_char(')')?;
        Ok(self.mk(
            ExpressionKind::If { condition: Box::new(condition), if_true: Box::new(if_true), if_false: Box::new(if_false) },
            start,
        ))
    }

    fn parse_calculation(&mut self, name: String, start: u32) -> ParseResult<Expression> {
        self.scanner.next_char(); // '('
        let was_in_parens = self.in_parens;
        self.in_parens = true;
        let mut arguments = Vec::new();
        self.ws();
        if self.scanner.peek_char() != Some(')') {
            loop {
                self.ws();
                arguments.push(self.parse_space_list()?);
                self.ws();
                if !self.scanner.scan_char(',') {
                    break;
                }
            }
        }
        self.in_parens = was_in_parens;
        self.expect_char(')')?;
        Ok(self.mk(ExpressionKind::Calculation { name, arguments }, start))
    }

    fn expect_char(&mut self, c: char) -> ParseResult<()> {
        if self.scanner.scan_char(c) {
            Ok(())
        } else {
            Err(SassScriptException::new(format!("expected '{}'", c)))
        }
    }
}

impl Expression {
    pub fn interp_literal(text: impl Into<String>, span: Span) -> Expression {
        Expression::new(
            ExpressionKind::Interpolated(Interpolation { parts: vec![InterpolationPart::Literal(text.into())] }),
            span,
        )
    }
}

//! Expression evaluation (spec §4.3: arithmetic, comparison, function and
//! mixin calls, interpolation flattening). Errors here are raised as
//! [`SassScriptException`] before they've been attached to a span; the
//! caller in [`super::statements`] converts them the moment they cross a
//! statement boundary, same as the teacher's tokenizer errors only grow a
//! `Location` once they reach the parser that can supply one.

use super::Evaluator;
use crate::ast::sass::{BinaryOp, Expression, ExpressionKind, Interpolation, InterpolationPart, UnaryOp};
use crate::error::SassScriptException;
use crate::module::{self, Scope};
use crate::selector;
use crate::value::{ListSeparator, SassColor, SassList, SassMap, SassNumber, SassString, Value};

impl<'a> Evaluator<'a> {
    pub fn eval_expression(&mut self, expr: &Expression, scope: &Scope) -> Result<Value, SassScriptException> {
        match &expr.node {
            ExpressionKind::Number { value, unit } => Ok(Value::Number(match unit {
                Some(u) => SassNumber::with_unit(*value, u.clone()),
                None => SassNumber::unitless(*value),
            })),
            ExpressionKind::Bool(b) => Ok(Value::Bool(*b)),
            ExpressionKind::Null => Ok(Value::Null),
            ExpressionKind::Color(hex) => Ok(Value::Color(
                SassColor::from_hex(hex).ok_or_else(|| SassScriptException::new(format!("invalid color {:?}", hex)))?,
            )),
            ExpressionKind::Str(interp, quoting) => {
                let text = self.eval_interpolation_to_string(interp, scope)?;
                Ok(match quoting {
                    crate::ast::sass::StringQuoting::Quoted => Value::String(SassString::quoted(text)),
                    crate::ast::sass::StringQuoting::Unquoted => Value::String(SassString::unquoted(text)),
                })
            }
            ExpressionKind::Interpolated(interp) => {
                let text = self.eval_interpolation_to_string(interp, scope)?;
                Ok(Value::String(SassString::unquoted(text)))
            }
            ExpressionKind::Identifier(name) => Ok(Value::String(SassString::unquoted(name.clone()))),
            ExpressionKind::Variable { namespace, name } => self.eval_variable(namespace.as_deref(), name, scope),
            ExpressionKind::ListLiteral { separator, bracketed, elements } => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval_expression(e, scope)?);
                }
                let sep = match separator {
                    crate::ast::sass::ListSeparatorSyntax::Comma => ListSeparator::Comma,
                    crate::ast::sass::ListSeparatorSyntax::Space => ListSeparator::Space,
                    crate::ast::sass::ListSeparatorSyntax::Slash => ListSeparator::Slash,
                };
                // A bare `1px/2` outside parens used to mean division before
                // Sass made `/` build a slash list by default (spec §7
                // `slash-div`); still warn when both sides are plain numbers,
                // the shape most likely to be a leftover division.
                if sep == ListSeparator::Slash && !*bracketed && values.len() == 2 {
                    if let [Value::Number(_), Value::Number(_)] = values.as_slice() {
                        self.deprecated(
                            crate::error::DeprecationId::SlashDiv,
                            "/ for division is deprecated; use math.div instead.",
                            expr.span,
                        )?;
                    }
                }
                Ok(Value::List(SassList::new(sep, *bracketed, values)))
            }
            ExpressionKind::MapLiteral { pairs } => {
                let mut map = SassMap::new();
                for (k, v) in pairs {
                    let key = self.eval_expression(k, scope)?;
                    let value = self.eval_expression(v, scope)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            ExpressionKind::Paren(inner) => self.eval_expression(inner, scope),
            ExpressionKind::Unary { op, operand } => self.eval_unary(*op, operand, scope),
            ExpressionKind::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            ExpressionKind::If { condition, if_true, if_false } => {
                let cond = self.eval_expression(condition, scope)?;
                if cond.is_truthy() {
                    self.eval_expression(if_true, scope)
                } else {
                    self.eval_expression(if_false, scope)
                }
            }
            ExpressionKind::Calculation { name, arguments } => {
                let mut args = Vec::with_capacity(arguments.len());
                for a in arguments {
                    args.push(crate::value::calculation::CalcArg::Value(self.eval_expression(a, scope)?));
                }
                Ok(Value::Calculation(crate::value::Calculation { name: name.clone(), arguments: args }))
            }
            ExpressionKind::Selector(inner) => {
                let text = self.eval_expression(inner, scope)?.to_string();
                let (list, bogus) = selector::parser::parse_selector_list_with_diagnostics(&text, false)?;
                self.report_bogus_combinators(&bogus, expr.span)?;
                Ok(Value::Selector(list))
            }
            ExpressionKind::Call { namespace, name, arguments } => self.eval_call(namespace.as_deref(), name, arguments, scope, expr.span),
        }
    }

    pub fn eval_interpolation_to_string(&mut self, interp: &Interpolation, scope: &Scope) -> Result<String, SassScriptException> {
        let mut out = String::new();
        for part in &interp.parts {
            match part {
                InterpolationPart::Literal(s) => out.push_str(s),
                InterpolationPart::Expr(e) => {
                    let value = self.eval_expression(e, scope)?;
                    out.push_str(&interpolate_value(&value));
                }
            }
        }
        Ok(out)
    }

    fn eval_variable(&mut self, namespace: Option<&str>, name: &str, scope: &Scope) -> Result<Value, SassScriptException> {
        if let Some(ns) = namespace {
            let module = self
                .namespace_module(ns)
                .ok_or_else(|| SassScriptException::new(format!("undefined module \"{}\"", ns)))?;
            return module
                .exports
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| SassScriptException::new(format!("undefined variable ${} in module \"{}\"", name, ns)));
        }
        module::lookup_variable(scope, name).ok_or_else(|| SassScriptException::new(format!("undefined variable ${}", name)))
    }

    /// Namespaces are bound in `self.namespaces`, separate from the
    /// canonical-URL keyed [`crate::module::resolver::ModuleGraph`] cache —
    /// see `eval/statements.rs`'s handling of `@use`, which registers the
    /// loaded module here under its local alias.
    fn namespace_module(&self, ns: &str) -> Option<std::rc::Rc<crate::module::Module>> {
        self.namespaces.get(ns).cloned()
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expression, scope: &Scope) -> Result<Value, SassScriptException> {
        let value = self.eval_expression(operand, scope)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOp::Neg => match value {
                Value::Number(n) => Ok(Value::Number(n.neg())),
                other => Ok(Value::String(SassString::unquoted(format!("-{}", other)))),
            },
            UnaryOp::Plus => match value {
                Value::Number(n) => Ok(Value::Number(n)),
                other => Ok(Value::String(SassString::unquoted(format!("+{}", other)))),
            },
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression, scope: &Scope) -> Result<Value, SassScriptException> {
        if op == BinaryOp::Or {
            let l = self.eval_expression(left, scope)?;
            return if l.is_truthy() { Ok(l) } else { self.eval_expression(right, scope) };
        }
        if op == BinaryOp::And {
            let l = self.eval_expression(left, scope)?;
            return if !l.is_truthy() { Ok(l) } else { self.eval_expression(right, scope) };
        }
        let l = self.eval_expression(left, scope)?;
        let r = self.eval_expression(right, scope)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
            BinaryOp::Neq => Ok(Value::Bool(!values_equal(&l, &r))),
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => compare(op, &l, &r),
            BinaryOp::Add => add(&l, &r),
            BinaryOp::Sub => sub(&l, &r),
            BinaryOp::Mul => mul(&l, &r),
            BinaryOp::Div => div(&l, &r),
            BinaryOp::Mod => rem(&l, &r),
            BinaryOp::Or | BinaryOp::And => unreachable!("short-circuited above"),
        }
    }

    fn eval_call(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        arguments: &crate::ast::sass::ArgumentList,
        scope: &Scope,
        span: crate::span::Span,
    ) -> Result<Value, SassScriptException> {
        if namespace.is_none() {
            if let Some(decl) = module::lookup_function(scope, name) {
                return self.call_user_function(decl, arguments, scope, span);
            }
        } else if let Some(module) = self.namespace_module(namespace.unwrap()) {
            if let Some(decl) = module.exports.functions.get(name).cloned() {
                return self.call_user_function(decl, arguments, scope, span);
            }
        }
        super::builtins::dispatch(self, namespace, name, arguments, scope, span)
    }

    pub(crate) fn call_user_function(
        &mut self,
        decl: std::rc::Rc<crate::ast::sass::FunctionDecl>,
        arguments: &crate::ast::sass::ArgumentList,
        call_scope: &Scope,
        span: crate::span::Span,
    ) -> Result<Value, SassScriptException> {
        self.call_depth += 1;
        if self.call_depth > super::MAX_CALL_DEPTH {
            self.call_depth -= 1;
            return Err(SassScriptException::new("stack depth exceeded"));
        }
        let declaration_scope = call_scope.clone();
        let frame = module::new_scope(Some(declaration_scope.clone()));
        let bind_result = super::calling::bind_arguments(self, &decl.parameters, arguments, call_scope, &declaration_scope, &frame);
        let result = bind_result.and_then(|()| {
            self.scope_stack.push(frame);
            self.call_stack.push(self.file_span(span));
            let flow = self.exec_body(&decl.body);
            self.call_stack.pop();
            self.scope_stack.pop();
            match flow {
                Ok(super::Flow::Return(v)) => Ok(v),
                Ok(super::Flow::Normal) => Ok(Value::Null),
                Err(e) => Err(SassScriptException::new(e.message)),
            }
        });
        self.call_depth -= 1;
        result
    }
}

/// The string a value contributes to `#{...}` interpolation: unquoted text
/// for strings, the ordinary `Display` rendering for everything else
/// (spec §4.3 "Interpolation flattening"). Nested quoted strings inside a
/// list keep their quotes — matching the common case, not dart-sass's
/// full unquoting recursion through every container.
pub fn interpolate_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b
}

fn compare(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    let (Value::Number(an), Value::Number(bn)) = (a, b) else {
        return Err(SassScriptException::new(format!("{} and {} are not comparable", a, b)));
    };
    let converted = an
        .value_in(&bn.numerators, &bn.denominators)
        .ok_or_else(|| SassScriptException::new(format!("{} and {} have incompatible units", a, b)))?;
    let ord = converted.partial_cmp(&bn.value).ok_or_else(|| SassScriptException::new("NaN is not comparable"))?;
    let result = match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Lte => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Gte => ord.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn add(a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.add(y).map(Value::Number).map_err(SassScriptException::new),
        (Value::List(_), _) | (_, Value::List(_)) if !matches!(a, Value::String(_)) && !matches!(b, Value::String(_)) => {
            Ok(Value::String(SassString::unquoted(format!("{}{}", a, b))))
        }
        (Value::String(x), _) => {
            let quotes = x.quotes;
            Ok(Value::String(SassString { text: format!("{}{}", x.text, concat_operand(b)), quotes }))
        }
        (_, Value::String(y)) => Ok(Value::String(SassString { text: format!("{}{}", concat_operand(a), y.text), quotes: y.quotes })),
        _ => Ok(Value::String(SassString::unquoted(format!("{}{}", a, b)))),
    }
}

fn concat_operand(v: &Value) -> String {
    match v {
        Value::String(s) => s.text.clone(),
        other => other.to_string(),
    }
}

fn sub(a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.sub(y).map(Value::Number).map_err(SassScriptException::new),
        _ => Ok(Value::String(SassString::unquoted(format!("{}-{}", a, b)))),
    }
}

fn mul(a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.mul(y))),
        _ => Err(SassScriptException::new(format!("can't multiply {} and {}", a, b))),
    }
}

fn div(a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.div(y))),
        _ => Ok(Value::String(SassString::unquoted(format!("{}/{}", a, b)))),
    }
}

fn rem(a: &Value, b: &Value) -> Result<Value, SassScriptException> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.rem(y).map(Value::Number).map_err(SassScriptException::new),
        _ => Err(SassScriptException::new(format!("can't take {} % {}", a, b))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(SassNumber::unitless(n))
    }

    #[test]
    fn adding_two_numbers_sums_their_values() {
        assert_eq!(add(&num(1.0), &num(2.0)).unwrap(), num(3.0));
    }

    #[test]
    fn adding_a_string_to_a_number_concatenates_without_a_separator() {
        let joined = add(&Value::unquoted_string("foo"), &num(1.0)).unwrap();
        assert_eq!(joined.to_string(), "foo1");
    }

    #[test]
    fn adding_two_unquoted_bare_values_concatenates_them() {
        // spec §8 invariant #4: non-string `+` falls back to concatenation.
        let joined = add(&Value::Bool(true), &Value::Bool(false)).unwrap();
        assert_eq!(joined, Value::unquoted_string("truefalse"));
    }

    #[test]
    fn subtracting_non_numbers_falls_back_to_a_dash_joined_string() {
        let joined = sub(&Value::unquoted_string("a"), &Value::unquoted_string("b")).unwrap();
        assert_eq!(joined, Value::unquoted_string("a-b"));
    }

    #[test]
    fn multiplying_non_numbers_is_an_error() {
        assert!(mul(&Value::unquoted_string("a"), &num(1.0)).is_err());
    }

    #[test]
    fn dividing_non_numbers_falls_back_to_a_slash_joined_string() {
        let joined = div(&Value::unquoted_string("a"), &Value::unquoted_string("b")).unwrap();
        assert_eq!(joined, Value::unquoted_string("a/b"));
    }

    #[test]
    fn modulo_of_non_numbers_is_an_error() {
        assert!(rem(&Value::unquoted_string("a"), &num(1.0)).is_err());
    }

    #[test]
    fn compare_rejects_non_number_operands() {
        assert!(compare(BinaryOp::Lt, &Value::unquoted_string("a"), &num(1.0)).is_err());
    }

    #[test]
    fn compare_converts_units_before_ordering() {
        let one_in = Value::Number(SassNumber::with_unit(1.0, "in"));
        let ninety_five_px = Value::Number(SassNumber::with_unit(95.0, "px"));
        assert_eq!(compare(BinaryOp::Gt, &one_in, &ninety_five_px).unwrap(), Value::Bool(true));
    }

    #[test]
    fn values_equal_uses_tolerant_number_equality() {
        assert!(values_equal(&num(1.0), &num(1.0 + 1e-12)));
    }

    #[test]
    fn interpolate_value_leaves_a_quoted_string_unquoted() {
        assert_eq!(interpolate_value(&Value::quoted_string("hi")), "hi");
    }

    #[test]
    fn interpolate_value_renders_null_as_empty() {
        assert_eq!(interpolate_value(&Value::Null), "");
    }
}

//! The built-in function library (spec §4.3). Functions are grouped the
//! way the Sass built-in modules are (`sass:math`, `sass:list`, `sass:map`,
//! `sass:string`, `sass:meta`, `sass:selector`, `sass:color`) and are also
//! reachable unqualified under their legacy global names, the way
//! `@use "sass:math"` coexists with bare `percentage()` in real
//! stylesheets. Coverage favors the functions exercised by ordinary
//! stylesheets over an exhaustive port of every built-in.

use super::Evaluator;
use crate::ast::sass::ArgumentList;
use crate::error::SassScriptException;
use crate::module::Scope;
use crate::selector;
use crate::span::Span;
use crate::value::{SassColor, SassList, SassMap, SassNumber, SassString, Value};

pub fn dispatch(ev: &mut Evaluator, namespace: Option<&str>, name: &str, arguments: &ArgumentList, scope: &Scope, span: Span) -> Result<Value, SassScriptException> {
    let args = eval_positional(ev, arguments, scope, span)?;
    if namespace.is_none() {
        if let Some(callback) = ev.host_functions.get(name).cloned() {
            return call_host_function(&callback, name, &args);
        }
    }
    match namespace {
        Some("math") => math::call(name, &args),
        Some("list") => list::call(name, &args),
        Some("map") => map::call(name, &args),
        Some("string") => string::call(name, &args),
        Some("meta") => meta::call(ev, name, &args, scope),
        Some("selector") => selector_fns::call(name, &args),
        Some("color") => color::call(name, &args),
        Some(other) => Err(SassScriptException::new(format!("unknown built-in module \"{}\"", other))),
        None => call_global(ev, name, &args, scope),
    }
}

pub(crate) fn call_host_function(callback: &std::rc::Rc<dyn Fn(&[Value]) -> Result<Value, String>>, name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
    callback(args).map_err(|e| SassScriptException::new(format!("host function \"{}\": {}", name, e)))
}

/// Evaluates every argument positionally, in source order, ignoring
/// keyword names (every built-in here accepts its arguments positionally —
/// matching the common call sites; named-argument built-in calls fall
/// back to positional order, which covers every non-keyword-only case).
fn eval_positional(ev: &mut Evaluator, arguments: &ArgumentList, scope: &Scope, span: Span) -> Result<Vec<Value>, SassScriptException> {
    use crate::ast::sass::Argument;
    let mut out = Vec::new();
    for arg in &arguments.arguments {
        match arg {
            Argument::Positional(e) | Argument::Named(_, e) => out.push(ev.eval_expression(e, scope)?),
            Argument::RestPositional(e) => {
                let v = ev.eval_expression(e, scope)?;
                out.extend(v.as_list_elements());
            }
            Argument::RestKeyword(e) => {
                // A keyword-spread map passed to a built-in that doesn't
                // expect one is simply ignored positionally.
                let _ = ev.eval_expression(e, scope)?;
            }
        }
    }
    let _ = span;
    Ok(out)
}

fn arg(args: &[Value], i: usize) -> Result<&Value, SassScriptException> {
    args.get(i).ok_or_else(|| SassScriptException::new(format!("missing argument {}", i + 1)))
}

fn arg_number<'a>(args: &'a [Value], i: usize) -> Result<&'a SassNumber, SassScriptException> {
    match arg(args, i)? {
        Value::Number(n) => Ok(n),
        other => Err(SassScriptException::new(format!("{} is not a number", other))),
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.text.clone(),
        other => other.to_string(),
    }
}

fn arg_string(args: &[Value], i: usize) -> Result<String, SassScriptException> {
    Ok(value_text(arg(args, i)?))
}

fn call_global(ev: &mut Evaluator, name: &str, args: &[Value], scope: &Scope) -> Result<Value, SassScriptException> {
    // Legacy global aliases for the built-in modules, same names dart-sass
    // keeps available without `@use` for backward compatibility.
    match name {
        "percentage" | "round" | "ceil" | "floor" | "abs" | "min" | "max" | "pow" | "sqrt" | "div" => math::call(name, args),
        "length" | "nth" | "join" | "append" | "index" | "zip" | "list-separator" | "is-bracketed" | "set-nth" => list::call(name, args),
        "map-get" => map::call("get", args),
        "map-set" => map::call("set", args),
        "map-merge" => map::call("merge", args),
        "map-has-key" => map::call("has-key", args),
        "map-keys" => map::call("keys", args),
        "map-values" => map::call("values", args),
        "map-remove" => map::call("remove", args),
        "quote" | "unquote" | "to-upper-case" | "to-lower-case" | "str-length" | "str-insert" | "str-index" | "str-slice" => string::call(name, args),
        "type-of" | "inspect" | "variable-exists" | "global-variable-exists" | "function-exists" | "mixin-exists" | "call" | "get-function" | "feature-exists" | "unit" | "unitless" | "comparable" => {
            meta::call(ev, name, args, scope)
        }
        "selector-nest" | "selector-append" | "selector-replace" | "selector-unify" | "is-superselector" | "simple-selectors" | "selector-parse" => selector_fns::call(name, args),
        "rgb" | "rgba" | "hsl" | "hsla" | "hwb" | "red" | "green" | "blue" | "alpha" | "opacity" | "mix" | "lighten" | "darken" | "saturate" | "desaturate" | "grayscale" | "invert"
        | "complement" => color::call(name, args),
        "if" => {
            let cond = arg(args, 0)?;
            Ok(if cond.is_truthy() { arg(args, 1)?.clone() } else { arg(args, 2).cloned().unwrap_or(Value::Null) })
        }
        "not" => Ok(Value::Bool(!arg(args, 0)?.is_truthy())),
        _ => Err(SassScriptException::new(format!("Undefined function \"{}\"", name))),
    }
}

mod math {
    use super::*;

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "ceil" => Ok(num(arg_number(args, 0)?, f64::ceil)),
            "floor" => Ok(num(arg_number(args, 0)?, f64::floor)),
            "abs" => Ok(num(arg_number(args, 0)?, f64::abs)),
            "round" => Ok(num(arg_number(args, 0)?, |v| v.round())),
            "sqrt" => {
                let n = arg_number(args, 0)?;
                n.require_unitless("sqrt()").map_err(SassScriptException::new)?;
                Ok(Value::Number(SassNumber::unitless(n.value.sqrt())))
            }
            "percentage" => {
                let n = arg_number(args, 0)?;
                n.require_unitless("percentage()").map_err(SassScriptException::new)?;
                Ok(Value::Number(SassNumber::with_unit(n.value * 100.0, "%".to_string())))
            }
            "pow" => {
                let base = arg_number(args, 0)?;
                let exp = arg_number(args, 1)?;
                base.require_unitless("pow()'s base").map_err(SassScriptException::new)?;
                exp.require_unitless("pow()'s exponent").map_err(SassScriptException::new)?;
                Ok(Value::Number(SassNumber::unitless(base.value.powf(exp.value))))
            }
            "min" => fold_numbers(args, |a, b| if a <= b { a } else { b }),
            "max" => fold_numbers(args, |a, b| if a >= b { a } else { b }),
            "div" => {
                let a = arg_number(args, 0)?;
                let b = arg_number(args, 1)?;
                Ok(Value::Number(a.div(b)))
            }
            _ => Err(SassScriptException::new(format!("unknown math function \"{}\"", name))),
        }
    }

    fn num(n: &SassNumber, f: impl Fn(f64) -> f64) -> Value {
        let mut result = n.clone();
        result.value = f(result.value);
        Value::Number(result)
    }

    fn fold_numbers(args: &[Value], pick: impl Fn(f64, f64) -> f64) -> Result<Value, SassScriptException> {
        let mut iter = args.iter();
        let first = match iter.next() {
            Some(Value::Number(n)) => n.clone(),
            _ => return Err(SassScriptException::new("min()/max() require at least one number")),
        };
        let mut best = first;
        for v in iter {
            let Value::Number(n) = v else {
                return Err(SassScriptException::new(format!("{} is not a number", v)));
            };
            let converted = n
                .value_in(&best.numerators, &best.denominators)
                .ok_or_else(|| SassScriptException::new("incompatible units"))?;
            if pick(converted, best.value) == converted && converted != best.value {
                best = n.clone();
            }
        }
        Ok(Value::Number(best))
    }
}

mod list {
    use super::*;
    use crate::value::ListSeparator;

    fn as_list(v: &Value) -> SassList {
        match v {
            Value::List(l) => l.clone(),
            other => SassList::new(ListSeparator::Undecided, false, vec![other.clone()]),
        }
    }

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "length" => {
                let v = arg(args, 0)?;
                Ok(Value::Number(SassNumber::unitless(match v {
                    Value::Map(m) => m.pairs.len() as f64,
                    other => as_list(other).elements.len() as f64,
                })))
            }
            "nth" => {
                let list = as_list(arg(args, 0)?);
                let index = nth_index(arg_number(args, 1)?, list.elements.len())?;
                Ok(list.elements[index].clone())
            }
            "set-nth" => {
                let mut list = as_list(arg(args, 0)?);
                let index = nth_index(arg_number(args, 1)?, list.elements.len())?;
                list.elements[index] = arg(args, 2)?.clone();
                Ok(Value::List(list))
            }
            "join" => {
                let a = as_list(arg(args, 0)?);
                let b = as_list(arg(args, 1)?);
                let sep = match args.get(2) {
                    Some(v) => match value_text(v).as_str() {
                        "comma" => ListSeparator::Comma,
                        "space" => ListSeparator::Space,
                        "slash" => ListSeparator::Slash,
                        _ => a.separator,
                    },
                    None if a.separator != ListSeparator::Undecided => a.separator,
                    None => b.separator,
                };
                let mut elements = a.elements;
                elements.extend(b.elements);
                Ok(Value::List(SassList::new(sep, a.bracketed, elements)))
            }
            "append" => {
                let mut list = as_list(arg(args, 0)?);
                list.elements.push(arg(args, 1)?.clone());
                Ok(Value::List(list))
            }
            "index" => {
                let list = as_list(arg(args, 0)?);
                let target = arg(args, 1)?;
                Ok(match list.elements.iter().position(|e| e == target) {
                    Some(i) => Value::Number(SassNumber::unitless((i + 1) as f64)),
                    None => Value::Null,
                })
            }
            "zip" => {
                let lists: Vec<SassList> = args.iter().map(as_list).collect();
                let len = lists.iter().map(|l| l.elements.len()).min().unwrap_or(0);
                let mut out = Vec::with_capacity(len);
                for i in 0..len {
                    out.push(Value::List(SassList::new(ListSeparator::Space, false, lists.iter().map(|l| l.elements[i].clone()).collect())));
                }
                Ok(Value::List(SassList::new(ListSeparator::Comma, false, out)))
            }
            "list-separator" => Ok(Value::String(SassString::unquoted(
                match as_list(arg(args, 0)?).separator {
                    ListSeparator::Comma => "comma",
                    ListSeparator::Space => "space",
                    ListSeparator::Slash => "slash",
                    ListSeparator::Undecided => "space",
                }
                .to_string(),
            ))),
            "is-bracketed" => Ok(Value::Bool(as_list(arg(args, 0)?).bracketed)),
            _ => Err(SassScriptException::new(format!("unknown list function \"{}\"", name))),
        }
    }

    fn nth_index(n: &SassNumber, len: usize) -> Result<usize, SassScriptException> {
        let i = n.as_integer().ok_or_else(|| SassScriptException::new("list index must be an integer"))?;
        if len == 0 {
            return Err(SassScriptException::new("list has no elements"));
        }
        let resolved = if i > 0 { i - 1 } else { len as i64 + i };
        if resolved < 0 || resolved as usize >= len {
            return Err(SassScriptException::new(format!("invalid index {} for a list of length {}", i, len)));
        }
        Ok(resolved as usize)
    }
}

mod map {
    use super::*;

    fn as_map(v: &Value) -> Result<SassMap, SassScriptException> {
        match v {
            Value::Map(m) => Ok(m.clone()),
            other => Err(SassScriptException::new(format!("{} is not a map", other))),
        }
    }

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "get" => {
                let map = as_map(arg(args, 0)?)?;
                Ok(map.get(arg(args, 1)?).cloned().unwrap_or(Value::Null))
            }
            "set" => {
                let mut map = as_map(arg(args, 0)?)?;
                map.insert(arg(args, 1)?.clone(), arg(args, 2)?.clone());
                Ok(Value::Map(map))
            }
            "has-key" => {
                let map = as_map(arg(args, 0)?)?;
                Ok(Value::Bool(map.get(arg(args, 1)?).is_some()))
            }
            "merge" => {
                let mut map = as_map(arg(args, 0)?)?;
                let other = as_map(arg(args, 1)?)?;
                for (k, v) in other.pairs {
                    map.insert(k, v);
                }
                Ok(Value::Map(map))
            }
            "keys" => {
                let map = as_map(arg(args, 0)?)?;
                Ok(Value::List(SassList::new(crate::value::ListSeparator::Comma, false, map.pairs.into_iter().map(|(k, _)| k).collect())))
            }
            "values" => {
                let map = as_map(arg(args, 0)?)?;
                Ok(Value::List(SassList::new(crate::value::ListSeparator::Comma, false, map.pairs.into_iter().map(|(_, v)| v).collect())))
            }
            "remove" => {
                let mut map = as_map(arg(args, 0)?)?;
                for key in &args[1..] {
                    map.pairs.retain(|(k, _)| k != key);
                }
                Ok(Value::Map(map))
            }
            _ => Err(SassScriptException::new(format!("unknown map function \"{}\"", name))),
        }
    }
}

mod string {
    use super::*;

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "quote" => Ok(Value::String(SassString::quoted(arg_string(args, 0)?))),
            "unquote" => Ok(Value::String(SassString::unquoted(arg_string(args, 0)?))),
            "to-upper-case" => with_quotes(args, str::to_uppercase),
            "to-lower-case" => with_quotes(args, str::to_lowercase),
            "str-length" => Ok(Value::Number(SassNumber::unitless(arg_string(args, 0)?.chars().count() as f64))),
            "str-slice" => {
                let s: Vec<char> = arg_string(args, 0)?.chars().collect();
                let len = s.len();
                let start = clamp_index(arg_number(args, 1)?, len)?;
                let end = match args.get(2) {
                    Some(Value::Number(n)) => clamp_index(n, len)?,
                    _ => len,
                };
                let text: String = if start > end || start >= len { String::new() } else { s[start..end.min(len)].iter().collect() };
                Ok(Value::String(like(args, 0, text)))
            }
            "str-index" => {
                let haystack = arg_string(args, 0)?;
                let needle = arg_string(args, 1)?;
                Ok(match haystack.find(&needle) {
                    Some(byte_idx) => Value::Number(SassNumber::unitless((haystack[..byte_idx].chars().count() + 1) as f64)),
                    None => Value::Null,
                })
            }
            "str-insert" => {
                let base = arg_string(args, 0)?;
                let insert = arg_string(args, 1)?;
                let len = base.chars().count();
                let idx = clamp_index(arg_number(args, 2)?, len)?;
                let mut chars: Vec<char> = base.chars().collect();
                let insertion: Vec<char> = insert.chars().collect();
                chars.splice(idx..idx, insertion);
                Ok(Value::String(like(args, 0, chars.into_iter().collect())))
            }
            _ => Err(SassScriptException::new(format!("unknown string function \"{}\"", name))),
        }
    }

    fn with_quotes(args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, SassScriptException> {
        let text = f(&arg_string(args, 0)?);
        Ok(Value::String(like(args, 0, text)))
    }

    fn like(args: &[Value], i: usize, text: String) -> SassString {
        match args.get(i) {
            Some(Value::String(s)) => SassString { text, quotes: s.quotes },
            _ => SassString::unquoted(text),
        }
    }

    fn clamp_index(n: &SassNumber, len: usize) -> Result<usize, SassScriptException> {
        let i = n.as_integer().ok_or_else(|| SassScriptException::new("string index must be an integer"))?;
        let resolved = if i >= 1 { i - 1 } else if i == 0 { 0 } else { len as i64 + i };
        Ok(resolved.clamp(0, len as i64) as usize)
    }
}

mod meta {
    use super::*;

    pub fn call(ev: &mut Evaluator, name: &str, args: &[Value], scope: &Scope) -> Result<Value, SassScriptException> {
        match name {
            "type-of" => Ok(Value::String(SassString::unquoted(arg(args, 0)?.type_name().to_string()))),
            "inspect" => Ok(Value::String(SassString::unquoted(arg(args, 0)?.to_string()))),
            "unit" => Ok(Value::String(SassString::quoted(arg_number(args, 0)?.unit_suffix()))),
            "unitless" => Ok(Value::Bool(arg_number(args, 0)?.is_unitless())),
            "comparable" => {
                let a = arg_number(args, 0)?;
                let b = arg_number(args, 1)?;
                Ok(Value::Bool(a.value_in(&b.numerators, &b.denominators).is_some()))
            }
            "variable-exists" => Ok(Value::Bool(crate::module::lookup_variable(scope, &arg_string(args, 0)?).is_some())),
            "global-variable-exists" => {
                let mut s = scope.clone();
                loop {
                    let parent = s.borrow().parent.clone();
                    match parent {
                        Some(p) => s = p,
                        None => break,
                    }
                }
                let exists = s.borrow().variables.contains_key(&arg_string(args, 0)?);
                Ok(Value::Bool(exists))
            }
            "function-exists" => Ok(Value::Bool(crate::module::lookup_function(scope, &arg_string(args, 0)?).is_some())),
            "mixin-exists" => Ok(Value::Bool(crate::module::lookup_mixin(scope, &arg_string(args, 0)?).is_some())),
            "feature-exists" => Ok(Value::Bool(matches!(arg_string(args, 0)?.as_str(), "global-variable-shadowing" | "extend-selector-pseudoclass" | "units-level-3" | "at-error"))),
            "get-function" => {
                let fn_name = arg_string(args, 0)?;
                Ok(Value::Function(match crate::module::lookup_function(scope, &fn_name) {
                    Some(decl) => crate::value::SassFunction::UserDefined(decl),
                    None if ev.host_functions.contains_key(&fn_name) => crate::value::SassFunction::Host(fn_name.into()),
                    None => crate::value::SassFunction::Builtin { name: fn_name.into(), module: None },
                }))
            }
            "call" => {
                let Value::Function(f) = arg(args, 0)?.clone() else {
                    return Err(SassScriptException::new("call() requires a function value"));
                };
                let call_args = crate::ast::sass::ArgumentList {
                    arguments: args[1..].iter().map(|v| crate::ast::sass::Argument::Positional(literal_expr(v.clone()))).collect(),
                };
                match f {
                    crate::value::SassFunction::UserDefined(decl) => ev.call_user_function(decl, &call_args, scope, crate::span::Span::point(0)),
                    crate::value::SassFunction::Builtin { name, module } => super::dispatch(ev, module.as_deref(), &name, &call_args, scope, crate::span::Span::point(0)),
                    crate::value::SassFunction::Host(name) => match ev.host_functions.get(name.as_ref()).cloned() {
                        Some(callback) => call_host_function(&callback, &name, &args[1..]),
                        None => Err(SassScriptException::new(format!("host function \"{}\" has no local implementation", name))),
                    },
                }
            }
            _ => Err(SassScriptException::new(format!("unknown meta function \"{}\"", name))),
        }
    }

    fn literal_expr(v: Value) -> crate::ast::sass::Expression {
        crate::ast::sass::Expression {
            node: literal_kind(v),
            span: crate::span::Span::point(0),
        }
    }

    fn literal_kind(v: Value) -> crate::ast::sass::ExpressionKind {
        use crate::ast::sass::{Interpolation, InterpolationPart, StringQuoting};
        match v {
            Value::Null => crate::ast::sass::ExpressionKind::Null,
            Value::Bool(b) => crate::ast::sass::ExpressionKind::Bool(b),
            Value::Number(n) => crate::ast::sass::ExpressionKind::Number { value: n.value, unit: n.unit().map(|u| u.to_string()) },
            other => crate::ast::sass::ExpressionKind::Str(
                Interpolation { parts: vec![InterpolationPart::Literal(other.to_string())] },
                StringQuoting::Unquoted,
            ),
        }
    }
}

mod selector_fns {
    use super::*;
    use crate::selector::algebra::{resolve_parent, unify_compound};
    use crate::selector::{ComplexComponent, ComplexSelector, SelectorList};

    fn as_selector(v: &Value) -> Result<SelectorList, SassScriptException> {
        match v {
            Value::Selector(s) => Ok(s.clone()),
            Value::String(s) => selector::parser::parse_selector_list(&s.text, false),
            Value::List(_) => selector::parser::parse_selector_list(&v.to_string(), false),
            other => Err(SassScriptException::new(format!("{} is not a valid selector", other))),
        }
    }

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "selector-parse" => Ok(Value::Selector(as_selector(arg(args, 0)?)?)),
            "is-superselector" => {
                let a = as_selector(arg(args, 0)?)?;
                let b = as_selector(arg(args, 1)?)?;
                Ok(Value::Bool(selector::algebra::is_superselector(&a, &b)))
            }
            "selector-nest" => {
                let mut acc: Option<SelectorList> = None;
                for a in args {
                    let sel = as_selector(a)?;
                    acc = Some(match acc {
                        None => sel,
                        Some(prev) => resolve_parent(Some(&prev), &sel),
                    });
                }
                Ok(Value::Selector(acc.unwrap_or_default()))
            }
            "selector-append" => {
                let mut complexes = Vec::new();
                let first = as_selector(arg(args, 0)?)?;
                for base in &first.complex {
                    let mut current = base.clone();
                    for rest in &args[1..] {
                        let sel = as_selector(rest)?;
                        for c in &sel.complex {
                            let mut components = current.components.clone();
                            components.extend(c.components.clone());
                            current = ComplexSelector { components };
                        }
                    }
                    complexes.push(current);
                }
                Ok(Value::Selector(SelectorList::from_complex(complexes)))
            }
            "selector-unify" => {
                let a = as_selector(arg(args, 0)?)?;
                let b = as_selector(arg(args, 1)?)?;
                let mut out = Vec::new();
                for ca in &a.complex {
                    for cb in &b.complex {
                        if let (Some(la), Some(lb)) = (ca.last_compound(), cb.last_compound()) {
                            if let Some(unified) = unify_compound(la, lb) {
                                let mut components = ca.components[..ca.components.len().saturating_sub(1)].to_vec();
                                components.push(ComplexComponent::Compound(unified));
                                out.push(ComplexSelector { components });
                            }
                        }
                    }
                }
                Ok(if out.is_empty() { Value::Null } else { Value::Selector(SelectorList::from_complex(out)) })
            }
            "selector-replace" | "simple-selectors" => Err(SassScriptException::new(format!("{} is not yet supported", name))),
            _ => Err(SassScriptException::new(format!("unknown selector function \"{}\"", name))),
        }
    }
}

mod color {
    use super::*;

    fn num_arg(args: &[Value], i: usize) -> Result<f64, SassScriptException> {
        Ok(arg_number(args, i)?.value)
    }

    fn as_color(v: &Value) -> Result<SassColor, SassScriptException> {
        match v {
            Value::Color(c) => Ok(*c),
            other => Err(SassScriptException::new(format!("{} is not a color", other))),
        }
    }

    pub fn call(name: &str, args: &[Value]) -> Result<Value, SassScriptException> {
        match name {
            "rgb" | "rgba" => {
                if args.len() == 1 {
                    return Ok(Value::Color(as_color(arg(args, 0)?)?));
                }
                if args.len() == 2 {
                    let base = as_color(arg(args, 0)?)?;
                    return Ok(Value::Color(base.with_alpha(num_arg(args, 1)?)));
                }
                let r = num_arg(args, 0)?;
                let g = num_arg(args, 1)?;
                let b = num_arg(args, 2)?;
                let a = if args.len() > 3 { num_arg(args, 3)? } else { 1.0 };
                Ok(Value::Color(SassColor::rgb(r, g, b, a)))
            }
            "hsl" | "hsla" => {
                let h = num_arg(args, 0)?;
                let s = percent(args, 1)?;
                let l = percent(args, 2)?;
                let a = if args.len() > 3 { num_arg(args, 3)? } else { 1.0 };
                Ok(Value::Color(SassColor::hsl(h, s, l, a)))
            }
            "hwb" => {
                let h = num_arg(args, 0)?;
                let w = percent(args, 1)?;
                let b = percent(args, 2)?;
                let a = if args.len() > 3 { num_arg(args, 3)? } else { 1.0 };
                Ok(Value::Color(SassColor::hwb(h, w, b, a)))
            }
            "red" => Ok(Value::Number(SassNumber::unitless(as_color(arg(args, 0)?)?.red))),
            "green" => Ok(Value::Number(SassNumber::unitless(as_color(arg(args, 0)?)?.green))),
            "blue" => Ok(Value::Number(SassNumber::unitless(as_color(arg(args, 0)?)?.blue))),
            "alpha" | "opacity" => Ok(Value::Number(SassNumber::unitless(as_color(arg(args, 0)?)?.alpha))),
            "mix" => {
                let a = as_color(arg(args, 0)?)?;
                let b = as_color(arg(args, 1)?)?;
                let weight = if args.len() > 2 { num_arg(args, 2)? / 100.0 } else { 0.5 };
                Ok(Value::Color(mix(a, b, weight)))
            }
            "grayscale" => {
                let c = as_color(arg(args, 0)?)?;
                let hsl = c.to_hsl();
                Ok(Value::Color(SassColor::hsl(hsl.0, 0.0, hsl.2, c.alpha)))
            }
            "invert" => {
                let c = as_color(arg(args, 0)?)?;
                Ok(Value::Color(SassColor::rgb(255.0 - c.red, 255.0 - c.green, 255.0 - c.blue, c.alpha)))
            }
            "lighten" => adjust_lightness(args, 1.0),
            "darken" => adjust_lightness(args, -1.0),
            "saturate" => adjust_saturation(args, 1.0),
            "desaturate" => adjust_saturation(args, -1.0),
            "complement" => {
                let c = as_color(arg(args, 0)?)?;
                let hsl = c.to_hsl();
                Ok(Value::Color(SassColor::hsl((hsl.0 + 180.0) % 360.0, hsl.1, hsl.2, c.alpha)))
            }
            _ => Err(SassScriptException::new(format!("unknown color function \"{}\"", name))),
        }
    }

    fn percent(args: &[Value], i: usize) -> Result<f64, SassScriptException> {
        Ok(num_arg(args, i)?)
    }

    fn adjust_lightness(args: &[Value], sign: f64) -> Result<Value, SassScriptException> {
        let c = as_color(arg(args, 0)?)?;
        let amount = num_arg(args, 1)?;
        let hsl = c.to_hsl();
        let l = (hsl.2 + sign * amount).clamp(0.0, 100.0);
        Ok(Value::Color(SassColor::hsl(hsl.0, hsl.1, l, c.alpha)))
    }

    fn adjust_saturation(args: &[Value], sign: f64) -> Result<Value, SassScriptException> {
        let c = as_color(arg(args, 0)?)?;
        let amount = num_arg(args, 1)?;
        let hsl = c.to_hsl();
        let s = (hsl.1 + sign * amount).clamp(0.0, 100.0);
        Ok(Value::Color(SassColor::hsl(hsl.0, s, hsl.2, c.alpha)))
    }

    fn mix(a: SassColor, b: SassColor, weight: f64) -> SassColor {
        let w = weight.clamp(0.0, 1.0);
        SassColor::rgb(
            a.red * w + b.red * (1.0 - w),
            a.green * w + b.green * (1.0 - w),
            a.blue * w + b.blue * (1.0 - w),
            a.alpha * w + b.alpha * (1.0 - w),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::sass::{Argument, ExpressionKind};
    use crate::span::Span;

    fn number_arg(value: f64) -> Argument {
        Argument::Positional(crate::ast::sass::Expression::new(ExpressionKind::Number { value, unit: None }, Span::point(0)))
    }

    #[test]
    fn a_host_function_is_reachable_both_directly_and_through_meta_call() {
        // spec §8 invariant #9: a host callback registered on `CompileOptions`
        // answers both an unqualified call from Sass and `meta.get-function`
        // + `meta.call`, driving the identical registered closure either way.
        let mut ev = Evaluator::new("test.scss", Vec::new()).with_host_function(
            "double",
            std::rc::Rc::new(|args: &[Value]| {
                let Value::Number(n) = &args[0] else { return Err("expected a number".to_string()) };
                Ok(Value::Number(SassNumber::unitless(n.value * 2.0)))
            }),
        );
        let scope = ev.scope();

        let direct_args = ArgumentList { arguments: vec![number_arg(21.0)] };
        let direct = dispatch(&mut ev, None, "double", &direct_args, &scope, Span::point(0)).unwrap();
        assert_eq!(direct, Value::Number(SassNumber::unitless(42.0)));

        let func = meta::call(&mut ev, "get-function", &[Value::String(SassString::quoted("double"))], &scope).unwrap();
        assert_eq!(func, Value::Function(crate::value::SassFunction::Host("double".into())));

        let via_call = meta::call(&mut ev, "call", &[func, Value::Number(SassNumber::unitless(21.0))], &scope).unwrap();
        assert_eq!(via_call, direct);
    }

    #[test]
    fn a_host_function_error_surfaces_as_a_script_exception_not_a_panic() {
        // spec §8 invariant #10: failures are always a closed error kind.
        let mut ev = Evaluator::new("test.scss", Vec::new())
            .with_host_function("fails", std::rc::Rc::new(|_args: &[Value]| Err("boom".to_string())));
        let scope = ev.scope();
        let args = ArgumentList { arguments: vec![number_arg(1.0)] };
        let err = dispatch(&mut ev, None, "fails", &args, &scope, Span::point(0)).unwrap_err();
        assert!(err.0.contains("boom"));
    }
}

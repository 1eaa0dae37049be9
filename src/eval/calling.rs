//! The argument-binding convention (spec §4.3, "Calling convention"):
//! positional, named, and spread arguments bind against a parameter
//! list, applying defaults from the callee's own declaration scope.

use super::Evaluator;
use crate::ast::sass::{Argument, ArgumentList, ParameterList};
use crate::error::SassScriptException;
use crate::module::{self, Scope};
use crate::value::{ListSeparator, SassList, SassMap, Value};
use std::collections::HashMap;

pub fn bind_arguments(
    ev: &mut Evaluator,
    params: &ParameterList,
    args: &ArgumentList,
    call_scope: &Scope,
    declaration_scope: &Scope,
    target_scope: &Scope,
) -> Result<(), SassScriptException> {
    let mut positional: Vec<Value> = Vec::new();
    let mut named: HashMap<String, Value> = HashMap::new();

    for arg in &args.arguments {
        match arg {
            Argument::Positional(expr) => positional.push(ev.eval_expression(expr, call_scope)?),
            Argument::Named(name, expr) => {
                let value = ev.eval_expression(expr, call_scope)?;
                if named.insert(name.clone(), value).is_some() {
                    return Err(SassScriptException::new(format!("duplicate argument ${}", name)));
                }
            }
            Argument::RestPositional(expr) => {
                let value = ev.eval_expression(expr, call_scope)?;
                positional.extend(value.as_list_elements());
            }
            Argument::RestKeyword(expr) => {
                let value = ev.eval_expression(expr, call_scope)?;
                if let Value::Map(map) = value {
                    for (k, v) in map.pairs {
                        if let Value::String(s) = k {
                            named.insert(s.text, v);
                        }
                    }
                }
            }
        }
    }

    let mut pos_iter = positional.into_iter();
    let declared: std::collections::HashSet<&str> = params.parameters.iter().map(|p| p.name.as_str()).collect();
    for param in &params.parameters {
        let value = if let Some(v) = pos_iter.next() {
            if named.contains_key(&param.name) {
                return Err(SassScriptException::new(format!(
                    "argument ${} passed both positionally and by name",
                    param.name
                )));
            }
            v
        } else if let Some(v) = named.remove(&param.name) {
            v
        } else if let Some(default) = &param.default {
            ev.eval_expression(default, declaration_scope)?
        } else {
            return Err(SassScriptException::new(format!("missing argument ${}", param.name)));
        };
        module::set_variable(target_scope, &param.name, value);
    }

    let leftover_positional: Vec<Value> = pos_iter.collect();
    if let Some(rest_name) = &params.rest {
        if !leftover_positional.is_empty() {
            module::set_variable(
                target_scope,
                rest_name,
                Value::List(SassList::new(ListSeparator::Comma, false, leftover_positional)),
            );
        } else if !named.is_empty() {
            let mut map = SassMap::new();
            for (k, v) in named.drain() {
                map.insert(Value::quoted_string(k), v);
            }
            module::set_variable(target_scope, rest_name, Value::Map(map));
        } else {
            module::set_variable(target_scope, rest_name, Value::List(SassList::empty()));
        }
        return Ok(());
    }

    if !leftover_positional.is_empty() {
        return Err(SassScriptException::new("too many positional arguments"));
    }
    if let Some(name) = named.keys().find(|n| !declared.contains(n.as_str())) {
        return Err(SassScriptException::new(format!("unknown argument ${}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::sass::{Expression, ExpressionKind, Parameter};
    use crate::span::Span;
    use crate::value::SassNumber;

    fn num(value: f64) -> Expression {
        Expression::new(ExpressionKind::Number { value, unit: None }, Span::point(0))
    }

    fn param(name: &str, default: Option<f64>) -> Parameter {
        Parameter { name: name.to_string(), default: default.map(num) }
    }

    fn get(scope: &Scope, name: &str) -> Value {
        module::lookup_variable(scope, name).expect("variable should be bound")
    }

    #[test]
    fn positional_arguments_bind_in_declared_order() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None), param("b", None)], rest: None };
        let args = ArgumentList { arguments: vec![Argument::Positional(num(1.0)), Argument::Positional(num(2.0))] };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).unwrap();
        assert_eq!(get(&target, "a"), Value::Number(SassNumber::unitless(1.0)));
        assert_eq!(get(&target, "b"), Value::Number(SassNumber::unitless(2.0)));
    }

    #[test]
    fn a_named_argument_fills_a_parameter_out_of_order() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None), param("b", None)], rest: None };
        let args = ArgumentList {
            arguments: vec![Argument::Named("b".to_string(), num(2.0)), Argument::Named("a".to_string(), num(1.0))],
        };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).unwrap();
        assert_eq!(get(&target, "a"), Value::Number(SassNumber::unitless(1.0)));
        assert_eq!(get(&target, "b"), Value::Number(SassNumber::unitless(2.0)));
    }

    #[test]
    fn an_omitted_argument_falls_back_to_its_default() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", Some(7.0))], rest: None };
        let args = ArgumentList { arguments: vec![] };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).unwrap();
        assert_eq!(get(&target, "a"), Value::Number(SassNumber::unitless(7.0)));
    }

    #[test]
    fn a_missing_required_argument_is_an_error() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None)], rest: None };
        let args = ArgumentList { arguments: vec![] };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        assert!(bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).is_err());
    }

    #[test]
    fn the_same_parameter_cannot_be_passed_both_positionally_and_by_name() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None)], rest: None };
        let args = ArgumentList {
            arguments: vec![Argument::Positional(num(1.0)), Argument::Named("a".to_string(), num(2.0))],
        };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        assert!(bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).is_err());
    }

    #[test]
    fn leftover_positional_arguments_collect_into_the_rest_parameter() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None)], rest: Some("rest".to_string()) };
        let args = ArgumentList {
            arguments: vec![Argument::Positional(num(1.0)), Argument::Positional(num(2.0)), Argument::Positional(num(3.0))],
        };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).unwrap();
        let Value::List(rest) = get(&target, "rest") else { panic!("expected a list") };
        assert_eq!(rest.elements, vec![Value::Number(SassNumber::unitless(2.0)), Value::Number(SassNumber::unitless(3.0))]);
    }

    #[test]
    fn an_unknown_named_argument_is_rejected_when_there_is_no_rest_parameter() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        let params = ParameterList { parameters: vec![param("a", None)], rest: None };
        let args = ArgumentList { arguments: vec![Argument::Named("a".to_string(), num(1.0)), Argument::Named("b".to_string(), num(2.0))] };
        let call_scope = module::new_scope(None);
        let target = module::new_scope(None);
        assert!(bind_arguments(&mut ev, &params, &args, &call_scope, &call_scope, &target).is_err());
    }
}

//! Statement execution (spec §4.3): one function per [`StatementKind`]
//! variant, dispatched from [`super::Evaluator::exec_body`]. Every
//! function reads its scope via `ev.scope()` rather than threading one
//! through as a parameter — expression evaluation takes an explicit scope
//! (so default-argument evaluation can use the callee's declaration scope
//! instead of the caller's), but statement execution always runs against
//! whatever frame is on top of the evaluator's own stack.

use super::scope::{ContentArgs, ContentBlock};
use super::{is_empty_rule, Evaluator, Flow};
use crate::ast::css::{CssAtRule, CssDeclaration, CssNode, CssStatement};
use crate::ast::sass::{Configuration, ImportTarget, MixinDecl, Statement, StatementKind};
use crate::error::{SassRuntimeException, SassScriptException};
use crate::module::{self, Exports, Module, Scope};
use crate::span::{SourceFile, Span};
use crate::value::{ListSeparator, SassList, SassNumber, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Safety bound on `@while` iteration count: real stylesheets terminate in
/// a handful of passes, so this only guards against an author's mistaken
/// condition hanging the compiler.
const MAX_LOOP_ITERATIONS: u64 = 1_000_000;

pub fn exec_statement(ev: &mut Evaluator, statement: &Statement) -> Result<Flow, SassRuntimeException> {
    match &statement.node {
        StatementKind::SilentComment(_) => Ok(Flow::Normal),

        StatementKind::LoudComment(interp) => {
            let scope = ev.scope();
            let text = ev
                .eval_interpolation_to_string(interp, &scope)
                .map_err(|e| ev.runtime_error(e, statement.span))?;
            ev.emit(CssNode::new(CssStatement::Comment(text), statement.span));
            Ok(Flow::Normal)
        }

        StatementKind::Root(body) => ev.exec_body(body),

        StatementKind::VariableDecl { namespace, name, value, guarded, global } => {
            let scope = ev.scope();
            if let Some(ns) = namespace {
                ev.warn(format!("cannot assign to variable ${} in module \"{}\"", name, ns), statement.span);
                return Ok(Flow::Normal);
            }
            if *guarded {
                let bound = module::lookup_variable(&scope, name);
                if matches!(bound, Some(v) if v != Value::Null) {
                    return Ok(Flow::Normal);
                }
            }
            let v = ev.eval_expression(value, &scope).map_err(|e| ev.runtime_error(e, value.span))?;
            if *global {
                module::set_global(&scope, name, v);
            } else {
                module::set_variable(&scope, name, v);
            }
            Ok(Flow::Normal)
        }

        StatementKind::FunctionDecl(decl) => {
            module::declare_function(&ev.scope(), decl.clone());
            Ok(Flow::Normal)
        }

        StatementKind::MixinDecl(decl) => {
            module::declare_mixin(&ev.scope(), decl.clone());
            Ok(Flow::Normal)
        }

        StatementKind::Return(expr) => {
            let scope = ev.scope();
            let v = ev.eval_expression(expr, &scope).map_err(|e| ev.runtime_error(e, expr.span))?;
            Ok(Flow::Return(v))
        }

        StatementKind::Error(expr) => {
            let scope = ev.scope();
            let v = ev.eval_expression(expr, &scope).map_err(|e| ev.runtime_error(e, expr.span))?;
            Err(ev.runtime_error(SassScriptException::new(v.to_string()), statement.span))
        }

        StatementKind::Warn(expr) => {
            let scope = ev.scope();
            let v = ev.eval_expression(expr, &scope).map_err(|e| ev.runtime_error(e, expr.span))?;
            ev.warn(v.to_string(), statement.span);
            Ok(Flow::Normal)
        }

        StatementKind::Debug(expr) => {
            let scope = ev.scope();
            let v = ev.eval_expression(expr, &scope).map_err(|e| ev.runtime_error(e, expr.span))?;
            ev.debug(v.to_string(), statement.span);
            Ok(Flow::Normal)
        }

        StatementKind::If { clauses, else_clause } => {
            let scope = ev.scope();
            for clause in clauses {
                let cond = ev
                    .eval_expression(&clause.condition, &scope)
                    .map_err(|e| ev.runtime_error(e, clause.condition.span))?;
                if cond.is_truthy() {
                    ev.push_scope();
                    let flow = ev.exec_body(&clause.body);
                    ev.pop_scope();
                    return flow;
                }
            }
            if let Some(body) = else_clause {
                ev.push_scope();
                let flow = ev.exec_body(body);
                ev.pop_scope();
                return flow;
            }
            Ok(Flow::Normal)
        }

        StatementKind::Each { variables, list, body } => {
            let scope = ev.scope();
            let list_val = ev.eval_expression(list, &scope).map_err(|e| ev.runtime_error(e, list.span))?;
            for entry in each_entries(&list_val, variables.len()) {
                ev.push_scope();
                let each_scope = ev.scope();
                for (i, name) in variables.iter().enumerate() {
                    module::set_variable(&each_scope, name, entry.get(i).cloned().unwrap_or(Value::Null));
                }
                let flow = ev.exec_body(body);
                ev.pop_scope();
                match flow? {
                    Flow::Normal => {}
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        }

        StatementKind::For { variable, from, to, inclusive, body } => {
            let scope = ev.scope();
            let from_val = ev.eval_expression(from, &scope).map_err(|e| ev.runtime_error(e, from.span))?;
            let to_val = ev.eval_expression(to, &scope).map_err(|e| ev.runtime_error(e, to.span))?;
            let (Value::Number(from_n), Value::Number(to_n)) = (&from_val, &to_val) else {
                return Err(ev.runtime_error(SassScriptException::new("@for bounds must be numbers"), statement.span));
            };
            let start = from_n
                .as_integer()
                .ok_or_else(|| ev.runtime_error(SassScriptException::new("@for bounds must be integers"), statement.span))?;
            let end = to_n
                .as_integer()
                .ok_or_else(|| ev.runtime_error(SassScriptException::new("@for bounds must be integers"), statement.span))?;
            let step: i64 = if start <= end { 1 } else { -1 };
            let mut i = start;
            loop {
                let done = if step > 0 {
                    if *inclusive {
                        i > end
                    } else {
                        i >= end
                    }
                } else if *inclusive {
                    i < end
                } else {
                    i <= end
                };
                if done {
                    break;
                }
                ev.push_scope();
                module::set_variable(&ev.scope(), variable, Value::Number(SassNumber::unitless(i as f64)));
                let flow = ev.exec_body(body);
                ev.pop_scope();
                match flow? {
                    Flow::Normal => {}
                    flow @ Flow::Return(_) => return Ok(flow),
                }
                i += step;
            }
            Ok(Flow::Normal)
        }

        StatementKind::While { condition, body } => {
            let mut iterations: u64 = 0;
            loop {
                let scope = ev.scope();
                let cond = ev.eval_expression(condition, &scope).map_err(|e| ev.runtime_error(e, condition.span))?;
                if !cond.is_truthy() {
                    break;
                }
                iterations += 1;
                if iterations > MAX_LOOP_ITERATIONS {
                    return Err(ev.runtime_error(SassScriptException::new("@while loop exceeded its iteration limit"), statement.span));
                }
                ev.push_scope();
                let flow = ev.exec_body(body);
                ev.pop_scope();
                match flow? {
                    Flow::Normal => {}
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            }
            Ok(Flow::Normal)
        }

        StatementKind::StyleRule { selector, body } => exec_style_rule(ev, statement, selector, body),

        StatementKind::Declaration { name, value, body } => exec_declaration(ev, statement, name, value, body),

        StatementKind::Include { namespace, name, arguments, content } => {
            exec_include(ev, statement, namespace.as_deref(), name, arguments, content.as_deref())
        }

        StatementKind::Content { .. } => {
            let Some(entry) = ev.content_stack.last().cloned().flatten() else {
                return Ok(Flow::Normal);
            };
            let (content, _args) = entry;
            ev.push_scope_with_parent(content.closure.clone());
            ev.content_stack.push(None);
            let flow = ev.exec_body(&content.body);
            ev.content_stack.pop();
            ev.pop_scope();
            flow
        }

        StatementKind::AtRoot { query, body } => exec_at_root(ev, statement, query, body),

        StatementKind::Media { query, body } => exec_media(ev, statement, query, body),

        StatementKind::Supports { condition, body } => exec_supports(ev, statement, condition, body),

        StatementKind::UnknownAtRule { name, prelude, body } => exec_unknown_at_rule(ev, statement, name, prelude, body),

        StatementKind::Extend { selector, optional } => {
            let Some(current) = ev.current_selector.clone() else {
                return Err(ev.runtime_error(SassScriptException::new("@extend may only be used within a style rule"), statement.span));
            };
            let scope = ev.scope();
            let text = ev
                .eval_interpolation_to_string(selector, &scope)
                .map_err(|e| ev.runtime_error(e, statement.span))?;
            let (extendee, bogus) =
                crate::selector::parser::parse_selector_list_with_diagnostics(&text, false).map_err(|e| ev.runtime_error(e, statement.span))?;
            ev.report_bogus_combinators(&bogus, statement.span).map_err(|e| ev.runtime_error(e, statement.span))?;
            let span = ev.file_span(statement.span);
            ev.extender.add_extension(current, extendee, *optional, span, ev.current_condition_scope.clone());
            Ok(Flow::Normal)
        }

        StatementKind::Import(targets) => {
            for target in targets {
                match target {
                    ImportTarget::StaticUrl(interp) => {
                        let scope = ev.scope();
                        let url = ev
                            .eval_interpolation_to_string(interp, &scope)
                            .map_err(|e| ev.runtime_error(e, statement.span))?;
                        ev.emit(CssNode::new(CssStatement::Import { url }, statement.span));
                    }
                    ImportTarget::DynamicUrl(url) => exec_import(ev, url, statement.span)?,
                }
            }
            Ok(Flow::Normal)
        }

        StatementKind::Use { url, namespace, configuration } => {
            let module = load_or_get_module(ev, url, configuration, statement.span)?;
            if let Some(ns) = namespace {
                ev.namespaces.insert(ns.clone(), module);
            }
            Ok(Flow::Normal)
        }

        StatementKind::Forward { url, prefix, filter, configuration } => {
            let module = load_or_get_module(ev, url, configuration, statement.span)?;
            if let Some(exports) = ev.exports_stack.last_mut() {
                exports.merge_prefixed(&module.exports, prefix.as_deref(), filter.as_ref());
            }
            Ok(Flow::Normal)
        }
    }
}

fn each_entries(value: &Value, var_count: usize) -> Vec<Vec<Value>> {
    match value {
        Value::Map(map) if var_count >= 2 => map.pairs.iter().map(|(k, v)| vec![k.clone(), v.clone()]).collect(),
        Value::Map(map) => map
            .pairs
            .iter()
            .map(|(k, v)| vec![Value::List(SassList::new(ListSeparator::Space, false, vec![k.clone(), v.clone()]))])
            .collect(),
        Value::List(list) if var_count >= 2 => list
            .elements
            .iter()
            .map(|el| match el {
                Value::List(inner) => inner.elements.clone(),
                other => vec![other.clone()],
            })
            .collect(),
        Value::List(list) => list.elements.iter().map(|el| vec![el.clone()]).collect(),
        other => vec![vec![other.clone()]],
    }
}

fn exec_style_rule(ev: &mut Evaluator, statement: &Statement, selector: &crate::ast::sass::Interpolation, body: &[Statement]) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let text = ev
        .eval_interpolation_to_string(selector, &scope)
        .map_err(|e| ev.runtime_error(e, statement.span))?;

    if ev.in_keyframes {
        let selectors =
            crate::parser::keyframes::parse_keyframe_selector_list(text.trim()).map_err(|e| ev.runtime_error(e, statement.span))?;
        let node = CssNode::new(CssStatement::AtRule(CssAtRule::KeyframeBlock { selectors }), statement.span);
        let children = node.children.clone();
        ev.push_scope();
        let flow = ev.with_children(children, |ev| ev.exec_body(body));
        ev.pop_scope();
        let flow = flow?;
        if !node.children.borrow().is_empty() {
            ev.emit(node);
        }
        return Ok(flow);
    }

    let (parsed, bogus) =
        crate::selector::parser::parse_selector_list_with_diagnostics(&text, true).map_err(|e| ev.runtime_error(e, statement.span))?;
    ev.report_bogus_combinators(&bogus, statement.span).map_err(|e| ev.runtime_error(e, statement.span))?;
    let resolved = crate::selector::algebra::resolve_parent(ev.current_selector.as_ref(), &parsed);
    let mut node = CssNode::new(CssStatement::StyleRule { selector: Rc::new(RefCell::new(resolved.clone())) }, statement.span);
    node.condition_scope = ev.current_condition_scope.clone();
    let children = node.children.clone();
    let previous_selector = ev.current_selector.replace(resolved);
    ev.push_scope();
    let flow = ev.with_children(children, |ev| ev.exec_body(body));
    ev.pop_scope();
    ev.current_selector = previous_selector;
    let flow = flow?;
    if !is_empty_rule(&node) {
        ev.emit(node);
    }
    Ok(flow)
}

fn exec_declaration(
    ev: &mut Evaluator,
    statement: &Statement,
    name: &crate::ast::sass::Interpolation,
    value: &Option<crate::ast::sass::Expression>,
    body: &[Statement],
) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let name_text = ev.eval_interpolation_to_string(name, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;

    let value_val = match value {
        Some(expr) => Some(ev.eval_expression(expr, &scope).map_err(|e| ev.runtime_error(e, expr.span))?),
        None => None,
    };
    let elide = match &value_val {
        None => true,
        Some(v) => matches!(v, Value::Null) || v.is_empty_unquoted_string(),
    };
    if !elide {
        if let Some(v) = &value_val {
            ev.emit(CssNode::new(
                CssStatement::Declaration(CssDeclaration { name: name_text.clone(), value: v.clone(), important: false, span: statement.span }),
                statement.span,
            ));
        }
    }

    if body.is_empty() {
        return Ok(Flow::Normal);
    }

    // Nested declarations (spec §4.3): run the body with a private children
    // list, then re-emit each produced declaration with this name prefixed
    // on. A doubly-nested declaration already carries its own one-level
    // prefix by the time it reaches this loop, so the prefixing composes.
    let collected: Rc<RefCell<Vec<CssNode>>> = Rc::new(RefCell::new(Vec::new()));
    let flow = ev.with_children(collected.clone(), |ev| ev.exec_body(body))?;
    for child in collected.borrow().iter() {
        if let CssStatement::Declaration(decl) = &child.statement {
            let mut prefixed = decl.clone();
            prefixed.name = format!("{}-{}", name_text, decl.name);
            ev.emit(CssNode::new(CssStatement::Declaration(prefixed), child.span));
        } else {
            ev.emit(child.clone());
        }
    }
    Ok(flow)
}

fn exec_include(
    ev: &mut Evaluator,
    statement: &Statement,
    namespace: Option<&str>,
    name: &str,
    arguments: &crate::ast::sass::ArgumentList,
    content: Option<&MixinDecl>,
) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let mixin_decl = lookup_mixin_for_include(ev, namespace, name, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;

    ev.call_depth += 1;
    if ev.call_depth > super::MAX_CALL_DEPTH {
        ev.call_depth -= 1;
        return Err(ev.runtime_error(SassScriptException::new("stack depth exceeded"), statement.span));
    }

    let declaration_scope = scope.clone();
    let frame = module::new_scope(Some(declaration_scope.clone()));
    let bind_result = super::calling::bind_arguments(ev, &mixin_decl.parameters, arguments, &scope, &declaration_scope, &frame)
        .map_err(|e| ev.runtime_error(e, statement.span));

    let result = match bind_result {
        Ok(()) => {
            let content_entry = content.map(|c| (ContentBlock { body: Rc::from(c.body.clone()), closure: scope.clone() }, ContentArgs::default()));
            ev.content_stack.push(content_entry);
            ev.scope_stack.push(frame);
            ev.call_stack.push(ev.file_span(statement.span));
            let flow = ev.exec_body(&mixin_decl.body);
            ev.call_stack.pop();
            ev.scope_stack.pop();
            ev.content_stack.pop();
            flow
        }
        Err(e) => Err(e),
    };
    ev.call_depth -= 1;
    result
}

fn lookup_mixin_for_include(ev: &Evaluator, namespace: Option<&str>, name: &str, scope: &Scope) -> Result<Rc<MixinDecl>, SassScriptException> {
    if let Some(ns) = namespace {
        let module = ev
            .namespaces
            .get(ns)
            .cloned()
            .ok_or_else(|| SassScriptException::new(format!("undefined module \"{}\"", ns)))?;
        module
            .exports
            .mixins
            .get(name)
            .cloned()
            .ok_or_else(|| SassScriptException::new(format!("undefined mixin {} in module \"{}\"", name, ns)))
    } else {
        module::lookup_mixin(scope, name).ok_or_else(|| SassScriptException::new(format!("undefined mixin {}", name)))
    }
}

fn exec_at_root(ev: &mut Evaluator, statement: &Statement, query: &Option<crate::ast::sass::Interpolation>, body: &[Statement]) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let exclude_rule = match query {
        None => true,
        Some(q) => {
            let text = ev.eval_interpolation_to_string(q, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;
            at_root_excludes_rule(&text)
        }
    };
    let previous_selector = if exclude_rule { ev.current_selector.take() } else { ev.current_selector.clone() };
    let root_children = ev.root_children.clone();
    let flow = ev.with_children(root_children, |ev| ev.exec_body(body));
    ev.current_selector = previous_selector;
    flow
}

fn at_root_excludes_rule(query: &str) -> bool {
    let q = query.to_ascii_lowercase();
    if let Some(rest) = q.strip_prefix("without:") {
        return rest.split_whitespace().any(|t| t == "rule" || t == "all");
    }
    if let Some(rest) = q.strip_prefix("with:") {
        return !rest.split_whitespace().any(|t| t == "rule" || t == "all");
    }
    true
}

fn exec_media(ev: &mut Evaluator, statement: &Statement, query: &crate::ast::sass::Interpolation, body: &[Statement]) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let text = ev.eval_interpolation_to_string(query, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;
    let queries = crate::parser::media::parse_query_list(&text).map_err(|e| ev.runtime_error(e, statement.span))?;
    let canonical: Rc<str> = Rc::from(format!("@media {}", text.split_whitespace().collect::<Vec<_>>().join(" ")));
    let mut node = CssNode::new(CssStatement::AtRule(CssAtRule::Media { queries }), statement.span);
    node.condition_scope = Some(canonical.clone());
    let children = node.children.clone();
    let previous_scope = ev.current_condition_scope.replace(canonical);
    let flow = ev.with_children(children, |ev| ev.exec_body(body))?;
    ev.current_condition_scope = previous_scope;
    if !node.children.borrow().is_empty() {
        ev.emit(node);
    }
    Ok(flow)
}

fn exec_supports(
    ev: &mut Evaluator,
    statement: &Statement,
    condition: &crate::ast::sass::SupportsCondition,
    body: &[Statement],
) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let css_cond = eval_supports_condition(ev, condition, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;
    let canonical: Rc<str> = Rc::from(format!("@supports {}", css_cond));
    let mut node = CssNode::new(CssStatement::AtRule(CssAtRule::Supports { condition: css_cond }), statement.span);
    node.condition_scope = Some(canonical.clone());
    let children = node.children.clone();
    let previous_scope = ev.current_condition_scope.replace(canonical);
    let flow = ev.with_children(children, |ev| ev.exec_body(body))?;
    ev.current_condition_scope = previous_scope;
    if !node.children.borrow().is_empty() {
        ev.emit(node);
    }
    Ok(flow)
}

fn eval_supports_condition(
    ev: &mut Evaluator,
    cond: &crate::ast::sass::SupportsCondition,
    scope: &Scope,
) -> Result<crate::ast::css::SupportsCondition, SassScriptException> {
    use crate::ast::css::SupportsCondition as C;
    use crate::ast::sass::SupportsCondition as S;
    Ok(match cond {
        S::Declaration { property, value } => C::Declaration {
            property: ev.eval_interpolation_to_string(property, scope)?,
            value: ev.eval_interpolation_to_string(value, scope)?,
        },
        S::Interpolation(i) => C::Interpolation(ev.eval_interpolation_to_string(i, scope)?),
        S::Not(inner) => C::Not(Box::new(eval_supports_condition(ev, inner, scope)?)),
        S::And(items) => C::And(items.iter().map(|c| eval_supports_condition(ev, c, scope)).collect::<Result<_, _>>()?),
        S::Or(items) => C::Or(items.iter().map(|c| eval_supports_condition(ev, c, scope)).collect::<Result<_, _>>()?),
    })
}

fn exec_unknown_at_rule(
    ev: &mut Evaluator,
    statement: &Statement,
    name: &str,
    prelude: &crate::ast::sass::Interpolation,
    body: &Option<Vec<Statement>>,
) -> Result<Flow, SassRuntimeException> {
    let scope = ev.scope();
    let prelude_text = ev.eval_interpolation_to_string(prelude, &scope).map_err(|e| ev.runtime_error(e, statement.span))?;
    let is_keyframes = name == "keyframes" || name.ends_with("-keyframes");

    match body {
        None => {
            let mut node = CssNode::new(CssStatement::AtRule(CssAtRule::Unknown { name: name.to_string(), prelude: prelude_text }), statement.span);
            node.has_block = false;
            ev.emit(node);
            Ok(Flow::Normal)
        }
        Some(body) => {
            let at_rule = if is_keyframes {
                CssAtRule::Keyframes { name: prelude_text, vendor_prefix: vendor_prefix_of(name) }
            } else {
                CssAtRule::Unknown { name: name.to_string(), prelude: prelude_text }
            };
            let mut node = CssNode::new(CssStatement::AtRule(at_rule), statement.span);
            node.condition_scope = ev.current_condition_scope.clone();
            let children = node.children.clone();
            let previous_in_keyframes = ev.in_keyframes;
            ev.in_keyframes = is_keyframes;
            let flow = ev.with_children(children, |ev| ev.exec_body(body))?;
            ev.in_keyframes = previous_in_keyframes;
            ev.emit(node);
            Ok(flow)
        }
    }
}

fn vendor_prefix_of(name: &str) -> Option<String> {
    if name == "keyframes" {
        None
    } else {
        name.strip_suffix("keyframes").map(std::string::ToString::to_string)
    }
}

fn exec_import(ev: &mut Evaluator, url: &str, span: Span) -> Result<(), SassRuntimeException> {
    let current_url = ev.current_file.url().to_string();
    let canonical = module::resolver::canonicalize(&ev.importers, url, Some(&current_url))
        .ok_or_else(|| ev.runtime_error(SassScriptException::new(format!("Can't find stylesheet to import: {}", url)), span))?;
    if !ev.modules.try_enter_import(&canonical) {
        // Already being imported higher up the call stack: break the
        // cycle by skipping this re-entrant import (spec §4.2).
        return Ok(());
    }
    let result = exec_import_body(ev, &canonical, span);
    ev.modules.exit_import(&canonical);
    result
}

fn exec_import_body(ev: &mut Evaluator, canonical: &str, span: Span) -> Result<(), SassRuntimeException> {
    let loaded =
        module::resolver::load(&ev.importers, canonical).ok_or_else(|| ev.runtime_error(SassScriptException::new(format!("Can't load stylesheet: {}", canonical)), span))?;
    let file = SourceFile::new(canonical.to_string(), loaded.contents);
    let stylesheet = crate::parser::parse_stylesheet(file.clone(), loaded.syntax).map_err(|e| ev.runtime_error(e, span))?;
    ev.record_source(&file);
    let previous_file = std::mem::replace(&mut ev.current_file, file);
    let flow = ev.exec_body(&stylesheet.statements);
    ev.current_file = previous_file;
    flow.map(|_| ())
}

fn load_or_get_module(ev: &mut Evaluator, url: &str, configuration: &Configuration, span: Span) -> Result<Rc<Module>, SassRuntimeException> {
    let caller_scope = ev.scope();
    let current_url = ev.current_file.url().to_string();
    let canonical = module::resolver::canonicalize(&ev.importers, url, Some(&current_url))
        .ok_or_else(|| ev.runtime_error(SassScriptException::new(format!("Can't find stylesheet to import: {}", url)), span))?;

    if let Some(existing) = ev.modules.get(&canonical) {
        return Ok(existing);
    }

    ev.modules.begin_use(&canonical).map_err(|e| ev.runtime_error(e, span))?;
    let result = load_module_body(ev, &canonical, configuration, &caller_scope, span);
    ev.modules.end_use(&canonical);
    result
}

fn load_module_body(ev: &mut Evaluator, canonical: &str, configuration: &Configuration, caller_scope: &Scope, span: Span) -> Result<Rc<Module>, SassRuntimeException> {
    let loaded =
        module::resolver::load(&ev.importers, canonical).ok_or_else(|| ev.runtime_error(SassScriptException::new(format!("Can't load stylesheet: {}", canonical)), span))?;
    let file = SourceFile::new(canonical.to_string(), loaded.contents);
    let stylesheet = crate::parser::parse_stylesheet(file.clone(), loaded.syntax).map_err(|e| ev.runtime_error(e, span))?;
    ev.record_source(&file);

    let module_scope = module::new_scope(None);
    for cfg_var in &configuration.variables {
        let value = ev.eval_expression(&cfg_var.value, caller_scope).map_err(|e| ev.runtime_error(e, span))?;
        module::set_variable(&module_scope, &cfg_var.name, value);
    }

    let module_css: Rc<RefCell<Vec<CssNode>>> = Rc::new(RefCell::new(Vec::new()));
    let previous_file = std::mem::replace(&mut ev.current_file, file);
    ev.scope_stack.push(module_scope.clone());
    ev.exports_stack.push(Exports::default());
    let flow = ev.with_children(module_css.clone(), |ev| ev.exec_body(&stylesheet.statements));
    let forwarded = ev.exports_stack.pop().unwrap_or_default();
    ev.scope_stack.pop();
    ev.current_file = previous_file;
    flow?;

    let mut exports = Exports::from_scope(&module_scope);
    exports.variables.extend(forwarded.variables);
    exports.functions.extend(forwarded.functions);
    exports.mixins.extend(forwarded.mixins);

    let module = Rc::new(Module { url: canonical.to_string(), scope: module_scope, exports, css: module_css });
    ev.modules.insert(canonical.to_string(), module.clone());
    ev.root_children.borrow_mut().extend(module.css.borrow().iter().cloned());
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SassMap, SassNumber};

    fn num(n: f64) -> Value {
        Value::Number(SassNumber::unitless(n))
    }

    #[test]
    fn each_over_a_map_with_one_variable_pairs_key_and_value_into_a_space_list() {
        let mut map = SassMap::new();
        map.insert(Value::unquoted_string("a"), num(1.0));
        let entries = each_entries(&Value::Map(map), 1);
        assert_eq!(entries, vec![vec![Value::List(SassList::new(ListSeparator::Space, false, vec![Value::unquoted_string("a"), num(1.0)]))]]);
    }

    #[test]
    fn each_over_a_map_with_two_variables_destructures_key_and_value_separately() {
        let mut map = SassMap::new();
        map.insert(Value::unquoted_string("a"), num(1.0));
        let entries = each_entries(&Value::Map(map), 2);
        assert_eq!(entries, vec![vec![Value::unquoted_string("a"), num(1.0)]]);
    }

    #[test]
    fn each_over_a_bare_value_yields_a_single_one_element_row() {
        assert_eq!(each_entries(&num(5.0), 1), vec![vec![num(5.0)]]);
    }

    #[test]
    fn at_root_without_rule_excludes_the_enclosing_style_rule() {
        assert!(at_root_excludes_rule("without: rule"));
        assert!(!at_root_excludes_rule("without: media"));
    }

    #[test]
    fn at_root_with_rule_keeps_the_enclosing_style_rule() {
        assert!(!at_root_excludes_rule("with: rule"));
        assert!(at_root_excludes_rule("with: media"));
    }

    #[test]
    fn at_root_defaults_to_excluding_the_rule_when_no_query_is_given() {
        assert!(at_root_excludes_rule(""));
    }

    #[test]
    fn vendor_prefix_of_strips_the_keyframes_suffix() {
        assert_eq!(vendor_prefix_of("-webkit-keyframes"), Some("-webkit-".to_string()));
        assert_eq!(vendor_prefix_of("keyframes"), None);
        assert_eq!(vendor_prefix_of("media"), None);
    }
}

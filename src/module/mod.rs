//! Scopes and modules (spec §3 "Scopes", §4.2 "Module Resolver").
//!
//! A lexical environment is a chain of [`Frame`]s, each holding three
//! disjoint namespaces (variables, functions, mixins). Frames are
//! reference-counted so that closures captured at declaration time (a
//! function/mixin's defining scope, used to evaluate its parameter
//! defaults) stay valid independent of the call stack that's active when
//! the closure is later invoked.

pub mod importer;
pub mod resolver;

use crate::ast::sass::{FunctionDecl, MixinDecl};
use crate::value::{SassFunction, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Frame {
    pub variables: HashMap<String, Value>,
    pub functions: HashMap<String, Rc<FunctionDecl>>,
    pub mixins: HashMap<String, Rc<MixinDecl>>,
    pub parent: Option<Scope>,
}

/// A reference-counted, mutable frame. Cloning a `Scope` shares the same
/// frame (spec's "chain of frames" is realized as a parent pointer, not a
/// borrowed slice, so closures can hold onto an ancestor after the
/// evaluator has popped past it).
pub type Scope = Rc<RefCell<Frame>>;

pub fn new_scope(parent: Option<Scope>) -> Scope {
    Rc::new(RefCell::new(Frame { parent, ..Default::default() }))
}

pub fn lookup_variable(scope: &Scope, name: &str) -> Option<Value> {
    let frame = scope.borrow();
    if let Some(v) = frame.variables.get(name) {
        return Some(v.clone());
    }
    frame.parent.as_ref().and_then(|p| lookup_variable(p, name))
}

pub fn lookup_function(scope: &Scope, name: &str) -> Option<Rc<FunctionDecl>> {
    let frame = scope.borrow();
    if let Some(v) = frame.functions.get(name) {
        return Some(v.clone());
    }
    frame.parent.as_ref().and_then(|p| lookup_function(p, name))
}

pub fn lookup_mixin(scope: &Scope, name: &str) -> Option<Rc<MixinDecl>> {
    let frame = scope.borrow();
    if let Some(v) = frame.mixins.get(name) {
        return Some(v.clone());
    }
    frame.parent.as_ref().and_then(|p| lookup_mixin(p, name))
}

/// Writes to the innermost frame that already binds `name`, falling back
/// to `scope` itself when no frame does (spec §4.3, variable declaration
/// semantics).
pub fn set_variable(scope: &Scope, name: &str, value: Value) {
    if set_variable_existing(scope, name, &value) {
        return;
    }
    scope.borrow_mut().variables.insert(name.to_string(), value);
}

fn set_variable_existing(scope: &Scope, name: &str, value: &Value) -> bool {
    let has_it = scope.borrow().variables.contains_key(name);
    if has_it {
        scope.borrow_mut().variables.insert(name.to_string(), value.clone());
        return true;
    }
    let parent = scope.borrow().parent.clone();
    match parent {
        Some(p) => set_variable_existing(&p, name, value),
        None => false,
    }
}

/// Writes to the module's top frame regardless of nesting (`!global`).
pub fn set_global(scope: &Scope, name: &str, value: Value) {
    let mut cur = scope.clone();
    loop {
        let parent = cur.borrow().parent.clone();
        match parent {
            Some(p) => cur = p,
            None => break,
        }
    }
    cur.borrow_mut().variables.insert(name.to_string(), value);
}

pub fn declare_function(scope: &Scope, decl: Rc<FunctionDecl>) {
    scope.borrow_mut().functions.insert(decl.name.clone(), decl);
}

pub fn declare_mixin(scope: &Scope, decl: Rc<MixinDecl>) {
    scope.borrow_mut().mixins.insert(decl.name.clone(), decl);
}

/// A compiled module's export table (spec §4.2): every variable,
/// function, and mixin visible to a `@use`r, keyed by the unprefixed
/// name it was declared with.
#[derive(Debug, Default, Clone)]
pub struct Exports {
    pub variables: HashMap<String, Value>,
    pub functions: HashMap<String, Rc<FunctionDecl>>,
    pub mixins: HashMap<String, Rc<MixinDecl>>,
}

impl Exports {
    pub fn from_scope(scope: &Scope) -> Self {
        let frame = scope.borrow();
        Exports {
            variables: frame.variables.clone(),
            functions: frame.functions.clone(),
            mixins: frame.mixins.clone(),
        }
    }

    pub fn merge_prefixed(&mut self, other: &Exports, prefix: Option<&str>, filter: Option<&crate::ast::sass::MemberFilter>) {
        let keep = |name: &str| -> bool {
            match filter {
                None => true,
                Some(f) if f.is_show => f.names.iter().any(|n| n == name),
                Some(f) => !f.names.iter().any(|n| n == name),
            }
        };
        let apply_prefix = |name: &str| -> String {
            match prefix {
                Some(p) => format!("{}{}", p, name),
                None => name.to_string(),
            }
        };
        for (name, value) in &other.variables {
            if keep(name) {
                self.variables.insert(apply_prefix(name), value.clone());
            }
        }
        for (name, decl) in &other.functions {
            if keep(name) {
                self.functions.insert(apply_prefix(name), decl.clone());
            }
        }
        for (name, decl) in &other.mixins {
            if keep(name) {
                self.mixins.insert(apply_prefix(name), decl.clone());
            }
        }
    }
}

/// One evaluated stylesheet, keyed by canonical URL (spec "Module" in
/// the glossary). Evaluated exactly once per compile (spec §4.2,
/// at-most-once-execution invariant), then immutable.
pub struct Module {
    pub url: String,
    pub scope: Scope,
    pub exports: Exports,
    /// Top-level CSS produced while evaluating this module, appended to
    /// the importing stylesheet at the `@use`/`@forward` site the first
    /// time the module is loaded.
    pub css: Rc<RefCell<Vec<crate::ast::css::CssNode>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::sass::MemberFilter;
    use crate::value::SassNumber;

    fn value(n: f64) -> Value {
        Value::Number(SassNumber::unitless(n))
    }

    #[test]
    fn lookup_variable_walks_up_through_parent_frames() {
        let root = new_scope(None);
        set_variable(&root, "color", value(1.0));
        let child = new_scope(Some(root));
        assert_eq!(lookup_variable(&child, "color"), Some(value(1.0)));
        assert_eq!(lookup_variable(&child, "missing"), None);
    }

    #[test]
    fn set_variable_reassigns_an_existing_binding_in_an_ancestor_frame() {
        let root = new_scope(None);
        set_variable(&root, "x", value(1.0));
        let child = new_scope(Some(root.clone()));
        set_variable(&child, "x", value(2.0));
        assert_eq!(lookup_variable(&root, "x"), Some(value(2.0)));
        assert!(!child.borrow().variables.contains_key("x"));
    }

    #[test]
    fn set_variable_declares_locally_when_no_frame_already_binds_the_name() {
        let root = new_scope(None);
        let child = new_scope(Some(root.clone()));
        set_variable(&child, "y", value(3.0));
        assert!(child.borrow().variables.contains_key("y"));
        assert!(!root.borrow().variables.contains_key("y"));
    }

    #[test]
    fn set_global_writes_to_the_outermost_frame_regardless_of_nesting() {
        let root = new_scope(None);
        let mid = new_scope(Some(root.clone()));
        let leaf = new_scope(Some(mid));
        set_global(&leaf, "z", value(4.0));
        assert_eq!(root.borrow().variables.get("z"), Some(&value(4.0)));
        assert_eq!(lookup_variable(&leaf, "z"), Some(value(4.0)));
    }

    #[test]
    fn merge_prefixed_applies_a_namespace_prefix_to_every_export() {
        let mut target = Exports::default();
        let mut source = Exports::default();
        source.variables.insert("base".to_string(), value(5.0));
        target.merge_prefixed(&source, Some("ns."), None);
        assert_eq!(target.variables.get("ns.base"), Some(&value(5.0)));
    }

    #[test]
    fn merge_prefixed_honors_a_show_filter() {
        let mut target = Exports::default();
        let mut source = Exports::default();
        source.variables.insert("shown".to_string(), value(1.0));
        source.variables.insert("hidden".to_string(), value(2.0));
        let filter = MemberFilter { names: vec!["shown".to_string()], is_show: true, active: true };
        target.merge_prefixed(&source, None, Some(&filter));
        assert!(target.variables.contains_key("shown"));
        assert!(!target.variables.contains_key("hidden"));
    }

    #[test]
    fn merge_prefixed_honors_a_hide_filter() {
        let mut target = Exports::default();
        let mut source = Exports::default();
        source.variables.insert("shown".to_string(), value(1.0));
        source.variables.insert("hidden".to_string(), value(2.0));
        let filter = MemberFilter { names: vec!["hidden".to_string()], is_show: false, active: true };
        target.merge_prefixed(&source, None, Some(&filter));
        assert!(target.variables.contains_key("shown"));
        assert!(!target.variables.contains_key("hidden"));
    }
}

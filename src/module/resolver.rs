//! URL canonicalization and the module cache (spec §4.2). This module is
//! deliberately evaluator-agnostic: it resolves and memoizes, but the
//! actual execution of a module's body (which needs the full evaluator)
//! is driven from [`crate::eval`], which owns a [`ModuleGraph`].

use super::importer::{Importer, LoadedStylesheet};
use super::Module;
use crate::error::SassScriptException;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Tries each importer in order, returning the first canonicalization.
pub fn canonicalize(importers: &[Box<dyn Importer>], url: &str, from_import: Option<&str>) -> Option<String> {
    importers.iter().find_map(|i| i.canonicalize(url, from_import))
}

pub fn load(importers: &[Box<dyn Importer>], canonical_url: &str) -> Option<LoadedStylesheet> {
    importers.iter().find_map(|i| i.load(canonical_url))
}

/// Per-compile module cache plus cycle guards (spec §4.2: `@use`/`@forward`
/// cycles are errors, `@import` cycles are broken by re-entry skipping).
#[derive(Default)]
pub struct ModuleGraph {
    modules: HashMap<String, Rc<Module>>,
    use_chain: Vec<String>,
    active_imports: HashSet<String>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Rc<Module>> {
        self.modules.get(url).cloned()
    }

    pub fn insert(&mut self, url: String, module: Rc<Module>) {
        self.modules.insert(url, module);
    }

    /// Pushes `url` onto the `@use`/`@forward` resolution chain, erroring
    /// if it's already present (a cycle).
    pub fn begin_use(&mut self, url: &str) -> Result<(), SassScriptException> {
        if self.use_chain.iter().any(|u| u == url) {
            return Err(SassScriptException::new(format!("module loop: {} is already being loaded", url)));
        }
        self.use_chain.push(url.to_string());
        Ok(())
    }

    pub fn end_use(&mut self, url: &str) {
        if let Some(pos) = self.use_chain.iter().rposition(|u| u == url) {
            self.use_chain.remove(pos);
        }
    }

    /// `@import` re-entry guard: returns `false` (and does not mark
    /// active) if `url` is already being imported higher up the stack,
    /// so the importing statement is simply skipped rather than erroring.
    pub fn try_enter_import(&mut self, url: &str) -> bool {
        self.active_imports.insert(url.to_string())
    }

    pub fn exit_import(&mut self, url: &str) {
        self.active_imports.remove(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Exports, Module};
    use std::cell::RefCell;

    fn stub_module(url: &str) -> Rc<Module> {
        Rc::new(Module {
            url: url.to_string(),
            scope: crate::module::new_scope(None),
            exports: Exports::default(),
            css: Rc::new(RefCell::new(Vec::new())),
        })
    }

    #[test]
    fn a_module_is_cached_by_canonical_url_after_insert() {
        // spec §8 invariant #8: at-most-once execution relies on this cache
        // being consulted before a module's body is re-run.
        let mut graph = ModuleGraph::new();
        assert!(graph.get("pkg:a").is_none());
        graph.insert("pkg:a".to_string(), stub_module("pkg:a"));
        assert!(graph.get("pkg:a").is_some());
    }

    #[test]
    fn a_use_cycle_is_rejected() {
        let mut graph = ModuleGraph::new();
        graph.begin_use("pkg:a").unwrap();
        graph.begin_use("pkg:b").unwrap();
        assert!(graph.begin_use("pkg:a").is_err());
    }

    #[test]
    fn ending_a_use_allows_it_to_be_entered_again() {
        let mut graph = ModuleGraph::new();
        graph.begin_use("pkg:a").unwrap();
        graph.end_use("pkg:a");
        assert!(graph.begin_use("pkg:a").is_ok());
    }

    #[test]
    fn import_re_entry_guard_only_lets_the_first_entry_through() {
        let mut graph = ModuleGraph::new();
        assert!(graph.try_enter_import("a.scss"));
        assert!(!graph.try_enter_import("a.scss"));
        graph.exit_import("a.scss");
        assert!(graph.try_enter_import("a.scss"));
    }
}

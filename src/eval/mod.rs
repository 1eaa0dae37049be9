//! The evaluator (spec §4.3): walks the Sass AST and produces the CSS AST,
//! owning every piece of state a compile needs — the scope stack, the
//! module graph, the emit cursor into the CSS tree under construction, the
//! content-block register, and the extender that rewrites selectors once
//! the tree is complete.
//!
//! Shaped after the teacher's single `Css3` parser struct owning all parse
//! state in one place rather than threading a dozen parameters through
//! free functions; here the same struct drives evaluation instead of
//! parsing.

pub mod builtins;
pub mod calling;
pub mod expressions;
pub mod scope;
pub mod statements;

use crate::ast::css::{CssNode, CssStatement, CssStylesheet};
use crate::ast::sass::Statement;
use crate::error::{DeprecationId, Diagnostic, DiagnosticKind, SassRuntimeException, SassScriptException};
use crate::extend::Extender;
use crate::logger::{Logger, NullLogger};
use crate::module::importer::Importer;
use crate::module::resolver::ModuleGraph;
use crate::module::{self, Exports, Module, Scope as LexicalScope};
use crate::selector::{Combinator, SelectorList};
use crate::span::{FileSpan, SourceFile, Span};
use crate::value::Value;
use scope::{ContentArgs, ContentBlock};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Guards against unbounded `@include`/function recursion (spec §4.3, "a
/// recursion-depth guard"). Dart Sass uses 'a few hundred' deep call
/// stacks as its practical ceiling; matched here rather than derived from
/// anything the teacher needed, since parsing never recurses this deep.
pub const MAX_CALL_DEPTH: usize = 512;

pub struct Evaluator<'a> {
    pub importers: Vec<Box<dyn Importer>>,
    pub logger: &'a dyn Logger,
    pub quiet_deps: bool,
    pub fatal_deprecations: HashSet<DeprecationId>,
    /// Deprecations to warn about even though they aren't active by
    /// default yet (spec §6 `futureDeprecations`). See [`DeprecationId::is_future`].
    pub future_deprecations: HashSet<DeprecationId>,
    pub modules: ModuleGraph,
    pub extender: Extender,
    pub(crate) current_file: SourceFile,
    pub(crate) scope_stack: Vec<LexicalScope>,
    pub(crate) content_stack: Vec<Option<(ContentBlock, ContentArgs)>>,
    pub(crate) call_stack: Vec<FileSpan>,
    pub(crate) current_selector: Option<SelectorList>,
    pub(crate) current_children: Rc<RefCell<Vec<CssNode>>>,
    pub(crate) current_condition_scope: Option<Rc<str>>,
    pub(crate) in_keyframes: bool,
    pub(crate) call_depth: usize,
    /// Local `@use ... as <namespace>` bindings for the stylesheet
    /// currently being evaluated — distinct from [`ModuleGraph`]'s
    /// canonical-URL cache, since the same loaded module can be bound
    /// under different namespaces by different stylesheets.
    pub(crate) namespaces: std::collections::HashMap<String, Rc<Module>>,
    /// Accumulates this stylesheet's own exports while it runs, so
    /// `@forward` can merge a dependency's members in before the whole
    /// thing is itself packaged up as a [`Module`] by a caller higher in
    /// the `@use`/`@forward` chain. Pushed/popped per nested module load.
    pub(crate) exports_stack: Vec<Exports>,
    /// Insertion point for `@at-root` (spec §4.3): the top-level CSS
    /// children of whichever stylesheet/module is currently running.
    pub(crate) root_children: Rc<RefCell<Vec<CssNode>>>,
    /// Values passed via `@use ... with (...)`/`@forward ... with (...)`,
    /// consumed by matching `!default` variable declarations as the
    /// configured module runs; whatever's left unconsumed is an error.
    pub(crate) pending_configuration: Vec<std::collections::HashMap<String, Value>>,
    /// Host callbacks registered via `CompileOptions::functions` (spec §9,
    /// "First-class functions across host boundaries"), reachable the same
    /// way a user-defined global function is.
    pub(crate) host_functions: std::collections::HashMap<String, Rc<dyn Fn(&[Value]) -> Result<Value, String>>>,
    /// Every source file text seen during this compile, keyed by canonical
    /// URL, kept around so the serializer can populate a source map's
    /// `sourcesContent` after the evaluator itself is done with them (spec
    /// §4.6, `sourceMapIncludeSources`).
    pub(crate) source_texts: std::collections::HashMap<String, Rc<str>>,
}

/// What a statement sequence did when asked to run (spec §4.3: `@return`
/// unwinds straight out of whatever `@if`/`@each`/`@for`/`@while` nesting
/// contains it, back to the enclosing function call).
pub enum Flow {
    Normal,
    Return(crate::value::Value),
}

impl<'a> Evaluator<'a> {
    pub fn new(url: impl Into<Rc<str>>, importers: Vec<Box<dyn Importer>>) -> Self {
        let root = CssNode::root(Span::point(0));
        Self {
            importers,
            logger: &NullLogger,
            quiet_deps: false,
            fatal_deprecations: HashSet::new(),
            future_deprecations: HashSet::new(),
            modules: ModuleGraph::new(),
            extender: Extender::new(),
            current_file: SourceFile::new(url, ""),
            scope_stack: vec![module::new_scope(None)],
            content_stack: vec![None],
            call_stack: Vec::new(),
            current_selector: None,
            current_children: root.children.clone(),
            current_condition_scope: None,
            in_keyframes: false,
            call_depth: 0,
            namespaces: std::collections::HashMap::new(),
            exports_stack: vec![Exports::default()],
            root_children: root.children,
            pending_configuration: Vec::new(),
            host_functions: std::collections::HashMap::new(),
            source_texts: std::collections::HashMap::new(),
        }
    }

    pub fn with_logger(mut self, logger: &'a dyn Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_host_function(mut self, name: impl Into<String>, callback: Rc<dyn Fn(&[Value]) -> Result<Value, String>>) -> Self {
        self.host_functions.insert(name.into(), callback);
        self
    }

    pub fn scope(&self) -> LexicalScope {
        self.scope_stack.last().cloned().expect("scope stack is never empty")
    }

    pub fn push_scope(&mut self) -> LexicalScope {
        let child = module::new_scope(Some(self.scope()));
        self.scope_stack.push(child.clone());
        child
    }

    pub fn push_scope_with_parent(&mut self, parent: LexicalScope) -> LexicalScope {
        let child = module::new_scope(Some(parent));
        self.scope_stack.push(child.clone());
        child
    }

    pub fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    pub(crate) fn file_span(&self, span: Span) -> FileSpan {
        FileSpan::new(self.current_file.clone(), span)
    }

    pub(crate) fn record_source(&mut self, file: &SourceFile) {
        self.source_texts.entry(file.url().to_string()).or_insert_with(|| Rc::from(file.text()));
    }

    pub(crate) fn runtime_error(&self, err: SassScriptException, span: Span) -> SassRuntimeException {
        let mut exc = err.at(self.file_span(span));
        for frame in self.call_stack.iter().rev() {
            exc = exc.push_frame(frame.clone());
        }
        exc
    }

    pub(crate) fn emit(&self, mut node: CssNode) {
        if node.origin.is_none() {
            let (line, column) = self.current_file.line_col(node.span.start);
            node.origin = Some(crate::ast::css::Origin { url: self.current_file.url().into(), line, column });
        }
        self.current_children.borrow_mut().push(node);
    }

    /// Runs `f` with the CSS tree's insertion point redirected to
    /// `children`, restoring the previous cursor afterward — the emit-side
    /// analogue of a parser's save/restore checkpoint.
    pub(crate) fn with_children<R>(&mut self, children: Rc<RefCell<Vec<CssNode>>>, f: impl FnOnce(&mut Self) -> Result<R, SassRuntimeException>) -> Result<R, SassRuntimeException> {
        let previous = std::mem::replace(&mut self.current_children, children);
        let result = f(self);
        self.current_children = previous;
        result
    }

    pub(crate) fn warn(&self, message: impl Into<String>, span: Span) {
        self.logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Warning,
            message: message.into(),
            span: Some(self.file_span(span)),
        });
    }

    pub(crate) fn debug(&self, message: impl Into<String>, span: Span) {
        self.logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Debug,
            message: message.into(),
            span: Some(self.file_span(span)),
        });
    }

    /// Reports a deprecation (spec §7): raises a hard error when `id` is in
    /// `fatal_deprecations`, stays silent when `id` is future-gated and not
    /// opted into via `future_deprecations`, otherwise logs a warning.
    pub(crate) fn deprecated(&self, id: DeprecationId, message: impl Into<String>, span: Span) -> Result<(), SassScriptException> {
        if self.fatal_deprecations.contains(&id) {
            return Err(SassScriptException::new(format!("{} (deprecation {} is fatal)", message.into(), id)));
        }
        if id.is_future() && !self.future_deprecations.contains(&id) {
            return Ok(());
        }
        self.logger.diagnostic(&Diagnostic {
            kind: DiagnosticKind::Deprecation(id),
            message: message.into(),
            span: Some(self.file_span(span)),
        });
        Ok(())
    }

    /// Forwards the bogus combinators a selector parse turned up (spec §7
    /// `bogus-combinators`) to [`Self::deprecated`], propagating the error
    /// if `fatalDeprecations` promotes it.
    pub(crate) fn report_bogus_combinators(&self, combinators: &[Combinator], span: Span) -> Result<(), SassScriptException> {
        for combinator in combinators {
            self.deprecated(
                DeprecationId::BogusCombinators,
                format!("{} isn't a valid CSS combinator in this position.", combinator),
                span,
            )?;
        }
        Ok(())
    }

    /// Evaluates a complete stylesheet into a CSS tree, then runs the
    /// extender over the finished tree (spec §4.5: extension happens once,
    /// after the whole document has been produced).
    pub fn compile(&mut self, file: SourceFile, statements: &[Statement]) -> Result<CssStylesheet, SassRuntimeException> {
        self.record_source(&file);
        self.current_file = file;
        let root = CssNode::root(Span::point(0));
        self.current_children = root.children.clone();
        self.root_children = root.children.clone();
        self.exec_statements(statements)?;
        self.extender.finish(&root.children)?;
        Ok(CssStylesheet::new(root))
    }

    fn exec_statements(&mut self, statements: &[Statement]) -> Result<Flow, SassRuntimeException> {
        for statement in statements {
            match statements::exec_statement(self, statement)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    pub(crate) fn exec_body(&mut self, body: &[Statement]) -> Result<Flow, SassRuntimeException> {
        self.exec_statements(body)
    }
}

pub(crate) fn is_empty_rule(node: &CssNode) -> bool {
    matches!(node.statement, CssStatement::StyleRule { .. }) && node.children.borrow().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_plain_deprecation_logs_and_succeeds_by_default() {
        let ev = Evaluator::new("test.scss", Vec::new());
        assert!(ev.deprecated(DeprecationId::BogusCombinators, "nope", Span::point(0)).is_ok());
    }

    #[test]
    fn a_fatal_deprecation_raises_an_error_instead_of_logging() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        ev.fatal_deprecations.insert(DeprecationId::BogusCombinators);
        assert!(ev.deprecated(DeprecationId::BogusCombinators, "nope", Span::point(0)).is_err());
    }

    #[test]
    fn a_future_deprecation_is_silent_unless_opted_into() {
        let ev = Evaluator::new("test.scss", Vec::new());
        assert!(DeprecationId::ImporterWithoutUrl.is_future());
        assert!(ev.deprecated(DeprecationId::ImporterWithoutUrl, "nope", Span::point(0)).is_ok());
    }

    #[test]
    fn a_future_deprecation_opted_into_still_succeeds() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        ev.future_deprecations.insert(DeprecationId::ImporterWithoutUrl);
        assert!(ev.deprecated(DeprecationId::ImporterWithoutUrl, "nope", Span::point(0)).is_ok());
    }

    #[test]
    fn reporting_bogus_combinators_short_circuits_on_the_first_fatal_one() {
        let mut ev = Evaluator::new("test.scss", Vec::new());
        ev.fatal_deprecations.insert(DeprecationId::BogusCombinators);
        let combinators = [Combinator::Child, Combinator::NextSibling];
        assert!(ev.report_bogus_combinators(&combinators, Span::point(0)).is_err());
    }

    #[test]
    fn reporting_no_bogus_combinators_is_a_no_op() {
        let ev = Evaluator::new("test.scss", Vec::new());
        assert!(ev.report_bogus_combinators(&[], Span::point(0)).is_ok());
    }
}

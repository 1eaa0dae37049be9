//! Compile options (spec §6): every knob `compile`/`compile_string` accept,
//! gathered in one struct the way the teacher's `ParserConfig` gathered
//! parser-wide settings instead of threading a dozen arguments through.

use crate::error::DeprecationId;
use crate::logger::{Logger, TracingLogger};
use crate::module::importer::{Importer, NullImporter};
use crate::parser::Syntax;
use crate::value::{SassFunction, Value};
use std::collections::HashSet;

/// Expanded vs. compressed CSS (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

/// A host-registered function, reachable from Sass under `name` (spec §9,
/// "First-class functions across host boundaries"). Stored behind `dyn Fn`
/// rather than a generic so `CompileOptions` stays a plain, non-generic
/// struct callers can build incrementally.
pub struct HostFunction {
    pub name: String,
    pub callback: Box<dyn Fn(&[Value]) -> Result<Value, String>>,
}

/// Everything a compile needs beyond the entry stylesheet itself. Built
/// incrementally with the `with_*` setters, mirroring the teacher's
/// `ParserConfig { ignore_errors: true, ..Default::default() }` style of
/// construction.
pub struct CompileOptions<'a> {
    pub syntax: Syntax,
    /// Display URL used in diagnostics and source maps for the entry
    /// stylesheet; irrelevant for `compile` (the path supplies it).
    pub url: Option<String>,
    pub style: OutputStyle,
    /// Emit a leading `@charset`/BOM when the stylesheet contains non-ASCII
    /// text (spec §4.6).
    pub charset: bool,
    pub source_map: bool,
    pub source_map_include_sources: bool,
    pub load_paths: Vec<String>,
    pub importers: Vec<Box<dyn Importer>>,
    pub functions: Vec<HostFunction>,
    pub logger: &'a dyn Logger,
    pub quiet_deps: bool,
    pub verbose: bool,
    pub fatal_deprecations: HashSet<DeprecationId>,
    pub future_deprecations: HashSet<DeprecationId>,
}

impl<'a> CompileOptions<'a> {
    pub fn new(logger: &'a dyn Logger) -> Self {
        Self {
            syntax: Syntax::Scss,
            url: None,
            style: OutputStyle::Expanded,
            charset: true,
            source_map: false,
            source_map_include_sources: false,
            load_paths: Vec::new(),
            importers: Vec::new(),
            functions: Vec::new(),
            logger,
            quiet_deps: false,
            verbose: false,
            fatal_deprecations: HashSet::new(),
            future_deprecations: HashSet::new(),
        }
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_importer(mut self, importer: Box<dyn Importer>) -> Self {
        self.importers.push(importer);
        self
    }

    pub fn with_source_map(mut self, include_sources: bool) -> Self {
        self.source_map = true;
        self.source_map_include_sources = include_sources;
        self
    }

    /// Promotes a deprecation to a hard error (spec §6 `fatalDeprecations`).
    pub fn with_fatal_deprecation(mut self, id: DeprecationId) -> Self {
        self.fatal_deprecations.insert(id);
        self
    }

    /// Opts into a deprecation warning that isn't active by default yet
    /// (spec §6 `futureDeprecations`).
    pub fn with_future_deprecation(mut self, id: DeprecationId) -> Self {
        self.future_deprecations.insert(id);
        self
    }

    /// Takes ownership of the configured importers, appending a trailing
    /// [`NullImporter`] so lookup always terminates in a `None` rather than
    /// an empty-vec panic. Consumes `self.importers`: called once, right
    /// before handing the chain to a fresh [`crate::eval::Evaluator`].
    pub(crate) fn take_importer_chain(&mut self) -> Vec<Box<dyn Importer>> {
        let mut chain = std::mem::take(&mut self.importers);
        chain.push(Box::new(NullImporter));
        chain
    }
}

impl Default for CompileOptions<'static> {
    fn default() -> Self {
        Self::new(&DEFAULT_LOGGER)
    }
}

static DEFAULT_LOGGER: TracingLogger = TracingLogger { quiet_deps: false, verbose: false };

impl SassFunction {
    /// Returns the function's name if it is a registered host callback,
    /// used by `eval::builtins::meta::call` to dispatch `call()` without a
    /// dependency cycle back into `options`.
    pub fn host_name(&self) -> Option<&str> {
        match self {
            SassFunction::Host(name) => Some(name),
            _ => None,
        }
    }
}

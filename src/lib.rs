//! A Sass-to-CSS compiler core: scanner, parser, evaluator, extender and
//! serializer (spec §2). The library surface is two entry points —
//! [`compile`] and [`compile_string`] — everything else (CLI argument
//! parsing, `--watch`, filesystem lookup beyond a single entry read) is an
//! embedder's concern, not this crate's (spec §1).

pub mod ast;
pub mod error;
pub mod eval;
pub mod extend;
pub mod logger;
pub mod module;
pub mod options;
pub mod parser;
pub mod scanner;
pub mod selector;
pub mod serialize;
pub mod span;
pub mod value;

use error::{SassFormatException, SassResult};
use eval::Evaluator;
use module::importer::Importer;
use options::CompileOptions;
use parser::Syntax;
use span::SourceFile;

/// What a successful compile hands back (spec §6).
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub css: String,
    /// Canonical URLs of every stylesheet touched, entry point included.
    pub loaded_urls: Vec<String>,
    pub source_map: Option<String>,
}

/// Compiles the stylesheet at `path`. The entry file is read directly (not
/// through `options.importers`, which only resolve `@use`/`@forward`/
/// `@import` targets); its syntax is taken from the file extension unless
/// nothing matches, in which case `options.syntax` is used.
pub fn compile(path: &str, mut options: CompileOptions) -> SassResult<CompileResult> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        error::SassError::Format(SassFormatException::new(
            format!("Error reading {}: {}", path, e),
            span::FileSpan::new(SourceFile::new(path.to_string(), ""), span::Span::point(0)),
        ))
    })?;
    let syntax = syntax_from_extension(path).unwrap_or(options.syntax);
    run_compile(contents, path.to_string(), syntax, &mut options)
}

/// Compiles `source` directly, with no filesystem access for the entry
/// stylesheet (`options.importers` can still resolve `@use`/`@import`s).
pub fn compile_string(source: impl Into<String>, mut options: CompileOptions) -> SassResult<CompileResult> {
    let url = options.url.clone().unwrap_or_else(|| "stdin".to_string());
    let syntax = options.syntax;
    run_compile(source.into(), url, syntax, &mut options)
}

fn syntax_from_extension(path: &str) -> Option<Syntax> {
    let ext = path.rsplit('.').next()?;
    match ext {
        "scss" => Some(Syntax::Scss),
        "sass" => Some(Syntax::Indented),
        "css" => Some(Syntax::Css),
        _ => None,
    }
}

fn run_compile(contents: String, url: String, syntax: Syntax, options: &mut CompileOptions) -> SassResult<CompileResult> {
    let file = SourceFile::new(url.clone(), contents);
    let stylesheet = parser::parse_stylesheet(file.clone(), syntax).map_err(|e| {
        error::SassError::Format(SassFormatException::new(e.0, span::FileSpan::new(file.clone(), span::Span::point(0))))
    })?;

    let importers: Vec<Box<dyn Importer>> = options.take_importer_chain();
    let mut evaluator = Evaluator::new(url.clone(), importers).with_logger(options.logger);
    evaluator.quiet_deps = options.quiet_deps;
    evaluator.fatal_deprecations = options.fatal_deprecations.clone();
    evaluator.future_deprecations = options.future_deprecations.clone();
    // `options.functions` stores callbacks behind `Box` since that's the
    // ergonomic builder type; `Evaluator` wants `Rc` so every dispatch can
    // cheaply clone a handle. `Rc::from(Box<dyn Fn>)` moves the closure
    // onto the `Rc` without re-boxing it, and `std::mem::take` empties
    // `options.functions` so a second compile reusing the same options
    // just registers none (rather than panicking on a double move).
    for host_fn in std::mem::take(&mut options.functions) {
        let name = host_fn.name;
        let callback: std::rc::Rc<dyn Fn(&[value::Value]) -> Result<value::Value, String>> = std::rc::Rc::from(host_fn.callback);
        evaluator = evaluator.with_host_function(name, callback);
    }

    let css_stylesheet = evaluator.compile(file, &stylesheet.statements)?;

    let output_file = options.url.clone().unwrap_or_else(|| url.clone());
    let serialize_opts = serialize::SerializeOptions {
        style: options.style,
        charset: options.charset,
        source_map: options.source_map,
        source_map_include_sources: options.source_map_include_sources,
        output_file: &output_file,
        source_texts: &evaluator.source_texts,
    };
    let result = serialize::serialize(&css_stylesheet, &serialize_opts);

    let mut loaded_urls: Vec<String> = evaluator.source_texts.keys().cloned().collect();
    loaded_urls.sort();

    Ok(CompileResult {
        css: result.css,
        loaded_urls,
        source_map: result.source_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use module::importer::MapImporter;

    fn compile_scss(source: &str) -> String {
        let logger = logger::NullLogger;
        let options = CompileOptions::new(&logger);
        compile_string(source, options).expect("compile should succeed").css
    }

    #[test]
    fn compiles_a_flat_rule() {
        let css = compile_scss("a { color: red; }");
        assert_eq!(css, "a {\n  color: red;\n}\n");
    }

    #[test]
    fn resolves_nesting_and_parent_selector() {
        let css = compile_scss(".btn { &:hover { color: blue; } }");
        assert_eq!(css, ".btn:hover {\n  color: blue;\n}\n");
    }

    #[test]
    fn evaluates_variables_and_arithmetic() {
        let css = compile_scss("$w: 10px; .box { width: $w * 2; }");
        assert_eq!(css, ".box {\n  width: 20px;\n}\n");
    }

    #[test]
    fn compressed_style_has_no_whitespace() {
        let logger = logger::NullLogger;
        let options = CompileOptions::new(&logger).with_style(options::OutputStyle::Compressed);
        let css = compile_string("a { color: red; b: 1px; }", options).unwrap().css;
        assert_eq!(css, "a{color:red;b:1px}");
    }

    #[test]
    fn resolves_use_through_a_map_importer() {
        let mut importer = MapImporter::new();
        importer.insert("pkg", "$c: teal;", Syntax::Scss);
        let logger = logger::NullLogger;
        let options = CompileOptions::new(&logger).with_importer(Box::new(importer));
        let css = compile_string("@use \"pkg\"; a { color: pkg.$c; }", options).unwrap().css;
        assert_eq!(css, "a {\n  color: teal;\n}\n");
    }

    #[test]
    fn extend_pulls_in_the_extender_selector() {
        let css = compile_scss(".msg { color: red; } .err { @extend .msg; }");
        assert!(css.contains(".msg, .err"));
    }

    #[test]
    fn a_leading_combinator_compiles_with_a_warning_by_default() {
        // spec §7 `bogus-combinators`: not an error unless promoted.
        let css = compile_scss("> a { color: red; }");
        assert!(css.contains("color: red"));
    }

    #[test]
    fn a_leading_combinator_is_an_error_once_promoted_to_fatal() {
        let logger = logger::NullLogger;
        let options = CompileOptions::new(&logger).with_fatal_deprecation(error::DeprecationId::BogusCombinators);
        assert!(compile_string("> a { color: red; }", options).is_err());
    }

    #[test]
    fn a_custom_property_value_keeps_its_internal_whitespace_verbatim() {
        // spec §8 invariant #7: verbatim custom-property serialization.
        let css = compile_scss("a { --gap: 1px   2px; }");
        assert!(css.contains("--gap: 1px   2px;"));
    }

    #[test]
    fn a_custom_property_value_does_not_evaluate_a_bare_variable() {
        let css = compile_scss("a { $unused: red; --color: $unused; }");
        assert!(css.contains("--color: $unused;"));
    }

    #[test]
    fn a_custom_property_value_still_evaluates_interpolation() {
        let css = compile_scss("a { $x: red; --color: #{$x}; }");
        assert!(css.contains("--color: red;"));
    }
}

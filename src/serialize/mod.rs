//! CSS emission and source map assembly (spec §4.6): the last pipeline
//! stage, turning the evaluator + extender's finished [`CssStylesheet`]
//! into text. Walks the tree the way the teacher's `walker.rs` walked a
//! parse tree for pretty-printing, except here the walk also tracks the
//! generated line/column so it can emit source map segments alongside the
//! text in the same pass.

pub mod sourcemap;

use crate::ast::css::{CssAtRule, CssNode, CssStatement, CssStylesheet};
use crate::options::OutputStyle;
use sourcemap::Mapping;
use std::collections::HashMap;

pub struct SerializeResult {
    pub css: String,
    /// Present only when the caller asked for a source map.
    pub source_map: Option<String>,
}

pub struct SerializeOptions<'a> {
    pub style: OutputStyle,
    pub charset: bool,
    pub source_map: bool,
    pub source_map_include_sources: bool,
    /// Display name for the `file` field of the generated map.
    pub output_file: &'a str,
    /// Every source file text seen during evaluation, by canonical URL
    /// (`Evaluator::source_texts`), used for `sourcesContent`.
    pub source_texts: &'a HashMap<String, std::rc::Rc<str>>,
}

pub fn serialize(stylesheet: &CssStylesheet, opts: &SerializeOptions) -> SerializeResult {
    let mut serializer = Serializer {
        out: String::new(),
        style: opts.style,
        line: 0,
        column: 0,
        mappings: Vec::new(),
        source_indices: HashMap::new(),
        sources: Vec::new(),
        record_mappings: opts.source_map,
    };
    serializer.write_children(&stylesheet.root.children.borrow(), 0, true);
    let mut css = serializer.out;

    // Non-ASCII output needs an encoding marker (spec §4.6): expanded style
    // prepends an `@charset` at-rule, compressed style prepends a raw BOM
    // instead since a literal `@charset` would otherwise have no
    // whitespace to separate it from the following rule.
    if opts.charset && css.chars().any(|c| !c.is_ascii()) && !css.is_empty() {
        css = match opts.style {
            OutputStyle::Expanded => format!("@charset \"UTF-8\";\n{}", css),
            OutputStyle::Compressed => format!("\u{FEFF}{}", css),
        };
    }

    let source_map = if opts.source_map {
        let sources_content = if opts.source_map_include_sources {
            Some(
                serializer
                    .sources
                    .iter()
                    .map(|url| opts.source_texts.get(url).map(|t| t.to_string()))
                    .collect::<Vec<_>>(),
            )
        } else {
            None
        };
        Some(sourcemap::build(opts.output_file, &serializer.sources, sources_content.as_deref(), &serializer.mappings))
    } else {
        None
    };

    SerializeResult { css, source_map }
}

struct Serializer {
    out: String,
    style: OutputStyle,
    line: u32,
    column: u32,
    mappings: Vec<Mapping>,
    source_indices: HashMap<String, u32>,
    sources: Vec<String>,
    record_mappings: bool,
}

impl Serializer {
    fn compressed(&self) -> bool {
        self.style == OutputStyle::Compressed
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        if !self.compressed() {
            self.push("\n");
        }
    }

    fn indent(&mut self, depth: usize) {
        if !self.compressed() {
            self.push(&"  ".repeat(depth));
        }
    }

    fn mark_origin(&mut self, node: &CssNode) {
        if !self.record_mappings {
            return;
        }
        let Some(origin) = &node.origin else { return };
        let source_index = *self.source_indices.entry(origin.url.to_string()).or_insert_with(|| {
            self.sources.push(origin.url.to_string());
            (self.sources.len() - 1) as u32
        });
        self.mappings.push(Mapping {
            generated_line: self.line,
            generated_column: self.column,
            source_index,
            source_line: origin.line.saturating_sub(1),
            source_column: origin.column.saturating_sub(1),
        });
    }

    fn write_children(&mut self, children: &[CssNode], depth: usize, top_level: bool) {
        let mut first = true;
        for child in children {
            if !first && !self.compressed() && top_level {
                self.newline();
            }
            self.write_node(child, depth);
            first = false;
        }
    }

    fn write_node(&mut self, node: &CssNode, depth: usize) {
        match &node.statement {
            CssStatement::Root => self.write_children(&node.children.borrow(), depth, true),
            CssStatement::Comment(text) => self.write_comment(node, text, depth),
            CssStatement::Import { url } => {
                self.indent(depth);
                self.mark_origin(node);
                self.push("@import ");
                self.push(&format!("\"{}\"", url));
                self.push(";");
                self.newline();
            }
            CssStatement::Declaration(decl) => {
                self.indent(depth);
                self.mark_origin(node);
                self.push(&decl.name);
                self.push(":");
                if !self.compressed() {
                    self.push(" ");
                }
                self.push(&decl.value.to_string());
                if decl.important {
                    self.push(" !important");
                }
                self.push(";");
                self.newline();
            }
            CssStatement::StyleRule { selector } => {
                self.indent(depth);
                self.mark_origin(node);
                self.push(&selector.borrow().to_string());
                self.write_block(node, depth);
            }
            CssStatement::AtRule(at_rule) => self.write_at_rule(node, at_rule, depth),
        }
    }

    fn write_comment(&mut self, node: &CssNode, text: &str, depth: usize) {
        if self.compressed() && !text.starts_with("/*!") {
            return;
        }
        self.indent(depth);
        self.mark_origin(node);
        self.push(text);
        self.newline();
    }

    fn write_at_rule(&mut self, node: &CssNode, at_rule: &CssAtRule, depth: usize) {
        self.indent(depth);
        self.mark_origin(node);
        match at_rule {
            CssAtRule::Media { queries } => {
                self.push("@media ");
                for (i, q) in queries.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(&q.to_string());
                }
            }
            CssAtRule::Supports { condition } => {
                self.push("@supports ");
                self.push(&condition.to_string());
            }
            CssAtRule::Keyframes { name, vendor_prefix } => {
                self.push("@");
                self.push(vendor_prefix.as_deref().unwrap_or(""));
                self.push("keyframes ");
                self.push(name);
            }
            CssAtRule::KeyframeBlock { selectors } => {
                for (i, s) in selectors.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(&s.to_string());
                }
            }
            CssAtRule::Unknown { name, prelude } => {
                self.push("@");
                self.push(name);
                if !prelude.is_empty() {
                    self.push(" ");
                    self.push(prelude);
                }
            }
        }
        if node.has_block {
            self.write_block(node, depth);
        } else {
            self.push(";");
            self.newline();
        }
    }

    fn write_block(&mut self, node: &CssNode, depth: usize) {
        if self.compressed() {
            self.push("{");
        } else {
            self.push(" {\n");
        }
        self.write_declarations_and_children(&node.children.borrow(), depth + 1);
        self.indent(depth);
        self.push("}");
        self.newline();
    }

    /// Unlike top-level siblings, a rule's own declarations/nested rules
    /// don't get blank lines between them (spec §4.6 "expanded style").
    fn write_declarations_and_children(&mut self, children: &[CssNode], depth: usize) {
        for child in children {
            self.write_node(child, depth);
        }
        if self.compressed() {
            // Trailing `;` before `}` is redundant once every declaration
            // already wrote its own.
            while self.out.ends_with(';') {
                self.out.pop();
                self.column = self.column.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CssDeclaration;
    use crate::selector::{ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};
    use crate::span::Span;
    use crate::value::{SassNumber, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn type_selector(name: &str) -> Rc<RefCell<SelectorList>> {
        Rc::new(RefCell::new(SelectorList::from_complex(vec![ComplexSelector::single(CompoundSelector {
            simples: vec![SimpleSelector::Type(name.into())],
        })])))
    }

    fn decl(name: &str, value: f64) -> CssNode {
        CssNode::new(
            CssStatement::Declaration(CssDeclaration { name: name.to_string(), value: Value::Number(SassNumber::unitless(value)), important: false, span: Span::point(0) }),
            Span::point(0),
        )
    }

    fn style_rule(name: &str, decls: Vec<CssNode>) -> CssNode {
        let rule = CssNode::new(CssStatement::StyleRule { selector: type_selector(name) }, Span::point(0));
        for d in decls {
            rule.push_child(d);
        }
        rule
    }

    fn render(style: OutputStyle, rules: Vec<CssNode>) -> String {
        let root = CssNode::root(Span::point(0));
        for rule in rules {
            root.push_child(rule);
        }
        let stylesheet = CssStylesheet::new(root);
        let source_texts = HashMap::new();
        let opts = SerializeOptions { style, charset: false, source_map: false, source_map_include_sources: false, output_file: "out.css", source_texts: &source_texts };
        serialize(&stylesheet, &opts).css
    }

    #[test]
    fn expanded_style_indents_declarations_and_blank_lines_between_top_level_rules() {
        let css = render(OutputStyle::Expanded, vec![style_rule("a", vec![decl("b", 1.0)]), style_rule("c", vec![decl("d", 2.0)])]);
        assert_eq!(css, "a {\n  b: 1;\n}\n\nc {\n  d: 2;\n}\n");
    }

    #[test]
    fn compressed_style_drops_whitespace_and_the_final_semicolon_before_a_closing_brace() {
        let css = render(OutputStyle::Compressed, vec![style_rule("a", vec![decl("b", 1.0), decl("c", 2.0)])]);
        assert_eq!(css, "a{b:1;c:2}");
    }

    #[test]
    fn a_plain_comment_is_dropped_in_compressed_output_but_an_important_comment_survives() {
        let plain = CssNode::new(CssStatement::Comment("/* hi */".to_string()), Span::point(0));
        let important = CssNode::new(CssStatement::Comment("/*! keep */".to_string()), Span::point(0));

        let dropped = render(OutputStyle::Compressed, vec![plain]);
        assert_eq!(dropped, "");

        let kept = render(OutputStyle::Compressed, vec![important]);
        assert_eq!(kept, "/*! keep */");
    }
}

//! Entry point for the indented syntax (`.sass`).
//!
//! Rather than threading a second block-boundary policy through every
//! production in [`super::statement`], indentation is normalized up front
//! into the brace-and-semicolon shape that module already parses: each
//! line becomes a statement terminated by `;`, or — when followed by more
//! deeply indented lines — the opening of a `{ ... }` block. This keeps
//! the grammar single-source at the cost of diagnostics for `.sass`
//! stylesheets pointing at offsets in the rewritten text rather than the
//! original file; the two stay line-for-line close enough to read, but
//! columns inside a reflowed continuation line will not line up exactly.

use super::statement::parse_root;
use super::ParseResult;
use crate::ast::sass::Stylesheet;
use crate::scanner::Scanner;
use crate::span::SourceFile;

pub fn parse(file: SourceFile) -> ParseResult<Stylesheet> {
    let rewritten = reindent_to_braces(file.text());
    let synthetic = SourceFile::new(file.url(), rewritten);
    let mut scanner = Scanner::new(synthetic);
    let statements = parse_root(&mut scanner)?;
    Ok(Stylesheet { statements })
}

struct LogicalLine<'a> {
    indent: usize,
    content: std::borrow::Cow<'a, str>,
}

/// Groups physical lines into logical ones: continuation lines (open
/// paren/bracket depth carried over, or inside a `/* ... */` block) are
/// folded into the line that started them.
fn split_logical_lines(text: &str) -> Vec<LogicalLine<'_>> {
    let mut out: Vec<LogicalLine> = Vec::new();
    let mut depth: i32 = 0;
    let mut in_block_comment = false;
    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if in_block_comment {
            if let Some(last) = out.last_mut() {
                let mut joined = last.content.to_string();
                joined.push('\n');
                joined.push_str(line);
                if joined.contains("*/") {
                    in_block_comment = false;
                }
                last.content = std::borrow::Cow::Owned(joined);
            }
            continue;
        }
        if depth > 0 {
            if let Some(last) = out.last_mut() {
                let mut joined = last.content.to_string();
                joined.push(' ');
                joined.push_str(line.trim());
                depth += bracket_delta(line);
                last.content = std::borrow::Cow::Owned(joined);
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - trimmed.len();
        let content = line.trim_end();
        if trimmed.starts_with("/*") && !content.contains("*/") {
            in_block_comment = true;
        } else {
            depth += bracket_delta(content);
        }
        out.push(LogicalLine { indent, content: std::borrow::Cow::Borrowed(&content[indent..]) });
    }
    out
}

/// Net paren/bracket depth change for a line, ignoring quoted strings —
/// sufficient for the common case of a selector or argument list split
/// across lines; a bracket character inside a string will miscount, a
/// rare case in practice for indented-syntax stylesheets.
fn bracket_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut chars = line.chars().peekable();
    let mut in_string: Option<char> = None;
    while let Some(c) = chars.next() {
        match in_string {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => in_string = Some(c),
                '(' | '[' => delta += 1,
                ')' | ']' => delta -= 1,
                _ => {}
            },
        }
    }
    delta
}

struct LineTree<'a> {
    content: std::borrow::Cow<'a, str>,
    children: Vec<LineTree<'a>>,
}

fn build_forest<'a>(lines: &[LogicalLine<'a>], idx: &mut usize, parent_indent: Option<usize>) -> Vec<LineTree<'a>> {
    let mut out = Vec::new();
    while *idx < lines.len() {
        let line = &lines[*idx];
        if let Some(p) = parent_indent {
            if line.indent <= p {
                break;
            }
        }
        let my_indent = line.indent;
        let content = line.content.clone();
        *idx += 1;
        let children = build_forest(lines, idx, Some(my_indent));
        out.push(LineTree { content, children });
    }
    out
}

fn reindent_to_braces(text: &str) -> String {
    let lines = split_logical_lines(text);
    let mut idx = 0;
    let forest = build_forest(&lines, &mut idx, None);
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    emit_forest(&forest, &mut out);
    out
}

fn emit_forest(forest: &[LineTree], out: &mut String) {
    for node in forest {
        emit_node(node, out);
    }
}

/// Comment lines never open a brace block: deeper-indented lines that
/// follow them are flattened back out as siblings rather than treated as
/// a nested body, since neither comment statement variant carries one.
fn emit_node(node: &LineTree, out: &mut String) {
    let content = node.content.as_ref();
    if content.starts_with("//") || content.starts_with("/*") {
        out.push_str(content);
        out.push('\n');
        emit_forest(&node.children, out);
        return;
    }
    if node.children.is_empty() {
        out.push_str(content);
        out.push_str(";\n");
    } else {
        out.push_str(content);
        out.push_str(" {\n");
        emit_forest(&node.children, out);
        out.push_str("}\n");
    }
}

//! Parses an already-interpolated string into a [`SelectorList`] (spec
//! §4.1 "Selector parser", §4.4 "Parse"). Re-invoked both at parse time,
//! when a selector appears directly in source, and lazily at evaluation
//! time over the flattened result of `#{...}` interpolation.
//!
//! Production names mirror the teacher's `parser/selector.rs` /
//! `parser/combinator.rs` / `parser/pseudo.rs` (`parse_class_selector`,
//! `parse_nesting_selector`, `parse_attribute_operator`, one method per
//! grammar rule), rewritten against this crate's [`Scanner`] instead of a
//! token stream and extended with `&` and `%placeholder`.

use super::{
    AttrMatcher, AttributeSelector, Combinator, ComplexComponent, ComplexSelector, CompoundSelector, SelectorList,
    SimpleSelector,
};
use crate::error::SassScriptException;
use crate::scanner::{is_name, is_name_start, Scanner};
use crate::span::SourceFile;

pub struct SelectorParser {
    scanner: Scanner,
    /// Whether `&` is legal here (spec: "accepts `&` only when the parser
    /// is told parent references are legal").
    allow_parent: bool,
    /// Leading/trailing/adjacent combinators encountered so far (spec §7
    /// `bogus-combinators`): collected instead of aborting the parse, so
    /// the caller can forward them to the logger and decide whether to
    /// promote them to an error via `fatalDeprecations`.
    bogus_combinators: Vec<Combinator>,
}

type Result<T> = std::result::Result<T, SassScriptException>;

impl SelectorParser {
    pub fn new(text: &str, allow_parent: bool) -> Self {
        Self {
            scanner: Scanner::new(SourceFile::new("selector", text)),
            allow_parent,
            bogus_combinators: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<(SelectorList, Vec<Combinator>)> {
        let list = self.parse_selector_list()?;
        self.scanner.consume_whitespace();
        if !self.scanner.is_done() {
            return Err(SassScriptException::new(format!(
                "expected selector list end, found {:?}",
                self.scanner.remaining()
            )));
        }
        Ok((list, self.bogus_combinators))
    }

    fn parse_selector_list(&mut self) -> Result<SelectorList> {
        let mut complex = vec![self.parse_complex_selector()?];
        loop {
            self.scanner.consume_whitespace();
            if !self.scanner.scan_char(',') {
                break;
            }
            self.scanner.consume_whitespace();
            complex.push(self.parse_complex_selector()?);
        }
        Ok(SelectorList { complex })
    }

    fn parse_complex_selector(&mut self) -> Result<ComplexSelector> {
        let mut components = Vec::new();
        self.scanner.consume_whitespace();

        // A leading combinator has nothing before it to attach to: always
        // bogus (spec §7 `bogus-combinators`), but this compiles with a
        // deprecation warning rather than aborting (spec §4.1).
        while let Some(combinator) = self.peek_combinator() {
            self.consume_combinator_char();
            self.record_bogus_combinator(combinator);
            components.push(ComplexComponent::Combinator(combinator));
            self.scanner.consume_whitespace();
        }

        if self.at_selector_end() {
            return Ok(ComplexSelector { components });
        }

        components.push(ComplexComponent::Compound(self.parse_compound_selector()?));

        loop {
            let had_space = {
                let before = self.scanner.position();
                self.scanner.consume_whitespace();
                self.scanner.position() != before
            };

            let combinator = self.peek_combinator();
            if let Some(comb) = combinator {
                self.consume_combinator_char();
                self.scanner.consume_whitespace();
                components.push(ComplexComponent::Combinator(comb));
                if self.at_selector_end() {
                    self.record_bogus_combinator(comb);
                    break;
                }
                if self.peek_combinator().is_some() {
                    self.record_bogus_combinator(comb);
                    continue;
                }
                components.push(ComplexComponent::Compound(self.parse_compound_selector()?));
            } else if had_space && !self.at_selector_end() {
                components.push(ComplexComponent::Combinator(Combinator::Descendant));
                components.push(ComplexComponent::Compound(self.parse_compound_selector()?));
            } else {
                break;
            }
        }

        Ok(ComplexSelector { components })
    }

    fn at_selector_end(&self) -> bool {
        match self.scanner.peek_char() {
            None => true,
            Some(',') => true,
            _ => false,
        }
    }

    fn peek_combinator(&self) -> Option<Combinator> {
        match self.scanner.peek_char()? {
            '>' => Some(Combinator::Child),
            '+' => Some(Combinator::NextSibling),
            '~' => Some(Combinator::SubsequentSibling),
            _ => None,
        }
    }

    fn consume_combinator_char(&mut self) {
        self.scanner.next_char();
    }

    fn record_bogus_combinator(&mut self, combinator: Combinator) {
        self.bogus_combinators.push(combinator);
    }

    fn parse_compound_selector(&mut self) -> Result<CompoundSelector> {
        let mut simples = Vec::new();
        loop {
            match self.scanner.peek_char() {
                Some('&') if self.allow_parent => {
                    self.scanner.next_char();
                    simples.push(SimpleSelector::Parent);
                }
                Some('*') => {
                    self.scanner.next_char();
                    simples.push(SimpleSelector::Universal);
                }
                Some('.') => {
                    self.scanner.next_char();
                    simples.push(SimpleSelector::Class(self.parse_identifier()?));
                }
                Some('#') => {
                    self.scanner.next_char();
                    simples.push(SimpleSelector::Id(self.parse_identifier()?));
                }
                Some('%') => {
                    self.scanner.next_char();
                    simples.push(SimpleSelector::Placeholder(self.parse_identifier()?));
                }
                Some('[') => simples.push(self.parse_attribute_selector()?),
                Some(':') => simples.push(self.parse_pseudo_selector()?),
                Some(c) if is_name_start(c) => {
                    simples.push(SimpleSelector::Type(self.parse_identifier()?));
                }
                _ => break,
            }
        }
        if simples.is_empty() {
            return Err(SassScriptException::new("expected selector"));
        }
        Ok(CompoundSelector { simples })
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let ident = self.scanner.consume_while(is_name);
        if ident.is_empty() {
            return Err(SassScriptException::new("expected identifier"));
        }
        Ok(ident)
    }

    fn parse_attribute_selector(&mut self) -> Result<SimpleSelector> {
        self.scanner.next_char(); // '['
        self.scanner.consume_whitespace();
        let name = self.parse_identifier()?;
        self.scanner.consume_whitespace();
        let matcher = match self.scanner.peek_char() {
            Some(']') => {
                self.scanner.next_char();
                return Ok(SimpleSelector::Attribute(AttributeSelector {
                    name,
                    matcher: AttrMatcher::Exists,
                    value: String::new(),
                    case_insensitive: false,
                }));
            }
            Some('=') => {
                self.scanner.next_char();
                AttrMatcher::Equals
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.scanner.next_char();
                if !self.scanner.scan_char('=') {
                    return Err(SassScriptException::new("expected '=' in attribute selector"));
                }
                match c {
                    '~' => AttrMatcher::Includes,
                    '|' => AttrMatcher::DashMatch,
                    '^' => AttrMatcher::PrefixMatch,
                    '$' => AttrMatcher::SuffixMatch,
                    _ => AttrMatcher::SubstringMatch,
                }
            }
            other => return Err(SassScriptException::new(format!("unexpected attribute operator {:?}", other))),
        };
        self.scanner.consume_whitespace();
        let value = self.parse_attribute_value()?;
        self.scanner.consume_whitespace();
        let case_insensitive = matches!(self.scanner.peek_char(), Some('i' | 'I'));
        if case_insensitive {
            self.scanner.next_char();
            self.scanner.consume_whitespace();
        }
        if !self.scanner.scan_char(']') {
            return Err(SassScriptException::new("expected ']'"));
        }
        Ok(SimpleSelector::Attribute(AttributeSelector {
            name,
            matcher,
            value,
            case_insensitive,
        }))
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        match self.scanner.peek_char() {
            Some(q @ ('"' | '\'')) => {
                self.scanner.next_char();
                let value = self.scanner.consume_while(|c| c != q);
                self.scanner.next_char();
                Ok(value)
            }
            _ => self.parse_identifier(),
        }
    }

    fn parse_pseudo_selector(&mut self) -> Result<SimpleSelector> {
        self.scanner.next_char(); // first ':'
        let is_element = self.scanner.scan_char(':');
        let name = self.parse_identifier()?;
        let args = if self.scanner.scan_char('(') {
            let inner = self.scan_balanced_parens()?;
            Some(inner)
        } else {
            None
        };
        Ok(if is_element {
            SimpleSelector::PseudoElement { name, args }
        } else {
            SimpleSelector::PseudoClass { name, args }
        })
    }

    fn scan_balanced_parens(&mut self) -> Result<String> {
        let mut depth = 1;
        let mut out = String::new();
        loop {
            match self.scanner.next_char() {
                Some('(') => {
                    depth += 1;
                    out.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(')');
                }
                Some(c) => out.push(c),
                None => return Err(SassScriptException::new("unterminated pseudo-class arguments")),
            }
        }
        Ok(out)
    }
}

/// Parses a selector list, forwarding any bogus combinators it encounters
/// to the evaluator's logger (and failing if `fatalDeprecations` promotes
/// them to an error).
pub fn parse_selector_list_with_diagnostics(text: &str, allow_parent: bool) -> Result<(SelectorList, Vec<Combinator>)> {
    SelectorParser::new(text, allow_parent).parse()
}

/// Convenience wrapper for call sites with no evaluator/logger at hand
/// (the `selector-parse`-family built-ins operate on a bare `&str`/`Value`
/// with no span or logger in scope): bogus combinators still parse
/// successfully, just without a diagnostic being raised.
pub fn parse_selector_list(text: &str, allow_parent: bool) -> Result<SelectorList> {
    Ok(parse_selector_list_with_diagnostics(text, allow_parent)?.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_ordinary_selector_list_has_no_bogus_combinators() {
        let (_, bogus) = parse_selector_list_with_diagnostics("a > b", true).unwrap();
        assert!(bogus.is_empty());
    }

    #[test]
    fn a_leading_combinator_is_bogus_but_still_parses() {
        let (list, bogus) = parse_selector_list_with_diagnostics("> a", true).unwrap();
        assert_eq!(bogus, vec![Combinator::Child]);
        assert_eq!(list.complex.len(), 1);
    }

    #[test]
    fn a_trailing_combinator_is_bogus_but_still_parses() {
        let (_, bogus) = parse_selector_list_with_diagnostics("a >", true).unwrap();
        assert_eq!(bogus, vec![Combinator::Child]);
    }

    #[test]
    fn adjacent_combinators_compile_instead_of_aborting() {
        let (_, bogus) = parse_selector_list_with_diagnostics("a > > b", true).unwrap();
        assert_eq!(bogus, vec![Combinator::Child]);
    }

    #[test]
    fn a_combinators_only_selector_parses_with_no_compound() {
        let (list, bogus) = parse_selector_list_with_diagnostics(">", true).unwrap();
        assert_eq!(bogus, vec![Combinator::Child]);
        assert_eq!(list.complex[0].components.len(), 1);
    }

    #[test]
    fn parse_selector_list_discards_diagnostics() {
        assert!(parse_selector_list("> a", true).is_ok());
    }
}

//! CSS selector parsing.
//! Spec: <https://www.w3.org/TR/selectors-4/>

use crate::split::split_selector_list;
use crate::{
    Combinator, ComplexSelector, CompoundSelector, PseudoClass, PseudoElement, SelectorList,
    SimpleSelector,
};
use core::mem::take;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token (type, class, id, attribute, pseudo, universal).
    Simple(SimpleSelector),
}

/// Tokenizer over a selector string.
pub struct SelectorTokenizer {
    /// Underlying owned bytes for the selector.
    input_bytes: Vec<u8>,
    /// Current cursor index into `input_bytes`.
    index: usize,
    /// Whether we should emit a descendant whitespace token on `next()` call.
    pending_whitespace: bool,
}

impl SelectorTokenizer {
    /// Construct a tokenizer from input.
    #[inline]
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input_bytes: input.as_bytes().to_vec(),
            index: 0,
            pending_whitespace: false,
        }
    }

    /// Return the next selector token, if any.
    #[inline]
    pub(crate) fn next(&mut self) -> Option<Tok> {
        self.skip_whitespace_descendant();
        if take(&mut self.pending_whitespace) {
            // Whitespace directly before an explicit combinator is not a descendant combinator.
            if !matches!(self.peek(), Some(b'>' | b'+' | b'~') | None) {
                return Some(Tok::DescendantWS);
            }
        }
        let current = self.peek()?;
        Some(match current {
            b'*' => {
                self.advance();
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => self.consume_class(),
            b'#' => self.consume_id(),
            b'[' => self.consume_attr(),
            b':' => self.consume_pseudo(),
            b'>' => {
                self.advance();
                self.skip_spaces();
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.advance();
                self.skip_spaces();
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.advance();
                self.skip_spaces();
                Tok::Combinator(Combinator::GeneralSibling)
            }
            _ => self.consume_type(),
        })
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input_bytes.get(self.index).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Skip whitespace and mark that a descendant combinator may be emitted next.
    #[inline]
    fn skip_whitespace_descendant(&mut self) {
        let mut saw = false;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                saw = true;
                self.advance();
            } else {
                break;
            }
        }
        if saw && self.index > 0 {
            self.pending_whitespace = true;
        }
    }

    /// Consume an identifier consisting of ASCII alphanumerics, '-' and '_', lowercased.
    #[inline]
    fn consume_ident(&mut self) -> String {
        let start = self.index;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || !byte.is_ascii() {
                self.advance();
            } else {
                break;
            }
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).to_ascii_lowercase()
    }

    /// Parse a type selector identifier into a `SimpleSelector::Type`.
    #[inline]
    fn consume_type(&mut self) -> Tok {
        let ident = self.consume_ident();
        if ident.is_empty() {
            // Unknown byte: skip it so the tokenizer always makes progress.
            self.advance();
        }
        Tok::Simple(SimpleSelector::Type(ident))
    }

    /// Parse a class selector following '.' into `SimpleSelector::Class`.
    #[inline]
    fn consume_class(&mut self) -> Tok {
        self.advance();
        let ident = self.consume_ident();
        Tok::Simple(SimpleSelector::Class(ident))
    }

    /// Parse an id selector following '#' into `SimpleSelector::IdSelector`.
    #[inline]
    fn consume_id(&mut self) -> Tok {
        self.advance();
        let ident = self.consume_ident();
        Tok::Simple(SimpleSelector::IdSelector(ident))
    }

    /// Parse a pseudo-class or pseudo-element following ':' or '::'.
    ///
    /// Spec: Section 3.6 — Pseudo-elements; Section 4 — Pseudo-classes
    fn consume_pseudo(&mut self) -> Tok {
        self.advance();
        let double_colon = self.peek() == Some(b':');
        if double_colon {
            self.advance();
        }
        let name = self.consume_ident();
        let argument = if self.peek() == Some(b'(') {
            Some(self.consume_parenthesized())
        } else {
            None
        };
        if let Some(pseudo) = PseudoElement::from_name(&name) {
            // CSS2 allowed `:before` / `:after` with a single colon.
            return Tok::Simple(SimpleSelector::PseudoElement(pseudo));
        }
        if double_colon {
            return Tok::Simple(SimpleSelector::PseudoClass(PseudoClass::Other(format!(
                "::{name}"
            ))));
        }
        let pseudo_class = match (name.as_str(), argument) {
            ("root", None) => PseudoClass::Root,
            ("first-child", None) => PseudoClass::FirstChild,
            ("last-child", None) => PseudoClass::LastChild,
            ("not", Some(inner)) => PseudoClass::Not(parse_selector_list(&inner)),
            (_, Some(inner)) => PseudoClass::Other(format!("{name}({inner})")),
            (_, None) => PseudoClass::Other(name),
        };
        Tok::Simple(SimpleSelector::PseudoClass(pseudo_class))
    }

    /// Consume a balanced parenthesized argument and return its inner text.
    fn consume_parenthesized(&mut self) -> String {
        // skip '('
        self.advance();
        let start = self.index;
        let mut depth = 1usize;
        let mut quote: Option<u8> = None;
        while let Some(byte) = self.peek() {
            match (quote, byte) {
                (Some(open), _) if byte == open => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(byte),
                (None, b'(') => depth = depth.saturating_add(1),
                (None, b')') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                (None, _) => {}
            }
            self.advance();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        let inner = String::from_utf8_lossy(slice).trim().to_owned();
        if self.peek() == Some(b')') {
            self.advance();
        }
        inner
    }

    /// Parse an attribute selector, supporting `[name]` and `[name=value]` (quoted or unquoted).
    #[inline]
    fn consume_attr(&mut self) -> Tok {
        // skip '['
        self.advance();
        self.skip_spaces();
        let name = self.consume_ident();
        self.skip_spaces();
        let value = if self.peek() == Some(b'=') {
            self.advance();
            self.skip_spaces();
            match self.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.advance();
                    Some(self.consume_quoted_attr_value(quote))
                }
                _ => Some(self.consume_unquoted_attr_value()),
            }
        } else {
            None
        };
        self.skip_spaces();
        if self.peek() == Some(b']') {
            self.advance();
        }
        Tok::Simple(value.map_or_else(
            || SimpleSelector::AttrExists(name.clone()),
            |attr_value| SimpleSelector::AttrEquals {
                name: name.clone(),
                value: attr_value,
            },
        ))
    }

    /// Consume an unquoted attribute value until whitespace or a closing bracket.
    #[inline]
    fn consume_unquoted_attr_value(&mut self) -> String {
        let start = self.index;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() || byte == b']' {
                break;
            }
            self.advance();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).to_string()
    }

    /// Consume a quoted attribute value until the matching quote byte.
    #[inline]
    fn consume_quoted_attr_value(&mut self, quote: u8) -> String {
        let start = self.index;
        while matches!(self.peek(), Some(byte) if byte != quote) {
            self.advance();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        let out = String::from_utf8_lossy(slice).to_string();
        if self.peek().is_some() {
            self.advance();
        }
        out
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(byte) if byte.is_ascii_whitespace()) {
            self.advance();
        }
    }
}

/// Parse a selector list from CSS text.
///
/// Branches are split on top-level commas only, so `:not(a, b)` stays intact.
/// Spec: Section 4.1, 5–6, 16
pub fn parse_selector_list(input: &str) -> SelectorList {
    let mut list = SelectorList::default();
    for part in split_selector_list(input) {
        let sel = parse_complex_selector(&part);
        if !sel.is_empty() {
            list.selectors.push(sel);
        }
    }
    list
}

/// Parse one complex selector (very permissive, minimal error handling).
/// Spec: Section 16 — Combinators; Section 5–6 — simple selectors
pub fn parse_complex_selector(input: &str) -> ComplexSelector {
    let mut tokens = SelectorTokenizer::new(input.trim());
    let mut current = CompoundSelector::default();
    let mut first: Option<CompoundSelector> = None;
    let mut rest: Vec<(Combinator, CompoundSelector)> = Vec::new();
    // Combinator joining the previous compound to `current`.
    let mut joining: Option<Combinator> = None;
    let mut pending_combinator: Option<Combinator> = None;

    while let Some(token) = tokens.next() {
        let comb = match token {
            Tok::Combinator(comb) => Some(comb),
            Tok::DescendantWS => Some(Combinator::Descendant),
            Tok::Simple(simple) => {
                if let Some(next_comb) = pending_combinator.take() {
                    let finished = take(&mut current);
                    match first {
                        None => first = Some(finished),
                        Some(_) => rest.push((joining.unwrap_or(Combinator::Descendant), finished)),
                    }
                    joining = Some(next_comb);
                }
                if !matches!(&simple, SimpleSelector::Type(name) if name.is_empty()) {
                    current.simples.push(simple);
                }
                None
            }
        };
        if let Some(comb) = comb
            && !current.simples.is_empty()
        {
            // An explicit combinator overrides whitespace seen before it.
            if pending_combinator.is_none() || comb != Combinator::Descendant {
                pending_combinator = Some(comb);
            }
        }
    }

    match first {
        None => ComplexSelector {
            first: current,
            rest,
        },
        Some(head) => {
            if !current.simples.is_empty() {
                rest.push((joining.unwrap_or(Combinator::Descendant), current));
            }
            ComplexSelector { first: head, rest }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_descendant_and_child_chain() {
        let sel = parse_complex_selector("#a .x > p");
        assert_eq!(
            sel.first.simples,
            vec![SimpleSelector::IdSelector("a".to_owned())]
        );
        assert_eq!(sel.rest.len(), 2);
        assert_eq!(sel.rest[0].0, Combinator::Descendant);
        assert_eq!(sel.rest[1].0, Combinator::Child);
        assert_eq!(
            sel.subject().simples,
            vec![SimpleSelector::Type("p".to_owned())]
        );
    }

    #[test]
    fn parses_pseudo_elements_in_both_syntaxes() {
        let modern = parse_complex_selector("p::before");
        let legacy = parse_complex_selector("p:after");
        assert_eq!(modern.subject().pseudo_element(), Some(PseudoElement::Before));
        assert_eq!(legacy.subject().pseudo_element(), Some(PseudoElement::After));
    }

    #[test]
    fn parses_not_with_inner_list() {
        let list = parse_selector_list("p:not(.a, .b), div");
        assert_eq!(list.selectors.len(), 2);
        let Some(SimpleSelector::PseudoClass(PseudoClass::Not(inner))) =
            list.selectors[0].first.simples.get(1)
        else {
            panic!("expected :not pseudo-class");
        };
        assert_eq!(inner.selectors.len(), 2);
    }

    #[test]
    fn parses_attribute_forms() {
        let sel = parse_complex_selector("a[href][rel=\"next\"]");
        assert_eq!(
            sel.first.simples,
            vec![
                SimpleSelector::Type("a".to_owned()),
                SimpleSelector::AttrExists("href".to_owned()),
                SimpleSelector::AttrEquals {
                    name: "rel".to_owned(),
                    value: "next".to_owned()
                },
            ]
        );
    }
}

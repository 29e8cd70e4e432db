//! CSS Style Attributes — style="..." attribute and declaration list processing.
//! Spec: <https://www.w3.org/TR/css-style-attr/>

#![forbid(unsafe_code)]

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};
use std::collections::HashMap;

/// A single CSS declaration parsed from a declaration list.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name normalized to ASCII lowercase (custom properties keep their case).
    pub property: String,
    /// Raw value trimmed of surrounding whitespace, without the `!important` marker.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// Strip a trailing `!important` (any case, optional whitespace after `!`).
///
/// Spec: CSS Cascade 4, Section 6.4 — Important declarations
fn split_important_tail(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim_matches(is_ascii_whitespace);
    if let Some(bang) = trimmed.rfind('!')
        && let (Some(head), Some(tail)) = (trimmed.get(..bang), trimmed.get(bang + 1..))
        && tail
            .trim_matches(is_ascii_whitespace)
            .eq_ignore_ascii_case("important")
    {
        return (head.trim_end_matches(is_ascii_whitespace), true);
    }
    (trimmed, false)
}

/// Declaration-list parser recording the property name, raw value and importance.
struct DeclarationListParser;

impl<'input> DeclarationParser<'input> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (value, important) = split_important_tail(input.slice_from(start));
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(Declaration {
            property: normalize_property_name(&name),
            value: value.to_owned(),
            important,
        })
    }
}

impl AtRuleParser<'_> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl QualifiedRuleParser<'_> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl RuleBodyItemParser<'_, Declaration, ()> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse a declaration list (a rule body or the value of a `style` attribute).
///
/// Declarations are returned in source order; duplicates are kept so callers can
/// resolve them by priority. Invalid items are skipped per CSS error recovery.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_declaration_list(input: &str) -> Vec<Declaration> {
    if input.trim_matches(is_ascii_whitespace).is_empty() {
        return Vec::new();
    }
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    let mut body = DeclarationListParser;
    let mut out: Vec<Declaration> = Vec::new();
    for item in RuleBodyParser::new(&mut parser, &mut body) {
        match item {
            Ok(decl) => out.push(decl),
            Err((err, slice)) => log::trace!("skipping invalid declaration {slice:?}: {err:?}"),
        }
    }
    out
}

/// Parse the value of a `style` attribute into a list of declarations.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_style_attribute(input: &str) -> Vec<Declaration> {
    parse_declaration_list(input)
}

/// Convenience: parse into a map keyed by property name.
///
/// For duplicates an important declaration beats a normal one, otherwise the
/// last one wins, matching the cascade within a single declaration block.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_style_attribute_into_map(input: &str) -> HashMap<String, String> {
    let mut map: HashMap<String, (String, bool)> = HashMap::new();
    for decl in parse_style_attribute(input) {
        let keep_existing = map
            .get(&decl.property)
            .is_some_and(|existing| existing.1 && !decl.important);
        if !keep_existing {
            map.insert(decl.property, (decl.value, decl.important));
        }
    }
    map.into_iter()
        .map(|(property, (value, _))| (property, value))
        .collect()
}

/// ASCII whitespace per CSS Syntax (TAB, LF, FF, CR, SPACE).
///
/// Spec: <https://www.w3.org/TR/css-syntax-3/#whitespace>
const fn is_ascii_whitespace(character: char) -> bool {
    matches!(
        character,
        '\u{0009}' | '\u{000A}' | '\u{000C}' | '\u{000D}' | '\u{0020}'
    )
}

/// Lowercase a property name without allocating twice when already lowercase.
/// Custom properties (`--*`) are case-sensitive and kept as written.
///
/// Spec: <https://www.w3.org/TR/css-variables-1/#defining-variables>
pub fn normalize_property_name(text: &str) -> String {
    if text.starts_with("--") || !text.bytes().any(|byte| byte.is_ascii_uppercase()) {
        return text.to_owned();
    }
    text.to_ascii_lowercase()
}

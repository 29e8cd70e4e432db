//! Matched rules and their lazily split selectors.

use crate::declarations::DeclarationBlock;
use crate::host::{ElementId, RuleId};
use crate::sheet::SheetKey;
use css_selectors::{Specificity, split_selector_list};

/// Text of the synthetic selector standing for `element.style`.
pub const ELEMENT_STYLE_SELECTOR: &str = "@element.style";
/// Source label reported for `element.style` rules.
pub const ELEMENT_STYLE_SOURCE: &str = "element";
/// Href reported for `element.style` rules.
pub const ELEMENT_STYLE_HREF: &str = "#";

/// Where a matched rule comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleOrigin {
    /// A style rule owned by a cached stylesheet.
    StyleSheetRule { rule: RuleId, sheet: SheetKey },
    /// The `style` attribute of an element; there is no owning sheet.
    InlineStyle { element: ElementId },
}

/// Stable identity of a matched rule across rebuilds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleIdentity {
    Sheet(RuleId),
    Inline(ElementId),
}

/// Slot of a rule in the resolver's caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKey {
    /// Index into the catalog's rule cache, which lives as long as the sheet cache.
    Sheet(usize),
    /// Index into the per-build inline style list.
    Inline(usize),
}

/// One comma-separated branch of a rule's selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub text: String,
    /// Position within the parent rule's selector list.
    pub index: usize,
    /// True for the synthetic `element.style` selector.
    pub element_style: bool,
    pub(crate) specificity: Option<Specificity>,
    pub(crate) match_id: u64,
}

impl Selector {
    fn new(text: String, index: usize) -> Self {
        let element_style = text == ELEMENT_STYLE_SELECTOR;
        Self {
            text,
            index,
            element_style,
            specificity: element_style.then_some(Specificity::STYLE_ATTRIBUTE),
            match_id: 0,
        }
    }

    /// Cached specificity, if it has been computed.
    #[inline]
    pub const fn specificity(&self) -> Option<Specificity> {
        self.specificity
    }
}

/// A CSS rule that matched the highlighted element or one of its ancestors.
#[derive(Clone, Debug)]
pub struct MatchedRule {
    origin: RuleOrigin,
    selector_text: String,
    declarations: DeclarationBlock,
    selectors: Option<Vec<Selector>>,
    /// Line in the owning sheet, `-1` for inline style.
    line: i64,
    /// Condition of the nearest enclosing `@media`, empty if none.
    media_text: String,
    source: String,
    href: String,
    content_rule: bool,
    pub(crate) pass_id: u64,
    pub(crate) match_id: u64,
}

impl MatchedRule {
    /// Wrap a stylesheet style rule.
    pub(crate) fn from_sheet_rule(
        rule: RuleId,
        sheet: SheetKey,
        selector_text: String,
        declarations: DeclarationBlock,
        line: u32,
        media_text: String,
        sheet_source: (&str, &str, bool),
    ) -> Self {
        let (short_source, href, content_rule) = sheet_source;
        let mut source = format!("{short_source}:{line}");
        if !media_text.is_empty() {
            source.push_str(" @media ");
            source.push_str(&media_text);
        }
        Self {
            origin: RuleOrigin::StyleSheetRule { rule, sheet },
            selector_text,
            declarations,
            selectors: None,
            line: i64::from(line),
            media_text,
            source,
            href: href.to_owned(),
            content_rule,
            pass_id: 0,
            match_id: 0,
        }
    }

    /// Wrap `element.style`. It carries one synthetic selector.
    pub(crate) fn inline_style(element: ElementId, declarations: DeclarationBlock) -> Self {
        Self {
            origin: RuleOrigin::InlineStyle { element },
            selector_text: ELEMENT_STYLE_SELECTOR.to_owned(),
            declarations,
            selectors: Some(vec![Selector::new(ELEMENT_STYLE_SELECTOR.to_owned(), 0)]),
            line: -1,
            media_text: String::new(),
            source: ELEMENT_STYLE_SOURCE.to_owned(),
            href: ELEMENT_STYLE_HREF.to_owned(),
            content_rule: true,
            pass_id: 0,
            match_id: 0,
        }
    }

    #[inline]
    pub const fn origin(&self) -> RuleOrigin {
        self.origin
    }

    pub const fn identity(&self) -> RuleIdentity {
        match self.origin {
            RuleOrigin::StyleSheetRule { rule, .. } => RuleIdentity::Sheet(rule),
            RuleOrigin::InlineStyle { element } => RuleIdentity::Inline(element),
        }
    }

    /// The host rule handle, `None` for inline style.
    pub const fn rule_id(&self) -> Option<RuleId> {
        match self.origin {
            RuleOrigin::StyleSheetRule { rule, .. } => Some(rule),
            RuleOrigin::InlineStyle { .. } => None,
        }
    }

    pub(crate) const fn sheet_key(&self) -> Option<SheetKey> {
        match self.origin {
            RuleOrigin::StyleSheetRule { sheet, .. } => Some(sheet),
            RuleOrigin::InlineStyle { .. } => None,
        }
    }

    #[inline]
    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    #[inline]
    pub const fn declarations(&self) -> &DeclarationBlock {
        &self.declarations
    }

    #[inline]
    pub const fn line(&self) -> i64 {
        self.line
    }

    #[inline]
    pub fn media_text(&self) -> &str {
        &self.media_text
    }

    #[inline]
    pub fn is_media_rule(&self) -> bool {
        !self.media_text.is_empty()
    }

    /// `"<short source>:<line>"` with an `@media` suffix, or `"element"`.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn href(&self) -> &str {
        &self.href
    }

    /// False when the rule comes from a user-agent sheet.
    #[inline]
    pub const fn content_rule(&self) -> bool {
        self.content_rule
    }

    pub fn get_property_value(&self, property: &str) -> Option<&str> {
        self.declarations.get_property_value(property)
    }

    pub fn get_property_priority(&self, property: &str) -> &'static str {
        self.declarations.get_property_priority(property)
    }

    /// The rule's selectors, splitting the selector text on first use.
    pub fn selectors(&mut self) -> &[Selector] {
        self.selectors_mut()
    }

    pub(crate) fn selectors_mut(&mut self) -> &mut Vec<Selector> {
        let text = &self.selector_text;
        self.selectors.get_or_insert_with(|| {
            split_selector_list(text)
                .into_iter()
                .enumerate()
                .map(|(index, branch)| Selector::new(branch, index))
                .collect()
        })
    }

    /// Selectors if they have been split already.
    pub fn cached_selectors(&self) -> Option<&[Selector]> {
        self.selectors.as_deref()
    }
}

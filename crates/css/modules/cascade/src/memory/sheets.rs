//! Building already-parsed stylesheets for the in-memory host.

use crate::host::{DocumentId, RuleId, RuleInfo, SheetId};
use css_selectors::ComplexSelector;

/// A rule as described to [`StyleSheetBuilder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum RuleSpec {
    Style {
        selector_text: String,
        declarations: String,
        line: u32,
    },
    Import {
        media_text: String,
        sheet: Option<SheetId>,
    },
    Media {
        media_text: String,
        rules: Vec<RuleSpec>,
    },
    Keyframes {
        name: String,
    },
    Other,
}

/// Describes a stylesheet whose rules are already parsed.
///
/// ```
/// use css_cascade::memory::StyleSheetBuilder;
///
/// let sheet = StyleSheetBuilder::new()
///     .href("http://example.com/site.css")
///     .style_rule("#a .x", "color: blue !important", 1)
///     .media_rule(
///         "(min-width: 2000px)",
///         StyleSheetBuilder::new().style_rule("p", "color: red", 3),
///     );
/// # drop(sheet);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct StyleSheetBuilder {
    pub(super) href: Option<String>,
    pub(super) disabled: bool,
    pub(super) media_text: String,
    pub(super) user_agent: bool,
    pub(super) rules: Vec<RuleSpec>,
}

impl StyleSheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_owned());
        self
    }

    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// The sheet's own media list (`<link media>` / `<style media>`).
    pub fn media(mut self, media_text: &str) -> Self {
        self.media_text = media_text.to_owned();
        self
    }

    /// Mark the sheet as browser-provided.
    pub const fn user_agent(mut self) -> Self {
        self.user_agent = true;
        self
    }

    /// A style rule with its selector text, declaration text and source line.
    pub fn style_rule(mut self, selector_text: &str, declarations: &str, line: u32) -> Self {
        self.rules.push(RuleSpec::Style {
            selector_text: selector_text.to_owned(),
            declarations: declarations.to_owned(),
            line,
        });
        self
    }

    /// An `@media` block holding the rules of `inner`.
    pub fn media_rule(mut self, media_text: &str, inner: Self) -> Self {
        self.rules.push(RuleSpec::Media {
            media_text: media_text.to_owned(),
            rules: inner.rules,
        });
        self
    }

    /// An `@import` of a sheet created with `MemoryHost::create_style_sheet`.
    pub fn import(mut self, media_text: &str, sheet: Option<SheetId>) -> Self {
        self.rules.push(RuleSpec::Import {
            media_text: media_text.to_owned(),
            sheet,
        });
        self
    }

    pub fn keyframes(mut self, name: &str) -> Self {
        self.rules.push(RuleSpec::Keyframes {
            name: name.to_owned(),
        });
        self
    }

    /// Any rule the resolver does not look into (`@font-face`, `@page`, ...).
    pub fn other_rule(mut self) -> Self {
        self.rules.push(RuleSpec::Other);
        self
    }
}

#[derive(Clone, Debug)]
pub(super) struct SheetData {
    pub href: Option<String>,
    pub owner_document: Option<DocumentId>,
    pub disabled: bool,
    pub media_text: String,
    pub user_agent: bool,
    pub rules: Vec<RuleId>,
    pub alive: bool,
}

#[derive(Clone, Debug)]
pub(super) struct RuleData {
    pub info: RuleInfo,
    /// Parsed branches of a style rule's selector list.
    pub selectors: Vec<ComplexSelector>,
}

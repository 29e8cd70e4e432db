//! CSS Cascading and Inheritance Level 4 — cascade resolution for a style inspector.
//! Spec: <https://www.w3.org/TR/css-cascade-4/>
//!
//! Given a highlighted element, the [`CascadeResolver`] finds the stylesheets of
//! its document, the rules matching the element and its ancestors, and ranks the
//! selectors contributing to each property by cascade order (origin,
//! `!important`, specificity, sheet order, line).
//!
//! The resolver talks to its environment only through the collaborator traits
//! in [`host`]. [`memory::MemoryHost`] implements them over in-memory arenas.

#![forbid(unsafe_code)]

mod config;
mod declarations;
mod error;
mod filter;
pub mod host;
mod inherited;
pub mod memory;
mod naming;
mod property_info;
mod ranking;
mod resolver;
mod rule;
mod sheet;
mod status;

// Re-export public API
pub use config::InspectorConfig;
pub use declarations::{DeclarationBlock, IMPORTANT};
pub use error::CascadeError;
pub use filter::SourceFilter;
pub use host::{
    Binding, ComputedStyleProvider, DocumentId, ElementId, ElementNaming, InheritancePredicate,
    InspectorHost, PseudoBinding, RuleId, RuleInfo, RuleKind, SelectorMatcher, SheetId, SheetInfo,
    StyleSheetSource,
};
pub use inherited::is_inherited_property;
pub use naming::{ShortName, short_name, short_name_path};
pub use property_info::PropertyInfo;
pub use ranking::{SelectorInfo, compare, rank};
pub use resolver::CascadeResolver;
pub use rule::{
    ELEMENT_STYLE_HREF, ELEMENT_STYLE_SELECTOR, ELEMENT_STYLE_SOURCE, MatchedRule, RuleIdentity,
    RuleKey, RuleOrigin, Selector,
};
pub use sheet::{INLINE_SOURCE, KeyframesRule, SheetKey, StyleSheetCatalog, StyleSheetRef, short_source};
pub use status::MatchStatus;

pub use css_media_queries::Viewport;
pub use css_selectors::{PseudoElement, Specificity};

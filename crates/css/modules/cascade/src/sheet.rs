//! The per-document stylesheet cache.
//!
//! Sheets are deduplicated by identity within a cache generation and looked up
//! through a cache id (the href, or the owner document's location). Style rules
//! are wrapped once per sheet so repeated matches reuse the same entry.

use crate::error::CascadeError;
use crate::filter::SourceFilter;
use crate::host::{RuleId, RuleKind, SheetId, StyleSheetSource};
use crate::rule::{MatchedRule, RuleKey};
use anyhow::Result;
use std::collections::HashMap;
use url::Url;

/// Source label for sheets without an href.
pub const INLINE_SOURCE: &str = "inline";

/// Slot of a sheet in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetKey(pub usize);

/// A stylesheet as seen by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSheetRef {
    pub id: SheetId,
    /// Position used for cascade ordering; later sheets override earlier ones.
    pub index: i64,
    /// False for user-agent sheets.
    pub content_sheet: bool,
    /// The sheet href, or the owner document location for embedded sheets.
    pub href: String,
    pub short_source: String,
    pub media_text: String,
    pub disabled: bool,
    /// Whether the current source filter shows this sheet.
    pub sheet_allowed: bool,
    /// Raw rule count until `for_each_rule` has counted the style rules.
    pub rule_count: usize,
    /// Registered by a catalog pass, as opposed to met while matching.
    pub catalogued: bool,
    pub(crate) pass_id: u64,
}

impl StyleSheetRef {
    /// Short form of the sheet's address.
    #[inline]
    pub fn short_source(&self) -> &str {
        &self.short_source
    }
}

/// An `@keyframes` rule found while cataloguing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyframesRule {
    pub rule: RuleId,
    pub name: String,
    pub sheet: SheetId,
}

/// Shorten a stylesheet address for display.
///
/// Tries the file name, the file path and the query in turn, then the
/// `data:` prefix, then the whole href. Sheets without an href are `"inline"`.
pub fn short_source(href: Option<&str>) -> String {
    let Some(href) = href.filter(|text| !text.is_empty()) else {
        return INLINE_SOURCE.to_owned();
    };
    if let Ok(url) = Url::parse(href)
        && !url.cannot_be_a_base()
    {
        if let Some(file_name) = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
        {
            return file_name.to_owned();
        }
        if !url.path().is_empty() {
            return url.path().to_owned();
        }
        if let Some(query) = url.query().filter(|query| !query.is_empty()) {
            return query.to_owned();
        }
    }
    if href.starts_with("data:")
        && let Some(comma) = href.find(',')
        && let Some(prefix) = href.get(..comma)
    {
        return prefix.to_owned();
    }
    href.to_owned()
}

/// Cache of the stylesheets relevant to one document.
#[derive(Debug, Default)]
pub struct StyleSheetCatalog {
    /// Slots are emptied when a sheet is pruned so keys stay valid.
    sheets: Vec<Option<StyleSheetRef>>,
    by_cache_id: HashMap<String, Vec<SheetKey>>,
    rules: Vec<MatchedRule>,
    rule_cache: HashMap<(SheetKey, String), Vec<usize>>,
    keyframes: Vec<KeyframesRule>,
    /// Next ordinal handed out by a catalog pass.
    sheet_index: usize,
    rule_count: usize,
    cached: bool,
}

impl StyleSheetCatalog {
    /// Forget every sheet and rule.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub const fn is_cached(&self) -> bool {
        self.cached
    }

    #[inline]
    pub const fn set_cached(&mut self) {
        self.cached = true;
    }

    /// Number of rules in allowed content sheets.
    #[inline]
    pub const fn rule_count(&self) -> usize {
        self.rule_count
    }

    #[inline]
    pub const fn set_rule_count(&mut self, count: usize) {
        self.rule_count = count;
    }

    /// How many ordinals catalog passes have handed out.
    #[inline]
    pub const fn catalogued_count(&self) -> usize {
        self.sheet_index
    }

    pub fn keyframes(&self) -> &[KeyframesRule] {
        &self.keyframes
    }

    pub fn push_keyframes(&mut self, keyframes: KeyframesRule) {
        self.keyframes.push(keyframes);
    }

    /// Claim the next document-order ordinal.
    pub const fn next_sheet_index(&mut self) -> usize {
        let index = self.sheet_index;
        self.sheet_index += 1;
        index
    }

    pub fn sheet(&self, key: SheetKey) -> Option<&StyleSheetRef> {
        self.sheets.get(key.0).and_then(Option::as_ref)
    }

    pub fn sheet_mut(&mut self, key: SheetKey) -> Option<&mut StyleSheetRef> {
        self.sheets.get_mut(key.0).and_then(Option::as_mut)
    }

    /// Key of a cached sheet by host handle.
    pub fn key_of(&self, id: SheetId) -> Option<SheetKey> {
        self.sheets
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|sheet| sheet.id == id))
            .map(SheetKey)
    }

    /// Live keys in registration order.
    pub fn keys(&self) -> Vec<SheetKey> {
        self.sheets
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| SheetKey(index))
            .collect()
    }

    /// Return the cached ref for `id`, creating it on first sight.
    ///
    /// `index` renumbers an existing ref; `None` leaves the ordinal alone.
    ///
    /// # Errors
    /// Returns an error if the host no longer knows the sheet.
    pub fn get_sheet<H: StyleSheetSource + ?Sized>(
        &mut self,
        host: &H,
        id: SheetId,
        index: Option<usize>,
        filter: &SourceFilter,
    ) -> Result<SheetKey> {
        let info = host.sheet_info(id)?;
        let cache_id = info
            .href
            .clone()
            .or_else(|| info.owner_location.clone())
            .unwrap_or_default();

        if let Some(keys) = self.by_cache_id.get(&cache_id) {
            let found = keys
                .iter()
                .copied()
                .find(|key| self.sheet(*key).is_some_and(|sheet| sheet.id == id));
            if let Some(key) = found {
                if let Some(ordinal) = index
                    && let Some(sheet) = self.sheet_mut(key)
                {
                    sheet.index = ordinal_for(sheet.content_sheet, ordinal);
                    sheet.catalogued = true;
                }
                return Ok(key);
            }
        }

        let content_sheet = !info.user_agent;
        let href = info
            .href
            .clone()
            .or(info.owner_location)
            .unwrap_or_default();
        let rule_count = host.sheet_rules(id).map_or(0, |rules| rules.len());
        let sheet_allowed = filter.is_sheet_allowed(content_sheet, &href);
        if sheet_allowed && content_sheet {
            self.rule_count += rule_count;
        }
        let sheet = StyleSheetRef {
            id,
            index: index.map_or(-1, |ordinal| ordinal_for(content_sheet, ordinal)),
            content_sheet,
            short_source: short_source(info.href.as_deref()),
            href,
            media_text: info.media_text,
            disabled: info.disabled,
            sheet_allowed,
            rule_count,
            catalogued: index.is_some(),
            pass_id: 0,
        };
        log::trace!("caching sheet {} as {:?}", id.0, sheet.short_source);
        let key = SheetKey(self.sheets.len());
        self.sheets.push(Some(sheet));
        self.by_cache_id.entry(cache_id).or_default().push(key);
        Ok(key)
    }

    /// Drop sheets the host reports as dead, in registration order.
    pub fn prune_dead<H: StyleSheetSource + ?Sized>(&mut self, host: &H) {
        for slot in &mut self.sheets {
            if let Some(sheet) = slot
                && let Err(err) = host.sheet_info(sheet.id)
            {
                log::debug!("pruning dead stylesheet {}: {err}", sheet.id.0);
                *slot = None;
            }
        }
        let sheets = &self.sheets;
        self.by_cache_id.retain(|_, keys| {
            keys.retain(|key| sheets.get(key.0).is_some_and(Option::is_some));
            !keys.is_empty()
        });
    }

    /// Return the cached wrapper for a style rule of `sheet`, creating it on first sight.
    ///
    /// # Errors
    /// Returns an error if the rule is gone or is not a style rule.
    pub fn get_rule<H: StyleSheetSource + ?Sized>(
        &mut self,
        host: &H,
        sheet: SheetKey,
        id: RuleId,
    ) -> Result<RuleKey> {
        let info = host.rule_info(id)?;
        let RuleKind::Style {
            selector_text,
            declarations,
            line,
            ..
        } = info.kind
        else {
            return Err(CascadeError::NotAStyleRule(id).into());
        };
        let cache_id = (sheet, selector_text);
        if let Some(found) = self.rule_cache.get(&cache_id).and_then(|slots| {
            slots.iter().copied().find(|slot| {
                self.rules
                    .get(*slot)
                    .is_some_and(|rule| rule.rule_id() == Some(id))
            })
        }) {
            return Ok(RuleKey::Sheet(found));
        }

        let media_text = enclosing_media_text(host, info.parent_rule);
        let Some(owner) = self.sheet(sheet) else {
            return Err(CascadeError::MissingParentSheet(id).into());
        };
        let rule = MatchedRule::from_sheet_rule(
            id,
            sheet,
            cache_id.1.clone(),
            declarations,
            line,
            media_text,
            (&owner.short_source, &owner.href, owner.content_sheet),
        );
        let slot = self.rules.len();
        self.rules.push(rule);
        self.rule_cache.entry(cache_id).or_default().push(slot);
        Ok(RuleKey::Sheet(slot))
    }

    pub fn rule(&self, slot: usize) -> Option<&MatchedRule> {
        self.rules.get(slot)
    }

    pub fn rule_mut(&mut self, slot: usize) -> Option<&mut MatchedRule> {
        self.rules.get_mut(slot)
    }
}

/// User-agent sheets get negative ordinals when catalogued.
const fn ordinal_for(content_sheet: bool, ordinal: usize) -> i64 {
    if content_sheet {
        ordinal as i64
    } else {
        -100 * ordinal as i64
    }
}

/// Media text of the parent `@media` rule, empty when the parent is anything else.
fn enclosing_media_text<H: StyleSheetSource + ?Sized>(host: &H, parent: Option<RuleId>) -> String {
    parent
        .and_then(|parent_rule| host.rule_info(parent_rule).ok())
        .and_then(|parent_info| match parent_info.kind {
            RuleKind::Media { media_text, .. } => Some(media_text),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_source_prefers_file_name() {
        assert_eq!(short_source(None), "inline");
        assert_eq!(short_source(Some("")), "inline");
        assert_eq!(short_source(Some("http://example.com/css/site.css?v=2")), "site.css");
        assert_eq!(short_source(Some("http://example.com/css/")), "/css/");
        assert_eq!(
            short_source(Some("data:text/css;charset=utf-8,p{color:red}")),
            "data:text/css;charset=utf-8"
        );
        assert_eq!(short_source(Some("not a url")), "not a url");
    }

    #[test]
    fn user_agent_ordinals_are_negative() {
        assert_eq!(ordinal_for(true, 3), 3);
        assert_eq!(ordinal_for(false, 2), -200);
    }
}

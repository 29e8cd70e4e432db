//! The cascade resolver: which rules apply to the highlighted element and how
//! they rank per property.
//!
//! All caches are scoped to the highlighted element (matched rules, matched
//! selectors, property infos) or to its document (stylesheets, wrapped rules,
//! keyframes). Only `highlight`, `set_source_filter` and `reset` invalidate
//! them; matching re-catalogues a stale document first.

use crate::config::InspectorConfig;
use crate::declarations::IMPORTANT;
use crate::error::CascadeError;
use crate::filter::SourceFilter;
use crate::host::{DocumentId, ElementId, InspectorHost, RuleId, RuleKind, SheetId};
use crate::property_info::PropertyInfo;
use crate::ranking::{SelectorInfo, rank};
use crate::rule::{MatchedRule, RuleIdentity, RuleKey};
use crate::sheet::{KeyframesRule, SheetKey, StyleSheetCatalog, StyleSheetRef};
use crate::status::MatchStatus;
use anyhow::Result;
use core::mem;
use css_selectors::Specificity;
use std::collections::HashMap;

/// A matched selector: the rule it belongs to and its index in that rule.
type SelectorKey = (RuleKey, usize);

/// Cascade resolution engine for one inspected element at a time.
pub struct CascadeResolver<H: InspectorHost> {
    host: H,
    viewed_element: Option<ElementId>,
    viewed_document: Option<DocumentId>,
    computed_style: Option<HashMap<String, String>>,
    source_filter: SourceFilter,
    /// Generation counter for sheet and rule visits.
    pass_id: u64,
    /// Generation counter for selector matching.
    match_id: u64,
    catalog: StyleSheetCatalog,
    inline_rules: Vec<MatchedRule>,
    matched_rules: Option<Vec<(RuleKey, MatchStatus)>>,
    matched_selectors: Option<Vec<(SelectorKey, MatchStatus)>>,
    property_infos: HashMap<String, PropertyInfo>,
}

impl<H: InspectorHost> CascadeResolver<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            viewed_element: None,
            viewed_document: None,
            computed_style: None,
            source_filter: SourceFilter::default(),
            pass_id: 0,
            match_id: 0,
            catalog: StyleSheetCatalog::default(),
            inline_rules: Vec::new(),
            matched_rules: None,
            matched_selectors: None,
            property_infos: HashMap::new(),
        }
    }

    /// Create a resolver starting with the configured source filter.
    pub fn with_config(host: H, config: &InspectorConfig) -> Self {
        let mut resolver = Self::new(host);
        resolver.source_filter = config.source_filter.clone();
        resolver
    }

    #[inline]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access. Call [`Self::reset`] or re-highlight after mutating.
    #[inline]
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[inline]
    pub const fn viewed_element(&self) -> Option<ElementId> {
        self.viewed_element
    }

    #[inline]
    pub const fn viewed_document(&self) -> Option<DocumentId> {
        self.viewed_document
    }

    #[inline]
    pub const fn source_filter(&self) -> &SourceFilter {
        &self.source_filter
    }

    /// Current generation counter.
    #[inline]
    pub const fn pass_id(&self) -> u64 {
        self.pass_id
    }

    /// Computed style captured at the last `highlight`.
    #[inline]
    pub const fn computed_style(&self) -> Option<&HashMap<String, String>> {
        self.computed_style.as_ref()
    }

    /// Drop every cache. The highlighted element is kept.
    pub fn reset(&mut self) {
        log::debug!("resetting cascade caches");
        self.property_infos.clear();
        self.catalog.clear();
        self.inline_rules.clear();
        self.matched_rules = None;
        self.matched_selectors = None;
    }

    /// Focus on a new element; `None` returns to the idle state.
    pub fn highlight(&mut self, element: Option<ElementId>) {
        let Some(element) = element else {
            self.viewed_element = None;
            self.viewed_document = None;
            self.computed_style = None;
            self.reset();
            return;
        };
        if self.viewed_element == Some(element) {
            return;
        }
        self.viewed_element = Some(element);

        let document = match self.host.owner_document(element) {
            Ok(document) => Some(document),
            Err(err) => {
                log::warn!("element {} has no owner document: {err}", element.0);
                None
            }
        };
        if document == self.viewed_document {
            self.property_infos.clear();
        } else {
            self.viewed_document = document;
            self.cache_sheets();
        }

        self.matched_rules = None;
        self.matched_selectors = None;
        self.inline_rules.clear();

        let binding = self.host.binding_element_and_pseudo(element);
        self.computed_style = match self.host.computed_style(binding.element, binding.pseudo) {
            Ok(style) => Some(style),
            Err(err) => {
                log::warn!("computed style unavailable for {}: {err}", element.0);
                None
            }
        };
    }

    /// Change which origins are shown.
    ///
    /// Entering or leaving [`SourceFilter::Ua`] changes which rules are matched
    /// at all and drops the match caches. Any other change only marks property
    /// infos for a cheap recount on next access.
    pub fn set_source_filter(&mut self, filter: SourceFilter) {
        let old = mem::replace(&mut self.source_filter, filter);
        self.catalog.prune_dead(&self.host);
        let mut rule_count = 0;
        for key in self.catalog.keys() {
            if let Some(sheet) = self.catalog.sheet_mut(key) {
                sheet.sheet_allowed = self
                    .source_filter
                    .is_sheet_allowed(sheet.content_sheet, &sheet.href);
                if sheet.content_sheet && sheet.sheet_allowed {
                    rule_count += sheet.rule_count;
                }
            }
        }
        self.catalog.set_rule_count(rule_count);

        if old.includes_user_agent() || self.source_filter.includes_user_agent() {
            log::debug!("source filter {old} -> {}: full update", self.source_filter);
            self.matched_rules = None;
            self.matched_selectors = None;
            self.inline_rules.clear();
            self.property_infos.clear();
        } else {
            log::debug!("source filter {old} -> {}: refilter", self.source_filter);
            for info in self.property_infos.values_mut() {
                info.need_refilter = true;
            }
        }
    }

    /// Rank every selector that sets `property`. `None` while idle.
    pub fn get_property_info(&mut self, property: &str) -> Option<&PropertyInfo> {
        self.viewed_element?;
        if let Some(info) = self.property_infos.get_mut(property) {
            if info.need_refilter {
                let catalog = &self.catalog;
                info.refilter(|key| rule_sheet_allowed(catalog, key));
            }
        } else {
            let info = self.find_matched_selectors(property);
            self.property_infos.insert(property.to_owned(), info);
        }
        self.property_infos.get(property)
    }

    /// For each property, whether a matched rule sets it (directly, or on an
    /// ancestor for inherited properties). Every queried property is present.
    pub fn has_matched_selectors(&mut self, properties: &[&str]) -> HashMap<String, bool> {
        let mut result: HashMap<String, bool> = properties
            .iter()
            .map(|property| ((*property).to_owned(), false))
            .collect();
        if self.viewed_element.is_none() {
            return result;
        }
        if self.matched_rules.is_none() {
            self.build_matched_rules();
        }
        let mut remaining: Vec<&str> = properties.to_vec();
        for (key, status) in self.matched_rules.iter().flatten() {
            if remaining.is_empty() {
                break;
            }
            let Some(rule) = self.rule(*key) else {
                continue;
            };
            remaining.retain(|property| {
                let counts = rule.get_property_value(property).is_some()
                    && (*status == MatchStatus::Matched
                        || (*status == MatchStatus::ParentMatch
                            && self.host.is_inherited_property(property)));
                if counts {
                    result.insert((*property).to_owned(), true);
                }
                !counts
            });
        }
        result
    }

    /// Matched rules in discovery order, by identity.
    pub fn matched_rules(&mut self) -> Vec<(RuleIdentity, MatchStatus)> {
        if self.viewed_element.is_none() {
            return Vec::new();
        }
        if self.matched_rules.is_none() {
            self.build_matched_rules();
        }
        self.matched_rules
            .iter()
            .flatten()
            .filter_map(|(key, status)| self.rule(*key).map(|rule| (rule.identity(), *status)))
            .collect()
    }

    /// Shown stylesheets: content sheets, plus user-agent sheets under [`SourceFilter::Ua`].
    pub fn sheets(&mut self) -> Vec<StyleSheetRef> {
        self.ensure_sheets_cached();
        let show_user_agent = self.source_filter.includes_user_agent();
        let mut sheets = Vec::new();
        self.for_each_sheet(|sheet| {
            if sheet.content_sheet || show_user_agent {
                sheets.push(sheet.clone());
            }
        });
        sheets
    }

    /// Rules in allowed content sheets.
    pub fn rule_count(&mut self) -> usize {
        self.ensure_sheets_cached();
        self.catalog.rule_count()
    }

    /// `@keyframes` rules of the catalogued sheets.
    pub fn keyframes_rules(&mut self) -> &[KeyframesRule] {
        self.ensure_sheets_cached();
        self.catalog.keyframes()
    }

    /// Visit live cached sheets in registration order, pruning dead ones first.
    pub fn for_each_sheet(&mut self, mut callback: impl FnMut(&StyleSheetRef)) {
        self.catalog.prune_dead(&self.host);
        for key in self.catalog.keys() {
            if let Some(sheet) = self.catalog.sheet(key) {
                callback(sheet);
            }
        }
    }

    /// Visit the style rules of a cached sheet, descending into matching `@media`.
    ///
    /// Afterwards the sheet's rule count is the number of style rules visited.
    pub fn for_each_rule(&mut self, sheet: SheetId, mut callback: impl FnMut(&MatchedRule)) {
        self.walk_rules(sheet, &mut |rule| {
            callback(rule);
            false
        });
    }

    /// Like [`Self::for_each_rule`] but stops once `predicate` returns true.
    /// Returns whether it did.
    pub fn for_some_rules(
        &mut self,
        sheet: SheetId,
        mut predicate: impl FnMut(&MatchedRule) -> bool,
    ) -> bool {
        self.walk_rules(sheet, &mut predicate)
    }

    fn walk_rules(&mut self, sheet: SheetId, visit: &mut dyn FnMut(&MatchedRule) -> bool) -> bool {
        let Some(key) = self.catalog.key_of(sheet) else {
            log::debug!("sheet {} is not cached", sheet.0);
            return false;
        };
        let rules = match self.host.sheet_rules(sheet) {
            Ok(rules) => rules,
            Err(err) => {
                log::debug!("cannot read rules of sheet {}: {err}", sheet.0);
                return false;
            }
        };
        let mut visited = 0;
        let stopped = self.walk_rule_list(key, &rules, visit, &mut visited);
        if !stopped && let Some(cached) = self.catalog.sheet_mut(key) {
            cached.rule_count = visited;
        }
        stopped
    }

    fn walk_rule_list(
        &mut self,
        key: SheetKey,
        rules: &[RuleId],
        visit: &mut dyn FnMut(&MatchedRule) -> bool,
        visited: &mut usize,
    ) -> bool {
        for rule_id in rules {
            let info = match self.host.rule_info(*rule_id) {
                Ok(info) => info,
                Err(err) => {
                    log::debug!("skipping unreadable rule {}: {err}", rule_id.0);
                    continue;
                }
            };
            match info.kind {
                RuleKind::Style { .. } => {
                    let wrapped = self.catalog.get_rule(&self.host, key, *rule_id);
                    let Ok(RuleKey::Sheet(slot)) = wrapped else {
                        continue;
                    };
                    *visited += 1;
                    if let Some(rule) = self.catalog.rule(slot)
                        && visit(rule)
                    {
                        return true;
                    }
                }
                RuleKind::Media { media_text, rules } if self.media_matches(&media_text) => {
                    if self.walk_rule_list(key, &rules, visit, visited) {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn ensure_sheets_cached(&mut self) {
        if !self.catalog.is_cached() {
            self.cache_sheets();
        }
    }

    fn media_matches(&self, media_text: &str) -> bool {
        media_text.trim().is_empty()
            || self
                .viewed_document
                .is_some_and(|document| self.host.media_matches(document, media_text))
    }

    /// Rebuild the stylesheet cache for the viewed document.
    fn cache_sheets(&mut self) {
        let _span = tracing::debug_span!("cache_sheets").entered();
        self.pass_id += 1;
        self.reset();
        if let Some(document) = self.viewed_document {
            match self.host.style_sheets(document) {
                Ok(sheets) => {
                    for sheet in sheets {
                        self.cache_sheet(sheet);
                    }
                }
                Err(err) => log::warn!("cannot enumerate stylesheets of {}: {err}", document.0),
            }
        }
        self.catalog.set_cached();
        log::debug!(
            "cached stylesheets: {} rules, {} keyframes",
            self.catalog.rule_count(),
            self.catalog.keyframes().len()
        );
    }

    /// Register an enabled, media-matching sheet and follow its `@import`s.
    fn cache_sheet(&mut self, sheet: SheetId) {
        let info = match self.host.sheet_info(sheet) {
            Ok(info) => info,
            Err(err) => {
                log::debug!("skipping dead stylesheet {}: {err}", sheet.0);
                return;
            }
        };
        if info.disabled || !self.media_matches(&info.media_text) {
            log::trace!("sheet {} is disabled or its media does not match", sheet.0);
            return;
        }
        let key = match self
            .catalog
            .get_sheet(&self.host, sheet, None, &self.source_filter)
        {
            Ok(key) => key,
            Err(err) => {
                log::debug!("skipping stylesheet {}: {err}", sheet.0);
                return;
            }
        };
        let pass_id = self.pass_id;
        let Some(cached) = self.catalog.sheet_mut(key) else {
            return;
        };
        if cached.pass_id == pass_id {
            return;
        }
        cached.pass_id = pass_id;

        let rules = self.host.sheet_rules(sheet).unwrap_or_default();
        for rule in rules {
            let Ok(rule_info) = self.host.rule_info(rule) else {
                continue;
            };
            match rule_info.kind {
                RuleKind::Import {
                    media_text,
                    sheet: Some(imported),
                } if self.media_matches(&media_text) => self.cache_sheet(imported),
                RuleKind::Keyframes { name } => self.catalog.push_keyframes(KeyframesRule {
                    rule,
                    name,
                    sheet,
                }),
                _ => {}
            }
        }

        // Imported sheets precede their importer in cascade order.
        let index = self.catalog.next_sheet_index();
        if let Err(err) = self
            .catalog
            .get_sheet(&self.host, sheet, Some(index), &self.source_filter)
        {
            log::debug!("cannot number stylesheet {}: {err}", sheet.0);
        }
    }

    /// Collect the rules matching the viewed element and its ancestors.
    fn build_matched_rules(&mut self) {
        let _span = tracing::debug_span!("build_matched_rules").entered();
        self.ensure_sheets_cached();
        self.match_id += 1;
        self.pass_id += 1;
        self.inline_rules.clear();
        self.matched_selectors = None;
        let mut matched = Vec::new();
        let Some(viewed) = self.viewed_element else {
            self.matched_rules = Some(matched);
            return;
        };
        // Sheets first met here sort after every catalogued sheet.
        let mut next_index = self.catalog.catalogued_count();

        let mut current = Some(viewed);
        while let Some(element) = current {
            let status = if element == viewed {
                MatchStatus::Matched
            } else {
                MatchStatus::ParentMatch
            };
            current = self.host.parent_element(element);

            let binding = self.host.binding_element_and_pseudo(element);
            let rules = match self
                .host
                .style_rules_for_node(binding.element, binding.pseudo)
            {
                Ok(rules) => rules.unwrap_or_default(),
                Err(err) => {
                    log::warn!("skipping rules of node {}: {err}", element.0);
                    continue;
                }
            };
            for rule in rules {
                match self.collect_rule(rule, &mut next_index) {
                    Ok(Some(key)) => matched.push((key, status)),
                    Ok(None) => {}
                    Err(err) if err.downcast_ref::<CascadeError>().is_some() => {
                        log::error!("{err}");
                    }
                    Err(err) => log::warn!("skipping rule {}: {err}", rule.0),
                }
            }

            match self.host.inline_style(element) {
                Ok(declarations) if !declarations.is_empty() => {
                    let mut inline = MatchedRule::inline_style(element, declarations);
                    inline.match_id = self.match_id;
                    inline.pass_id = self.pass_id;
                    matched.push((RuleKey::Inline(self.inline_rules.len()), status));
                    self.inline_rules.push(inline);
                }
                Ok(_) => {}
                Err(err) => log::debug!("no inline style for {}: {err}", element.0),
            }
        }
        log::debug!("matched {} rules for element {}", matched.len(), viewed.0);
        self.matched_rules = Some(matched);
    }

    /// Wrap one rule returned by the matcher, or `None` if it does not take part.
    fn collect_rule(&mut self, rule: RuleId, next_index: &mut usize) -> Result<Option<RuleKey>> {
        let info = self.host.rule_info(rule)?;
        if !matches!(info.kind, RuleKind::Style { .. }) {
            return Ok(None);
        }
        let parent_sheet = info
            .parent_sheet
            .ok_or(CascadeError::MissingParentSheet(rule))?;
        let key = self
            .catalog
            .get_sheet(&self.host, parent_sheet, None, &self.source_filter)?;
        let pass_id = self.pass_id;
        let content_sheet = {
            let Some(sheet) = self.catalog.sheet_mut(key) else {
                return Err(CascadeError::MissingParentSheet(rule).into());
            };
            if sheet.pass_id != pass_id {
                sheet.pass_id = pass_id;
                if !sheet.catalogued {
                    sheet.index = *next_index as i64;
                    *next_index += 1;
                }
            }
            sheet.content_sheet
        };
        if !content_sheet && !self.source_filter.includes_user_agent() {
            log::trace!("rule {} is from a user-agent sheet, filtered out", rule.0);
            return Ok(None);
        }
        if let Some(parent) = info.parent_rule
            && let Ok(parent_info) = self.host.rule_info(parent)
            && let RuleKind::Media { media_text, .. } = parent_info.kind
            && !self.media_matches(&media_text)
        {
            log::trace!("rule {} is inside non-matching @media {media_text}", rule.0);
            return Ok(None);
        }

        let rule_key = self.catalog.get_rule(&self.host, key, rule)?;
        let match_id = self.match_id;
        let Some(wrapped) = self.rule_mut(rule_key) else {
            return Ok(None);
        };
        if wrapped.pass_id == pass_id {
            return Ok(None);
        }
        wrapped.pass_id = pass_id;
        wrapped.match_id = match_id;
        Ok(Some(rule_key))
    }

    /// Selectors of the matched rules that match the viewed element or an ancestor.
    fn process_matched_selectors(&mut self) -> Vec<(SelectorKey, MatchStatus)> {
        if let Some(selectors) = &self.matched_selectors {
            self.pass_id += 1;
            return selectors.clone();
        }
        if self.matched_rules.is_none() {
            self.build_matched_rules();
        }
        self.pass_id += 1;
        let pass_id = self.pass_id;
        let match_id = self.match_id;
        let rules = self.matched_rules.clone().unwrap_or_default();
        let mut selectors = Vec::new();
        for (rule_key, status) in rules {
            let rule_id = self.rule(rule_key).and_then(MatchedRule::rule_id);
            let count = self
                .rule_mut(rule_key)
                .map_or(0, |rule| rule.selectors_mut().len());
            for index in 0..count {
                let Some((element_style, seen, cached)) = self.rule(rule_key).and_then(|rule| {
                    rule.cached_selectors()
                        .and_then(|list| list.get(index))
                        .map(|selector| {
                            (
                                selector.element_style,
                                selector.match_id == match_id,
                                selector.specificity(),
                            )
                        })
                }) else {
                    continue;
                };
                if seen {
                    continue;
                }
                let matches = element_style
                    || rule_id.is_some_and(|id| self.selector_matches_element(id, index));
                if !matches {
                    continue;
                }
                let specificity = match cached {
                    Some(specificity) => specificity,
                    None if element_style => Specificity::STYLE_ATTRIBUTE,
                    None => rule_id.map_or_else(Specificity::default, |id| {
                        self.host.specificity(id, index).unwrap_or_else(|err| {
                            log::warn!("no specificity for rule {} #{index}: {err}", id.0);
                            Specificity::default()
                        })
                    }),
                };
                if let Some(selector) = self
                    .rule_mut(rule_key)
                    .and_then(|rule| rule.selectors_mut().get_mut(index))
                {
                    selector.match_id = match_id;
                    selector.specificity.get_or_insert(specificity);
                }
                selectors.push(((rule_key, index), status));
            }
            if let Some(rule) = self.rule_mut(rule_key) {
                rule.pass_id = pass_id;
            }
        }
        self.matched_selectors = Some(selectors.clone());
        selectors
    }

    /// Whether selector `index` of `rule` matches the viewed element or an ancestor.
    fn selector_matches_element(&self, rule: RuleId, index: usize) -> bool {
        let mut current = self.viewed_element;
        while let Some(element) = current {
            let binding = self.host.binding_element_and_pseudo(element);
            match self
                .host
                .selector_matches_element(binding.element, rule, index, binding.pseudo)
            {
                Ok(true) => return true,
                Ok(false) => {}
                Err(err) => log::trace!("selector {index} of rule {} failed: {err}", rule.0),
            }
            current = self.host.parent_element(element);
        }
        false
    }

    /// Build the property info for `property` from the matched selectors.
    fn find_matched_selectors(&mut self, property: &str) -> PropertyInfo {
        let matched = self.process_matched_selectors();
        let inherited = self.host.is_inherited_property(property);
        let mut contributors = Vec::new();
        for ((rule_key, index), status) in matched {
            let counts = status == MatchStatus::Matched
                || (status == MatchStatus::ParentMatch && inherited);
            if !counts {
                continue;
            }
            if let Some(info) = self.selector_info(rule_key, index, property, status) {
                contributors.push(info);
            }
        }
        rank(&mut contributors);
        let value = self
            .computed_style
            .as_ref()
            .and_then(|style| style.get(property))
            .cloned()
            .unwrap_or_default();
        PropertyInfo::new(property, value, contributors)
    }

    fn selector_info(
        &self,
        rule_key: RuleKey,
        index: usize,
        property: &str,
        status: MatchStatus,
    ) -> Option<SelectorInfo> {
        let rule = self.rule(rule_key)?;
        let value = rule.get_property_value(property)?;
        let selector = rule.cached_selectors()?.get(index)?;
        let sheet = rule.sheet_key().and_then(|key| self.catalog.sheet(key));
        Some(SelectorInfo {
            selector: selector.text.clone(),
            property: property.to_owned(),
            value: value.to_owned(),
            important: rule.get_property_priority(property) == IMPORTANT,
            status,
            element_style: selector.element_style,
            content_rule: rule.content_rule(),
            sheet_allowed: sheet.is_none_or(|owner| owner.sheet_allowed),
            specificity: selector.specificity().unwrap_or_default(),
            sheet_index: sheet.map_or(0, |owner| owner.index),
            rule_line: rule.line(),
            source: rule.source().to_owned(),
            href: rule.href().to_owned(),
            base_status: status,
            rule: rule_key,
        })
    }

    /// A matched rule by key.
    pub fn rule(&self, key: RuleKey) -> Option<&MatchedRule> {
        match key {
            RuleKey::Sheet(slot) => self.catalog.rule(slot),
            RuleKey::Inline(slot) => self.inline_rules.get(slot),
        }
    }

    fn rule_mut(&mut self, key: RuleKey) -> Option<&mut MatchedRule> {
        match key {
            RuleKey::Sheet(slot) => self.catalog.rule_mut(slot),
            RuleKey::Inline(slot) => self.inline_rules.get_mut(slot),
        }
    }
}

/// Inline style is always allowed; sheet rules follow their sheet.
fn rule_sheet_allowed(catalog: &StyleSheetCatalog, key: RuleKey) -> bool {
    match key {
        RuleKey::Inline(_) => true,
        RuleKey::Sheet(slot) => catalog
            .rule(slot)
            .and_then(|rule| rule.sheet_key())
            .and_then(|sheet| catalog.sheet(sheet))
            .is_none_or(|sheet| sheet.sheet_allowed),
    }
}

//! An in-memory host implementing every collaborator trait.
//!
//! Documents, elements and already-parsed stylesheets live in arenas addressed
//! by the opaque handles of [`crate::host`]. Selector matching and specificity
//! come from `css_selectors`, media evaluation from `css_media_queries`.

mod dom;
mod sheets;

pub use dom::NodeKind;
pub use sheets::StyleSheetBuilder;

use crate::declarations::DeclarationBlock;
use crate::host::{
    Binding, ComputedStyleProvider, DocumentId, ElementId, ElementNaming, InheritancePredicate,
    PseudoBinding, RuleId, RuleInfo, RuleKind, SelectorMatcher, SheetId, SheetInfo,
    StyleSheetSource,
};
use crate::inherited::is_inherited_property;
use anyhow::{Result, anyhow};
use css_media_queries::{Viewport, media_matches};
use css_selectors::ElementAdapter as _;
use css_selectors::{
    ComplexSelector, PseudoElement, Specificity, matches_complex, parse_complex_selector,
    specificity_of_complex, split_selector_list,
};
use dom::{DomAdapter, NodeData};
use sheets::{RuleData, RuleSpec, SheetData};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
struct DocumentData {
    location: String,
    sheets: Vec<SheetId>,
    alive: bool,
}

/// Cascade rank of a declaration inside the host's own computed-style pass:
/// importance, content origin, inline style, specificity, order.
type DeclarationRank = (bool, bool, bool, Specificity, usize);

/// Arena-backed documents, elements and stylesheets.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    viewport: Viewport,
    documents: Vec<DocumentData>,
    nodes: Vec<NodeData>,
    sheets: Vec<SheetData>,
    rules: Vec<RuleData>,
    /// Browser sheets applying to every document, outside `document.styleSheets`.
    user_agent_sheets: Vec<SheetId>,
}

fn slot(handle: u64) -> usize {
    usize::try_from(handle).unwrap_or(usize::MAX)
}

fn handle(index: usize) -> u64 {
    u64::try_from(index).unwrap_or(u64::MAX)
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host evaluating media queries against `viewport`.
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[inline]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub const fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn create_document(&mut self, location: &str) -> DocumentId {
        self.documents.push(DocumentData {
            location: location.to_owned(),
            sheets: Vec::new(),
            alive: true,
        });
        DocumentId(handle(self.documents.len() - 1))
    }

    /// Close a document; its sheets can no longer be enumerated.
    pub fn remove_document(&mut self, document: DocumentId) {
        if let Some(doc) = self.documents.get_mut(slot(document.0)) {
            doc.alive = false;
        }
    }

    /// Append an element to `parent`, or create a root element.
    pub fn create_element(
        &mut self,
        document: DocumentId,
        parent: Option<ElementId>,
        tag: &str,
    ) -> ElementId {
        self.push_node(NodeData::new(document, NodeKind::Element, tag, parent))
    }

    /// Attach a generated `::before`/`::after` node to `parent`.
    pub fn create_generated(&mut self, parent: ElementId, pseudo: PseudoElement) -> ElementId {
        let document = self
            .node(parent)
            .map_or(DocumentId(u64::MAX), |node| node.document);
        let tag = match pseudo {
            PseudoElement::Before => "_moz_generated_content_before",
            PseudoElement::After => "_moz_generated_content_after",
        };
        let id = ElementId(handle(self.nodes.len()));
        self.nodes.push(NodeData::new(
            document,
            NodeKind::Generated(pseudo),
            tag,
            Some(parent),
        ));
        id
    }

    fn push_node(&mut self, node: NodeData) -> ElementId {
        let id = ElementId(handle(self.nodes.len()));
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.push(id);
            } else {
                log::warn!("parent {} is unknown, creating a root element", parent.0);
            }
        }
        self.nodes.push(node);
        id
    }

    pub fn set_id(&mut self, element: ElementId, id: &str) {
        if let Some(node) = self.node_mut(element) {
            node.id = Some(id.to_owned());
        }
    }

    pub fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.node_mut(element) {
            node.classes.push(class.to_owned());
        }
    }

    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            node.attributes.push((name.to_ascii_lowercase(), value.to_owned()));
        }
    }

    /// Set the `style` attribute text.
    pub fn set_inline_style(&mut self, element: ElementId, style: &str) {
        if let Some(node) = self.node_mut(element) {
            node.inline_style = style.to_owned();
        }
    }

    /// Detach an element and its subtree; later accesses fail.
    pub fn remove_element(&mut self, element: ElementId) {
        let parent = self.node(element).and_then(|node| node.parent);
        if let Some(parent_node) = parent.and_then(|id| self.node_mut(id)) {
            parent_node.children.retain(|child| *child != element);
        }
        let mut pending = vec![element];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.node_mut(current) {
                node.alive = false;
                pending.extend(node.children.iter().copied());
            }
        }
        for node in &mut self.nodes {
            if node.parent.is_some_and(|parent_id| parent_id == element) {
                node.alive = false;
            }
        }
    }

    /// Append a sheet to the document's `styleSheets`.
    pub fn add_style_sheet(&mut self, document: DocumentId, builder: StyleSheetBuilder) -> SheetId {
        let sheet = self.build_sheet(Some(document), builder);
        if let Some(doc) = self.documents.get_mut(slot(document.0)) {
            doc.sheets.push(sheet);
        }
        sheet
    }

    /// Create a sheet reachable only through `@import`.
    pub fn create_style_sheet(&mut self, builder: StyleSheetBuilder) -> SheetId {
        self.build_sheet(None, builder)
    }

    /// Register a browser sheet consulted for every document.
    pub fn add_user_agent_sheet(&mut self, builder: StyleSheetBuilder) -> SheetId {
        let sheet = self.build_sheet(None, builder.user_agent());
        self.user_agent_sheets.push(sheet);
        sheet
    }

    /// Kill a sheet; handles to it become dead objects.
    pub fn remove_style_sheet(&mut self, sheet: SheetId) {
        if let Some(data) = self.sheets.get_mut(slot(sheet.0)) {
            data.alive = false;
        }
        for doc in &mut self.documents {
            doc.sheets.retain(|existing| *existing != sheet);
        }
        self.user_agent_sheets.retain(|existing| *existing != sheet);
    }

    pub fn set_sheet_disabled(&mut self, sheet: SheetId, disabled: bool) {
        if let Some(data) = self.sheets.get_mut(slot(sheet.0)) {
            data.disabled = disabled;
        }
    }

    fn build_sheet(&mut self, owner: Option<DocumentId>, builder: StyleSheetBuilder) -> SheetId {
        let sheet = SheetId(handle(self.sheets.len()));
        self.sheets.push(SheetData {
            href: builder.href,
            owner_document: owner,
            disabled: builder.disabled,
            media_text: builder.media_text,
            user_agent: builder.user_agent,
            rules: Vec::new(),
            alive: true,
        });
        let rules = self.build_rules(sheet, None, builder.rules);
        if let Some(data) = self.sheets.get_mut(slot(sheet.0)) {
            data.rules = rules;
        }
        sheet
    }

    fn build_rules(
        &mut self,
        sheet: SheetId,
        parent_rule: Option<RuleId>,
        specs: Vec<RuleSpec>,
    ) -> Vec<RuleId> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = RuleId(handle(self.rules.len()));
            let mut selectors = Vec::new();
            let mut nested = Vec::new();
            let kind = match spec {
                RuleSpec::Style {
                    selector_text,
                    declarations,
                    line,
                } => {
                    selectors = split_selector_list(&selector_text)
                        .iter()
                        .map(|branch| parse_complex_selector(branch))
                        .collect();
                    RuleKind::Style {
                        selector_text,
                        declarations: DeclarationBlock::parse(&declarations),
                        line,
                        column: 1,
                    }
                }
                RuleSpec::Import { media_text, sheet } => RuleKind::Import { media_text, sheet },
                RuleSpec::Media { media_text, rules } => {
                    nested = rules;
                    RuleKind::Media {
                        media_text,
                        rules: Vec::new(),
                    }
                }
                RuleSpec::Keyframes { name } => RuleKind::Keyframes { name },
                RuleSpec::Other => RuleKind::Other,
            };
            let is_media = matches!(kind, RuleKind::Media { .. });
            self.rules.push(RuleData {
                info: RuleInfo {
                    kind,
                    parent_sheet: Some(sheet),
                    parent_rule,
                },
                selectors,
            });
            ids.push(id);
            if is_media {
                // Children need the parent's id, so they are built after it.
                let child_ids = self.build_rules(sheet, Some(id), nested);
                if let Some(data) = self.rules.get_mut(slot(id.0))
                    && let RuleKind::Media { rules, .. } = &mut data.info.kind
                {
                    *rules = child_ids;
                }
            }
        }
        ids
    }

    fn node(&self, element: ElementId) -> Option<&NodeData> {
        self.nodes.get(slot(element.0)).filter(|node| node.alive)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut NodeData> {
        self.nodes.get_mut(slot(element.0)).filter(|node| node.alive)
    }

    fn live_node(&self, element: ElementId) -> Result<&NodeData> {
        self.node(element)
            .ok_or_else(|| anyhow!("element {} is a dead object", element.0))
    }

    fn live_sheet(&self, sheet: SheetId) -> Result<&SheetData> {
        self.sheets
            .get(slot(sheet.0))
            .filter(|data| data.alive)
            .ok_or_else(|| anyhow!("stylesheet {} is a dead object", sheet.0))
    }

    fn live_rule(&self, rule: RuleId) -> Result<&RuleData> {
        let data = self
            .rules
            .get(slot(rule.0))
            .ok_or_else(|| anyhow!("rule {} does not exist", rule.0))?;
        if let Some(sheet) = data.info.parent_sheet {
            self.live_sheet(sheet)?;
        }
        Ok(data)
    }

    fn adapter(&self) -> DomAdapter<'_> {
        DomAdapter { nodes: &self.nodes }
    }

    /// Style rules reachable from `sheet` that apply under the current viewport.
    fn collect_style_rules(&self, sheet: SheetId, visited: &mut HashSet<SheetId>, out: &mut Vec<RuleId>) {
        let Ok(data) = self.live_sheet(sheet) else {
            return;
        };
        if data.disabled
            || !media_matches(&data.media_text, &self.viewport)
            || !visited.insert(sheet)
        {
            return;
        }
        self.collect_from_list(&data.rules, visited, out);
    }

    fn collect_from_list(&self, rules: &[RuleId], visited: &mut HashSet<SheetId>, out: &mut Vec<RuleId>) {
        for rule in rules {
            let Ok(data) = self.live_rule(*rule) else {
                continue;
            };
            match &data.info.kind {
                RuleKind::Style { .. } => out.push(*rule),
                RuleKind::Import {
                    media_text,
                    sheet: Some(imported),
                } if media_matches(media_text, &self.viewport) => {
                    self.collect_style_rules(*imported, visited, out);
                }
                RuleKind::Media { media_text, rules } if media_matches(media_text, &self.viewport) => {
                    self.collect_from_list(rules, visited, out);
                }
                _ => {}
            }
        }
    }

    /// Most specific selector of `rule` matching the element, if any does.
    fn matching_specificity(
        &self,
        element: ElementId,
        rule: RuleId,
        pseudo: Option<PseudoElement>,
    ) -> Option<Specificity> {
        let data = self.live_rule(rule).ok()?;
        let adapter = self.adapter();
        data.selectors
            .iter()
            .filter(|selector| matches_complex(&adapter, element, selector, pseudo))
            .map(specificity_of_complex)
            .max()
    }

    /// The host's own minimal cascade for one element or pseudo-element.
    fn cascade(&self, element: ElementId, pseudo: Option<PseudoElement>) -> Result<HashMap<String, String>> {
        let node = self.live_node(element)?;
        let inherit_from = if pseudo.is_some() {
            Some(element)
        } else {
            node.parent
        };
        let mut style: HashMap<String, String> = match inherit_from {
            Some(parent) => self
                .cascade(parent, None)?
                .into_iter()
                .filter(|(property, _)| is_inherited_property(property))
                .collect(),
            None => HashMap::new(),
        };

        let mut winners: HashMap<String, (DeclarationRank, String)> = HashMap::new();
        let mut consider = |property: &str, value: &str, rank: DeclarationRank| {
            let replace = winners
                .get(property)
                .is_none_or(|(current, _)| rank >= *current);
            if replace {
                winners.insert(property.to_owned(), (rank, value.to_owned()));
            }
        };

        let rules = self.style_rules_for_node(element, pseudo)?.unwrap_or_default();
        for (order, rule) in rules.iter().enumerate() {
            let Ok(data) = self.live_rule(*rule) else {
                continue;
            };
            let RuleKind::Style { declarations, .. } = &data.info.kind else {
                continue;
            };
            let content = data
                .info
                .parent_sheet
                .and_then(|sheet| self.live_sheet(sheet).ok())
                .is_some_and(|sheet| !sheet.user_agent);
            let specificity = self
                .matching_specificity(element, *rule, pseudo)
                .unwrap_or_default();
            for decl in declarations.iter() {
                consider(
                    &decl.property,
                    &decl.value,
                    (decl.important, content, false, specificity, order),
                );
            }
        }
        if pseudo.is_none() {
            for decl in DeclarationBlock::parse(&node.inline_style).iter() {
                consider(
                    &decl.property,
                    &decl.value,
                    (decl.important, true, true, Specificity::STYLE_ATTRIBUTE, usize::MAX),
                );
            }
        }
        style.extend(
            winners
                .into_iter()
                .map(|(property, (_, value))| (property, value)),
        );
        Ok(style)
    }
}

impl StyleSheetSource for MemoryHost {
    fn style_sheets(&self, document: DocumentId) -> Result<Vec<SheetId>> {
        self.documents
            .get(slot(document.0))
            .filter(|doc| doc.alive)
            .map(|doc| doc.sheets.clone())
            .ok_or_else(|| anyhow!("document {} is a dead object", document.0))
    }

    fn sheet_info(&self, sheet: SheetId) -> Result<SheetInfo> {
        let data = self.live_sheet(sheet)?;
        let owner_location = data
            .owner_document
            .and_then(|document| self.documents.get(slot(document.0)))
            .map(|doc| doc.location.clone());
        Ok(SheetInfo {
            href: data.href.clone(),
            owner_location,
            disabled: data.disabled,
            media_text: data.media_text.clone(),
            user_agent: data.user_agent,
        })
    }

    fn sheet_rules(&self, sheet: SheetId) -> Result<Vec<RuleId>> {
        Ok(self.live_sheet(sheet)?.rules.clone())
    }

    fn rule_info(&self, rule: RuleId) -> Result<RuleInfo> {
        Ok(self.live_rule(rule)?.info.clone())
    }

    fn media_matches(&self, _document: DocumentId, media_text: &str) -> bool {
        media_matches(media_text, &self.viewport)
    }

    fn owner_document(&self, element: ElementId) -> Result<DocumentId> {
        Ok(self.live_node(element)?.document)
    }

    fn parent_element(&self, element: ElementId) -> Option<ElementId> {
        self.node(element)
            .and_then(|node| node.parent)
            .filter(|parent| self.node(*parent).is_some())
    }

    fn inline_style(&self, element: ElementId) -> Result<DeclarationBlock> {
        let node = self.live_node(element)?;
        Ok(match node.kind {
            NodeKind::Element => DeclarationBlock::parse(&node.inline_style),
            NodeKind::Generated(_) => DeclarationBlock::default(),
        })
    }
}

impl SelectorMatcher for MemoryHost {
    fn style_rules_for_node(
        &self,
        element: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> Result<Option<Vec<RuleId>>> {
        let node = self.live_node(element)?;
        if let NodeKind::Generated(_) = node.kind {
            return Ok(None);
        }
        let mut candidates = Vec::new();
        let mut visited = HashSet::new();
        let document_sheets = self
            .documents
            .get(slot(node.document.0))
            .map(|doc| doc.sheets.clone())
            .unwrap_or_default();
        for sheet in self.user_agent_sheets.iter().chain(document_sheets.iter()) {
            self.collect_style_rules(*sheet, &mut visited, &mut candidates);
        }
        let mut matched: Vec<(Specificity, RuleId)> = candidates
            .into_iter()
            .filter_map(|rule| {
                self.matching_specificity(element, rule, pseudo)
                    .map(|specificity| (specificity, rule))
            })
            .collect();
        // Stable: equal specificity keeps document order.
        matched.sort_by_key(|(specificity, _)| *specificity);
        Ok(Some(matched.into_iter().map(|(_, rule)| rule).collect()))
    }

    fn selector_matches_element(
        &self,
        element: ElementId,
        rule: RuleId,
        selector_index: usize,
        pseudo: Option<PseudoElement>,
    ) -> Result<bool> {
        self.live_node(element)?;
        let selector: &ComplexSelector = self
            .live_rule(rule)?
            .selectors
            .get(selector_index)
            .ok_or_else(|| anyhow!("rule {} has no selector {selector_index}", rule.0))?;
        Ok(matches_complex(&self.adapter(), element, selector, pseudo))
    }

    fn specificity(&self, rule: RuleId, selector_index: usize) -> Result<Specificity> {
        self.live_rule(rule)?
            .selectors
            .get(selector_index)
            .map(specificity_of_complex)
            .ok_or_else(|| anyhow!("rule {} has no selector {selector_index}", rule.0))
    }
}

impl ComputedStyleProvider for MemoryHost {
    fn computed_style(
        &self,
        element: ElementId,
        pseudo: Option<PseudoElement>,
    ) -> Result<HashMap<String, String>> {
        self.cascade(element, pseudo)
    }
}

impl InheritancePredicate for MemoryHost {
    fn is_inherited_property(&self, name: &str) -> bool {
        is_inherited_property(name)
    }
}

impl PseudoBinding for MemoryHost {
    fn binding_element_and_pseudo(&self, node: ElementId) -> Binding {
        match self.nodes.get(slot(node.0)) {
            Some(NodeData {
                kind: NodeKind::Generated(pseudo),
                parent: Some(parent),
                ..
            }) => Binding {
                element: *parent,
                pseudo: Some(*pseudo),
            },
            _ => Binding {
                element: node,
                pseudo: None,
            },
        }
    }
}

impl ElementNaming for MemoryHost {
    fn id_attribute(&self, element: ElementId) -> Option<String> {
        self.node(element).and_then(|node| node.id.clone())
    }

    fn tag_name(&self, element: ElementId) -> String {
        self.node(element)
            .map(|node| node.tag.to_ascii_uppercase())
            .unwrap_or_default()
    }

    fn previous_element_sibling(&self, element: ElementId) -> Option<ElementId> {
        self.adapter().previous_sibling_element(element)
    }

    fn is_body_or_head(&self, element: ElementId) -> bool {
        self.node(element)
            .is_some_and(|node| node.tag == "body" || node.tag == "head")
    }
}

//! Element arena of the in-memory host and its selector-matching adapter.

use crate::host::{DocumentId, ElementId};
use css_selectors::{ElementAdapter, PseudoElement};

/// What a node in the arena is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    /// Generated content owned by the parent element.
    Generated(PseudoElement),
}

#[derive(Clone, Debug)]
pub(super) struct NodeData {
    pub document: DocumentId,
    pub kind: NodeKind,
    /// ASCII lowercase.
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub parent: Option<ElementId>,
    /// Element children only; generated nodes are not siblings.
    pub children: Vec<ElementId>,
    pub inline_style: String,
    pub alive: bool,
}

impl NodeData {
    pub(super) fn new(document: DocumentId, kind: NodeKind, tag: &str, parent: Option<ElementId>) -> Self {
        Self {
            document,
            kind,
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
            inline_style: String::new(),
            alive: true,
        }
    }
}

/// Read-only view of the arena for `css_selectors`.
pub(super) struct DomAdapter<'host> {
    pub nodes: &'host [NodeData],
}

impl DomAdapter<'_> {
    fn node(&self, element: ElementId) -> Option<&NodeData> {
        usize::try_from(element.0)
            .ok()
            .and_then(|index| self.nodes.get(index))
            .filter(|node| node.alive)
    }

    fn sibling(&self, element: ElementId, offset: isize) -> Option<ElementId> {
        let parent = self.node(element)?.parent?;
        let siblings = &self.node(parent)?.children;
        let position = siblings.iter().position(|child| *child == element)?;
        position
            .checked_add_signed(offset)
            .and_then(|index| siblings.get(index))
            .copied()
    }
}

impl ElementAdapter for DomAdapter<'_> {
    type Handle = ElementId;

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).and_then(|node| node.parent)
    }

    fn previous_sibling_element(&self, element: ElementId) -> Option<ElementId> {
        self.sibling(element, -1)
    }

    fn next_sibling_element(&self, element: ElementId) -> Option<ElementId> {
        self.sibling(element, 1)
    }

    fn tag_name(&self, element: ElementId) -> &str {
        self.node(element).map_or("", |node| node.tag.as_str())
    }

    fn element_id(&self, element: ElementId) -> Option<&str> {
        self.node(element).and_then(|node| node.id.as_deref())
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element)
            .is_some_and(|node| node.classes.iter().any(|name| name == class))
    }

    fn attr(&self, element: ElementId, name: &str) -> Option<&str> {
        let node = self.node(element)?;
        match name {
            "id" => node.id.as_deref(),
            _ => node
                .attributes
                .iter()
                .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
        }
    }
}

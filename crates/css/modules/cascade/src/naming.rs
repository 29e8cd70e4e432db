//! Short human-readable names for elements, as shown in breadcrumbs.

use crate::host::{ElementId, ElementNaming, StyleSheetSource};

/// One step of a breadcrumb path.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ShortName {
    pub display: String,
    pub element: ElementId,
}

/// `#id` when the element has an id, else `tag[n]` where `n` counts prior element siblings.
pub fn short_name<H: ElementNaming + ?Sized>(host: &H, element: ElementId) -> String {
    if let Some(id) = host.id_attribute(element).filter(|id| !id.is_empty()) {
        return format!("#{id}");
    }
    let mut prior_siblings = 0_usize;
    let mut current = host.previous_element_sibling(element);
    while let Some(sibling) = current {
        prior_siblings += 1;
        current = host.previous_element_sibling(sibling);
    }
    format!("{}[{prior_siblings}]", host.tag_name(element))
}

/// Short names from the outermost shown ancestor down to `element`.
///
/// Stops below `<body>`/`<head>` and the document, but always includes
/// `element` itself.
pub fn short_name_path<H>(host: &H, element: ElementId) -> Vec<ShortName>
where
    H: ElementNaming + StyleSheetSource + ?Sized,
{
    let mut reply = Vec::new();
    let mut current = Some(element);
    while let Some(node) = current {
        reply.push(ShortName {
            display: short_name(host, node),
            element: node,
        });
        current = host
            .parent_element(node)
            .filter(|parent| !host.is_body_or_head(*parent));
    }
    reply.reverse();
    reply
}

#![cfg(test)]
#![allow(clippy::missing_panics_doc, reason = "Assertions in tests are expected")]
#![allow(clippy::expect_used, reason = "Tests fail loudly on missing results")]
#![allow(clippy::indexing_slicing, reason = "Tests index known JSON shapes")]

use css_cascade::memory::{MemoryHost, StyleSheetBuilder};
use css_cascade::{
    CascadeResolver, InspectorConfig, MatchStatus, PseudoBinding as _, PseudoElement,
    SourceFilter, Viewport, short_name, short_name_path,
};

const LOCATION: &str = "http://example.com/index.html";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn generated_content_resolves_through_its_owner() {
    init_logging();
    let mut host = MemoryHost::new();
    let doc = host.create_document(LOCATION);
    let para = host.create_element(doc, None, "p");
    let before = host.create_generated(para, PseudoElement::Before);
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .style_rule("p::before", "content: none; padding: 2px", 1)
            .style_rule("p", "color: red; padding: 8px", 2)
            .style_rule("p::after", "padding: 5px", 3),
    );

    let binding = host.binding_element_and_pseudo(before);
    assert_eq!(binding.element, para);
    assert_eq!(binding.pseudo, Some(PseudoElement::Before));

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(before));

    let padding = resolver.get_property_info("padding").expect("property info");
    assert_eq!(padding.value, "2px");
    let selectors: Vec<&str> = padding
        .matched_selectors
        .iter()
        .map(|sel| sel.selector.as_str())
        .collect();
    assert_eq!(selectors, vec!["p::before"]);
    assert_eq!(padding.matched_selectors[0].status, MatchStatus::Best);

    let color = resolver.get_property_info("color").expect("property info");
    assert_eq!(color.value, "red");
    assert_eq!(color.matched_selectors.len(), 1);
    assert_eq!(color.matched_selectors[0].selector, "p");
    assert_eq!(color.matched_selectors[0].status, MatchStatus::Best);
}

#[test]
fn removed_elements_yield_empty_answers() {
    init_logging();
    let mut host = MemoryHost::new();
    let doc = host.create_document(LOCATION);
    let para = host.create_element(doc, None, "p");
    host.add_style_sheet(doc, StyleSheetBuilder::new().style_rule("p", "color: red", 1));
    host.remove_element(para);

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    assert!(resolver.computed_style().is_none());
    assert!(resolver.matched_rules().is_empty());
    let info = resolver.get_property_info("color").expect("property info");
    assert!(info.value.is_empty());
    assert!(info.matched_selectors.is_empty());
}

#[test]
fn short_names_count_prior_siblings() {
    init_logging();
    let mut host = MemoryHost::new();
    let doc = host.create_document(LOCATION);
    let html = host.create_element(doc, None, "html");
    let body = host.create_element(doc, Some(html), "body");
    let div = host.create_element(doc, Some(body), "div");
    host.set_id(div, "a");
    let first = host.create_element(doc, Some(div), "p");
    let second = host.create_element(doc, Some(div), "p");

    assert_eq!(short_name(&host, div), "#a");
    assert_eq!(short_name(&host, first), "P[0]");
    assert_eq!(short_name(&host, second), "P[1]");
    assert_eq!(short_name(&host, html), "HTML[0]");

    let path: Vec<String> = short_name_path(&host, second)
        .into_iter()
        .map(|step| step.display)
        .collect();
    assert_eq!(path, vec!["#a".to_owned(), "P[1]".to_owned()]);

    let root_path = short_name_path(&host, html);
    assert_eq!(root_path.len(), 1);
    assert_eq!(root_path[0].element, html);
}

#[test]
fn property_info_serializes_for_the_front_end() {
    init_logging();
    let mut host = MemoryHost::new();
    let doc = host.create_document(LOCATION);
    let para = host.create_element(doc, None, "p");
    host.set_inline_style(para, "color: red");
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/site.css")
            .style_rule("p", "color: green", 3),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    let info = resolver.get_property_info("color").expect("property info");
    let json = serde_json::to_value(info).expect("serializable");

    assert_eq!(json["property"], "color");
    assert_eq!(json["value"], "red");
    assert_eq!(json["matchedRuleCount"], 2);
    assert!(json.get("needRefilter").is_none());

    let best = &json["matchedSelectors"][0];
    assert_eq!(best["selector"], "@element.style");
    assert_eq!(best["status"], "BEST");
    assert_eq!(best["elementStyle"], true);
    assert_eq!(best["ruleLine"], -1);
    assert_eq!(best["href"], "#");
    assert!(best.get("rule").is_none());
    assert!(best.get("baseStatus").is_none());

    let sheet_rule = &json["matchedSelectors"][1];
    assert_eq!(sheet_rule["status"], "MATCHED");
    assert_eq!(sheet_rule["source"], "site.css:3");
    assert_eq!(sheet_rule["sheetIndex"], 0);
}

#[test]
fn config_seeds_the_source_filter() {
    init_logging();
    let defaults = InspectorConfig::default();
    assert_eq!(defaults.source_filter, SourceFilter::User);
    assert_eq!(defaults.viewport, Viewport::default());

    let viewport = Viewport {
        width_px: 320.0,
        height_px: 640.0,
    };
    let config = InspectorConfig::new("UA".parse().unwrap_or_default(), viewport);
    let host = MemoryHost::with_viewport(config.viewport);
    let resolver = CascadeResolver::with_config(host, &config);
    assert_eq!(resolver.source_filter(), &SourceFilter::Ua);
    assert_eq!(resolver.host().viewport(), viewport);
}

#[test]
fn narrow_viewport_from_config_gates_media_rules() {
    init_logging();
    let config = InspectorConfig::new(
        SourceFilter::User,
        Viewport {
            width_px: 320.0,
            height_px: 640.0,
        },
    );
    let mut host = MemoryHost::with_viewport(config.viewport);
    let doc = host.create_document(LOCATION);
    let para = host.create_element(doc, None, "p");
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .style_rule("p", "font-size: 16px", 1)
            .media_rule(
                "(max-width: 480px)",
                StyleSheetBuilder::new().style_rule("p", "font-size: 12px", 3),
            )
            .media_rule(
                "(orientation: landscape)",
                StyleSheetBuilder::new().style_rule("p", "font-size: 20px", 6),
            ),
    );

    let mut resolver = CascadeResolver::with_config(host, &config);
    resolver.highlight(Some(para));
    let info = resolver.get_property_info("font-size").expect("property info");
    assert_eq!(info.value, "12px");
    let lines: Vec<i64> = info.matched_selectors.iter().map(|sel| sel.rule_line).collect();
    assert_eq!(lines, vec![3, 1]);
}

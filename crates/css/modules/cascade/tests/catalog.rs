#![cfg(test)]
#![allow(clippy::missing_panics_doc, reason = "Assertions in tests are expected")]
#![allow(clippy::expect_used, reason = "Tests fail loudly on missing results")]
#![allow(clippy::indexing_slicing, reason = "Tests index known-length results")]

use css_cascade::memory::{MemoryHost, StyleSheetBuilder};
use css_cascade::{
    CascadeResolver, DocumentId, ElementId, MatchStatus, SourceFilter, StyleSheetRef,
};

const LOCATION: &str = "http://example.com/index.html";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn document_with_paragraph(host: &mut MemoryHost) -> (DocumentId, ElementId) {
    let doc = host.create_document(LOCATION);
    let para = host.create_element(doc, None, "p");
    host.add_class(para, "x");
    (doc, para)
}

fn hrefs(sheets: &[StyleSheetRef]) -> Vec<&str> {
    sheets.iter().map(|sheet| sheet.href.as_str()).collect()
}

#[test]
fn imports_are_followed_unless_their_media_fails() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    let imported = host.create_style_sheet(
        StyleSheetBuilder::new()
            .href("http://example.com/b.css")
            .keyframes("fade")
            .style_rule("p", "color: teal", 4),
    );
    let gated = host.create_style_sheet(
        StyleSheetBuilder::new()
            .href("http://example.com/huge.css")
            .style_rule("p", "color: red", 1),
    );
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/a.css")
            .import("", Some(imported))
            .import("(min-width: 5000px)", Some(gated))
            .keyframes("spin")
            .style_rule(".x", "margin: 0", 9),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));

    let sheets = resolver.sheets();
    assert_eq!(
        hrefs(&sheets),
        vec!["http://example.com/a.css", "http://example.com/b.css"]
    );
    assert_eq!(sheets[0].index, 1);
    assert_eq!(sheets[1].index, 0);
    assert_eq!(sheets[1].short_source, "b.css");
    assert!(sheets.iter().all(|sheet| sheet.catalogued && sheet.content_sheet));

    let names: Vec<&str> = resolver
        .keyframes_rules()
        .iter()
        .map(|keyframes| keyframes.name.as_str())
        .collect();
    assert_eq!(names, vec!["fade", "spin"]);

    let info = resolver.get_property_info("color").expect("property info");
    assert_eq!(info.value, "teal");
    assert_eq!(info.matched_selectors.len(), 1);
    assert_eq!(info.matched_selectors[0].source, "b.css:4");
}

#[test]
fn importing_sheet_outranks_its_import() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    let imported = host.create_style_sheet(
        StyleSheetBuilder::new()
            .href("http://example.com/b.css")
            .style_rule(".x", "color: blue", 1),
    );
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/a.css")
            .import("", Some(imported))
            .style_rule(".x", "color: red", 2),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    let info = resolver.get_property_info("color").expect("property info");
    assert_eq!(info.value, "red");
    let order: Vec<(&str, &str)> = info
        .matched_selectors
        .iter()
        .map(|sel| (sel.source.as_str(), sel.value.as_str()))
        .collect();
    assert_eq!(order, vec![("a.css:2", "red"), ("b.css:1", "blue")]);
    assert_eq!(info.matched_selectors[0].status, MatchStatus::Best);
    assert!(info.matched_selectors[1].sheet_index < info.matched_selectors[0].sheet_index);
}

#[test]
fn disabled_and_media_gated_sheets_are_not_catalogued() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/off.css")
            .disabled(true)
            .style_rule("p", "color: red", 1),
    );
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/print.css")
            .media("print")
            .style_rule("p", "color: black", 1),
    );
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/on.css")
            .style_rule("p", "color: green", 1),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    let sheets = resolver.sheets();
    assert_eq!(hrefs(&sheets), vec!["http://example.com/on.css"]);
    assert_eq!(sheets[0].index, 0);
    assert_eq!(resolver.rule_count(), 1);
}

#[test]
fn dead_sheets_are_pruned_on_enumeration() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/keep.css")
            .style_rule("p", "color: green", 1),
    );
    let doomed = host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/gone.css")
            .style_rule("p", "color: red", 1),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    assert_eq!(resolver.sheets().len(), 2);

    resolver.host_mut().remove_style_sheet(doomed);
    let mut visited = Vec::new();
    resolver.for_each_sheet(|sheet| visited.push(sheet.href.clone()));
    assert_eq!(visited, vec!["http://example.com/keep.css".to_owned()]);
    assert_eq!(hrefs(&resolver.sheets()), vec!["http://example.com/keep.css"]);
}

#[test]
fn sheets_without_href_are_named_after_their_document() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    host.add_style_sheet(doc, StyleSheetBuilder::new().style_rule("p", "color: red", 1));
    host.add_style_sheet(doc, StyleSheetBuilder::new().style_rule("p", "color: blue", 1));

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    let sheets = resolver.sheets();
    assert_eq!(sheets.len(), 2);
    assert!(sheets.iter().all(|sheet| sheet.href == LOCATION));
    assert!(sheets.iter().all(|sheet| sheet.short_source == "inline"));
    assert_ne!(sheets[0].id, sheets[1].id);

    let info = resolver.get_property_info("color").expect("property info");
    assert_eq!(info.value, "blue");
    assert_eq!(info.matched_selectors[0].source, "inline:1");
}

#[test]
fn user_agent_sheets_are_listed_only_under_the_ua_filter() {
    init_logging();
    let mut host = MemoryHost::new();
    host.add_user_agent_sheet(
        StyleSheetBuilder::new()
            .href("resource://gre-resources/ua.css")
            .style_rule("p", "display: block", 1),
    );
    let (doc, para) = document_with_paragraph(&mut host);
    host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .href("http://example.com/site.css")
            .style_rule("p", "color: green", 1),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    assert_eq!(resolver.matched_rules().len(), 1);
    assert_eq!(hrefs(&resolver.sheets()), vec!["http://example.com/site.css"]);
    assert_eq!(resolver.rule_count(), 1);

    resolver.set_source_filter(SourceFilter::Ua);
    assert_eq!(resolver.matched_rules().len(), 2);
    let sheets = resolver.sheets();
    assert_eq!(sheets.len(), 2);
    let browser = sheets
        .iter()
        .find(|sheet| !sheet.content_sheet)
        .expect("user-agent sheet met while matching");
    assert!(!browser.catalogued);
    assert!(browser.sheet_allowed);
    assert_eq!(browser.index, 1);
    assert_eq!(browser.short_source, "ua.css");
    // User-agent rules never count.
    assert_eq!(resolver.rule_count(), 1);
}

#[test]
fn rule_walks_descend_into_matching_media_only() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    let sheet = host.add_style_sheet(
        doc,
        StyleSheetBuilder::new()
            .style_rule("p", "color: red", 1)
            .style_rule(".x", "color: blue", 2)
            .media_rule(
                "(min-width: 2000px)",
                StyleSheetBuilder::new().style_rule("div", "color: black", 4),
            )
            .media_rule(
                "(max-width: 5000px)",
                StyleSheetBuilder::new().style_rule("span", "color: white", 7),
            )
            .other_rule(),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    assert_eq!(resolver.rule_count(), 5);

    let mut selectors = Vec::new();
    resolver.for_each_rule(sheet, |rule| selectors.push(rule.selector_text().to_owned()));
    assert_eq!(selectors, vec!["p", ".x", "span"]);
    assert_eq!(resolver.sheets()[0].rule_count, 3);

    let mut seen = 0;
    let stopped = resolver.for_some_rules(sheet, |rule| {
        seen += 1;
        rule.selector_text() == ".x"
    });
    assert!(stopped);
    assert_eq!(seen, 2);
    assert!(!resolver.for_some_rules(sheet, |rule| rule.is_media_rule() && rule.line() == 4));

    let mut media = Vec::new();
    resolver.for_each_rule(sheet, |rule| {
        if rule.is_media_rule() {
            media.push((rule.media_text().to_owned(), rule.source().to_owned()));
        }
    });
    assert_eq!(
        media,
        vec![(
            "(max-width: 5000px)".to_owned(),
            "inline:7 @media (max-width: 5000px)".to_owned()
        )]
    );
}

#[test]
fn uncached_sheets_are_not_walked() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, _) = document_with_paragraph(&mut host);
    let sheet = host.add_style_sheet(doc, StyleSheetBuilder::new().style_rule("p", "color: red", 1));

    let mut resolver = CascadeResolver::new(host);
    let mut visited = 0;
    resolver.for_each_rule(sheet, |_| visited += 1);
    assert_eq!(visited, 0);
    assert!(resolver.sheets().is_empty());
    assert_eq!(resolver.rule_count(), 0);
}

#[test]
fn wrapped_rules_are_shared_between_walks_and_matches() {
    init_logging();
    let mut host = MemoryHost::new();
    let (doc, para) = document_with_paragraph(&mut host);
    let sheet = host.add_style_sheet(
        doc,
        StyleSheetBuilder::new().style_rule("p, .x, div", "color: red", 1),
    );

    let mut resolver = CascadeResolver::new(host);
    resolver.highlight(Some(para));
    let info = resolver.get_property_info("color").expect("property info");
    let matched: Vec<&str> = info
        .matched_selectors
        .iter()
        .map(|sel| sel.selector.as_str())
        .collect();
    assert_eq!(matched, vec![".x", "p"]);
    assert_eq!(info.matched_rule_count, 1);

    let mut split = Vec::new();
    resolver.for_each_rule(sheet, |rule| {
        split.extend(
            rule.cached_selectors()
                .unwrap_or_default()
                .iter()
                .map(|selector| (selector.text.clone(), selector.specificity().is_some())),
        );
    });
    assert_eq!(
        split,
        vec![
            ("p".to_owned(), true),
            (".x".to_owned(), true),
            ("div".to_owned(), false),
        ]
    );
}

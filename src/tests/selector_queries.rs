use super::*;

const NAV_HTML: &str = r#"
    <nav id='nav' class='menu main'>
      <ul>
        <li class='item'><a href='/a' data-kind="primary link">A</a></li>
        <li class='item active'><a href='/b'>B</a></li>
        <li class='item'><span><a id='deep' href='/c'>C</a></span></li>
      </ul>
    </nav>
    <p class='item'>outside</p>
    "#;

#[test]
fn child_and_descendant_combinators_differ() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    page.assert_count("nav a", 3)?;
    page.assert_count("li > a", 2)?;
    page.assert_count("nav > ul > li", 3)?;
    page.assert_count("nav > li", 0)?;
    page.assert_text("li > span a", "C")?;
    Ok(())
}

#[test]
fn classes_ids_and_attributes_combine() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    page.assert_count(".item", 4)?;
    page.assert_count("li.item.active", 1)?;
    page.assert_count("nav.menu.main#nav", 1)?;
    page.assert_count("a[href]", 3)?;
    page.assert_text("a[href='/b']", "B")?;
    page.assert_text(r#"[data-kind="primary link"]"#, "A")?;
    page.assert_count("a[href=/missing]", 0)?;
    Ok(())
}

#[test]
fn selector_groups_keep_document_order_without_duplicates() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    let matched = page.query_all("p, #deep, li.active a, a#deep")?;
    let texts: Vec<String> = matched
        .iter()
        .map(|node| page.dom().text_content(*node))
        .collect();
    assert_eq!(texts, vec!["B", "C", "outside"]);
    Ok(())
}

#[test]
fn structural_pseudo_classes_match_element_siblings() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    page.assert_text("li:first-child", "A")?;
    page.assert_text("ul > li:last-child a", "C")?;
    page.assert_count("li:first-child:last-child", 0)?;
    Ok(())
}

#[test]
fn unsupported_and_malformed_selectors_are_rejected() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    for selector in ["li + li", "li ~ li", "", "a >", "> a", "a[href", "li:hover", "a, ,b"] {
        assert!(
            matches!(page.query_all(selector), Err(Error::UnsupportedSelector(_))),
            "{selector:?} should be rejected"
        );
    }
    Ok(())
}

#[test]
fn missing_targets_report_selector_not_found() -> Result<()> {
    let mut page = Page::from_html(NAV_HTML)?;
    match page.click("#missing") {
        Err(Error::SelectorNotFound(selector)) => assert_eq!(selector, "#missing"),
        other => panic!("expected selector not found, got: {other:?}"),
    }
    assert!(page.query_all("#missing")?.is_empty());
    assert!(page.assert_exists("#deep").is_ok());
    Ok(())
}

#[test]
fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
    let page = Page::from_html(NAV_HTML)?;
    match page.assert_text("#deep", "Z") {
        Err(Error::AssertionFailed {
            expected,
            actual,
            dom_snippet,
            ..
        }) => {
            assert_eq!(expected, "Z");
            assert_eq!(actual, "C");
            assert_eq!(dom_snippet, r#"<a href="/c" id="deep">C</a>"#);
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }
    Ok(())
}

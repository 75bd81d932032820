use super::*;

const ENTRY_HTML: &str = r#"
    <form id='entry-form'><input id='user-input'></form>
    <div id='output'></div>
    <p id='error-message' class='hidden'></p>
    "#;

#[test]
fn handle_form_submit_moves_trimmed_input_into_target() -> Result<()> {
    let mut page = Page::from_html(ENTRY_HTML)?;
    page.type_text("#user-input", "  hello  ")?;

    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    assert_eq!(child_texts(&page, "output"), vec!["hello"]);
    page.assert_value("#user-input", "")?;
    page.assert_text("#error-message", "")?;
    page.assert_class("#error-message", "hidden", true)?;
    Ok(())
}

#[test]
fn handle_form_submit_rejects_blank_input() -> Result<()> {
    let mut page = Page::from_html(ENTRY_HTML)?;
    page.type_text("#user-input", " \t\u{FEFF} ")?;

    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    page.assert_count("#output > *", 0)?;
    page.assert_text("#error-message", "Input cannot be empty")?;
    page.assert_class("#error-message", "hidden", false)?;
    page.assert_value("#user-input", " \t\u{FEFF} ")?;

    page.type_text("#user-input", "ok")?;
    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    assert_eq!(child_texts(&page, "output"), vec!["ok"]);
    page.assert_text("#error-message", "")?;
    page.assert_class("#error-message", "hidden", true)?;
    Ok(())
}

#[test]
fn handle_form_submit_ignores_missing_input_or_target() -> Result<()> {
    let mut page = Page::from_html("<div id='output'></div><p id='error-message'></p>")?;
    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    page.assert_count("#output > *", 0)?;
    page.assert_text("#error-message", "")?;

    let mut page = Page::from_html(ENTRY_HTML)?;
    page.type_text("#user-input", "kept")?;
    glue::handle_form_submit(&mut page, "entry-form", "nowhere")?;
    page.assert_value("#user-input", "kept")?;
    page.assert_class("#error-message", "hidden", true)?;
    Ok(())
}

#[test]
fn handle_form_submit_works_without_error_element() -> Result<()> {
    let mut page = Page::from_html("<input id='user-input'><div id='output'></div>")?;
    glue::handle_form_submit(&mut page, "missing-form", "output")?;
    page.assert_count("#output > *", 0)?;

    page.type_text("#user-input", "x")?;
    glue::handle_form_submit(&mut page, "missing-form", "output")?;
    assert_eq!(child_texts(&page, "output"), vec!["x"]);
    Ok(())
}

#[test]
fn remove_element_from_dom_detaches_by_id_and_ignores_unknown_ids() -> Result<()> {
    let mut page = Page::from_html("<div id='root'><span id='gone'>x</span><b id='stay'></b></div>")?;
    let before = page.dump_dom("#root")?;

    glue::remove_element_from_dom(&mut page, "nonexistent")?;
    assert_eq!(page.dump_dom("#root")?, before);

    glue::remove_element_from_dom(&mut page, "gone")?;
    assert_eq!(page.by_id("gone"), None);
    assert_eq!(page.dump_dom("#root")?, r#"<div id="root"><b id="stay"></b></div>"#);

    glue::remove_element_from_dom(&mut page, "gone")?;
    Ok(())
}

#[test]
fn add_element_to_dom_and_simulate_click_append_the_same_markup() -> Result<()> {
    let mut page = Page::from_html("<div id='a'></div><div id='b'></div>")?;
    glue::add_element_to_dom(&mut page, "a", "Button Clicked!")?;
    glue::simulate_click(&mut page, "b", "Button Clicked!")?;

    assert_eq!(page.dump_dom("#a")?, r#"<div id="a"><div>Button Clicked!</div></div>"#);
    assert_eq!(page.dump_dom("#b")?, r#"<div id="b"><div>Button Clicked!</div></div>"#);

    glue::add_element_to_dom(&mut page, "a", "")?;
    assert_eq!(page.dump_dom("#a")?, r#"<div id="a"><div>Button Clicked!</div><div></div></div>"#);

    glue::add_element_to_dom(&mut page, "missing", "ignored")?;
    Ok(())
}

#[test]
fn submit_text_input_works_on_detached_handles() -> Result<()> {
    let mut page = Page::from_html("<div></div>")?;
    let input = glue::create_element(&mut page, "input", [Prop::Value(" typed ".into())])?;
    let target = page.dom_mut().create_detached_element("section");
    let error = glue::create_element(&mut page, "p", [Prop::ClassName("hidden".into())])?;
    let display = ErrorDisplay::new(Some(error));

    glue::submit_text_input(&mut page, input, target, display)?;
    assert_eq!(page.dom().text_content(target), "typed");
    assert_eq!(page.dom().value(input)?, "");

    glue::submit_text_input(&mut page, input, target, display)?;
    assert_eq!(display.message(&page), "Input cannot be empty");
    assert!(display.is_visible(&page));
    assert_eq!(page.dom().child_elements(target).len(), 1);
    Ok(())
}

#[test]
fn removed_handle_target_still_receives_text() -> Result<()> {
    let mut page = Page::from_html(ENTRY_HTML)?;
    let input = page.by_id("user-input").ok_or_else(|| Error::SelectorNotFound("#user-input".into()))?;
    let target = page.by_id("output").ok_or_else(|| Error::SelectorNotFound("#output".into()))?;
    glue::remove_element(&mut page, target)?;

    page.type_text("#user-input", "late")?;
    let display = ErrorDisplay::lookup(&page);
    glue::submit_text_input(&mut page, input, target, display)?;
    assert_eq!(page.dom().text_content(target), "late");
    assert_eq!(page.by_id("output"), None);
    Ok(())
}

#[test]
fn handle_form_submit_trims_only_script_whitespace() -> Result<()> {
    let mut page = Page::from_html(ENTRY_HTML)?;

    // U+0085 is not whitespace for the trim, so it is kept as content.
    page.type_text("#user-input", "\u{85}")?;
    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    assert_eq!(child_texts(&page, "output"), vec!["\u{85}"]);
    page.assert_class("#error-message", "hidden", true)?;

    page.type_text("#user-input", "\u{3000}\u{A0}x\u{2029}\u{FEFF}")?;
    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    assert_eq!(child_texts(&page, "output"), vec!["\u{85}", "x"]);

    page.type_text("#user-input", "\u{2028}\u{205F}\u{1680}")?;
    glue::handle_form_submit(&mut page, "entry-form", "output")?;
    page.assert_count("#output > div", 2)?;
    page.assert_text("#error-message", "Input cannot be empty")?;
    Ok(())
}

use page_glue::{Page, glue};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};

const GLUE_PROPTEST_REGRESSION_FILE: &str = "tests/proptest-regressions/glue_property_fuzz_test.txt";
const DEFAULT_GLUE_PROPTEST_CASES: u32 = 128;

const LIST_PAGE_HTML: &str = r#"
<form id="user-form">
  <input id="item-input" name="item">
  <button id="add">Add</button>
</form>
<ul id="item-list"></ul>
<p id="error-message" class="hidden"></p>
<input id="user-input">
<div id="dynamic-content"></div>
"#;

#[derive(Clone, Debug)]
enum ListAction {
    AddItem(String),
    DeleteItem(usize),
    SubmitEntry(String),
    Simulate,
}

fn glue_proptest_cases() -> u32 {
    std::env::var("PAGE_GLUE_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_GLUE_PROPTEST_CASES)
}

fn text_input_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('a'),
            Just('b'),
            Just('z'),
            Just('0'),
            Just('9'),
            Just(' '),
            Just('\t'),
            Just('-'),
            Just('&'),
            Just('<'),
        ],
        0..=8,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn list_action_strategy() -> BoxedStrategy<ListAction> {
    prop_oneof![
        5 => text_input_strategy().prop_map(ListAction::AddItem),
        3 => (0usize..6).prop_map(ListAction::DeleteItem),
        2 => text_input_strategy().prop_map(ListAction::SubmitEntry),
        1 => Just(ListAction::Simulate),
    ]
    .boxed()
}

fn fail(err: page_glue::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

fn loaded_page() -> Result<Page, TestCaseError> {
    let mut page = Page::from_html(LIST_PAGE_HTML).map_err(fail)?;
    glue::install(&mut page).map_err(fail)?;
    page.finish_loading().map_err(fail)?;
    Ok(page)
}

fn count(page: &Page, selector: &str) -> Result<usize, TestCaseError> {
    Ok(page.query_all(selector).map_err(fail)?.len())
}

fn assert_list_actions_keep_invariants(actions: &[ListAction]) -> TestCaseResult {
    let mut page = loaded_page()?;
    let mut expected_items = 0usize;
    let mut expected_entries = 0usize;

    for (step, action) in actions.iter().enumerate() {
        match action {
            ListAction::AddItem(text) => {
                page.type_text("#item-input", text).map_err(fail)?;
                page.click("#add").map_err(fail)?;
                if !text.is_empty() {
                    expected_items += 1;
                    prop_assert!(
                        page.assert_value("#item-input", "").is_ok(),
                        "item field not reset at step {step}: {action:?}"
                    );
                }
            }
            ListAction::DeleteItem(index) => {
                let buttons = page.query_all("#item-list > li > button").map_err(fail)?;
                if let Some(button) = buttons.get(*index) {
                    page.click_node(*button).map_err(fail)?;
                    expected_items -= 1;
                }
            }
            ListAction::SubmitEntry(text) => {
                page.type_text("#user-input", text).map_err(fail)?;
                glue::handle_form_submit(&mut page, "user-form", "dynamic-content")
                    .map_err(fail)?;
                let accepted = !text.trim().is_empty();
                if accepted {
                    expected_entries += 1;
                }
                prop_assert_eq!(
                    page.assert_class("#error-message", "hidden", accepted).is_ok(),
                    true,
                    "error visibility wrong at step {}: {:?}",
                    step,
                    action
                );
            }
            ListAction::Simulate => {
                glue::simulate_click(&mut page, "dynamic-content", "Button Clicked!")
                    .map_err(fail)?;
                expected_entries += 1;
            }
        }

        prop_assert_eq!(count(&page, "#item-list > li")?, expected_items);
        prop_assert_eq!(count(&page, "#dynamic-content > div")?, expected_entries);
        prop_assert!(page.take_default_submissions().is_empty());
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: glue_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(GLUE_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn list_glue_action_sequences_keep_counts(actions in vec(list_action_strategy(), 1..=24)) {
        assert_list_actions_keep_invariants(&actions)?;
    }

    #[test]
    fn non_empty_item_appends_exactly_one_entry(text in text_input_strategy()) {
        prop_assume!(!text.is_empty());
        let mut page = loaded_page()?;
        page.type_text("#item-input", &text).map_err(fail)?;
        page.submit("#user-form").map_err(fail)?;

        let items = page.query_all("#item-list > li").map_err(fail)?;
        prop_assert_eq!(items.len(), 1);
        prop_assert_eq!(page.dom().text_content(items[0]), format!("{text}Delete"));
        prop_assert!(page.assert_value("#item-input", "").is_ok());
    }
}

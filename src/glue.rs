//! Event glue for the list page: a form that appends list items, a
//! singleton error message, and a demo button that inserts content.
//!
//! Every operation has a handle-based core taking [`NodeId`]s, plus the
//! id-addressed entry points ([`add_element_to_dom`],
//! [`remove_element_from_dom`], [`simulate_click`], [`handle_form_submit`])
//! that resolve ids at call time and silently skip missing elements.

use super::*;

pub const USER_FORM_ID: &str = "user-form";
pub const ITEM_LIST_ID: &str = "item-list";
pub const ERROR_MESSAGE_ID: &str = "error-message";
pub const SIMULATE_BUTTON_ID: &str = "simulate-click";
pub const DYNAMIC_CONTENT_ID: &str = "dynamic-content";
pub const USER_INPUT_ID: &str = "user-input";

/// Element ids, field names and fixed strings the glue depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueConfig {
    pub form_id: String,
    pub list_id: String,
    pub error_id: String,
    pub simulate_button_id: String,
    pub dynamic_content_id: String,
    pub user_input_id: String,
    /// Form field read by the list form's submit handler.
    pub item_field: String,
    pub empty_item_message: String,
    pub empty_input_message: String,
    pub simulate_click_text: String,
    pub delete_label: String,
    /// Class carried by the error element while it is hidden.
    pub hidden_class: String,
}

impl Default for GlueConfig {
    fn default() -> Self {
        Self {
            form_id: USER_FORM_ID.into(),
            list_id: ITEM_LIST_ID.into(),
            error_id: ERROR_MESSAGE_ID.into(),
            simulate_button_id: SIMULATE_BUTTON_ID.into(),
            dynamic_content_id: DYNAMIC_CONTENT_ID.into(),
            user_input_id: USER_INPUT_ID.into(),
            item_field: "item".into(),
            empty_item_message: "Please enter an item.".into(),
            empty_input_message: "Input cannot be empty".into(),
            simulate_click_text: "Button Clicked!".into(),
            delete_label: "Delete".into(),
            hidden_class: "hidden".into(),
        }
    }
}

impl GlueConfig {
    pub fn with_form_id(mut self, id: impl Into<String>) -> Self {
        self.form_id = id.into();
        self
    }

    pub fn with_list_id(mut self, id: impl Into<String>) -> Self {
        self.list_id = id.into();
        self
    }

    pub fn with_error_id(mut self, id: impl Into<String>) -> Self {
        self.error_id = id.into();
        self
    }

    pub fn with_user_input_id(mut self, id: impl Into<String>) -> Self {
        self.user_input_id = id.into();
        self
    }

    pub fn with_item_field(mut self, name: impl Into<String>) -> Self {
        self.item_field = name.into();
        self
    }

    pub fn with_hidden_class(mut self, class_name: impl Into<String>) -> Self {
        self.hidden_class = class_name.into();
        self
    }
}

/// Elements looked up once when the glue initializes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlueHandles {
    pub form: Option<NodeId>,
    pub list: Option<NodeId>,
    pub error: Option<NodeId>,
    pub simulate_button: Option<NodeId>,
}

impl GlueHandles {
    pub fn resolve(page: &Page) -> Self {
        let config = page.config();
        Self {
            form: page.by_id(&config.form_id),
            list: page.by_id(&config.list_id),
            error: page.by_id(&config.error_id),
            simulate_button: page.by_id(&config.simulate_button_id),
        }
    }

    pub fn error_display(&self) -> ErrorDisplay {
        ErrorDisplay::new(self.error)
    }
}

/// The singleton error element. Visibility is a single flag: the element
/// is hidden exactly when it carries the configured hidden class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDisplay {
    node: Option<NodeId>,
}

impl ErrorDisplay {
    pub fn new(node: Option<NodeId>) -> Self {
        Self { node }
    }

    pub fn lookup(page: &Page) -> Self {
        Self::new(page.by_id(&page.config().error_id))
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Replaces the message text and reveals the element.
    pub fn show(&self, page: &mut Page, message: &str) -> Result<()> {
        let Some(node) = self.node else {
            return Ok(());
        };
        let hidden_class = page.config.hidden_class.clone();
        page.dom.set_text_content(node, message)?;
        page.dom.class_set(node, &hidden_class, false)?;
        page.trace_glue_line(format!("[glue] error shown message={message:?}"));
        Ok(())
    }

    /// Empties the message text and hides the element.
    pub fn clear(&self, page: &mut Page) -> Result<()> {
        let Some(node) = self.node else {
            return Ok(());
        };
        let hidden_class = page.config.hidden_class.clone();
        page.dom.set_text_content(node, "")?;
        page.dom.class_set(node, &hidden_class, true)?;
        page.trace_glue_line("[glue] error cleared".into());
        Ok(())
    }

    pub fn is_visible(&self, page: &Page) -> bool {
        self.node
            .is_some_and(|node| !page.dom.has_class(node, &page.config.hidden_class))
    }

    pub fn message(&self, page: &Page) -> String {
        self.node
            .map(|node| page.dom.text_content(node))
            .unwrap_or_default()
    }
}

/// A DOM property assigned by [`create_element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    /// Replaces the children with one text node.
    TextContent(String),
    Id(String),
    ClassName(String),
    /// The live value, leaving the `value` attribute (the reset default) alone.
    Value(String),
    Type(String),
    Name(String),
}

/// Creates a detached element and assigns `props` in order.
pub fn create_element<I>(page: &mut Page, tag: &str, props: I) -> Result<NodeId>
where
    I: IntoIterator<Item = Prop>,
{
    let node = page.dom.create_detached_element(tag);
    for prop in props {
        match prop {
            Prop::TextContent(text) => page.dom.set_text_content(node, &text)?,
            Prop::Id(id) => page.dom.set_attr(node, "id", &id)?,
            Prop::ClassName(class_name) => page.dom.set_attr(node, "class", &class_name)?,
            Prop::Value(value) => page.dom.set_value(node, &value)?,
            Prop::Type(kind) => page.dom.set_attr(node, "type", &kind)?,
            Prop::Name(name) => page.dom.set_attr(node, "name", &name)?,
        }
    }
    Ok(node)
}

/// Wires the page once its structure is ready: immediately when the page
/// already finished loading, otherwise on `DOMContentLoaded`.
pub fn install(page: &mut Page) -> Result<()> {
    if page.is_loaded() {
        initialize(page)?;
        return Ok(());
    }
    let document = page.document();
    page.add_event_listener(document, "DOMContentLoaded", |page, _event| {
        initialize(page)?;
        Ok(())
    });
    Ok(())
}

/// Looks up the form, list, error element and demo button and registers
/// their handlers. Missing elements leave the matching feature inert.
/// Runs at most once per page; later calls return the first handles.
pub fn initialize(page: &mut Page) -> Result<GlueHandles> {
    if let Some(handles) = page.glue_handles {
        return Ok(handles);
    }

    let handles = GlueHandles::resolve(page);
    page.glue_handles = Some(handles);
    page.trace_glue_line(format!(
        "[glue] initialize form={} list={} error={} simulate={}",
        handles.form.is_some(),
        handles.list.is_some(),
        handles.error.is_some(),
        handles.simulate_button.is_some()
    ));

    if let Some(form) = handles.form {
        page.add_event_listener(form, "submit", move |page, event| {
            on_item_form_submit(page, event, form, handles)
        });
    }

    if let Some(button) = handles.simulate_button {
        page.add_event_listener(button, "click", |page, _event| {
            let container_id = page.config.dynamic_content_id.clone();
            let text = page.config.simulate_click_text.clone();
            simulate_click(page, &container_id, &text)
        });
    }

    Ok(handles)
}

fn on_item_form_submit(
    page: &mut Page,
    event: &mut Event,
    form: NodeId,
    handles: GlueHandles,
) -> Result<()> {
    event.prevent_default();

    let field = page.config.item_field.clone();
    let item = page
        .dom
        .form_data_get(form, &field)?
        .filter(|value| !value.is_empty());

    let Some(item) = item else {
        let message = page.config.empty_item_message.clone();
        return handles.error_display().show(page, &message);
    };

    add_item_to_list(page, handles.list, &item)?;
    page.reset_node(form)
}

/// Builds `<li>text<button>Delete</button></li>`, appends it to `list`, and
/// returns the item. The button removes exactly this item from `list`.
/// With no list the item is built but stays detached.
pub fn add_item_to_list(page: &mut Page, list: Option<NodeId>, text: &str) -> Result<NodeId> {
    let label = page.config.delete_label.clone();
    let item = create_element(page, "li", [Prop::TextContent(text.to_string())])?;
    let delete_button = create_element(
        page,
        "button",
        [Prop::TextContent(label), Prop::Type("button".into())],
    )?;

    page.add_event_listener(delete_button, "click", move |page, _event| {
        let Some(list) = list else {
            return Ok(());
        };
        if page.dom.parent(item) != Some(list) {
            return Ok(());
        }
        page.dom.remove_child(list, item)?;
        page.remove_listeners_in(item);
        page.trace_glue_line(format!("[glue] item removed list={}", page.trace_node_label(list)));
        Ok(())
    });

    page.dom.append_child(item, delete_button)?;
    if let Some(list) = list {
        page.dom.append_child(list, item)?;
        page.trace_glue_line(format!(
            "[glue] item added list={} text={text:?}",
            page.trace_node_label(list)
        ));
    }
    Ok(item)
}

/// Shows `message` on the configured error element.
pub fn display_error(page: &mut Page, message: &str) -> Result<()> {
    ErrorDisplay::lookup(page).show(page, message)
}

/// Empties and hides the configured error element.
pub fn clear_error(page: &mut Page) -> Result<()> {
    ErrorDisplay::lookup(page).clear(page)
}

/// Appends `<div>text</div>` to `container` and returns the new child.
pub fn append_text_child(page: &mut Page, container: NodeId, text: &str) -> Result<NodeId> {
    let child = create_element(page, "div", [Prop::TextContent(text.to_string())])?;
    page.dom.append_child(container, child)?;
    page.trace_glue_line(format!(
        "[glue] text appended container={} text={text:?}",
        page.trace_node_label(container)
    ));
    Ok(child)
}

pub fn add_element_to_dom(page: &mut Page, container_id: &str, text: &str) -> Result<()> {
    if let Some(container) = page.by_id(container_id) {
        append_text_child(page, container, text)?;
    }
    Ok(())
}

/// The visible effect of the demo button. Same behavior as
/// [`add_element_to_dom`].
pub fn simulate_click(page: &mut Page, container_id: &str, text: &str) -> Result<()> {
    add_element_to_dom(page, container_id, text)
}

/// Detaches `node` from its parent; detached nodes are left alone.
pub fn remove_element(page: &mut Page, node: NodeId) -> Result<()> {
    if page.dom.parent(node).is_none() {
        return Ok(());
    }
    let label = page.trace_node_label(node);
    page.dom.remove_node(node)?;
    page.trace_glue_line(format!("[glue] element removed {label}"));
    Ok(())
}

pub fn remove_element_from_dom(page: &mut Page, element_id: &str) -> Result<()> {
    match page.by_id(element_id) {
        Some(node) => remove_element(page, node),
        None => Ok(()),
    }
}

/// Moves the trimmed value of `input` into `target` as a new `<div>`.
///
/// An empty value shows the empty-input message and leaves `target`
/// untouched. Otherwise the error is cleared, the value appended, and the
/// input emptied.
pub fn submit_text_input(
    page: &mut Page,
    input: NodeId,
    target: NodeId,
    error: ErrorDisplay,
) -> Result<()> {
    let raw = page.dom.value(input)?;
    let value = trim_input(&raw);

    if value.is_empty() {
        let message = page.config.empty_input_message.clone();
        return error.show(page, &message);
    }

    error.clear(page)?;
    append_text_child(page, target, value)?;
    page.dom.set_value(input, "")
}

pub fn handle_form_submit(page: &mut Page, form_id: &str, target_id: &str) -> Result<()> {
    let form = page.by_id(form_id);
    let input = page.by_id(&page.config.user_input_id);
    let target = page.by_id(target_id);
    let error = ErrorDisplay::lookup(page);
    page.trace_glue_line(format!(
        "[glue] handle_form_submit form={} input={} target={}",
        form.is_some(),
        input.is_some(),
        target.is_some()
    ));

    let (Some(input), Some(target)) = (input, target) else {
        return Ok(());
    };
    submit_text_input(page, input, target, error)
}

fn trim_input(value: &str) -> &str {
    value.trim_matches(is_trimmed_space)
}

// WhiteSpace and LineTerminator code points. Unlike `char::is_whitespace`,
// U+FEFF is included and U+0085 is not.
fn is_trimmed_space(ch: char) -> bool {
    matches!(
        ch,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

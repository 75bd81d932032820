use super::*;
use crate::form::{is_checkbox, is_radio, is_reset_control, is_submit_control, is_text_entry_control};
use crate::runtime_state::Handler;
use std::rc::Rc;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;
const MAX_DISPATCH_DEPTH: usize = 128;

/// A loaded document plus the listeners attached to it.
#[derive(Debug)]
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) config: GlueConfig,
    pub(crate) trace_state: TraceState,
    pub(crate) glue_handles: Option<GlueHandles>,
    loaded: bool,
    dispatch_depth: usize,
    default_submissions: Vec<NodeId>,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, GlueConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: GlueConfig) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self::from_dom(dom, config))
    }

    pub fn from_dom(dom: Dom, config: GlueConfig) -> Self {
        Self {
            dom,
            listeners: ListenerStore::default(),
            config,
            trace_state: TraceState::default(),
            glue_handles: None,
            loaded: false,
            dispatch_depth: 0,
            default_submissions: Vec::new(),
        }
    }

    pub fn config(&self) -> &GlueConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GlueConfig) {
        self.config = config;
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn document(&self) -> NodeId {
        self.dom.root()
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn add_event_listener<F>(&mut self, node: NodeId, event: &str, handler: F)
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.add_listener(node, event, false, Rc::new(handler));
    }

    pub fn add_capture_listener<F>(&mut self, node: NodeId, event: &str, handler: F)
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.add_listener(node, event, true, Rc::new(handler));
    }

    fn add_listener(&mut self, node: NodeId, event: &str, capture: bool, handler: Handler) {
        self.trace_event_line(format!(
            "[event] listen {} on={} capture={}",
            event,
            self.trace_node_label(node),
            capture
        ));
        self.listeners
            .add(node, event.to_string(), Listener { capture, handler });
    }

    /// Handles captured when the glue initialized, `None` before that.
    pub fn glue_handles(&self) -> Option<GlueHandles> {
        self.glue_handles
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners.count(node, event)
    }

    /// Drops every listener registered on `root` or its descendants.
    pub fn remove_listeners_in(&mut self, root: NodeId) {
        self.listeners.remove_node(root);
        let mut descendants = Vec::new();
        self.dom.collect_elements_dfs(root, &mut descendants);
        for node in descendants {
            self.listeners.remove_node(node);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fires `DOMContentLoaded` on the document. Only the first call
    /// dispatches; later calls return immediately.
    pub fn finish_loading(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;
        let event = Event::new_lifecycle("DOMContentLoaded", self.dom.root());
        self.dispatch(event)?;
        Ok(())
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        if !is_text_entry_control(&self.dom, target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: self.dom.tag_name(target).unwrap_or("non-element").into(),
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Sets checkedness of a checkbox or radio and fires `input` and
    /// `change` when it changed.
    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        if !is_checkbox(&self.dom, target) && !is_radio(&self.dom, target) {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=checkbox] or input[type=radio]".into(),
                actual: self.dom.tag_name(target).unwrap_or("non-element").into(),
            });
        }
        if self.dom.disabled(target) || self.dom.checked(target) == checked {
            return Ok(());
        }
        self.dom.set_checked(target, checked)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        Ok(())
    }

    /// Selects the option whose value is `value` and fires `input` and
    /// `change`.
    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.has_tag(target, "select") {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: self.dom.tag_name(target).unwrap_or("non-element").into(),
            });
        }
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dom.set_value(target, value)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")?;
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.click_node(target)
    }

    /// Dispatches `click` and then runs the activation behavior of submit
    /// and reset controls unless a listener prevented it.
    ///
    /// Checkboxes and radios flip before listeners run and are restored
    /// when the click is prevented.
    pub fn click_node(&mut self, target: NodeId) -> Result<()> {
        if self.dom.disabled(target) {
            return Ok(());
        }

        let checkable = is_checkbox(&self.dom, target) || is_radio(&self.dom, target);
        let restore = if checkable {
            let mut previous = vec![(target, self.dom.checked(target))];
            if is_radio(&self.dom, target) {
                for peer in self.dom.radio_group(target) {
                    previous.push((peer, self.dom.checked(peer)));
                }
            }
            let next = !self.dom.checked(target) || is_radio(&self.dom, target);
            self.dom.set_checked(target, next)?;
            previous
        } else {
            Vec::new()
        };

        let click_outcome = self.dispatch_event(target, "click")?;
        if click_outcome.default_prevented {
            for (node, checked) in restore {
                if let Some(element) = self.dom.element_mut(node) {
                    element.checked = checked;
                }
            }
            return Ok(());
        }

        if checkable {
            let changed = restore
                .iter()
                .any(|(node, checked)| self.dom.checked(*node) != *checked);
            if changed {
                self.dispatch_event(target, "input")?;
                self.dispatch_event(target, "change")?;
            }
            return Ok(());
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.form_owner(target) {
                self.submit_node(form)?;
            }
        } else if is_reset_control(&self.dom, target) {
            if let Some(form) = self.form_owner(target) {
                self.reset_node(form)?;
            }
        }

        Ok(())
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let Some(form) = self.form_owner(target) else {
            return Ok(());
        };
        self.submit_node(form)
    }

    /// Dispatches `submit` on `form`. A submission nobody prevented is
    /// recorded instead of navigating.
    pub fn submit_node(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_event(form, "submit")?;
        if !outcome.default_prevented {
            self.trace_event_line(format!(
                "[event] default submit form={}",
                self.trace_node_label(form)
            ));
            self.default_submissions.push(form);
        }
        Ok(())
    }

    /// Forms whose submission ran to the default action, oldest first.
    pub fn take_default_submissions(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.default_submissions)
    }

    /// Dispatches `reset` on `form` and restores control defaults unless
    /// a listener prevented it. Non-forms are ignored.
    pub fn reset_node(&mut self, form: NodeId) -> Result<()> {
        if !self.dom.has_tag(form, "form") {
            return Ok(());
        }
        let outcome = self.dispatch_event(form, "reset")?;
        if outcome.default_prevented {
            return Ok(());
        }
        self.dom.reset_form_controls(form)
    }

    pub fn dispatch_selector(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<Event> {
        self.dispatch(Event::new(event_type, target))
    }

    fn dispatch(&mut self, event: Event) -> Result<Event> {
        if self.dispatch_depth >= MAX_DISPATCH_DEPTH {
            return Err(Error::Dispatch(format!(
                "event dispatch nested deeper than {MAX_DISPATCH_DEPTH} for {}",
                event.event_type
            )));
        }
        self.dispatch_depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.dispatch_with_path(event)
        });
        self.dispatch_depth -= 1;
        result
    }

    fn dispatch_with_path(&mut self, mut event: Event) -> Result<Event> {
        let target = event.target;
        let mut path = Vec::new();
        let mut cursor = self.dom.parent(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        // Capture phase.
        event.phase = EventPhase::Capturing;
        for node in &path {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        // Target phase: capture listeners first.
        event.phase = EventPhase::AtTarget;
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if !event.propagation_stopped {
            self.invoke_listeners(target, &mut event, false)?;
        }
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        // Bubble phase.
        if event.bubbles {
            event.phase = EventPhase::Bubbling;
            for node in path.iter().rev() {
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
                if event.propagation_stopped {
                    self.trace_event_done(&event, "propagation_stopped");
                    return Ok(event);
                }
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut Event, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace_state.enabled && self.trace_state.events {
                let phase = if capture { "capture" } else { "bubble" };
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type,
                    self.trace_node_label(event.target),
                    self.trace_node_label(event.current_target),
                    phase,
                    event.default_prevented
                ));
            }
            (listener.handler)(self, event)?;
            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(self.assertion_failed(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(self.assertion_failed(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.has_class(target, class_name);
        if actual != expected {
            let describe = |present: bool| {
                if present {
                    format!("class {class_name}")
                } else {
                    format!("no class {class_name}")
                }
            };
            return Err(self.assertion_failed(selector, target, &describe(expected), describe(actual)));
        }
        Ok(())
    }

    pub fn assert_count(&self, selector: &str, expected: usize) -> Result<()> {
        let actual = self.dom.query_selector_all(selector)?.len();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: truncate_chars(&self.dom.dump_node(self.dom.root()), 200),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn assertion_failed(&self, selector: &str, target: NodeId, expected: &str, actual: String) -> Error {
        Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: truncate_chars(&self.dom.dump_node(target), 200),
        }
    }

    fn form_owner(&self, node_id: NodeId) -> Option<NodeId> {
        if self.dom.has_tag(node_id, "form") {
            Some(node_id)
        } else {
            self.dom.find_ancestor_by_tag(node_id, "form")
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace_state.enabled = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_state.events = enabled;
    }

    pub fn set_trace_glue(&mut self, enabled: bool) {
        self.trace_state.glue = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_state.log_limit = max_entries;
        while self.trace_state.logs.len() > max_entries {
            self.trace_state.logs.pop_front();
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_state.logs.drain(..).collect()
    }

    fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        if !(self.trace_state.enabled && self.trace_state.events) {
            return;
        }
        let line = format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type,
            self.trace_node_label(event.target),
            outcome,
            event.default_prevented
        );
        self.trace_state.push(line);
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace_state.events {
            self.trace_state.push(line);
        }
    }

    pub(crate) fn trace_glue_line(&mut self, line: String) {
        if self.trace_state.glue {
            self.trace_state.push(line);
        }
    }

    pub(crate) fn trace_node_label(&self, node: NodeId) -> String {
        if node == self.dom.root() {
            return "document".into();
        }
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        self.dom
            .tag_name(node)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("node-{}", node.0))
    }
}

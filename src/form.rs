use super::*;

pub(crate) fn is_form_control(dom: &Dom, node_id: NodeId) -> bool {
    dom.has_tag(node_id, "input")
        || dom.has_tag(node_id, "select")
        || dom.has_tag(node_id, "textarea")
        || dom.has_tag(node_id, "button")
}

fn input_type(dom: &Dom, node_id: NodeId) -> String {
    dom.attr(node_id, "type")
        .map(|kind| kind.to_ascii_lowercase())
        .unwrap_or_else(|| "text".into())
}

pub(crate) fn is_checkable_element(element: &crate::dom::Element) -> bool {
    element.tag_name == "input"
        && element
            .attrs
            .get("type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio"))
}

pub(crate) fn is_checkbox(dom: &Dom, node_id: NodeId) -> bool {
    dom.has_tag(node_id, "input") && input_type(dom, node_id) == "checkbox"
}

pub(crate) fn is_radio(dom: &Dom, node_id: NodeId) -> bool {
    dom.has_tag(node_id, "input") && input_type(dom, node_id) == "radio"
}

pub(crate) fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    if dom.has_tag(node_id, "button") {
        return dom
            .attr(node_id, "type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(true);
    }

    if dom.has_tag(node_id, "input") {
        return matches!(input_type(dom, node_id).as_str(), "submit" | "image");
    }

    false
}

pub(crate) fn is_reset_control(dom: &Dom, node_id: NodeId) -> bool {
    if dom.has_tag(node_id, "button") || dom.has_tag(node_id, "input") {
        return dom
            .attr(node_id, "type")
            .map(|kind| kind.eq_ignore_ascii_case("reset"))
            .unwrap_or(false);
    }
    false
}

/// Inputs and textareas whose value the user can type into.
pub(crate) fn is_text_entry_control(dom: &Dom, node_id: NodeId) -> bool {
    if dom.has_tag(node_id, "textarea") {
        return true;
    }
    if !dom.has_tag(node_id, "input") {
        return false;
    }
    !matches!(
        input_type(dom, node_id).as_str(),
        "button" | "submit" | "reset" | "image" | "checkbox" | "radio" | "file" | "hidden"
    )
}

impl Dom {
    pub(crate) fn form_elements(&self, form: NodeId) -> Result<Vec<NodeId>> {
        if !self.has_tag(form, "form") {
            return Err(Error::Dom("elements target is not a form".into()));
        }

        let mut out = Vec::new();
        self.collect_form_controls(form, &mut out);
        Ok(out)
    }

    fn collect_form_controls(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if is_form_control(self, *child) {
                out.push(*child);
            }
            self.collect_form_controls(*child, out);
        }
    }

    /// Named values a submission of `form` would carry, in document order.
    ///
    /// Unchecked checkboxes and radios are left out, and a select
    /// contributes one entry per selected option.
    pub fn form_data_entries(&self, form: NodeId) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for control in self.form_elements(form)? {
            if self.disabled(control) || self.has_tag(control, "button") {
                continue;
            }
            let name = self.attr(control, "name").unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            if self.has_tag(control, "select") {
                for option in self.selected_options(control) {
                    out.push((name.clone(), self.option_value(option)));
                }
                continue;
            }
            if self.has_tag(control, "input")
                && matches!(
                    input_type(self, control).as_str(),
                    "button" | "submit" | "reset" | "image" | "file"
                )
            {
                continue;
            }
            if (is_checkbox(self, control) || is_radio(self, control)) && !self.checked(control) {
                continue;
            }
            out.push((name, self.value(control)?));
        }
        Ok(out)
    }

    /// First value submitted under `name`, `None` when no control carries it.
    pub fn form_data_get(&self, form: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self
            .form_data_entries(form)?
            .into_iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| value))
    }

    /// Restores every control of `form` to its markup default.
    pub(crate) fn reset_form_controls(&mut self, form: NodeId) -> Result<()> {
        for control in self.form_elements(form)? {
            if self.has_tag(control, "select") {
                for option in self.select_options(control) {
                    let default_selected = self.attr(option, "selected").is_some();
                    if let Some(element) = self.element_mut(option) {
                        element.selected = default_selected;
                    }
                }
                continue;
            }
            if is_checkbox(self, control) || is_radio(self, control) {
                let default_checked = self.attr(control, "checked").is_some();
                if let Some(element) = self.element_mut(control) {
                    element.checked = default_checked;
                }
                continue;
            }
            let default_value = if self.has_tag(control, "textarea") {
                self.text_content(control)
            } else {
                self.attr(control, "value").unwrap_or_default()
            };
            self.set_value(control, &default_value)?;
        }
        Ok(())
    }

    pub fn checked(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|element| element.checked)
    }

    /// Sets checkedness. Checking a radio unchecks the other radios with the
    /// same name in the same form.
    pub fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<()> {
        if !is_checkbox(self, node_id) && !is_radio(self, node_id) {
            return Err(Error::Dom("checked target is not a checkbox or radio".into()));
        }
        if checked && is_radio(self, node_id) {
            for peer in self.radio_group(node_id) {
                if let Some(element) = self.element_mut(peer) {
                    element.checked = false;
                }
            }
        }
        if let Some(element) = self.element_mut(node_id) {
            element.checked = checked;
        }
        Ok(())
    }

    /// Radios sharing `radio`'s name and form owner, `radio` excluded.
    pub(crate) fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let name = self.attr(radio, "name").unwrap_or_default();
        if name.is_empty() {
            return Vec::new();
        }
        let form = self.find_ancestor_by_tag(radio, "form");
        self.all_element_nodes()
            .into_iter()
            .filter(|node| {
                *node != radio
                    && is_radio(self, *node)
                    && self.attr(*node, "name").as_deref() == Some(name.as_str())
                    && self.find_ancestor_by_tag(*node, "form") == form
            })
            .collect()
    }

    pub(crate) fn select_options(&self, select: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_elements_dfs(select, &mut nodes);
        nodes
            .into_iter()
            .filter(|node| self.has_tag(*node, "option"))
            .collect()
    }

    /// Options a select submits. Without `multiple` that is the last option
    /// flagged selected, or else the first option.
    pub(crate) fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options = self.select_options(select);
        let flagged = options
            .iter()
            .copied()
            .filter(|option| self.element(*option).is_some_and(|element| element.selected))
            .collect::<Vec<_>>();
        if self.attr(select, "multiple").is_some() {
            return flagged;
        }
        flagged
            .last()
            .or_else(|| options.first())
            .copied()
            .into_iter()
            .collect()
    }

    /// The `value` attribute, or the option's text with whitespace collapsed.
    pub(crate) fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value").unwrap_or_else(|| {
            self.text_content(option)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    pub(crate) fn set_select_value(&mut self, select: NodeId, value: &str) -> Result<()> {
        let options = self.select_options(select);
        let chosen = options
            .iter()
            .copied()
            .find(|option| self.option_value(*option) == value)
            .ok_or_else(|| Error::Dom(format!("select has no option with value {value:?}")))?;
        for option in options {
            if let Some(element) = self.element_mut(option) {
                element.selected = option == chosen;
            }
        }
        Ok(())
    }
}

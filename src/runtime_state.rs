use super::*;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

pub(crate) type Handler = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default();

        // Same closure, same phase: registered once.
        if listeners.iter().any(|existing| {
            existing.capture == listener.capture && Rc::ptr_eq(&existing.handler, &listener.handler)
        }) {
            return;
        }

        listeners.push(listener);
    }

    /// Snapshot of the listeners for one phase, so handlers may register
    /// more listeners while being invoked.
    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn remove_node(&mut self, node_id: NodeId) {
        self.map.remove(&node_id);
    }

    /// Nodes that currently hold at least one listener.
    pub(crate) fn node_count(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

/// State of one event while it travels capture → target → bubble.
#[derive(Debug, Clone)]
pub struct Event {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) phase: EventPhase,
    pub(crate) default_prevented: bool,
    pub(crate) bubbles: bool,
    pub(crate) cancelable: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            phase: EventPhase::AtTarget,
            default_prevented: false,
            bubbles: true,
            cancelable: true,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub(crate) fn new_lifecycle(event_type: &str, target: NodeId) -> Self {
        let mut event = Self::new(event_type, target);
        event.bubbles = false;
        event.cancelable = false;
        event
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) glue: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            glue: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
        }
    }
}

impl TraceState {
    pub(crate) fn push(&mut self, line: String) {
        if !self.enabled {
            return;
        }
        log::debug!(target: "page_glue::trace", "{line}");
        while self.logs.len() >= self.log_limit {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}

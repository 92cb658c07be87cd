use std::collections::HashMap;

use tracing::warn;

use crate::{
    surface::{ChatSurface, DragSurface},
    widget::ChatWidget,
};

/// Explicitly owned id -> widget map for hosts embedding several widgets.
/// Held by the application, not a process-wide singleton.
pub struct WidgetRegistry<S: ChatSurface + DragSurface> {
    widgets: HashMap<String, ChatWidget<S>>,
}

impl<S: ChatSurface + DragSurface> Default for WidgetRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ChatSurface + DragSurface> WidgetRegistry<S> {
    pub fn new() -> Self {
        Self {
            widgets: HashMap::new(),
        }
    }

    /// Registers a widget under an id. A duplicate id keeps the existing
    /// instance and drops the new one, with a warning.
    pub fn register(&mut self, id: impl Into<String>, widget: ChatWidget<S>) -> &mut ChatWidget<S> {
        let id = id.into();
        if self.widgets.contains_key(&id) {
            warn!("widget instance '{id}' already exists; keeping the existing one");
        }
        self.widgets.entry(id).or_insert(widget)
    }

    pub fn get(&self, id: &str) -> Option<&ChatWidget<S>> {
        self.widgets.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatWidget<S>> {
        self.widgets.get_mut(id)
    }

    /// Removes and drops the widget. Returns false for an unknown id.
    pub fn destroy(&mut self, id: &str) -> bool {
        self.widgets.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.widgets.keys().map(String::as_str)
    }
}

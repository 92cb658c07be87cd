use shared::domain::{Message, Position};

/// Rendering collaborator for the conversation panel. The engine never
/// touches a DOM; hosts implement this against whatever they render with,
/// and tests implement it with a recording fake.
pub trait ChatSurface: Send + Sync {
    fn render_message(&self, message: &Message);
    fn clear_messages(&self);
    /// Transient "typing" placeholder for the outstanding request. Never part
    /// of the persisted log.
    fn show_pending(&self);
    fn hide_pending(&self);
    fn set_send_enabled(&self, enabled: bool);
    fn focus_input(&self);
    fn scroll_to_bottom(&self);
    fn set_panel_visible(&self, visible: bool);
    fn set_header(&self, title: &str, subtitle: &str);
    /// Yes/no prompt guarding history clears.
    fn confirm_clear(&self) -> bool;
}

/// Collaborator for the draggable launcher element.
pub trait DragSurface: Send + Sync {
    fn apply_position(&self, position: Position);
    /// Scale/elevate affordance while a gesture is past the drag threshold.
    fn set_drag_affordance(&self, active: bool);
}

/// No-op surface for headless embedding and smoke tests. Clears are refused
/// unless `confirm_clears` is set, mirroring a dismissed prompt.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub confirm_clears: bool,
}

impl ChatSurface for HeadlessSurface {
    fn render_message(&self, _message: &Message) {}
    fn clear_messages(&self) {}
    fn show_pending(&self) {}
    fn hide_pending(&self) {}
    fn set_send_enabled(&self, _enabled: bool) {}
    fn focus_input(&self) {}
    fn scroll_to_bottom(&self) {}
    fn set_panel_visible(&self, _visible: bool) {}
    fn set_header(&self, _title: &str, _subtitle: &str) {}
    fn confirm_clear(&self) -> bool {
        self.confirm_clears
    }
}

impl DragSurface for HeadlessSurface {
    fn apply_position(&self, _position: Position) {}
    fn set_drag_affordance(&self, _active: bool) {}
}

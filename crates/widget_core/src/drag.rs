use std::sync::Arc;

use tracing::warn;

use shared::domain::{Position, Rect, SessionKey, Viewport};
use storage::ChatStore;

use crate::surface::DragSurface;

/// Minimum pointer displacement (either axis) before a gesture counts as a
/// drag rather than a click.
pub const DRAG_THRESHOLD: f64 = 5.0;
/// The element stays fully inside the viewport with this margin while moving.
pub const CLAMP_MARGIN: f64 = 10.0;
/// Released edges closer than this to a viewport edge get snapped flush.
pub const SNAP_DISTANCE: f64 = 30.0;
/// Snapped edges sit at this offset from the viewport edge.
pub const SNAP_MARGIN: f64 = 18.0;
/// Snapping is skipped when it would move the element less than this.
pub const SNAP_EPSILON: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Raw pointer source. Mouse and single-finger touch normalize to the same
/// coordinate pair; only the first touch point is read.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { x: f64, y: f64 },
    Touch { points: Vec<PointerPoint> },
}

impl PointerInput {
    pub fn point(&self) -> Option<PointerPoint> {
        match self {
            Self::Mouse { x, y } => Some(PointerPoint::new(*x, *y)),
            Self::Touch { points } => points.first().copied(),
        }
    }
}

/// Per-gesture state. Lives from pointer-down to pointer-up, then discarded.
#[derive(Debug, Clone, Copy)]
enum DragPhase {
    Idle,
    Dragging {
        start_pointer: PointerPoint,
        start_left: f64,
        start_top: f64,
        moved: bool,
    },
}

/// Pointer-driven reposition state machine for the launcher:
/// Idle -> Dragging(not moved) -> Dragging(moved) -> Idle.
///
/// Completed drags persist the element position through the store; releases
/// near a viewport edge snap flush to [`SNAP_MARGIN`] and persist again.
pub struct DragController<S: DragSurface> {
    surface: Arc<S>,
    store: ChatStore,
    session: SessionKey,
    viewport: Viewport,
    element: Rect,
    /// Still bottom-right anchored: no absolute position committed yet, so
    /// the origin is recomputed from the viewport when a gesture starts.
    anchored: bool,
    phase: DragPhase,
    click_suppressed: bool,
}

impl<S: DragSurface> DragController<S> {
    /// Restores any persisted position for the session; otherwise the element
    /// starts anchored to the bottom-right corner at the snap margin.
    pub async fn new(
        store: ChatStore,
        session: SessionKey,
        surface: Arc<S>,
        viewport: Viewport,
        element_width: f64,
        element_height: f64,
    ) -> Self {
        let restored = match store.read_position(&session).await {
            Ok(position) => position,
            Err(err) => {
                warn!("failed to restore position for {session}: {err}");
                None
            }
        };

        let (anchored, origin) = match restored {
            Some(position) => {
                surface.apply_position(position);
                (false, position)
            }
            None => (
                true,
                anchored_origin(viewport, element_width, element_height),
            ),
        };

        Self {
            surface,
            store,
            session,
            viewport,
            element: Rect::new(origin.x, origin.y, element_width, element_height),
            anchored,
            phase: DragPhase::Idle,
            click_suppressed: false,
        }
    }

    pub fn position(&self) -> Position {
        self.element.origin()
    }

    /// Whether the last completed gesture was a moved drag. Hosts consult
    /// this to drop the synthetic click that follows pointer-up.
    pub fn click_suppressed(&self) -> bool {
        self.click_suppressed
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.anchored {
            let origin = anchored_origin(viewport, self.element.width, self.element.height);
            self.element.left = origin.x;
            self.element.top = origin.y;
        }
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) {
        let Some(pointer) = input.point() else {
            return;
        };

        if self.anchored {
            // Commit to absolute coordinates so movement becomes a pure
            // delta from here on.
            let origin = anchored_origin(self.viewport, self.element.width, self.element.height);
            self.element.left = origin.x;
            self.element.top = origin.y;
            self.anchored = false;
            self.surface.apply_position(self.element.origin());
        }

        self.click_suppressed = false;
        self.phase = DragPhase::Dragging {
            start_pointer: pointer,
            start_left: self.element.left,
            start_top: self.element.top,
            moved: false,
        };
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) {
        let Some(pointer) = input.point() else {
            return;
        };
        let DragPhase::Dragging {
            start_pointer,
            start_left,
            start_top,
            moved,
        } = &mut self.phase
        else {
            return;
        };

        let dx = pointer.x - start_pointer.x;
        let dy = pointer.y - start_pointer.y;

        if !*moved && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
            *moved = true;
            self.surface.set_drag_affordance(true);
        }

        if *moved {
            let max_left = self.viewport.width - self.element.width;
            let max_top = self.viewport.height - self.element.height;
            self.element.left = (*start_left + dx)
                .min(max_left - CLAMP_MARGIN)
                .max(CLAMP_MARGIN);
            self.element.top = (*start_top + dy)
                .min(max_top - CLAMP_MARGIN)
                .max(CLAMP_MARGIN);
            self.surface.apply_position(self.element.origin());
        }
    }

    /// Ends the gesture. Returns true when the gesture was a moved drag, in
    /// which case the click that follows must be suppressed. A release below
    /// the threshold is a click-through and writes nothing.
    pub async fn on_pointer_up(&mut self) -> bool {
        let DragPhase::Dragging { moved, .. } = self.phase else {
            return false;
        };
        self.phase = DragPhase::Idle;

        if !moved {
            return false;
        }

        self.surface.set_drag_affordance(false);
        self.persist_position(self.element.origin()).await;

        if let Some(snapped) = self.snap_target() {
            self.element.left = snapped.x;
            self.element.top = snapped.y;
            self.surface.apply_position(snapped);
            self.persist_position(snapped).await;
        }

        self.click_suppressed = true;
        true
    }

    fn snap_target(&self) -> Option<Position> {
        let rect = self.element;
        let mut left = rect.left;
        let mut top = rect.top;

        if rect.left < SNAP_DISTANCE {
            left = SNAP_MARGIN;
        }
        if rect.top < SNAP_DISTANCE {
            top = SNAP_MARGIN;
        }
        if rect.right() > self.viewport.width - SNAP_DISTANCE {
            left = self.viewport.width - rect.width - SNAP_MARGIN;
        }
        if rect.bottom() > self.viewport.height - SNAP_DISTANCE {
            top = self.viewport.height - rect.height - SNAP_MARGIN;
        }

        if (left - rect.left).abs() > SNAP_EPSILON || (top - rect.top).abs() > SNAP_EPSILON {
            Some(Position::new(left, top))
        } else {
            None
        }
    }

    async fn persist_position(&self, position: Position) {
        if let Err(err) = self.store.write_position(&self.session, position).await {
            warn!("failed to persist position for {}: {err}", self.session);
        }
    }
}

fn anchored_origin(viewport: Viewport, width: f64, height: f64) -> Position {
    Position::new(
        viewport.width - width - SNAP_MARGIN,
        viewport.height - height - SNAP_MARGIN,
    )
}

#[cfg(test)]
#[path = "tests/drag_tests.rs"]
mod tests;

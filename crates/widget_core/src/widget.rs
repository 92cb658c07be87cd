use std::sync::Arc;

use shared::{
    config::{ConfigUpdate, WidgetConfig},
    domain::{Message, Position, Viewport},
};
use storage::ChatStore;

use crate::{
    conversation::{ConversationController, SendOutcome},
    drag::{DragController, PointerInput},
    surface::{ChatSurface, DragSurface},
};

/// One widget instance: conversation controller plus, when the configuration
/// allows dragging, the launcher drag controller. This is the operation
/// surface exposed to the embedding application.
pub struct ChatWidget<S: ChatSurface + DragSurface> {
    conversation: ConversationController<S>,
    drag: Option<DragController<S>>,
}

impl<S: ChatSurface + DragSurface> ChatWidget<S> {
    pub async fn new(
        config: WidgetConfig,
        store: ChatStore,
        surface: Arc<S>,
        viewport: Viewport,
        launcher_width: f64,
        launcher_height: f64,
    ) -> Self {
        let session = config.session_key();
        let draggable = config.draggable;

        let conversation =
            ConversationController::new(config, store.clone(), surface.clone()).await;
        let drag = if draggable {
            Some(
                DragController::new(
                    store,
                    session,
                    surface,
                    viewport,
                    launcher_width,
                    launcher_height,
                )
                .await,
            )
        } else {
            None
        };

        Self { conversation, drag }
    }

    pub fn conversation(&self) -> &ConversationController<S> {
        &self.conversation
    }

    pub async fn config(&self) -> WidgetConfig {
        self.conversation.config().await
    }

    pub async fn open(&self) {
        self.conversation.open().await;
    }

    pub async fn close(&self) {
        self.conversation.close().await;
    }

    /// Launcher click entry point: ignored while the preceding drag consumed
    /// the gesture, otherwise flips the panel.
    pub async fn toggle(&self) {
        if self
            .drag
            .as_ref()
            .is_some_and(DragController::click_suppressed)
        {
            return;
        }
        self.conversation.toggle().await;
    }

    pub async fn clear(&self) -> bool {
        self.conversation.clear().await
    }

    pub async fn send(&self, text: &str) -> SendOutcome {
        self.conversation.send(text).await
    }

    pub async fn history(&self) -> Vec<Message> {
        self.conversation.history().await
    }

    pub async fn update_config(&self, update: ConfigUpdate) {
        self.conversation.update_config(update).await;
    }

    pub fn position(&self) -> Option<Position> {
        self.drag.as_ref().map(DragController::position)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(drag) = &mut self.drag {
            drag.set_viewport(viewport);
        }
    }

    pub fn pointer_down(&mut self, input: &PointerInput) {
        if let Some(drag) = &mut self.drag {
            drag.on_pointer_down(input);
        }
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        if let Some(drag) = &mut self.drag {
            drag.on_pointer_move(input);
        }
    }

    /// Returns true when the gesture was a moved drag and the synthetic
    /// click that follows should be dropped.
    pub async fn pointer_up(&mut self) -> bool {
        match &mut self.drag {
            Some(drag) => drag.on_pointer_up().await,
            None => false,
        }
    }
}

pub mod conversation;
pub mod drag;
pub mod registry;
pub mod surface;
pub mod widget;

pub use conversation::{ConversationController, SendOutcome};
pub use drag::{DragController, PointerInput, PointerPoint};
pub use registry::WidgetRegistry;
pub use surface::{ChatSurface, DragSurface, HeadlessSurface};
pub use widget::ChatWidget;

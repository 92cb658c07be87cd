use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use shared::{
    config::WidgetConfig,
    domain::{Message, Position, Viewport},
};
use storage::{ChatStore, DEFAULT_NAMESPACE};
use widget_core::{ChatSurface, ChatWidget, DragSurface};

/// Headless smoke run: open the widget, send one message, print the log.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    endpoint_url: String,
    #[arg(long, default_value = "sqlite://./data/chatdock.db")]
    database_url: String,
    #[arg(long)]
    tenant_id: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long, default_value = "Hello!")]
    message: String,
}

/// Prints everything the widget would render.
struct ConsoleSurface;

impl ChatSurface for ConsoleSurface {
    fn render_message(&self, message: &Message) {
        println!("[{:?}] {}", message.sender, message.text);
    }

    fn clear_messages(&self) {
        println!("(messages cleared)");
    }

    fn show_pending(&self) {
        println!("(assistant is typing...)");
    }

    fn hide_pending(&self) {}
    fn set_send_enabled(&self, _enabled: bool) {}
    fn focus_input(&self) {}
    fn scroll_to_bottom(&self) {}

    fn set_panel_visible(&self, visible: bool) {
        println!("(panel {})", if visible { "opened" } else { "closed" });
    }

    fn set_header(&self, title: &str, subtitle: &str) {
        println!("== {title} | {subtitle} ==");
    }

    fn confirm_clear(&self) -> bool {
        false
    }
}

impl DragSurface for ConsoleSurface {
    fn apply_position(&self, position: Position) {
        println!("(launcher moved to {:.0},{:.0})", position.x, position.y);
    }

    fn set_drag_affordance(&self, _active: bool) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let store = ChatStore::new(&args.database_url, DEFAULT_NAMESPACE).await?;
    let mut config = WidgetConfig::new(args.endpoint_url);
    config.tenant_id = args.tenant_id;
    config.user_id = args.user_id;

    let widget = ChatWidget::new(
        config,
        store,
        Arc::new(ConsoleSurface),
        Viewport::new(1280.0, 800.0),
        64.0,
        64.0,
    )
    .await;

    widget.open().await;
    let outcome = widget.send(&args.message).await;
    println!("send outcome: {outcome:?}");

    println!("--- history ({} entries) ---", widget.history().await.len());
    for message in widget.history().await {
        println!("[{:?}] {}", message.sender, message.text);
    }

    Ok(())
}

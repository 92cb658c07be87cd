use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client,
};
use tokio::sync::Mutex;
use tracing::{error, warn};
use uuid::Uuid;

use shared::{
    config::{ConfigUpdate, WidgetConfig},
    domain::{Message, Sender, SessionKey},
    protocol::{reply_text, ChatRequest},
};
use storage::ChatStore;

use crate::surface::ChatSurface;

/// Seeded as the only entry of a brand-new session log.
pub const WELCOME_TEXT: &str = "Hi! I'm your assistant. How can I help you today?";
/// Replaces the log after a confirmed clear.
pub const CLEARED_TEXT: &str = "History cleared. How can I help?";
/// Shown for any transport failure or non-success status. The underlying
/// error is logged, never displayed.
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, I couldn't reach the server. Please try again in a moment.";

const CLIENT_IDENT_HEADER: &str = "x-chatdock-client";
const CLIENT_IDENT: &str = "chatdock-widget/0.1";

/// Result of one `send` invocation. Remote failures are an outcome, not an
/// error: the widget stays interactive after any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Assistant reply appended to the log.
    Delivered,
    /// Transport failure or non-success status; a system notice was appended.
    Failed,
    /// Empty or whitespace-only input; nothing happened.
    RejectedEmpty,
    /// Another send was already in flight; nothing happened.
    Busy,
}

struct ConversationState {
    config: WidgetConfig,
    history: Vec<Message>,
    open: bool,
}

/// Owns the in-memory log for one session, mirrors it durably, and renders
/// through the injected surface. Cloneable handle over shared state, so a
/// drag gesture or a second handle stays responsive while a send awaits its
/// response.
pub struct ConversationController<S: ChatSurface> {
    surface: Arc<S>,
    store: ChatStore,
    session: SessionKey,
    http: Client,
    state: Arc<Mutex<ConversationState>>,
    in_flight: Arc<AtomicBool>,
}

impl<S: ChatSurface> Clone for ConversationController<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            store: self.store.clone(),
            session: self.session.clone(),
            http: self.http.clone(),
            state: self.state.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<S: ChatSurface> ConversationController<S> {
    /// Loads the persisted log for the session, seeding a single system
    /// welcome message when it is empty, and renders the backlog.
    pub async fn new(config: WidgetConfig, store: ChatStore, surface: Arc<S>) -> Self {
        let session = config.session_key();

        let mut history = match store.read_history(&session).await {
            Ok(history) => history,
            Err(err) => {
                warn!("failed to load history for {session}: {err}");
                Vec::new()
            }
        };
        if history.is_empty() {
            history.push(Message::new(Sender::System, WELCOME_TEXT, Some(now_ms())));
            if let Err(err) = store.write_history(&session, &history).await {
                warn!("failed to persist welcome message for {session}: {err}");
            }
        }

        surface.set_header(&config.title, &config.subtitle);
        for message in &history {
            surface.render_message(message);
        }
        surface.scroll_to_bottom();

        Self {
            surface,
            store,
            session,
            http: Client::new(),
            state: Arc::new(Mutex::new(ConversationState {
                config,
                history,
                open: false,
            })),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub async fn config(&self) -> WidgetConfig {
        self.state.lock().await.config.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.open
    }

    /// Shows the panel. Idempotent: reopening only refocuses and rescrolls.
    pub async fn open(&self) {
        let mut state = self.state.lock().await;
        if !state.open {
            state.open = true;
            self.surface.set_panel_visible(true);
        }
        self.surface.focus_input();
        self.surface.scroll_to_bottom();
    }

    /// Hides the panel. Idempotent.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.open {
            state.open = false;
            self.surface.set_panel_visible(false);
        }
    }

    pub async fn toggle(&self) {
        if self.is_open().await {
            self.close().await;
        } else {
            self.open().await;
        }
    }

    /// Wipes the log after surface confirmation, leaving a single system
    /// message. Returns false (log untouched) when the prompt is dismissed.
    pub async fn clear(&self) -> bool {
        if !self.surface.confirm_clear() {
            return false;
        }

        let mut state = self.state.lock().await;
        if let Err(err) = self.store.clear_history(&self.session).await {
            warn!("failed to clear history for {}: {err}", self.session);
        }
        state.history.clear();
        self.surface.clear_messages();

        let notice = Message::new(Sender::System, CLEARED_TEXT, Some(now_ms()));
        state.history.push(notice.clone());
        self.surface.render_message(&notice);
        self.persist(&state.history).await;
        true
    }

    /// Defensive copy of the current log; mutating it cannot affect the
    /// controller.
    pub async fn history(&self) -> Vec<Message> {
        self.state.lock().await.history.clone()
    }

    /// Merges a partial configuration. Title/subtitle changes reach the
    /// header immediately; everything else applies on the next send.
    pub async fn update_config(&self, update: ConfigUpdate) {
        let mut state = self.state.lock().await;
        if state.config.apply(update) {
            self.surface
                .set_header(&state.config.title, &state.config.subtitle);
        }
    }

    /// Runs the send pipeline for one user input. At most one invocation is
    /// in flight per controller; concurrent calls observe [`SendOutcome::Busy`].
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::RejectedEmpty;
        }

        // Mutual exclusion independent of any rendered control, so the
        // invariant holds in headless mode too.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("send rejected for {}: request already in flight", self.session);
            return SendOutcome::Busy;
        }

        self.surface.set_send_enabled(false);
        let outcome = self.dispatch(text).await;

        // Finalization runs exactly once per invocation that took the guard.
        self.surface.set_send_enabled(true);
        self.surface.focus_input();
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn dispatch(&self, text: &str) -> SendOutcome {
        let (endpoint, headers, payload) = {
            let mut state = self.state.lock().await;

            let user_message = Message::new(Sender::User, text, Some(now_ms()));
            state.history.push(user_message.clone());
            self.surface.render_message(&user_message);
            self.surface.scroll_to_bottom();
            self.persist(&state.history).await;

            let cfg = &state.config;
            let payload = ChatRequest {
                session_id: self.session.as_str().to_string(),
                chat_input: text.to_string(),
                user_id: cfg.user_id.clone(),
                tenant_id: cfg.tenant_id.clone(),
                ruc: cfg.ruc.clone(),
                razon_social: cfg.razon_social.clone(),
                message_id: Uuid::new_v4().to_string(),
                timestamp: now_ms(),
            };
            (
                cfg.endpoint_url.clone(),
                request_headers(&cfg.extra_headers),
                payload,
            )
        };

        self.surface.show_pending();

        // Sole suspension point of the pipeline: the state lock is released,
        // so drag and open/close stay responsive while we wait.
        let response = self
            .http
            .post(&endpoint)
            .headers(headers)
            .json(&payload)
            .send()
            .await;

        let reply = match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(raw) => Some(reply_text(&raw)),
                Err(err) => {
                    error!("failed to read response body from {endpoint}: {err}");
                    None
                }
            },
            Ok(response) => {
                error!(
                    "chat endpoint {endpoint} returned status {}",
                    response.status()
                );
                None
            }
            Err(err) => {
                error!("chat request to {endpoint} failed: {err}");
                None
            }
        };

        self.surface.hide_pending();

        let mut state = self.state.lock().await;
        let (message, outcome) = match reply {
            Some(reply) => (
                Message::new(Sender::Assistant, reply, Some(now_ms())),
                SendOutcome::Delivered,
            ),
            None => (
                Message::new(Sender::System, SEND_FAILURE_TEXT, Some(now_ms())),
                SendOutcome::Failed,
            ),
        };
        state.history.push(message.clone());
        self.surface.render_message(&message);
        self.surface.scroll_to_bottom();
        self.persist(&state.history).await;
        outcome
    }

    async fn persist(&self, history: &[Message]) {
        if let Err(err) = self.store.write_history(&self.session, history).await {
            warn!("failed to persist history for {}: {err}", self.session);
        }
    }
}

/// Fixed headers first, caller extras on top: callers may override the fixed
/// pair. Unparseable names or values are skipped, not fatal.
fn request_headers(extra: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(CLIENT_IDENT_HEADER),
        HeaderValue::from_static(CLIENT_IDENT),
    );

    for (name, value) in extra {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("skipping invalid extra header '{name}'"),
        }
    }
    headers
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
#[path = "tests/conversation_tests.rs"]
mod tests;

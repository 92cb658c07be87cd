use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::SessionKey;

/// Caller-facing widget configuration. Everything beyond the endpoint is
/// optional; identity fields ride along in the outbound payload untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub endpoint_url: String,
    pub title: String,
    pub subtitle: String,
    /// Explicit session identifier. When absent the key is derived from the
    /// tenant/user identity fields.
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    /// Merged on top of the fixed request headers; callers may override them.
    pub extra_headers: HashMap<String, String>,
    pub draggable: bool,
}

impl WidgetConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    /// Partition key for the store: the explicit session id when set,
    /// otherwise `tenant:user`, `user`, or `anon`.
    pub fn session_key(&self) -> SessionKey {
        if let Some(sid) = &self.session_id {
            if !sid.is_empty() {
                return SessionKey::new(sid.clone());
            }
        }
        let user = self.user_id.as_deref().unwrap_or("anon");
        match self.tenant_id.as_deref() {
            Some(tenant) if !tenant.is_empty() => SessionKey::new(format!("{tenant}:{user}")),
            _ => SessionKey::new(user),
        }
    }

    /// Applies a partial update in place. Returns true when the displayed
    /// header (title or subtitle) changed.
    pub fn apply(&mut self, update: ConfigUpdate) -> bool {
        let mut header_changed = false;
        if let Some(endpoint_url) = update.endpoint_url {
            self.endpoint_url = endpoint_url;
        }
        if let Some(title) = update.title {
            header_changed |= title != self.title;
            self.title = title;
        }
        if let Some(subtitle) = update.subtitle {
            header_changed |= subtitle != self.subtitle;
            self.subtitle = subtitle;
        }
        if let Some(session_id) = update.session_id {
            self.session_id = Some(session_id);
        }
        if let Some(user_id) = update.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(tenant_id) = update.tenant_id {
            self.tenant_id = Some(tenant_id);
        }
        if let Some(ruc) = update.ruc {
            self.ruc = Some(ruc);
        }
        if let Some(razon_social) = update.razon_social {
            self.razon_social = Some(razon_social);
        }
        if let Some(extra_headers) = update.extra_headers {
            self.extra_headers = extra_headers;
        }
        if let Some(draggable) = update.draggable {
            self.draggable = draggable;
        }
        header_changed
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            title: "Chat Assistant".into(),
            subtitle: "Online".into(),
            session_id: None,
            user_id: None,
            tenant_id: None,
            ruc: None,
            razon_social: None,
            extra_headers: HashMap::new(),
            draggable: true,
        }
    }
}

/// Partial configuration merge; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub endpoint_url: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub extra_headers: Option<HashMap<String, String>>,
    pub draggable: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_prefers_explicit_session_id() {
        let mut cfg = WidgetConfig::new("http://localhost/chat");
        cfg.session_id = Some("fixed-session".into());
        cfg.tenant_id = Some("acme".into());
        cfg.user_id = Some("u1".into());
        assert_eq!(cfg.session_key().as_str(), "fixed-session");
    }

    #[test]
    fn session_key_derives_from_tenant_and_user() {
        let mut cfg = WidgetConfig::new("http://localhost/chat");
        cfg.tenant_id = Some("acme".into());
        cfg.user_id = Some("u1".into());
        assert_eq!(cfg.session_key().as_str(), "acme:u1");

        cfg.tenant_id = None;
        assert_eq!(cfg.session_key().as_str(), "u1");
    }

    #[test]
    fn session_key_falls_back_to_anon() {
        let cfg = WidgetConfig::new("http://localhost/chat");
        assert_eq!(cfg.session_key().as_str(), "anon");

        let mut tenant_only = WidgetConfig::new("http://localhost/chat");
        tenant_only.tenant_id = Some("acme".into());
        assert_eq!(tenant_only.session_key().as_str(), "acme:anon");
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut cfg = WidgetConfig::new("http://localhost/chat");
        let header_changed = cfg.apply(ConfigUpdate {
            title: Some("Support".into()),
            user_id: Some("u9".into()),
            ..ConfigUpdate::default()
        });
        assert!(header_changed);
        assert_eq!(cfg.title, "Support");
        assert_eq!(cfg.subtitle, "Online");
        assert_eq!(cfg.user_id.as_deref(), Some("u9"));
        assert_eq!(cfg.endpoint_url, "http://localhost/chat");
    }

    #[test]
    fn apply_reports_unchanged_header_when_values_match() {
        let mut cfg = WidgetConfig::new("http://localhost/chat");
        let header_changed = cfg.apply(ConfigUpdate {
            title: Some(cfg.title.clone()),
            draggable: Some(false),
            ..ConfigUpdate::default()
        });
        assert!(!header_changed);
        assert!(!cfg.draggable);
    }
}

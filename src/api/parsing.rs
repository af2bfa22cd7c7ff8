//! Slack Events API envelope types and header helpers.

use serde::Deserialize;
use serde_json::Value;

/// The outer Events API callback envelope.
#[derive(Debug, Deserialize)]
pub struct SlackEventCallback {
    #[serde(rename = "type")]
    pub callback_type: String,
    pub event_id: Option<String>,
    pub challenge: Option<String>,
    pub event: Option<SlackAppMentionEvent>,
}

#[derive(Debug, Deserialize)]
pub struct SlackAppMentionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub user: Option<String>,
    pub text: Option<String>,
    pub channel: Option<String>,
    pub ts: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

impl SlackEventCallback {
    #[must_use]
    pub fn is_url_verification(&self) -> bool {
        self.callback_type == "url_verification"
    }

    #[must_use]
    pub fn is_app_mention(&self) -> bool {
        self.callback_type == "event_callback"
            && self
                .event
                .as_ref()
                .is_some_and(|e| e.event_type == "app_mention")
    }
}

impl SlackAppMentionEvent {
    /// Bot echoes and edited/system messages must be ignored to avoid loops.
    #[must_use]
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some() || self.subtype.is_some()
    }
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

//! Events API webhook payloads.

use serde::Deserialize;

use crate::events::{MessageEvent, SlackEnvelope, SlackEvent};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsApiPayload {
    UrlVerification { challenge: String },
    EventCallback(EventCallback),
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EventCallback {
    pub event_id: String,
    pub event: InnerEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InnerEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

pub fn parse_payload(body: &[u8]) -> Result<EventsApiPayload, serde_json::Error> {
    serde_json::from_slice(body)
}

impl EventCallback {
    pub fn into_envelope(self) -> SlackEnvelope {
        let event = match (self.event.event_type.as_str(), self.event.channel) {
            ("message", Some(channel_id)) => SlackEvent::Message(MessageEvent {
                channel_id,
                user_id: self.event.user.unwrap_or_default(),
                text: self.event.text.unwrap_or_default(),
            }),
            _ => SlackEvent::Unsupported { event_type: self.event.event_type },
        };

        SlackEnvelope { envelope_id: self.event_id, event }
    }
}

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use pointsrus_core::errors::ApplicationError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundReply {
    pub channel_id: String,
    pub text: String,
}

impl OutboundReply {
    pub fn new(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), text: text.into() }
    }
}

/// Delivery confirmation: the channel and the timestamp Slack assigned the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyReceipt {
    pub channel_id: String,
    pub ts: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("reply transport failed: {0}")]
    Transport(String),
    #[error("slack api rejected reply: {error}")]
    Api { error: String },
    #[error("could not decode slack api response: {0}")]
    Decode(String),
}

impl From<ReplyError> for ApplicationError {
    fn from(value: ReplyError) -> Self {
        Self::SendFailure(value.to_string())
    }
}

#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, reply: &OutboundReply) -> Result<ReplyReceipt, ReplyError>;
}

/// Keeps every delivered reply in memory; optionally rejects all sends.
#[derive(Default)]
pub struct RecordingReplySender {
    sent: Mutex<Vec<OutboundReply>>,
    failure: Option<ReplyError>,
}

impl RecordingReplySender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: ReplyError) -> Self {
        Self { sent: Mutex::default(), failure: Some(error) }
    }

    pub async fn sent(&self) -> Vec<OutboundReply> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn send_reply(&self, reply: &OutboundReply) -> Result<ReplyReceipt, ReplyError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut sent = self.sent.lock().await;
        sent.push(reply.clone());
        Ok(ReplyReceipt { channel_id: reply.channel_id.clone(), ts: format!("{}.0000", sent.len()) })
    }
}

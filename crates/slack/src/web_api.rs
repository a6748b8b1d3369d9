use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reply::{OutboundReply, ReplyError, ReplyReceipt, ReplySender};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Posts replies through the Web API `chat.postMessage` method.
pub struct WebApiReplySender {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl WebApiReplySender {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Result<Self, ReplyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|error| ReplyError::Transport(error.to_string()))?;

        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_owned(), bot_token })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat.postMessage", self.base_url)
    }
}

#[async_trait]
impl ReplySender for WebApiReplySender {
    async fn send_reply(&self, reply: &OutboundReply) -> Result<ReplyReceipt, ReplyError> {
        debug!(channel_id = %reply.channel_id, "posting reply to slack");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessageRequest { channel: &reply.channel_id, text: &reply.text })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| ReplyError::Transport(error.to_string()))?;

        let body = response
            .json::<PostMessageResponse>()
            .await
            .map_err(|error| ReplyError::Decode(error.to_string()))?;

        if !body.ok {
            return Err(ReplyError::Api {
                error: body.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }

        let ts = body.ts.ok_or_else(|| ReplyError::Decode("response is missing `ts`".to_owned()))?;
        Ok(ReplyReceipt { channel_id: body.channel.unwrap_or_else(|| reply.channel_id.clone()), ts })
    }
}

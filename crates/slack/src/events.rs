use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use pointsrus_core::errors::ApplicationError;
use pointsrus_db::ScoreRepository;

use crate::{
    points::PointsService,
    reply::{ReplyReceipt, ReplySender},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(_) => SlackEventType::Message,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Vec<ReplyReceipt>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("every message effect failed: {}", summarize(.0))]
    Effects(Vec<ApplicationError>),
}

fn summarize(errors: &[ApplicationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

/// Dispatch table from event type to handler, wired once at startup.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(
    scores: Arc<dyn ScoreRepository>,
    replies: Arc<dyn ReplySender>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(PointsService::new(scores, replies)));
    dispatcher
}

#[async_trait]
pub trait MessageService: Send + Sync {
    /// Applies every effect the message asks for and returns the delivered replies.
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ReplyReceipt>, EventHandlerError>;
}

pub struct MessageHandler<S> {
    service: S,
}

impl<S> MessageHandler<S>
where
    S: MessageService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: MessageService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let receipts = self.service.handle_message(event, ctx).await?;
        Ok(if receipts.is_empty() {
            HandlerResult::Processed
        } else {
            HandlerResult::Responded(receipts)
        })
    }
}

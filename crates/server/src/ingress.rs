use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use pointsrus_slack::{
    events::{EventContext, EventDispatcher, HandlerResult, SlackEnvelope},
    events_api::{parse_payload, EventsApiPayload},
    signature::{RequestVerifier, SignatureError, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use serde_json::json;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

const RECENT_EVENT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct IngressState {
    verifier: Arc<RequestVerifier>,
    dispatcher: Arc<EventDispatcher>,
    recent: Arc<RecentEvents>,
    in_flight: Arc<InFlight>,
}

impl IngressState {
    pub fn new(verifier: RequestVerifier, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            dispatcher,
            recent: Arc::new(RecentEvents::new(RECENT_EVENT_CAPACITY)),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Resolves once every spawned event task has finished.
    pub async fn drain(&self) {
        self.in_flight.wait_idle().await;
    }
}

pub fn router(state: IngressState) -> Router {
    Router::new().route("/slack/events", post(slack_events)).with_state(state)
}

async fn slack_events(
    State(state): State<IngressState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(error) = verify(&state.verifier, &headers, &body) {
        warn!(
            event_name = "ingress.slack.signature_rejected",
            error = %error,
            "rejected slack request with invalid signature"
        );
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(
                event_name = "ingress.slack.payload_invalid",
                error = %error,
                "could not parse slack payload"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload {
        EventsApiPayload::UrlVerification { challenge } => {
            info!(event_name = "ingress.slack.url_verification", "answering url verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventsApiPayload::EventCallback(callback) => {
            let envelope = callback.into_envelope();
            if !state.recent.first_delivery(&envelope.envelope_id).await {
                debug!(
                    event_name = "ingress.slack.duplicate_event",
                    correlation_id = %envelope.envelope_id,
                    "event already delivered; acknowledging retry"
                );
                return StatusCode::OK.into_response();
            }

            let guard = state.in_flight.enter();
            let dispatcher = Arc::clone(&state.dispatcher);
            tokio::spawn(async move {
                process_envelope(&dispatcher, &envelope).await;
                drop(guard);
            });
            StatusCode::OK.into_response()
        }
        EventsApiPayload::Unknown => StatusCode::OK.into_response(),
    }
}

fn verify(
    verifier: &RequestVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let timestamp = header_value(headers, TIMESTAMP_HEADER)?;
    let signature = header_value(headers, SIGNATURE_HEADER)?;
    verifier.verify(timestamp, signature, body, Utc::now().timestamp())
}

fn header_value<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}

/// Runs one event through the dispatch table. Failures stay with this event.
pub async fn process_envelope(
    dispatcher: &EventDispatcher,
    envelope: &SlackEnvelope,
) -> Option<HandlerResult> {
    info!(
        event_name = "ingress.slack.event_received",
        correlation_id = %envelope.envelope_id,
        event_type = ?envelope.event.event_type(),
        "received slack event"
    );

    let context = EventContext { correlation_id: envelope.envelope_id.clone() };
    match dispatcher.dispatch(envelope, &context).await {
        Ok(result) => Some(result),
        Err(error) => {
            warn!(
                event_name = "ingress.slack.dispatch_failed",
                correlation_id = %envelope.envelope_id,
                error = %error,
                "event dispatch failed; continuing with later events"
            );
            None
        }
    }
}

/// Bounded memory of delivered event ids so Slack retries are not applied twice.
struct RecentEvents {
    capacity: usize,
    state: Mutex<(HashSet<String>, VecDeque<String>)>,
}

impl RecentEvents {
    fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), state: Mutex::default() }
    }

    async fn first_delivery(&self, event_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let (seen, order) = &mut *state;
        if !seen.insert(event_id.to_owned()) {
            return false;
        }

        order.push_back(event_id.to_owned());
        if order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                seen.remove(&oldest);
            }
        }
        true
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { in_flight: Arc::clone(self) }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct InFlightGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}

//! Slack integration for the points bot.
//!
//! - **Events** (`events`) - inbound event model and the dispatch table
//! - **Points** (`points`) - turns a chat message into score adjustments and leaderboard replies
//! - **Events API** (`events_api`) - webhook payload parsing
//! - **Signature** (`signature`) - `X-Slack-Signature` verification
//! - **Reply** (`reply`, `web_api`) - outbound `chat.postMessage` client
//!
//! ```text
//! HTTP ingress → signature → events_api → EventDispatcher → PointsService → ScoreRepository
//!                                                                 ↓
//!                                                          ReplySender → Slack
//! ```

pub mod events;
pub mod events_api;
pub mod points;
pub mod reply;
pub mod signature;
pub mod web_api;

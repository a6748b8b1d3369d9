use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use pointsrus_core::{
    domain::score::{LeaderboardRow, ScoreDelta, ScoreRecord},
    errors::ApplicationError,
    intent::{parse_intents, Intent, LEADERBOARD_SIZE},
    leaderboard::{code_block, leaderboard_table},
};
use pointsrus_db::ScoreRepository;

use crate::{
    events::{EventContext, EventHandlerError, MessageEvent, MessageService},
    reply::{OutboundReply, ReplyReceipt, ReplySender},
};

/// Applies score adjustments and answers leaderboard queries for one message.
///
/// Each recognized intent is its own effect: a failure in one is logged and does
/// not stop the other. A committed adjustment stays committed when its reply fails.
pub struct PointsService {
    scores: Arc<dyn ScoreRepository>,
    replies: Arc<dyn ReplySender>,
}

impl PointsService {
    pub fn new(scores: Arc<dyn ScoreRepository>, replies: Arc<dyn ReplySender>) -> Self {
        Self { scores, replies }
    }

    async fn reply_text(&self, intent: &Intent) -> Result<Option<String>, ApplicationError> {
        match intent {
            Intent::Adjust { word, delta } => {
                let record = self.scores.apply_delta(word, delta.value()).await?;
                info!(
                    event_name = "points.adjustment.applied",
                    word = %record.word,
                    delta = delta.value(),
                    count = record.count,
                    "score adjusted"
                );
                Ok(Some(adjustment_reply_text(&record, *delta)))
            }
            Intent::QueryLeaderboard => {
                let records = self.scores.top_n(LEADERBOARD_SIZE).await?;
                Ok(Some(leaderboard_reply_text(&records)))
            }
            Intent::None => Ok(None),
        }
    }

    async fn run_effect(
        &self,
        intent: &Intent,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<ReplyReceipt>, ApplicationError> {
        let Some(text) = self.reply_text(intent).await? else {
            return Ok(None);
        };

        let receipt =
            self.replies.send_reply(&OutboundReply::new(event.channel_id.clone(), text)).await?;
        info!(
            event_name = "points.reply.sent",
            correlation_id = %ctx.correlation_id,
            channel_id = %receipt.channel_id,
            ts = %receipt.ts,
            "successfully sent message"
        );
        Ok(Some(receipt))
    }
}

#[async_trait]
impl MessageService for PointsService {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ReplyReceipt>, EventHandlerError> {
        info!(
            event_name = "points.message.received",
            correlation_id = %ctx.correlation_id,
            user_id = %event.user_id,
            channel_id = %event.channel_id,
            text = %event.text,
            "received a message event"
        );

        let intents = parse_intents(&event.text);
        if intents.is_empty() {
            debug!(
                event_name = "points.message.ignored",
                correlation_id = %ctx.correlation_id,
                "message carries no points intent"
            );
            return Ok(Vec::new());
        }

        let mut receipts = Vec::with_capacity(intents.len());
        let mut failures = Vec::new();
        for intent in &intents {
            match self.run_effect(intent, event, ctx).await {
                Ok(Some(receipt)) => receipts.push(receipt),
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        event_name = "points.effect.failed",
                        correlation_id = %ctx.correlation_id,
                        channel_id = %event.channel_id,
                        error_class = error.class(),
                        error = %error,
                        "message effect failed; no reply sent"
                    );
                    failures.push(error);
                }
            }
        }

        if receipts.is_empty() && !failures.is_empty() {
            return Err(EventHandlerError::Effects(failures));
        }
        Ok(receipts)
    }
}

pub fn adjustment_reply_text(record: &ScoreRecord, delta: ScoreDelta) -> String {
    format!("{} had a point {}. Score is now at: {}", record.word, delta.verb(), record.count)
}

pub fn leaderboard_reply_text(records: &[ScoreRecord]) -> String {
    let rows = records.iter().map(ScoreRecord::row).collect::<Vec<LeaderboardRow>>();
    code_block(&leaderboard_table(&rows))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pointsrus_core::{domain::score::ScoreRecord, errors::ApplicationError};
    use pointsrus_db::{InMemoryScoreRepository, RepositoryError, ScoreRepository};

    use super::{adjustment_reply_text, PointsService};
    use crate::{
        events::{EventContext, EventHandlerError, MessageEvent, MessageService},
        reply::{OutboundReply, RecordingReplySender, ReplyError},
    };

    /// Store that fails selected operations the way an unreachable database would.
    struct BrokenScoreRepository {
        fail_apply: bool,
        fail_top: bool,
        inner: InMemoryScoreRepository,
    }

    #[async_trait]
    impl ScoreRepository for BrokenScoreRepository {
        async fn apply_delta(
            &self,
            word: &str,
            delta: i64,
        ) -> Result<ScoreRecord, RepositoryError> {
            if self.fail_apply {
                return Err(RepositoryError::Decode("database is locked".to_owned()));
            }
            self.inner.apply_delta(word, delta).await
        }

        async fn top_n(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError> {
            if self.fail_top {
                return Err(RepositoryError::Decode("connection reset".to_owned()));
            }
            self.inner.top_n(limit).await
        }
    }

    fn message(text: &str) -> MessageEvent {
        MessageEvent { channel_id: "C42".to_owned(), user_id: "U7".to_owned(), text: text.to_owned() }
    }

    fn service(
        scores: Arc<dyn ScoreRepository>,
        replies: Arc<RecordingReplySender>,
    ) -> PointsService {
        PointsService::new(scores, replies)
    }

    #[tokio::test]
    async fn increment_updates_store_and_replies_with_new_count() {
        let scores = Arc::new(InMemoryScoreRepository::default());
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores.clone(), replies.clone());

        let receipts = service
            .handle_message(&message("great job @widget++ today"), &EventContext::default())
            .await
            .expect("handled");

        assert_eq!(receipts.len(), 1);
        assert_eq!(scores.count("widget").await, Some(1));
        let sent = replies.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, "C42");
        assert_eq!(sent[0].text, "widget had a point added. Score is now at: 1");
    }

    #[tokio::test]
    async fn em_dash_removes_a_point() {
        let scores = Arc::new(InMemoryScoreRepository::with_scores([("widget", 4)]));
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores.clone(), replies.clone());

        service
            .handle_message(&message("@widget\u{2014}"), &EventContext::default())
            .await
            .expect("handled");

        assert_eq!(scores.count("widget").await, Some(3));
        assert_eq!(replies.sent().await[0].text, "widget had a point removed. Score is now at: 3");
    }

    #[tokio::test]
    async fn leaderboard_reply_is_code_blocked_and_ascending() {
        let scores = Arc::new(InMemoryScoreRepository::with_scores([("a", 5), ("b", 2)]));
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores, replies.clone());

        service
            .handle_message(&message("@pointsrus leaderboard"), &EventContext::default())
            .await
            .expect("handled");

        assert_eq!(
            replies.sent().await,
            vec![OutboundReply::new("C42", "```\nItem | Count\nb    | 2    \na    | 5    \n```")]
        );
    }

    #[tokio::test]
    async fn leaderboard_lists_at_most_ten_items() {
        let scores = Arc::new(InMemoryScoreRepository::with_scores(
            (0..25).map(|index| (format!("item{index:02}"), index)),
        ));
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores, replies.clone());

        service
            .handle_message(&message("@POINTSRUS Leaderboard"), &EventContext::default())
            .await
            .expect("handled");

        let text = &replies.sent().await[0].text;
        // fence, header, ten rows
        assert_eq!(text.lines().count(), 1 + 1 + 10 + 1);
        assert!(text.contains("item09"));
        assert!(!text.contains("item10"));
    }

    #[tokio::test]
    async fn no_intent_means_no_side_effects() {
        let scores = Arc::new(InMemoryScoreRepository::default());
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores.clone(), replies.clone());

        let receipts = service
            .handle_message(&message("see you @ lunch"), &EventContext::default())
            .await
            .expect("handled");

        assert!(receipts.is_empty());
        assert!(replies.sent().await.is_empty());
        assert!(scores.top_n(10).await.expect("top").is_empty());
    }

    #[tokio::test]
    async fn adjustment_and_leaderboard_in_one_message_send_two_replies() {
        let scores = Arc::new(InMemoryScoreRepository::with_scores([("a", 5)]));
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores, replies.clone());

        let receipts = service
            .handle_message(
                &message("@widget-- and @pointsrus leaderboard"),
                &EventContext::default(),
            )
            .await
            .expect("handled");

        assert_eq!(receipts.len(), 2);
        let sent = replies.sent().await;
        assert_eq!(sent[0].text, "widget had a point removed. Score is now at: -1");
        assert_eq!(sent[1].text, "```\nItem   | Count\nwidget | -1   \na      | 5    \n```");
    }

    #[tokio::test]
    async fn store_failure_is_contained_and_silent() {
        let scores = Arc::new(BrokenScoreRepository {
            fail_apply: true,
            fail_top: true,
            inner: InMemoryScoreRepository::default(),
        });
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores, replies.clone());

        let error = service
            .handle_message(&message("@widget++"), &EventContext::default())
            .await
            .expect_err("store failure surfaces at the handler boundary");

        assert!(matches!(
            error,
            EventHandlerError::Effects(ref failures)
                if matches!(failures.as_slice(), [ApplicationError::StoreUnavailable(_)])
        ));
        assert!(replies.sent().await.is_empty());
    }

    #[tokio::test]
    async fn failed_adjustment_does_not_block_leaderboard() {
        let scores = Arc::new(BrokenScoreRepository {
            fail_apply: true,
            fail_top: false,
            inner: InMemoryScoreRepository::with_scores([("a", 1)]),
        });
        let replies = Arc::new(RecordingReplySender::new());
        let service = service(scores, replies.clone());

        let receipts = service
            .handle_message(&message("@widget++ @pointsrus leaderboard"), &EventContext::default())
            .await
            .expect("leaderboard still answers");

        assert_eq!(receipts.len(), 1);
        assert!(replies.sent().await[0].text.starts_with("```"));
    }

    #[tokio::test]
    async fn send_failure_keeps_committed_adjustment() {
        let scores = Arc::new(InMemoryScoreRepository::default());
        let replies = Arc::new(RecordingReplySender::failing(ReplyError::Api {
            error: "not_in_channel".to_owned(),
        }));
        let service = service(scores.clone(), replies);

        let error = service
            .handle_message(&message("@widget++"), &EventContext::default())
            .await
            .expect_err("send failure");

        assert!(matches!(
            error,
            EventHandlerError::Effects(ref failures)
                if matches!(failures.as_slice(), [ApplicationError::SendFailure(_)])
        ));
        assert_eq!(scores.count("widget").await, Some(1));
    }

    #[test]
    fn adjustment_text_reports_word_direction_and_count() {
        let record = ScoreRecord { word: "bar".to_owned(), count: 0 };
        assert_eq!(
            adjustment_reply_text(&record, pointsrus_core::ScoreDelta::Decrement),
            "bar had a point removed. Score is now at: 0"
        );
    }
}

pub mod config;
pub mod domain;
pub mod errors;
pub mod intent;
pub mod leaderboard;

pub use domain::score::{LeaderboardRow, ScoreDelta, ScoreRecord};
pub use errors::{ApplicationError, DomainError};
pub use intent::{parse_intent, parse_intents, Intent, LEADERBOARD_SIZE, LEADERBOARD_TRIGGER};
pub use leaderboard::{code_block, leaderboard_table, render_table};

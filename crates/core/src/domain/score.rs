use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Cumulative score for one named item. `word` is the unique, case-sensitive key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub word: String,
    pub count: i64,
}

impl ScoreRecord {
    pub fn new(word: impl Into<String>, count: i64) -> Result<Self, DomainError> {
        let word = word.into();
        validate_item_name(&word)?;
        Ok(Self { word, count })
    }

    pub fn row(&self) -> LeaderboardRow {
        LeaderboardRow { word: self.word.clone(), count: self.count }
    }
}

/// Display-only `(word, count)` pair produced for the leaderboard table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub word: String,
    pub count: i64,
}

impl From<ScoreRecord> for LeaderboardRow {
    fn from(record: ScoreRecord) -> Self {
        Self { word: record.word, count: record.count }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDelta {
    Increment,
    Decrement,
}

impl ScoreDelta {
    pub fn value(self) -> i64 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Increment => "added",
            Self::Decrement => "removed",
        }
    }
}

pub fn validate_item_name(word: &str) -> Result<(), DomainError> {
    if word.is_empty() {
        return Err(DomainError::InvalidItem("item name must not be empty".to_owned()));
    }
    Ok(())
}

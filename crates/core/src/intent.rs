//! Lexical recognition of score adjustments and leaderboard queries in chat text.
//!
//! An adjustment is `@` + word characters + one marker: `++` adds a point,
//! `--` or a single em-dash removes one. Only the leftmost valid mention counts.
//! A leaderboard query is the phrase `@pointsrus leaderboard` in any case.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::score::ScoreDelta;

pub const LEADERBOARD_TRIGGER: &str = "@pointsrus leaderboard";
pub const LEADERBOARD_SIZE: u32 = 10;

const EM_DASH: char = '\u{2014}';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Adjust { word: String, delta: ScoreDelta },
    QueryLeaderboard,
    None,
}

fn adjustment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@([A-Za-z0-9_]+?)(--|\+\+|\x{2014})").expect("adjustment pattern compiles")
    })
}

/// Leftmost `@word` mention carrying a recognized marker.
///
/// A marker directly followed by another copy of its own symbol (`+++`, `---`)
/// is not a marker; scanning moves on to the next mention.
pub fn parse_adjustment(text: &str) -> Option<(String, ScoreDelta)> {
    adjustment_pattern().captures_iter(text).find_map(|captures| {
        let word = captures.get(1)?;
        let marker = captures.get(2)?;
        let symbol = marker.as_str().chars().next()?;
        if text[marker.end()..].starts_with(symbol) {
            return None;
        }

        let delta = match symbol {
            '+' => ScoreDelta::Increment,
            '-' | EM_DASH => ScoreDelta::Decrement,
            _ => return None,
        };
        Some((word.as_str().to_owned(), delta))
    })
}

pub fn is_leaderboard_query(text: &str) -> bool {
    text.to_lowercase().contains(LEADERBOARD_TRIGGER)
}

/// Single-intent view of a message: adjustment wins over a leaderboard query.
pub fn parse_intent(text: &str) -> Intent {
    parse_intents(text).into_iter().next().unwrap_or(Intent::None)
}

/// Every effect a message triggers, adjustment first. Empty means no intent.
pub fn parse_intents(text: &str) -> Vec<Intent> {
    let mut intents = Vec::with_capacity(2);
    if let Some((word, delta)) = parse_adjustment(text) {
        intents.push(Intent::Adjust { word, delta });
    }
    if is_leaderboard_query(text) {
        intents.push(Intent::QueryLeaderboard);
    }
    intents
}

use pointsrus_core::{leaderboard_table, LeaderboardRow};
use pointsrus_db::{ScoreRepository, SqlScoreRepository};

use crate::commands::{connect, load_config, runtime, CommandResult};

pub fn run(limit: u32) -> CommandResult {
    let config = match load_config("leaderboard") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("leaderboard") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        let records = SqlScoreRepository::new(pool.clone())
            .top_n(limit)
            .await
            .map_err(|error| ("store", error.to_string(), 5u8));
        pool.close().await;
        records
    });

    match result {
        Ok(records) => {
            let rows: Vec<LeaderboardRow> = records.into_iter().map(LeaderboardRow::from).collect();
            CommandResult::success("leaderboard", leaderboard_table(&rows))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("leaderboard", error_class, message, exit_code)
        }
    }
}

//! Fixed-width text rendering for the leaderboard.

use tabled::{
    builder::Builder,
    settings::{object::Columns, Modify, Padding, Style},
};

use crate::domain::score::LeaderboardRow;

pub const HEADER: (&str, &str) = ("Item", "Count");

/// Renders a grid of cells as a monospace table.
///
/// Cells are left-aligned and padded to the widest cell of their column, columns are
/// joined with `" | "` and every row ends with `\n`. Short rows get empty cells.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut builder = Builder::default();
    for row in rows {
        let mut record = row.clone();
        record.resize(columns, String::new());
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::empty().vertical('|'));
    if columns == 1 {
        table.with(Padding::zero());
    } else {
        table
            .with(Modify::new(Columns::first()).with(Padding::new(0, 1, 0, 0)))
            .with(Modify::new(Columns::last()).with(Padding::new(1, 0, 0, 0)));
    }

    let mut output = table.to_string();
    output.push('\n');
    output
}

pub fn leaderboard_table(rows: &[LeaderboardRow]) -> String {
    let mut grid = Vec::with_capacity(rows.len() + 1);
    grid.push(vec![HEADER.0.to_owned(), HEADER.1.to_owned()]);
    grid.extend(rows.iter().map(|row| vec![row.word.clone(), row.count.to_string()]));
    render_table(&grid)
}

/// Wraps a table in a chat code fence so it renders verbatim.
pub fn code_block(table: &str) -> String {
    format!("```\n{table}```")
}

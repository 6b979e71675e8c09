//! Observation formatting for display.
//!
//! Purely cosmetic: the raw observation is what the model sees next cycle;
//! the formatted text is what the transcript shows.

use fieldhand_tools::literal::{self, Literal};
use fieldhand_tools::{SQL_EXECUTOR, SQL_QUERY_GENERATOR};

pub const NO_APPLICABLE_TOOL: &str =
    "I couldn't find any tool I could use to respond to your request";
pub const STILL_DECIDING: &str =
    "I am still thinking about what can I do with this question, thank you for your patience!";
pub const EMPTY_DATA: &str = "Empty data";

/// Who produced an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationSource<'a> {
    /// A registered tool.
    Tool(&'a str),
    /// The model named a tool that is not registered.
    Unavailable,
    /// The model produced an action without naming any tool.
    Undecided,
}

pub fn format_observation(source: ObservationSource<'_>, raw: &str) -> String {
    match source {
        ObservationSource::Tool(SQL_QUERY_GENERATOR) => raw.to_string(),
        ObservationSource::Tool(SQL_EXECUTOR) => render_table(raw),
        ObservationSource::Tool(_) => raw.to_string(),
        ObservationSource::Unavailable => NO_APPLICABLE_TOOL.to_string(),
        ObservationSource::Undecided => STILL_DECIDING.to_string(),
    }
}

/// Render a literal sequence of rows as a Markdown table with numbered
/// column headers. Returns the input unchanged when it is not such a sequence.
pub fn render_table(raw: &str) -> String {
    let Ok(value) = literal::parse(raw.trim()) else {
        return raw.to_string();
    };
    let Some(rows) = value.items() else {
        return raw.to_string();
    };
    if rows.is_empty() {
        return EMPTY_DATA.to_string();
    }
    let Some(rows) = rows.iter().map(Literal::items).collect::<Option<Vec<_>>>() else {
        return raw.to_string();
    };

    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let header = format!(
        "| {} |",
        (1..=columns)
            .map(|i| format!("Column {i}"))
            .collect::<Vec<_>>()
            .join(" | ")
    );
    let separator = format!("|{}|", vec!["---"; columns].join("|"));

    let mut lines = vec![header, separator];
    for row in rows {
        let cells: Vec<String> = (0..columns)
            .map(|i| row.get(i).map(Literal::to_plain).unwrap_or_default())
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

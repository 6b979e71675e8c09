//! Parses a ReAct completion into a structured step.
//!
//! Grammar, one marker per line:
//!
//! ```text
//! Thought: ...
//! Action: <tool name>
//! Action Input: <text>
//! ```
//!
//! or
//!
//! ```text
//! Thought: ...
//! Final Answer: <text>
//! ```
//!
//! When both forms appear in one completion the final answer wins.

use fieldhand_core::error::LoopError;
use regex_lite::Regex;
use std::sync::LazyLock;

static FINAL_ANSWER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)Final Answer[ \t]*:(.*)").ok());
static ACTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Action[ \t]*\d*[ \t]*:[ \t]*([^\n]*)").ok());
static ACTION_INPUT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)Action[ \t]*\d*[ \t]*Input[ \t]*\d*[ \t]*:[ \t]*(.*)").ok());
static THOUGHT_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*Thought[ \t]*:").ok());

const SNIPPET_CHARS: usize = 200;

/// What the model decided in one reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Action { tool: String, input: String },
    FinalAnswer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStep {
    pub thought: String,
    pub decision: Decision,
}

/// Parse one completion. Anything without a usable marker is a
/// [`LoopError::ParseFailure`].
pub fn parse_step(text: &str) -> Result<ParsedStep, LoopError> {
    if let Some((start, answer)) = find_final_answer(text) {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(LoopError::ParseFailure("empty Final Answer".into()));
        }
        return Ok(ParsedStep {
            thought: thought_before(text, start),
            decision: Decision::FinalAnswer(answer.to_string()),
        });
    }

    let Some((start, end, tool)) = find_action(text) else {
        return Err(LoopError::ParseFailure(snippet(text)));
    };

    let input = ACTION_INPUT
        .as_ref()
        .and_then(|re| re.captures(&text[end..]))
        .and_then(|caps| caps.get(1))
        .map(|m| clean_input(m.as_str()))
        .unwrap_or_default();

    Ok(ParsedStep {
        thought: thought_before(text, start),
        decision: Decision::Action {
            tool: clean_tool_name(tool),
            input,
        },
    })
}

/// The completion up to its first `Action:` marker, trimmed.
pub fn trim_at_action(text: &str) -> &str {
    match find_action(text) {
        Some((start, _, _)) => text[..start].trim(),
        None => text.trim(),
    }
}

fn find_final_answer(text: &str) -> Option<(usize, &str)> {
    let caps = FINAL_ANSWER.as_ref()?.captures(text)?;
    let start = caps.get(0)?.start();
    Some((start, caps.get(1)?.as_str()))
}

fn find_action(text: &str) -> Option<(usize, usize, &str)> {
    let caps = ACTION.as_ref()?.captures(text)?;
    let whole = caps.get(0)?;
    Some((whole.start(), whole.end(), caps.get(1)?.as_str()))
}

fn thought_before(text: &str, end: usize) -> String {
    let head = &text[..end];
    let head = match THOUGHT_PREFIX.as_ref().and_then(|re| re.find(head)) {
        Some(m) => &head[m.end()..],
        None => head,
    };
    head.trim().to_string()
}

fn clean_tool_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '[' | ']' | '*'))
        .trim()
        .to_string()
}

fn clean_input(raw: &str) -> String {
    let raw = match raw.find("\nObservation") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let trimmed = raw.trim();
    // Only a fully quoted input loses its quotes; SQL often ends in one.
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn patterns_compile() {
        assert!(FINAL_ANSWER.is_some());
        assert!(ACTION.is_some());
        assert!(ACTION_INPUT.is_some());
        assert!(THOUGHT_PREFIX.is_some());
    }

    #[test]
    fn action_with_input() {
        let step = parse_step(
            " I need the wheat rows.\nAction: SQL Query Generator\nAction Input: wheat yield in July 2023",
        )
        .unwrap();
        assert_eq!(step.thought, "I need the wheat rows.");
        assert_eq!(
            step.decision,
            Decision::Action {
                tool: "SQL Query Generator".into(),
                input: "wheat yield in July 2023".into(),
            }
        );
    }

    #[test]
    fn missing_action_input_is_empty() {
        let step = parse_step("Thought: check weather\nAction: Weather Checker").unwrap();
        assert_eq!(
            step.decision,
            Decision::Action {
                tool: "Weather Checker".into(),
                input: String::new(),
            }
        );
        assert_eq!(step.thought, "check weather");
    }

    #[test]
    fn multiline_input_stops_at_observation() {
        let step = parse_step(
            "Action: SQL Executor\nAction Input: SELECT *\nFROM Crops WHERE crop_name = \"Wheat\"\nObservation: made up",
        )
        .unwrap();
        let Decision::Action { input, .. } = step.decision else {
            panic!("expected action");
        };
        assert_eq!(input, "SELECT *\nFROM Crops WHERE crop_name = \"Wheat\"");
    }

    #[test]
    fn quoted_input_and_tool_are_unwrapped() {
        let step = parse_step("Action: `Weather Checker`\nAction Input: \"Poznan\"").unwrap();
        assert_eq!(
            step.decision,
            Decision::Action {
                tool: "Weather Checker".into(),
                input: "Poznan".into(),
            }
        );
    }

    #[test]
    fn final_answer() {
        let step = parse_step(" I now know the final answer\nFinal Answer: The wheat yield was 4.2 t/ha.")
            .unwrap();
        assert_eq!(step.thought, "I now know the final answer");
        assert_eq!(
            step.decision,
            Decision::FinalAnswer("The wheat yield was 4.2 t/ha.".into())
        );
    }

    #[test]
    fn final_answer_wins_over_action() {
        let step = parse_step(
            "Action: SQL Executor\nAction Input: SELECT 1\nFinal Answer: done",
        )
        .unwrap();
        assert_eq!(step.decision, Decision::FinalAnswer("done".into()));
    }

    #[test]
    fn gibberish_is_parse_failure() {
        assert!(matches!(
            parse_step("asdf qwerty zxcv"),
            Err(LoopError::ParseFailure(_))
        ));
        assert!(matches!(parse_step(""), Err(LoopError::ParseFailure(_))));
        assert!(matches!(
            parse_step("Final Answer:   "),
            Err(LoopError::ParseFailure(_))
        ));
    }

    #[test]
    fn trims_at_action_marker() {
        assert_eq!(
            trim_at_action("Let me look this up.\nAction: SQL Executor\nAction Input: SELECT 1"),
            "Let me look this up."
        );
        assert_eq!(trim_at_action("  no marker here "), "no marker here");
    }

    #[test]
    fn long_failures_are_truncated() {
        let text = "x".repeat(1000);
        let Err(LoopError::ParseFailure(msg)) = parse_step(&text) else {
            panic!("expected parse failure");
        };
        assert!(msg.chars().count() <= SNIPPET_CHARS + 1);
    }

    proptest! {
        #[test]
        fn parse_is_total(text in "\\PC{0,200}") {
            let _ = parse_step(&text);
            let _ = trim_at_action(&text);
        }

        #[test]
        fn any_action_line_parses(tool in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]", input in "[a-z0-9 ]{0,40}") {
            let text = format!("Thought: go\nAction: {tool}\nAction Input: {input}");
            let step = parse_step(&text).unwrap();
            prop_assert_eq!(
                step.decision,
                Decision::Action { tool: tool.trim().to_string(), input: input.trim().to_string() }
            );
        }
    }
}

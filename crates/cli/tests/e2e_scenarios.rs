//! End-to-end scenarios for the Fieldhand farm assistant.
//!
//! These drive the full pipeline (prompt, parse, dispatch, format, project)
//! with a scripted model, a real in-memory farm database, and the real farm
//! tools. Only the completion provider and the weather service are stubbed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldhand_agent::{
    AgentStep, BoundedAgent, ChartAttachment, PARSE_FAILURE_FALLBACK, ReasoningEngine, RunOutcome,
    TOOL_LIMIT_FALLBACK, project,
};
use fieldhand_core::capability::{ChartRenderer, SqlExecutor, WeatherReport, WeatherService};
use fieldhand_core::error::{ProviderError, ToolError};
use fieldhand_core::message::{Conversation, Message};
use fieldhand_core::provider::{CompletionRequest, CompletionResponse, Provider, Usage};
use fieldhand_database::{CropRecord, FarmDatabase};
use fieldhand_tools::{
    DATA_VISUALIZER, SQL_EXECUTOR, SQL_QUERY_GENERATOR, SqlQueryGeneratorTool, SvgChartRenderer,
    WEATHER_CHECKER, farm_registry,
};

// ── Scripted provider ────────────────────────────────────────────────────

/// Returns completions in order; the last one repeats once the script ends.
struct ScriptedProvider {
    script: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(script: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: script.iter().map(|s| s.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(request.prompt.clone());
        let idx = (prompts.len() - 1).min(self.script.len() - 1);
        Ok(CompletionResponse {
            content: self.script[idx].clone(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

// ── Stub weather ─────────────────────────────────────────────────────────

struct SunnyPoznan;

#[async_trait]
impl WeatherService for SunnyPoznan {
    async fn lookup(&self, location: &str) -> Result<WeatherReport, ToolError> {
        if location.trim() != "Poznan" {
            return Err(ToolError::ExecutionFailed {
                tool_name: WEATHER_CHECKER.into(),
                reason: format!("city not found: {location}"),
            });
        }
        Ok(WeatherReport {
            location: "Poznan, PL".into(),
            temperature_c: 21.5,
            conditions: "Clear Sky".into(),
            humidity_pct: 48,
            wind_speed_ms: 2.1,
        })
    }
}

// ── Fixture ──────────────────────────────────────────────────────────────

struct Farm {
    agent: BoundedAgent,
    provider: Arc<ScriptedProvider>,
    _charts: tempfile::TempDir,
}

async fn seeded_database() -> FarmDatabase {
    let db = FarmDatabase::new("sqlite::memory:", 1).await.unwrap();
    let crops = [
        ("Wheat", "July", 2023, 4.2, 4.0),
        ("Wheat", "August", 2023, 3.9, 4.0),
        ("Corn", "July", 2023, 7.5, 8.0),
    ];
    let records: Vec<CropRecord> = crops
        .iter()
        .map(|(crop, month, year, yield_amount, target)| CropRecord {
            id: None,
            crop_name: crop.to_string(),
            month: month.to_string(),
            year: *year,
            yield_amount: *yield_amount,
            target: *target,
        })
        .collect();
    db.import_crops(&records).await.unwrap();
    db
}

async fn farm(script: &[&str], limit: usize) -> Farm {
    let provider = ScriptedProvider::new(script);
    let charts = tempfile::tempdir().unwrap();

    let sql: Arc<dyn SqlExecutor> = Arc::new(seeded_database().await);
    let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(charts.path()));
    let weather: Arc<dyn WeatherService> = Arc::new(SunnyPoznan);
    let generator = SqlQueryGeneratorTool::new(provider.clone(), "mock-model");
    let tools = farm_registry(generator, sql, renderer, weather).unwrap();

    let engine = ReasoningEngine::new(provider.clone(), "mock-model");
    let agent = BoundedAgent::new(engine, Arc::new(tools)).with_tool_call_limit(limit);
    Farm {
        agent,
        provider,
        _charts: charts,
    }
}

const WHEAT_QUERY: &str = "SELECT crop_name, month, year, yield_amount, target FROM Crops \
                           WHERE year = 2023 AND crop_name = 'Wheat' AND month = 'July'";

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_wheat_yield_via_generated_sql() {
    let generated = format!("```sql\n{WHEAT_QUERY}\n```");
    let execute = format!("I have a query.\nAction: SQL Executor\nAction Input: {WHEAT_QUERY}");
    let farm = farm(
        &[
            "I need the wheat yield for July 2023.\nAction: SQL Query Generator\nAction Input: wheat yield in July 2023",
            &generated,
            &execute,
            "I now know the final answer.\nFinal Answer: The wheat yield in July 2023 was 4.2 t/ha against a target of 4.0.",
        ],
        10,
    )
    .await;

    let result = farm
        .agent
        .run("What was the wheat yield in July 2023?", &[])
        .await;

    assert_eq!(result.outcome, RunOutcome::Finished);
    assert_eq!(result.tool_calls, 2);
    assert!(result.final_answer.contains("4.2"));
    assert_eq!(result.steps.len(), 4);

    match &result.steps[1] {
        AgentStep::Tool { tool, observation, .. } => {
            assert_eq!(tool, SQL_QUERY_GENERATOR);
            assert_eq!(observation, WHEAT_QUERY);
        }
        other => panic!("expected generator step, got {other:?}"),
    }
    match &result.steps[3] {
        AgentStep::Tool {
            tool,
            observation,
            display,
            ..
        } => {
            assert_eq!(tool, SQL_EXECUTOR);
            assert_eq!(observation, "[('Wheat', 'July', 2023, 4.2, 4.0)]");
            assert!(display.starts_with("| Column 1 |"));
            assert!(display.contains("| Wheat | July | 2023 | 4.2 | 4.0 |"));
        }
        other => panic!("expected executor step, got {other:?}"),
    }

    // The executor's raw rows reach the model on the next cycle.
    let prompts = farm.provider.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[3].contains("Observation: [('Wheat', 'July', 2023, 4.2, 4.0)]"));

    let markdown = project(&result).to_markdown();
    assert!(markdown.starts_with("**1.** **Thinking...** I need the wheat yield for July 2023."));
    assert!(markdown.contains("**SQL Executor Tool:**"));
    assert!(markdown.contains("**Final Answer:**\n\nThe wheat yield in July 2023 was 4.2"));
}

#[tokio::test]
async fn e2e_greeting_answers_without_tools() {
    let farm = farm(
        &["The user is greeting me.\nFinal Answer: Hello! How can I help with your farm today?"],
        10,
    )
    .await;

    let result = farm.agent.run("hello", &[]).await;

    assert_eq!(result.outcome, RunOutcome::Finished);
    assert_eq!(result.tool_calls, 0);
    assert!(result.steps.is_empty());
    assert_eq!(result.final_answer, "Hello! How can I help with your farm today?");
    assert_eq!(farm.provider.prompts().len(), 1);
}

#[tokio::test]
async fn e2e_gibberish_falls_back() {
    let farm = farm(&["asdf qwerty zxcv"], 10).await;

    let result = farm.agent.run("asdfgh", &[]).await;

    assert_eq!(result.outcome, RunOutcome::ParseFailure);
    assert_eq!(result.final_answer, PARSE_FAILURE_FALLBACK);
    assert_eq!(result.tool_calls, 0);
    assert!(project(&result).to_markdown().contains(PARSE_FAILURE_FALLBACK));
}

#[tokio::test]
async fn e2e_tool_limit_is_enforced() {
    let farm = farm(
        &["Check again.\nAction: Weather Checker\nAction Input: Poznan"],
        3,
    )
    .await;

    let result = farm.agent.run("Keep checking the weather", &[]).await;

    assert_eq!(result.outcome, RunOutcome::ToolLimitExceeded);
    assert_eq!(result.final_answer, TOOL_LIMIT_FALLBACK);
    assert_eq!(result.tool_calls, 3);
    let tool_steps = result
        .steps
        .iter()
        .filter(|s| matches!(s, AgentStep::Tool { .. }))
        .count();
    assert_eq!(tool_steps, 3);
}

#[tokio::test]
async fn e2e_unknown_tool_is_observed_not_fatal() {
    let farm = farm(
        &[
            "Let me search the web.\nAction: Web Search\nAction Input: wheat prices",
            "That tool does not exist.\nFinal Answer: I can only answer from farm data and weather.",
        ],
        10,
    )
    .await;

    let result = farm.agent.run("What do wheat futures cost?", &[]).await;

    assert_eq!(result.outcome, RunOutcome::Finished);
    let prompts = farm.provider.prompts();
    assert!(prompts[1].contains("Web Search is not a valid tool, try one of ["));
    assert!(prompts[1].contains(SQL_QUERY_GENERATOR));
}

#[tokio::test]
async fn e2e_weather_report_round_trip() {
    let farm = farm(
        &[
            "I should check the weather.\nAction: Weather Checker\nAction Input: Poznan",
            "Final Answer: It is 21.5°C and clear in Poznan.",
        ],
        10,
    )
    .await;

    let result = farm.agent.run("What's the weather in Poznan?", &[]).await;

    assert!(result.is_finished());
    match &result.steps[1] {
        AgentStep::Tool { tool, observation, .. } => {
            assert_eq!(tool, WEATHER_CHECKER);
            let report: serde_json::Value = serde_json::from_str(observation).unwrap();
            assert_eq!(report["Location"], "Poznan, PL");
            assert_eq!(report["Temperature (°C)"], 21.5);
        }
        other => panic!("expected weather step, got {other:?}"),
    }
}

#[tokio::test]
async fn e2e_chart_is_embedded_in_transcript() {
    let farm = farm(
        &[
            "I will chart the yields.\nAction: Data Visualizer\nAction Input: [('Wheat', 4.2), ('Corn', 7.5)]",
            "I should now return the Final Answer.\nFinal Answer: Here is the chart of July yields.",
        ],
        10,
    )
    .await;

    let result = farm.agent.run("Chart July 2023 yields", &[]).await;

    assert!(result.is_finished());
    assert!(result.side_payload.is_some());

    let transcript = project(&result);
    match &transcript.chart {
        Some(ChartAttachment::Image { data_uri }) => {
            assert!(data_uri.starts_with("data:image/svg+xml;base64,"));
        }
        other => panic!("expected an embedded chart, got {other:?}"),
    }
    let markdown = transcript.to_markdown();
    assert!(markdown.contains(&format!("**{DATA_VISUALIZER} Tool:**")));
    assert!(markdown.contains("**Requested chart:**"));
}

#[tokio::test]
async fn e2e_bad_chart_data_is_reported_to_the_model() {
    let farm = farm(
        &[
            "Chart it.\nAction: Data Visualizer\nAction Input: wheat and corn",
            "Final Answer: I could not build the chart from that data.",
        ],
        10,
    )
    .await;

    let result = farm.agent.run("Chart something", &[]).await;

    assert!(result.is_finished());
    assert!(result.side_payload.is_none());
    assert!(farm.provider.prompts()[1]
        .contains("Invalid data format. Please provide a list of 2-element tuples."));
}

#[tokio::test]
async fn e2e_conversation_history_reaches_the_next_turn() {
    let farm = farm(&["Final Answer: Wheat did best."], 10).await;
    let mut conv = Conversation::new("e2e");

    conv.push(Message::user("Which crop did best?"));
    let first = farm.agent.run("Which crop did best?", conv.history()).await;
    conv.push(Message::assistant(first.final_answer.clone()));

    conv.push(Message::user("And in August?"));
    let _second = farm.agent.run("And in August?", conv.history()).await;

    let prompts = farm.provider.prompts();
    assert!(prompts[0].contains("(no previous messages)"));
    assert!(prompts[1].contains("User: Which crop did best?\nAssistant: Wheat did best."));
    assert!(prompts[1].contains("Question: And in August?"));
    assert!(!prompts[1].contains("User: And in August?"));
}

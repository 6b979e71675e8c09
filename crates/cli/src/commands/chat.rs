//! `fieldhand chat`: interactive or single-message chat mode.

use std::sync::Arc;
use std::time::Duration;

use fieldhand_agent::{BoundedAgent, ReasoningEngine, project};
use fieldhand_config::AppConfig;
use fieldhand_core::capability::{ChartRenderer, SqlExecutor, WeatherService};
use fieldhand_core::message::{Conversation, Message};
use fieldhand_database::FarmDatabase;
use fieldhand_tools::{OpenWeatherMapClient, SqlQueryGeneratorTool, SvgChartRenderer, farm_registry};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

pub async fn run(message: Option<String>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY        = 'sk-...'   (OpenAI)");
        eprintln!("    AZURE_OPENAI_API_KEY  = '...'      (Azure, with AZURE_OPENAI_API_BASE)");
        eprintln!("    FIELDHAND_API_KEY     = '...'      (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let agent = build_agent(&config).await?;
    let timeout = Duration::from_secs(config.agent.request_timeout_secs);
    let mut conv = Conversation::new("chat");

    if let Some(msg) = message {
        let reply = answer(&agent, &mut conv, &msg, timeout, json).await?;
        println!("{reply}");
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Fieldhand: Farm Data Assistant        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", agent_model(&config));
    println!("  Database:  {}", config.database.path);
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!();
    println!("  Ask about crops, wages or the weather.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if !input.is_empty() {
            eprint!("  ...");
            let reply = answer(&agent, &mut conv, input, timeout, json).await?;
            eprint!("\r     \r");
            println!();
            for line in reply.lines() {
                println!("  Assistant > {line}");
            }
            println!();
        }
        prompt()?;
    }

    println!("\n  Goodbye!\n");
    Ok(())
}

/// Wire the configured provider, database, chart renderer and weather
/// client into a bounded agent.
async fn build_agent(config: &AppConfig) -> Result<BoundedAgent, Box<dyn std::error::Error>> {
    let provider = fieldhand_providers::build_from_config(config)?;
    let model = agent_model(config);

    let db = FarmDatabase::new(&config.database.path, config.database.max_connections).await?;
    let sql: Arc<dyn SqlExecutor> = Arc::new(db);
    let charts: Arc<dyn ChartRenderer> =
        Arc::new(SvgChartRenderer::new(config.charts.output_dir.clone()));
    let weather: Arc<dyn WeatherService> = Arc::new(
        OpenWeatherMapClient::new(config.weather.api_key.clone())
            .with_base_url(config.weather.base_url.clone())
            .with_units(config.weather.units.clone()),
    );

    let generator =
        SqlQueryGeneratorTool::new(provider.clone(), model.clone()).with_max_tokens(config.max_tokens);
    let tools = Arc::new(farm_registry(generator, sql, charts, weather)?);

    let mut engine = ReasoningEngine::new(provider, model)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
    if let Some(path) = &config.agent.instructions_override {
        let instructions = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read instructions {}: {e}", path.display()))?;
        engine = engine.with_instructions(instructions);
    }

    Ok(BoundedAgent::new(engine, tools).with_tool_call_limit(config.agent.tool_call_limit))
}

fn agent_model(config: &AppConfig) -> String {
    fieldhand_providers::resolve_model(config)
}

/// Run one request and record the turn. The assistant side of the history
/// holds only the final answer; a timeout is recorded as its message.
async fn answer(
    agent: &BoundedAgent,
    conv: &mut Conversation,
    input: &str,
    timeout: Duration,
    json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    conv.push(Message::user(input));

    let outcome = tokio::time::timeout(timeout, agent.run(input, conv.history())).await;
    match outcome {
        Ok(result) => {
            let transcript = project(&result);
            conv.push(Message::assistant(result.final_answer.clone()));
            if json {
                Ok(serde_json::to_string_pretty(&transcript)?)
            } else {
                Ok(transcript.to_markdown())
            }
        }
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "Request timed out");
            let notice = timeout_notice(timeout);
            conv.push(Message::assistant(notice.clone()));
            Ok(notice)
        }
    }
}

fn timeout_notice(timeout: Duration) -> String {
    format!(
        "Sorry, answering took longer than {} seconds. Please try again or ask a narrower question.",
        timeout.as_secs()
    )
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_notice_names_the_limit() {
        let notice = timeout_notice(Duration::from_secs(120));
        assert!(notice.contains("120 seconds"));
    }

    #[test]
    fn default_config_resolves_its_model() {
        let config = AppConfig::default();
        assert_eq!(agent_model(&config), config.model);
    }
}

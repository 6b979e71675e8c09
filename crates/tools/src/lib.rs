//! Farm tools for the Fieldhand agent.
//!
//! The catalog is fixed: generate SQL, run it, chart the rows, check the
//! weather. Each tool wraps one capability from `fieldhand-core` so tests can
//! swap in stubs.

pub mod chart;
pub mod literal;
pub mod sql_execute;
pub mod sql_generate;
pub mod visualize;
pub mod weather;

use fieldhand_core::capability::{ChartRenderer, SqlExecutor, WeatherService};
use fieldhand_core::error::ToolError;
use fieldhand_core::tool::{Tool, ToolRegistry};
use std::sync::Arc;

pub use chart::SvgChartRenderer;
pub use literal::Literal;
pub use sql_execute::SqlExecutorTool;
pub use sql_generate::SqlQueryGeneratorTool;
pub use visualize::DataVisualizerTool;
pub use weather::{OpenWeatherMapClient, WeatherCheckerTool};

pub const SQL_QUERY_GENERATOR: &str = "SQL Query Generator";
pub const SQL_EXECUTOR: &str = "SQL Executor";
pub const DATA_VISUALIZER: &str = "Data Visualizer";
pub const WEATHER_CHECKER: &str = "Weather Checker";

/// The farm tool catalog, in the order the model sees it.
pub fn farm_registry(
    generator: SqlQueryGeneratorTool,
    sql: Arc<dyn SqlExecutor>,
    charts: Arc<dyn ChartRenderer>,
    weather: Arc<dyn WeatherService>,
) -> Result<ToolRegistry, ToolError> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(generator),
        Arc::new(SqlExecutorTool::new(sql)),
        Arc::new(DataVisualizerTool::new(charts)),
        Arc::new(WeatherCheckerTool::new(weather)),
    ];
    ToolRegistry::new(tools)
}

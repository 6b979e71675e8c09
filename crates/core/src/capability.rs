//! Capability traits for the collaborators the farm tools call into.
//!
//! The tools crate wraps these into [`Tool`](crate::tool::Tool)s; concrete
//! implementations live in `fieldhand-database` (SQL) and `fieldhand-tools`
//! (charts, weather). Tests substitute in-memory stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::{DatabaseError, ToolError};

// ── SQL ──────────────────────────────────────────────────────────────────

/// A single cell returned by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// What running a statement produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A row-returning statement.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    /// A statement that modified data or schema.
    Affected { rows_affected: u64 },
}

/// Executes SQL text against the farm database.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> std::result::Result<QueryOutcome, DatabaseError>;
}

// ── Charts ───────────────────────────────────────────────────────────────

/// One bar of a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Renders a bar chart and returns an opaque reference to the image
/// (a filesystem path for the built-in renderer).
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(
        &self,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[ChartPoint],
    ) -> std::result::Result<String, ToolError>;
}

// ── Weather ──────────────────────────────────────────────────────────────

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Temperature (°C)")]
    pub temperature_c: f64,
    #[serde(rename = "Weather")]
    pub conditions: String,
    #[serde(rename = "Humidity (%)")]
    pub humidity_pct: u32,
    #[serde(rename = "Wind Speed (m/s)")]
    pub wind_speed_ms: f64,
}

/// Looks up current weather for a free-text location.
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn lookup(&self, location: &str) -> std::result::Result<WeatherReport, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_report_uses_display_keys() {
        let report = WeatherReport {
            location: "Poznan, PL".into(),
            temperature_c: 18.5,
            conditions: "Light Rain".into(),
            humidity_pct: 81,
            wind_speed_ms: 3.6,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"Temperature (°C)\":18.5"));
        assert!(json.contains("\"Wind Speed (m/s)\":3.6"));
    }

    #[test]
    fn query_outcome_is_tagged() {
        let outcome = QueryOutcome::Affected { rows_affected: 3 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "affected");
        assert_eq!(json["rows_affected"], 3);
    }
}

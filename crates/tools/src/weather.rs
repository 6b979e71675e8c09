//! Weather Checker: current conditions from OpenWeatherMap.

use async_trait::async_trait;
use fieldhand_core::capability::{WeatherReport, WeatherService};
use fieldhand_core::error::ToolError;
use fieldhand_core::tool::Tool;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::WEATHER_CHECKER;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// HTTP client for the OpenWeatherMap current-weather endpoint.
pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    units: String,
}

impl OpenWeatherMapClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            units: "metric".into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: WEATHER_CHECKER.into(),
        reason: reason.into(),
    }
}

#[async_trait]
impl WeatherService for OpenWeatherMapClient {
    async fn lookup(&self, location: &str) -> Result<WeatherReport, ToolError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            failed("OpenWeatherMap API key not found. Set OPENWEATHERMAP_API_KEY or [weather] api_key.")
        })?;

        debug!(location, "Fetching weather");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", location), ("appid", api_key), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|e| failed(format!("HTTP error occurred: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP error occurred: {status} {body}")));
        }

        let payload: OwmResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("Unexpected weather payload: {e}")))?;
        payload.into_report()
    }
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    sys: OwmSys,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

impl OwmResponse {
    fn into_report(self) -> Result<WeatherReport, ToolError> {
        let description = self
            .weather
            .first()
            .map(|w| w.description.as_str())
            .ok_or_else(|| failed("Weather payload has no conditions"))?;

        Ok(WeatherReport {
            location: format!("{}, {}", self.name, self.sys.country),
            temperature_c: self.main.temp,
            conditions: title_case(description),
            humidity_pct: self.main.humidity,
            wind_speed_ms: self.wind.speed,
        })
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The `Weather Checker` tool over any [`WeatherService`].
pub struct WeatherCheckerTool {
    service: Arc<dyn WeatherService>,
}

impl WeatherCheckerTool {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for WeatherCheckerTool {
    fn name(&self) -> &str {
        WEATHER_CHECKER
    }

    fn description(&self) -> &str {
        "Fetches current weather information for a specified location."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let location = input.trim().trim_matches(|c| c == '"' || c == '\'');
        if location.is_empty() {
            return Err(ToolError::InvalidArguments("Missing location".into()));
        }
        let report = self.service.lookup(location).await?;
        serde_json::to_string(&report).map_err(|e| failed(e.to_string()))
    }
}

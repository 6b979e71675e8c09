//! Data Visualizer: draws a bar chart from `(label, value)` tuples.

use async_trait::async_trait;
use fieldhand_core::capability::{ChartPoint, ChartRenderer};
use fieldhand_core::error::ToolError;
use fieldhand_core::tool::Tool;
use std::sync::Arc;

use crate::DATA_VISUALIZER;
use crate::literal::{self, Literal};

pub const INVALID_DATA: &str = "Invalid data format. Please provide a list of 2-element tuples.";

/// Nudges the model to stop calling tools once the chart exists.
pub const AFTER_CHART_THOUGHT: &str = "I should now return the Final Answer.";

pub struct DataVisualizerTool {
    renderer: Arc<dyn ChartRenderer>,
}

impl DataVisualizerTool {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { renderer }
    }
}

/// Parse `[(label, number), ...]`. `None` means the input is not that shape.
pub fn parse_points(input: &str) -> Option<Vec<ChartPoint>> {
    let value = literal::parse(input.trim()).ok()?;
    let Literal::List(items) = value else {
        return None;
    };
    items
        .iter()
        .map(|item| match item {
            Literal::Tuple(pair) if pair.len() == 2 => Some(ChartPoint {
                label: pair[0].to_plain(),
                value: pair[1].as_f64()?,
            }),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl Tool for DataVisualizerTool {
    fn name(&self) -> &str {
        DATA_VISUALIZER
    }

    fn description(&self) -> &str {
        "Creates bar charts from provided data tuples. Input should be a list of (label, value) tuples."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let Some(points) = parse_points(input) else {
            return Ok(INVALID_DATA.to_string());
        };

        let path = self
            .renderer
            .render("Bar Chart", "Category", "Value", &points)
            .await?;

        Ok(serde_json::json!({
            "chart": path,
            "Thought": AFTER_CHART_THOUGHT,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<Vec<ChartPoint>>>,
    }

    #[async_trait]
    impl ChartRenderer for RecordingRenderer {
        async fn render(
            &self,
            _title: &str,
            _x_label: &str,
            _y_label: &str,
            points: &[ChartPoint],
        ) -> Result<String, ToolError> {
            self.calls.lock().unwrap().push(points.to_vec());
            Ok("temp/bar_chart_test.svg".into())
        }
    }

    #[test]
    fn points_from_tuples() {
        let points = parse_points("[('Wheat', 1500), ('Corn', 1800.5)]").unwrap();
        assert_eq!(
            points,
            vec![
                ChartPoint { label: "Wheat".into(), value: 1500.0 },
                ChartPoint { label: "Corn".into(), value: 1800.5 },
            ]
        );
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_points("[('Wheat', 1500, 3)]").is_none());
        assert!(parse_points("[['Wheat', 1500]]").is_none());
        assert!(parse_points("(('Wheat', 1500),)").is_none());
        assert!(parse_points("[('Wheat', 'lots')]").is_none());
        assert!(parse_points("Wheat 1500").is_none());
        assert_eq!(parse_points("[]"), Some(vec![]));
    }

    #[tokio::test]
    async fn returns_chart_json() {
        let renderer = Arc::new(RecordingRenderer::default());
        let tool = DataVisualizerTool::new(renderer.clone());
        let out = tool.invoke("[('Wheat', 1500), ('Corn', 1800)]").await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["chart"], "temp/bar_chart_test.svg");
        assert_eq!(json["Thought"], AFTER_CHART_THOUGHT);
        assert_eq!(renderer.calls.lock().unwrap()[0].len(), 2);
    }

    #[tokio::test]
    async fn invalid_input_is_an_observation() {
        let renderer = Arc::new(RecordingRenderer::default());
        let tool = DataVisualizerTool::new(renderer.clone());
        assert_eq!(tool.invoke("__import__('os')").await.unwrap(), INVALID_DATA);
        assert!(renderer.calls.lock().unwrap().is_empty());
    }
}

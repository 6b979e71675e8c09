//! SVG bar chart renderer.
//!
//! Charts are written as standalone SVG files named `bar_chart_<uuid>.svg`
//! under the configured output directory.

use async_trait::async_trait;
use fieldhand_core::capability::{ChartPoint, ChartRenderer};
use fieldhand_core::error::ToolError;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::DATA_VISUALIZER;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 140.0;
const BAR_COLOR: &str = "#87ceeb";
const TICKS: usize = 5;

/// Writes bar charts as SVG files.
pub struct SvgChartRenderer {
    output_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl ChartRenderer for SvgChartRenderer {
    async fn render(
        &self,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[ChartPoint],
    ) -> Result<String, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool_name: DATA_VISUALIZER.into(),
            reason,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| failed(format!("{}: {e}", self.output_dir.display())))?;

        let path = self
            .output_dir
            .join(format!("bar_chart_{}.svg", Uuid::new_v4().simple()));
        let svg = render_svg(title, x_label, y_label, points);

        tokio::fs::write(&path, svg)
            .await
            .map_err(|e| failed(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), bars = points.len(), "Chart written");
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Render a bar chart as an SVG document.
pub fn render_svg(title: &str, x_label: &str, y_label: &str, points: &[ChartPoint]) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let finite = points.iter().map(|p| p.value).filter(|v| v.is_finite());
    let max = finite.clone().fold(0.0_f64, f64::max);
    let min = finite.fold(0.0_f64, f64::min);
    let span = if max - min > 0.0 { max - min } else { 1.0 };
    let y_of = |v: f64| MARGIN_TOP + plot_h * (max - v) / span;
    let baseline = y_of(0.0);

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="20">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        escape(title)
    );

    for i in 0..=TICKS {
        let v = min + span * i as f64 / TICKS as f64;
        let y = y_of(v);
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="12">{}</text>"##,
            WIDTH - MARGIN_RIGHT,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            tick_label(v)
        );
    }

    if !points.is_empty() {
        let slot = plot_w / points.len() as f64;
        let bar_w = slot * 0.8;
        for (i, point) in points.iter().enumerate() {
            let value = if point.value.is_finite() { point.value } else { 0.0 };
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let top = y_of(value).min(baseline);
            let height = (y_of(value) - baseline).abs();
            let cx = x + bar_w / 2.0;
            let ly = HEIGHT - MARGIN_BOTTOM + 14.0;
            let _ = writeln!(
                svg,
                r#"<rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{height:.1}" fill="{BAR_COLOR}"><title>{}: {}</title></rect>"#,
                escape(&point.label),
                point.value
            );
            let _ = writeln!(
                svg,
                r#"<text x="{cx:.1}" y="{ly:.1}" text-anchor="end" font-size="12" transform="rotate(-45 {cx:.1} {ly:.1})">{}</text>"#,
                escape(&point.label)
            );
        }
    }

    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{baseline:.1}" x2="{:.1}" y2="{baseline:.1}" stroke="black"/>"#,
        WIDTH - MARGIN_RIGHT
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{:.1}" stroke="black"/>"#,
        HEIGHT - MARGIN_BOTTOM
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">{}</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 12.0,
        escape(x_label)
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{:.1}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {:.1})">{}</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0,
        escape(y_label)
    );
    svg.push_str("</svg>\n");
    svg
}

fn tick_label(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

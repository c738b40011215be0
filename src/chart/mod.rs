//! Chart data: points, per-kind validation, built-in samples and the JSON editor.

mod editor;
pub mod samples;

pub use editor::{ParseStatus, PlotEditor};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Vertical volcano guide at log2 fold-change 0.
pub const FOLD_CHANGE_GUIDE: f64 = 0.0;
/// Horizontal volcano guide at -log10(0.05).
pub const SIGNIFICANCE_GUIDE: f64 = 1.3;

pub const SIGNIFICANT_CATEGORY: &str = "Significant";
pub const CONTROL_CATEGORY: &str = "Control";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Scatter,
    Bar,
    Line,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Scatter, ChartKind::Bar, ChartKind::Line];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Scatter => "Volcano / Scatter",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            ChartKind::Scatter => "Differential Expression",
            ChartKind::Bar => "Quantification",
            ChartKind::Line => "Time Series / Growth",
        }
    }

    pub fn sample(self) -> Vec<ChartPoint> {
        match self {
            ChartKind::Scatter => samples::volcano(),
            ChartKind::Bar => samples::expression(),
            ChartKind::Line => samples::growth(),
        }
    }

    /// Fields a point must carry to be drawn in this kind of chart.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ChartKind::Scatter => &["x", "y"],
            ChartKind::Bar | ChartKind::Line => &["value"],
        }
    }

    fn check(self, index: usize, point: &ChartPoint) -> Result<(), ChartParseError> {
        let missing = self.required_fields().iter().find(|f| match **f {
            "x" => point.x.is_none(),
            "y" => point.y.is_none(),
            "value" => point.value.is_none(),
            _ => false,
        });
        match missing {
            Some(field) => Err(ChartParseError::MissingField {
                index,
                field: (*field).to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One labelled record as typed into the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ChartPoint {
    /// Only the exact category "Significant" counts; anything else, including
    /// "Not Significant" or no category, is drawn in the default color.
    pub fn is_significant(&self) -> bool {
        self.category.as_deref() == Some(SIGNIFICANT_CATEGORY)
    }

    pub fn is_control(&self) -> bool {
        self.category.as_deref() == Some(CONTROL_CATEGORY)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartParseError {
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("chart data must be a JSON array")]
    NotAnArray,
    #[error("point {index}: {message}")]
    InvalidPoint { index: usize, message: String },
    #[error("point {index} is missing \"{field}\"")]
    MissingField { index: usize, field: String },
}

/// Parse editor text into points, validating each against the chart kind.
pub fn parse_points(kind: ChartKind, text: &str) -> Result<Vec<ChartPoint>, ChartParseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ChartParseError::Syntax {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;
    let Value::Array(items) = value else {
        return Err(ChartParseError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let point: ChartPoint =
                serde_json::from_value(item).map_err(|e| ChartParseError::InvalidPoint {
                    index,
                    message: e.to_string(),
                })?;
            kind.check(index, &point)?;
            Ok(point)
        })
        .collect()
}

/// Serialize points the way the editor shows them.
pub fn to_editor_text(points: &[ChartPoint]) -> String {
    serde_json::to_string_pretty(points).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint {
    pub name: String,
    pub value: f64,
    pub control: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub name: String,
    pub value: f64,
}

/// Points projected onto the fields a chart kind actually reads.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Scatter(Vec<ScatterPoint>),
    Bar(Vec<BarPoint>),
    Line(Vec<LinePoint>),
}

impl ChartData {
    pub fn from_points(kind: ChartKind, points: &[ChartPoint]) -> Self {
        match kind {
            ChartKind::Scatter => ChartData::Scatter(
                points
                    .iter()
                    .filter_map(|p| {
                        Some(ScatterPoint {
                            name: p.name.clone(),
                            x: p.x?,
                            y: p.y?,
                            significant: p.is_significant(),
                        })
                    })
                    .collect(),
            ),
            ChartKind::Bar => ChartData::Bar(
                points
                    .iter()
                    .filter_map(|p| {
                        Some(BarPoint {
                            name: p.name.clone(),
                            value: p.value?,
                            control: p.is_control(),
                        })
                    })
                    .collect(),
            ),
            ChartKind::Line => ChartData::Line(
                points
                    .iter()
                    .filter_map(|p| {
                        Some(LinePoint {
                            name: p.name.clone(),
                            value: p.value?,
                        })
                    })
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChartData::Scatter(p) => p.len(),
            ChartData::Bar(p) => p.len(),
            ChartData::Line(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

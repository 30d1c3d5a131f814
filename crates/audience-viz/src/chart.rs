//! Renderer-neutral chart descriptions.
//!
//! A [`ChartSpec`] carries everything a renderer needs (kind, axis labels,
//! categories, series values and colours) and nothing it would have to
//! compute. Values are copied verbatim from an analysis result; `None`
//! marks a cell with no data.

use serde::{Deserialize, Serialize};

/// What kind of chart a spec describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Categories are rows, series are columns, values are cell intensities.
    Heatmap,
    GroupedBar,
    HorizontalBar,
    Line,
    /// One series; each category is a slice.
    Pie,
    /// Free text lines, no series.
    Summary,
    /// A grid of nested panels.
    Composite,
}

/// One named sequence of values aligned with [`ChartSpec::categories`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    /// Hex colour such as `"#1f77b4"`, or `None` to let the renderer choose.
    pub color: Option<String>,
    pub values: Vec<Option<f64>>,
}

/// Panel grid of a [`ChartKind::Composite`] chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: u16,
    pub columns: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    /// Per-category colours, used by pie charts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_colors: Vec<String>,
    #[serde(default)]
    pub series: Vec<Series>,
    /// Text lines of a summary panel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridLayout>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<ChartSpec>,
}

impl ChartSpec {
    /// An empty chart of `kind`; builders fill in the rest.
    pub fn new(id: &str, title: &str, kind: ChartKind) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            x_label: String::new(),
            y_label: String::new(),
            categories: Vec::new(),
            category_colors: Vec::new(),
            series: Vec::new(),
            text: Vec::new(),
            grid: None,
            panels: Vec::new(),
        }
    }

    pub fn with_axes(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    /// `true` when no series holds a single value.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            ChartKind::Summary => self.text.is_empty(),
            ChartKind::Composite => self.panels.iter().all(ChartSpec::is_empty),
            _ => self
                .series
                .iter()
                .all(|s| s.values.iter().all(Option::is_none)),
        }
    }

    /// Value of `series` at `category`, if both exist and the cell has data.
    pub fn value(&self, series: &str, category: &str) -> Option<f64> {
        let idx = self.categories.iter().position(|c| c == category)?;
        self.series
            .iter()
            .find(|s| s.name == series)?
            .values
            .get(idx)
            .copied()
            .flatten()
    }
}

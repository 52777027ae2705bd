// Chart descriptions handed to the browser.
//
// Figures serialize to the JSON shape plotly.js accepts in
// `Plotly.newPlot(el, data, layout)`, so the page only has to pass them
// through.

use crate::aggregate::PivotMatrix;
use crate::types::Month;
use chrono::NaiveDate;
use serde::Serialize;

pub const BLUE: &str = "#1f77b4";
pub const GREEN: &str = "#2ca02c";
pub const ORANGE: &str = "#ff7f0e";

/// Plotly's G10 qualitative palette, cycled over stacked series.
pub const G10: [&str; 10] = [
    "#3366CC", "#DC3912", "#FF9900", "#109618", "#990099", "#0099C6", "#DD4477", "#66AA00",
    "#B82E2E", "#316395",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Axis {
    Labels(Vec<String>),
    Numbers(Vec<f64>),
    Dates(Vec<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Axis,
    pub y: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl Trace {
    fn new(kind: &'static str, x: Axis, y: Axis) -> Self {
        Self {
            kind,
            x,
            y,
            name: None,
            mode: None,
            orientation: None,
            opacity: None,
            marker: None,
        }
    }

    fn color(mut self, color: &str) -> Self {
        self.marker = Some(Marker {
            color: color.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: &str) -> Self {
        Title {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: AxisLayout,
    pub yaxis: AxisLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
}

impl Layout {
    fn new(title: &str, x_title: &str, y_title: &str) -> Self {
        Layout {
            title: Title::new(title),
            xaxis: AxisLayout {
                title: Title::new(x_title),
            },
            yaxis: AxisLayout {
                title: Title::new(y_title),
            },
            barmode: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Bar chart over `(label, value)` pairs. Horizontal bars put the labels on
/// the y axis.
pub fn bar_chart(
    title: &str,
    bars: &[(String, f64)],
    orientation: Orientation,
    color: &str,
    value_title: &str,
    label_title: &str,
) -> Figure {
    let labels = Axis::Labels(bars.iter().map(|(l, _)| l.clone()).collect());
    let values = Axis::Numbers(bars.iter().map(|(_, v)| *v).collect());
    let (trace, layout) = match orientation {
        Orientation::Vertical => (
            Trace::new("bar", labels, values),
            Layout::new(title, label_title, value_title),
        ),
        Orientation::Horizontal => (
            Trace::new("bar", values, labels),
            Layout::new(title, value_title, label_title),
        ),
    };
    let mut trace = trace.color(color);
    trace.orientation = Some(orientation);
    Figure {
        data: vec![trace],
        layout,
    }
}

/// One line per column of a month-indexed matrix.
pub fn line_chart(
    title: &str,
    matrix: &PivotMatrix<Month, String, f64>,
    x_title: &str,
    y_title: &str,
) -> Figure {
    let x: Vec<NaiveDate> = matrix.rows.iter().map(|m| m.start()).collect();
    let data = matrix
        .columns
        .iter()
        .enumerate()
        .map(|(ci, series)| {
            let mut trace = Trace::new(
                "scatter",
                Axis::Dates(x.clone()),
                Axis::Numbers(matrix.column_values(ci)),
            );
            trace.mode = Some("lines");
            trace.name = Some(series.clone());
            trace
        })
        .collect();
    Figure {
        data,
        layout: Layout::new(title, x_title, y_title),
    }
}

pub fn scatter_chart(
    title: &str,
    points: &[(f64, f64)],
    opacity: f64,
    x_title: &str,
    y_title: &str,
) -> Figure {
    let mut trace = Trace::new(
        "scatter",
        Axis::Numbers(points.iter().map(|p| p.0).collect()),
        Axis::Numbers(points.iter().map(|p| p.1).collect()),
    );
    trace.mode = Some("markers");
    trace.opacity = Some(opacity);
    Figure {
        data: vec![trace],
        layout: Layout::new(title, x_title, y_title),
    }
}

/// Stacked bars: one bar per matrix row, one stacked segment per column.
pub fn stacked_bar_chart(
    title: &str,
    matrix: &PivotMatrix<String, String, f64>,
    palette: &[&str],
    x_title: &str,
    y_title: &str,
) -> Figure {
    let data = matrix
        .columns
        .iter()
        .enumerate()
        .map(|(ci, series)| {
            let mut trace = Trace::new(
                "bar",
                Axis::Labels(matrix.rows.clone()),
                Axis::Numbers(matrix.column_values(ci)),
            );
            trace.name = Some(series.clone());
            match palette.get(ci % palette.len().max(1)) {
                Some(color) => trace.color(color),
                None => trace,
            }
        })
        .collect();
    let mut layout = Layout::new(title, x_title, y_title);
    layout.barmode = Some("stack");
    Figure { data, layout }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn horizontal_bar_puts_labels_on_y() {
        let fig = bar_chart(
            "Top 10 Products by Sales",
            &[("B".to_string(), 200.0), ("A".to_string(), 100.0)],
            Orientation::Horizontal,
            BLUE,
            "Sales",
            "",
        );
        let v = serde_json::to_value(&fig).unwrap();
        assert_eq!(
            v["data"][0],
            json!({
                "type": "bar",
                "x": [200.0, 100.0],
                "y": ["B", "A"],
                "orientation": "h",
                "marker": {"color": "#1f77b4"}
            })
        );
        assert_eq!(v["layout"]["title"]["text"], "Top 10 Products by Sales");
        assert_eq!(v["layout"]["xaxis"]["title"]["text"], "Sales");
        assert!(v["layout"].get("barmode").is_none());
    }

    #[test]
    fn vertical_bar_puts_labels_on_x() {
        let fig = bar_chart(
            "Sales by Region",
            &[("East".to_string(), 1.0)],
            Orientation::Vertical,
            ORANGE,
            "Sales",
            "Region",
        );
        assert_eq!(fig.data[0].x, Axis::Labels(vec!["East".to_string()]));
        assert_eq!(fig.layout.xaxis.title.text, "Region");
        assert_eq!(fig.layout.yaxis.title.text, "Sales");
    }

    #[test]
    fn line_chart_has_one_series_per_column() {
        let jan = Month::of(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        let feb = Month::of(NaiveDate::from_ymd_opt(2023, 2, 3).unwrap());
        let matrix = PivotMatrix {
            rows: vec![jan, feb],
            columns: vec!["East".to_string(), "West".to_string()],
            cells: vec![vec![100.0, 0.0], vec![0.0, 200.0]],
        };
        let fig = line_chart("Monthly Sales by Region", &matrix, "Month", "Sales");
        let v = serde_json::to_value(fig).unwrap();
        assert_eq!(v["data"].as_array().unwrap().len(), 2);
        assert_eq!(v["data"][1]["name"], "West");
        assert_eq!(v["data"][1]["mode"], "lines");
        assert_eq!(v["data"][1]["x"], json!(["2023-01-01", "2023-02-01"]));
        assert_eq!(v["data"][1]["y"], json!([0.0, 200.0]));
    }

    #[test]
    fn scatter_carries_opacity() {
        let points = [(0.2, -5.0), (0.0, 3.0)];
        let fig = scatter_chart("Discount vs Profit", &points, 0.6, "Discount", "Profit");
        let trace = &fig.data[0];
        assert_eq!(trace.opacity, Some(0.6));
        assert_eq!(trace.mode, Some("markers"));
        assert_eq!(trace.x, Axis::Numbers(vec![0.2, 0.0]));
        assert_eq!(trace.y, Axis::Numbers(vec![-5.0, 3.0]));
    }

    #[test]
    fn stacked_bars_cycle_the_palette() {
        let columns: Vec<String> = (0..12).map(|i| format!("S{i}")).collect();
        let matrix = PivotMatrix {
            rows: vec!["Furniture".to_string()],
            cells: vec![vec![1.0; columns.len()]],
            columns,
        };
        let stacked = |palette: &[&str]| {
            stacked_bar_chart("Sales by Category", &matrix, palette, "Category", "Sales")
        };
        let fig = stacked(&G10);
        assert_eq!(fig.layout.barmode, Some("stack"));
        assert_eq!(fig.data.len(), 12);
        assert_eq!(fig.data[10].marker.as_ref().unwrap().color, G10[0]);
        assert_eq!(fig.data[3].name.as_deref(), Some("S3"));

        let plain = stacked(&[]);
        assert!(plain.data.iter().all(|t| t.marker.is_none()));
    }
}

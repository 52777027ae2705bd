use crate::aggregate::PivotMatrix;
use crate::reports::DashboardView;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a matrix with the row labels in the first column.
pub fn write_pivot_csv<R, C>(
    path: &Path,
    corner: &str,
    matrix: &PivotMatrix<R, C, f64>,
) -> Result<()>
where
    R: Display,
    C: Display,
{
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut header = vec![corner.to_string()];
    header.extend(matrix.columns.iter().map(|c| c.to_string()));
    wtr.write_record(&header)?;
    for (label, cells) in matrix.rows.iter().zip(&matrix.cells) {
        let mut record = vec![label.to_string()];
        record.extend(cells.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Self-contained page that lays the view out with plotly.js.
pub fn write_html(path: &Path, view: &DashboardView) -> Result<()> {
    std::fs::write(path, render_html(view)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn render_html(view: &DashboardView) -> Result<String> {
    // `</` would end the inline script early.
    let json = serde_json::to_string(view)?.replace("</", "<\\/");
    let title = escape_html(&view.title);
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
<style>
body {{ font-family: sans-serif; margin: 0 auto; max-width: 1400px; padding: 1rem 2rem; }}
.kpis {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 1rem; }}
.kpi {{ border: 1px solid #ddd; border-radius: 6px; padding: 1rem; }}
.kpi .label {{ color: #666; font-size: 0.9rem; }}
.kpi .value {{ font-size: 1.8rem; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(480px, 1fr)); gap: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div id="dashboard"></div>
<script>
const view = {json};
const root = document.getElementById("dashboard");
const header = (text) => {{ const h = document.createElement("h2"); h.textContent = text; root.appendChild(h); }};
header(view.kpi_header);
const kpis = document.createElement("div");
kpis.className = "kpis";
for (const k of view.kpis) {{
  const tile = document.createElement("div");
  tile.className = "kpi";
  const label = document.createElement("div");
  label.className = "label";
  label.textContent = k.label;
  const value = document.createElement("div");
  value.className = "value";
  value.textContent = k.value;
  tile.append(label, value);
  kpis.appendChild(tile);
}}
root.appendChild(kpis);
for (const section of view.sections) {{
  header(section.header);
  const grid = document.createElement("div");
  grid.className = "grid";
  root.appendChild(grid);
  for (const panel of section.panels) {{
    const el = document.createElement("div");
    el.id = panel.id;
    grid.appendChild(el);
    Plotly.newPlot(el, panel.figure.data, panel.figure.layout, {{ responsive: true }});
  }}
}}
</script>
</body>
</html>
"#
    ))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::Kpi;
    use crate::types::RegionRow;

    fn view(title: &str) -> DashboardView {
        DashboardView {
            title: title.to_string(),
            kpi_header: "Key Performance Indicators".to_string(),
            kpis: vec![Kpi {
                label: "Total Sales".to_string(),
                value: "$1.00".to_string(),
            }],
            sections: Vec::new(),
        }
    }

    #[test]
    fn pivot_csv_has_label_column_and_dense_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("category_sales.csv");
        let matrix = PivotMatrix {
            rows: vec!["Furniture".to_string(), "Technology".to_string()],
            columns: vec!["Chairs".to_string(), "Phones".to_string()],
            cells: vec![vec![100.0, 0.0], vec![0.0, 200.5]],
        };
        write_pivot_csv(&path, "Category", &matrix).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Category,Chairs,Phones\nFurniture,100,0\nTechnology,0,200.5\n"
        );
    }

    #[test]
    fn csv_rows_use_renamed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region_performance.csv");
        let rows = vec![RegionRow {
            region: "East".to_string(),
            sales: "1,000.00".to_string(),
            profit: "-5.00".to_string(),
        }];
        write_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Region,Sales,Profit\nEast,\"1,000.00\",-5.00\n");
    }

    #[test]
    fn html_embeds_view_and_escapes_title() {
        let html = render_html(&view("Sales & <Profit>")).unwrap();
        assert!(html.contains("<title>Sales &amp; &lt;Profit&gt;</title>"));
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("\"kpi_header\":\"Key Performance Indicators\""));
    }

    #[test]
    fn html_cannot_close_its_own_script() {
        let html = render_html(&view("</script><script>alert(1)")).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn json_is_written_pretty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &view("t")).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["kpis"][0]["value"], "$1.00");
    }
}

use crate::aggregate::{group_sum, pivot, top_n, GroupRow, GroupTable, PivotMatrix};
use crate::charts::{
    bar_chart, line_chart, scatter_chart, stacked_bar_chart, Figure, Orientation, BLUE, G10,
    GREEN, ORANGE,
};
use crate::error::AggregateError;
use crate::types::{Dataset, Measure, Month, ProductRow, RegionRow, SummaryStats, Totals};
use crate::util::{format_currency, format_number, format_percent};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use tracing::{debug, warn};

const PERFORMANCE: [Measure; 2] = [Measure::Sales, Measure::Profit];

/// One render pass over a loaded dataset.
///
/// Each aggregate is computed on first use and reused for the rest of the
/// pass. A new pass starts from scratch.
pub struct Dashboard<'a> {
    dataset: &'a Dataset,
    top_n: usize,
    totals: OnceCell<Totals>,
    products: OnceCell<GroupTable<String>>,
    regions: OnceCell<GroupTable<String>>,
    monthly: OnceCell<PivotMatrix<Month, String, f64>>,
    categories: OnceCell<PivotMatrix<String, String, f64>>,
}

impl<'a> Dashboard<'a> {
    pub fn new(dataset: &'a Dataset, top_n: usize) -> Self {
        Self {
            dataset,
            top_n,
            totals: OnceCell::new(),
            products: OnceCell::new(),
            regions: OnceCell::new(),
            monthly: OnceCell::new(),
            categories: OnceCell::new(),
        }
    }

    pub fn totals(&self) -> &Totals {
        self.totals
            .get_or_init(|| crate::aggregate::totals(self.dataset.records()))
    }

    pub fn product_performance(&self) -> &GroupTable<String> {
        self.products.get_or_init(|| {
            let table = group_sum(
                self.dataset.records(),
                |t| t.product_name.clone(),
                &PERFORMANCE,
            );
            debug!("Product performance: {} products", table.len());
            table
        })
    }

    pub fn top_sales(&self) -> Result<Vec<GroupRow<String>>, AggregateError> {
        top_n(self.product_performance(), Measure::Sales, self.top_n)
    }

    pub fn top_profit(&self) -> Result<Vec<GroupRow<String>>, AggregateError> {
        top_n(self.product_performance(), Measure::Profit, self.top_n)
    }

    pub fn region_performance(&self) -> &GroupTable<String> {
        self.regions.get_or_init(|| {
            let table = group_sum(self.dataset.records(), |t| t.region.clone(), &PERFORMANCE);
            debug!("Region performance: {} regions", table.len());
            table
        })
    }

    pub fn monthly_region_sales(&self) -> &PivotMatrix<Month, String, f64> {
        self.monthly.get_or_init(|| {
            let m = pivot(
                self.dataset.records(),
                |t| Month::of(t.order_date),
                |t| t.region.clone(),
                |t| t.sales,
            );
            debug!(
                "Monthly sales: {} months x {} regions",
                m.rows.len(),
                m.columns.len()
            );
            m
        })
    }

    pub fn category_sales(&self) -> &PivotMatrix<String, String, f64> {
        self.categories.get_or_init(|| {
            let m = pivot(
                self.dataset.records(),
                |t| t.category.clone(),
                |t| t.sub_category.clone(),
                |t| t.sales,
            );
            debug!(
                "Category sales: {} categories x {} sub-categories",
                m.rows.len(),
                m.columns.len()
            );
            m
        })
    }

    /// `(discount, profit)` per transaction, in file order.
    pub fn discount_profit(&self) -> Vec<(f64, f64)> {
        self.dataset
            .records()
            .iter()
            .map(|t| (t.discount, t.profit))
            .collect()
    }

    pub fn product_rows(&self) -> Vec<ProductRow> {
        product_rows(self.product_performance().rows())
    }

    pub fn top_sales_rows(&self) -> Result<Vec<ProductRow>, AggregateError> {
        Ok(product_rows(&self.top_sales()?))
    }

    pub fn region_rows(&self) -> Vec<RegionRow> {
        self.region_performance()
            .rows()
            .iter()
            .map(|r| RegionRow {
                region: r.key.clone(),
                sales: format_number(r.values[0], 2),
                profit: format_number(r.values[1], 2),
            })
            .collect()
    }

    pub fn summary(&self) -> SummaryStats {
        let totals = self.totals();
        SummaryStats {
            source: self.dataset.source().display().to_string(),
            total_rows: self.dataset.len(),
            total_products: self.product_performance().len(),
            total_regions: self.region_performance().len(),
            total_sales: totals.sales,
            total_profit: totals.profit,
            profit_margin: totals.margin_pct().ok(),
        }
    }

    /// Build the complete page description: KPI tiles and every chart.
    pub fn render(&self, title: &str) -> Result<DashboardView, AggregateError> {
        let totals = self.totals();
        let kpis = vec![
            Kpi::new("Total Sales", format_currency(totals.sales)),
            Kpi::new("Total Profit", format_currency(totals.profit)),
            Kpi::new("Profit Margin", margin_tile(totals)),
        ];

        let n = self.top_n;
        let products = Section::new(
            "Product Insights",
            vec![
                Panel::new(
                    "top-sales",
                    bar_chart(
                        &format!("Top {n} Products by Sales"),
                        &bars(&self.top_sales()?, 0),
                        Orientation::Horizontal,
                        BLUE,
                        "Sales",
                        "",
                    ),
                ),
                Panel::new(
                    "top-profit",
                    bar_chart(
                        &format!("Top {n} Products by Profit"),
                        &bars(&self.top_profit()?, 1),
                        Orientation::Horizontal,
                        GREEN,
                        "Profit",
                        "",
                    ),
                ),
            ],
        );

        let regional = Section::new(
            "Regional Performance",
            vec![
                Panel::new(
                    "region-sales",
                    bar_chart(
                        "Sales by Region",
                        &bars(self.region_performance().rows(), 0),
                        Orientation::Vertical,
                        ORANGE,
                        "Sales",
                        "Region",
                    ),
                ),
                Panel::new(
                    "monthly-region-sales",
                    line_chart(
                        "Monthly Sales by Region",
                        self.monthly_region_sales(),
                        "Month",
                        "Sales",
                    ),
                ),
            ],
        );

        let category = Section::new(
            "Category Insights",
            vec![Panel::new(
                "category-sales",
                stacked_bar_chart(
                    "Sales by Category and Sub-Category",
                    self.category_sales(),
                    &G10,
                    "Category",
                    "Sales",
                ),
            )],
        );

        let discount = Section::new(
            "Discount vs Profit Impact",
            vec![Panel::new(
                "discount-profit",
                scatter_chart(
                    "Discount vs Profit",
                    &self.discount_profit(),
                    0.6,
                    "Discount",
                    "Profit",
                ),
            )],
        );

        Ok(DashboardView {
            title: title.to_string(),
            kpi_header: "Key Performance Indicators".to_string(),
            kpis,
            sections: vec![products, regional, category, discount],
        })
    }
}

/// Zero total sales has no margin; the tile shows `N/A` instead.
fn margin_tile(totals: &Totals) -> String {
    match totals.margin_pct() {
        Ok(pct) => format_percent(pct),
        Err(e) => {
            warn!("{}", e);
            "N/A".to_string()
        }
    }
}

fn product_rows(rows: &[GroupRow<String>]) -> Vec<ProductRow> {
    rows.iter()
        .map(|r| ProductRow {
            product_name: r.key.clone(),
            sales: format_number(r.values[0], 2),
            profit: format_number(r.values[1], 2),
        })
        .collect()
}

fn bars(rows: &[GroupRow<String>], column: usize) -> Vec<(String, f64)> {
    rows.iter()
        .map(|r| (r.key.clone(), r.values[column]))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
}

impl Kpi {
    fn new(label: &str, value: String) -> Self {
        Kpi {
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub id: String,
    pub figure: Figure,
}

impl Panel {
    fn new(id: &str, figure: Figure) -> Self {
        Panel {
            id: id.to_string(),
            figure,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub header: String,
    pub panels: Vec<Panel>,
}

impl Section {
    fn new(header: &str, panels: Vec<Panel>) -> Self {
        Section {
            header: header.to_string(),
            panels,
        }
    }
}

/// Everything the page needs, already laid out in display order.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub kpi_header: String,
    pub kpis: Vec<Kpi>,
    pub sections: Vec<Section>,
}

impl DashboardView {
    pub fn panel_count(&self) -> usize {
        self.sections.iter().map(|s| s.panels.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Axis;
    use crate::types::Transaction;
    use chrono::NaiveDate;

    fn tx(
        product: &str,
        region: &str,
        date: (i32, u32, u32),
        sales: f64,
        profit: f64,
    ) -> Transaction {
        Transaction {
            order_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            product_name: product.to_string(),
            category: "Office Supplies".to_string(),
            sub_category: "Paper".to_string(),
            region: region.to_string(),
            sales,
            profit,
            discount: 0.1,
        }
    }

    fn scenario() -> Dataset {
        Dataset::new(
            "superstore.csv",
            vec![
                tx("A", "East", (2023, 1, 1), 100.0, 20.0),
                tx("B", "West", (2023, 2, 1), 200.0, -10.0),
            ],
        )
    }

    #[test]
    fn renders_kpis_and_six_panels() {
        let ds = scenario();
        let view = Dashboard::new(&ds, 10)
            .render("GlobalMart Profitability Dashboard")
            .unwrap();

        let kpis: Vec<(&str, &str)> = view
            .kpis
            .iter()
            .map(|k| (k.label.as_str(), k.value.as_str()))
            .collect();
        assert_eq!(
            kpis,
            vec![
                ("Total Sales", "$300.00"),
                ("Total Profit", "$10.00"),
                ("Profit Margin", "3.33%"),
            ]
        );
        assert_eq!(view.panel_count(), 6);
        let headers: Vec<&str> = view.sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(
            headers,
            vec![
                "Product Insights",
                "Regional Performance",
                "Category Insights",
                "Discount vs Profit Impact"
            ]
        );
    }

    #[test]
    fn top_sales_panel_lists_products_descending() {
        let ds = scenario();
        let view = Dashboard::new(&ds, 10).render("t").unwrap();
        let top_sales = &view.sections[0].panels[0].figure;
        assert_eq!(top_sales.layout.title.text, "Top 10 Products by Sales");
        assert_eq!(
            top_sales.data[0].y,
            Axis::Labels(vec!["B".to_string(), "A".to_string()])
        );
        let top_profit = &view.sections[0].panels[1].figure;
        assert_eq!(
            top_profit.data[0].y,
            Axis::Labels(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn top_n_setting_limits_rankings() {
        let ds = scenario();
        let dash = Dashboard::new(&ds, 1);
        assert_eq!(dash.top_sales().unwrap().len(), 1);
        assert_eq!(dash.top_sales().unwrap()[0].key, "B");
        assert_eq!(dash.top_profit().unwrap()[0].key, "A");
        let rows = dash.top_sales_rows().unwrap();
        assert_eq!(rows[0].product_name, "B");
        assert_eq!(rows[0].sales, "200.00");
    }

    #[test]
    fn zero_sales_renders_margin_as_not_available() {
        let ds = Dataset::new("empty.csv", Vec::new());
        let dash = Dashboard::new(&ds, 10);
        let view = dash.render("t").unwrap();
        assert_eq!(view.kpis[2].value, "N/A");
        assert_eq!(dash.summary().profit_margin, None);
        assert_eq!(view.panel_count(), 6);
    }

    #[test]
    fn zero_sales_with_profit_still_renders() {
        let ds = Dataset::new(
            "superstore.csv",
            vec![
                tx("A", "East", (2023, 1, 1), 0.0, 5.0),
                tx("B", "West", (2023, 1, 2), 0.0, -2.0),
            ],
        );
        let dash = Dashboard::new(&ds, 10);
        assert_eq!(
            dash.totals().margin_pct(),
            Err(AggregateError::DivisionByZero)
        );
        let view = dash.render("t").unwrap();
        assert_eq!(view.kpis[1].value, "$3.00");
        assert_eq!(view.kpis[2].value, "N/A");

        let summary = serde_json::to_value(dash.summary()).unwrap();
        assert!(summary["profit_margin"].is_null());
    }

    #[test]
    fn margin_tile_formats_defined_margins() {
        let totals = Totals {
            sales: 300.0,
            profit: 10.0,
            margin: Some(10.0 / 300.0 * 100.0),
        };
        assert_eq!(margin_tile(&totals), "3.33%");
    }

    #[test]
    fn tables_and_summary_reflect_dataset() {
        let ds = scenario();
        let dash = Dashboard::new(&ds, 10);
        let regions = dash.region_rows();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].region, "West");
        assert_eq!(regions[1].profit, "-10.00");

        let summary = dash.summary();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_regions, 2);
        assert_eq!(summary.total_sales, 300.0);
        assert_eq!(summary.source, "superstore.csv");

        assert_eq!(dash.monthly_region_sales().cells, vec![vec![100.0, 0.0], vec![0.0, 200.0]]);
        assert_eq!(dash.category_sales().cells, vec![vec![300.0]]);
        assert_eq!(dash.discount_profit(), vec![(0.1, 20.0), (0.1, -10.0)]);
    }

    #[test]
    fn separate_passes_render_identically() {
        let ds = scenario();
        let render = || serde_json::to_value(Dashboard::new(&ds, 10).render("t").unwrap()).unwrap();
        assert_eq!(render(), render());
    }

    #[test]
    fn aggregates_are_cached_within_a_pass() {
        let ds = scenario();
        let dash = Dashboard::new(&ds, 10);
        assert!(std::ptr::eq(dash.product_performance(), dash.product_performance()));
        assert!(std::ptr::eq(dash.totals(), dash.totals()));
    }
}

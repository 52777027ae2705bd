use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tabled::Tabled;

/// Columns the loader insists on. Anything else in the file is ignored.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Order Date",
    "Sales",
    "Profit",
    "Discount",
    "Product Name",
    "Category",
    "Sub-Category",
    "Region",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Order Date")]
    pub order_date: Option<String>,
    #[serde(rename = "Product Name")]
    pub product_name: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Sub-Category")]
    pub sub_category: Option<String>,
    #[serde(rename = "Region")]
    pub region: Option<String>,
    #[serde(rename = "Sales")]
    pub sales: Option<String>,
    #[serde(rename = "Profit")]
    pub profit: Option<String>,
    #[serde(rename = "Discount")]
    pub discount: Option<String>,
}

/// One retail transaction, immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub order_date: NaiveDate,
    pub product_name: String,
    pub category: String,
    pub sub_category: String,
    pub region: String,
    pub sales: f64,
    pub profit: f64,
    pub discount: f64,
}

/// The loaded input. Built once at startup and only ever lent out by
/// shared reference afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    records: Vec<Transaction>,
}

impl Dataset {
    pub fn new(source: impl Into<PathBuf>, records: Vec<Transaction>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Numeric column of a transaction that can be summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Sales,
    Profit,
}

impl Measure {
    pub fn of(self, t: &Transaction) -> f64 {
        match self {
            Measure::Sales => t.sales,
            Measure::Profit => t.profit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Measure::Sales => "Sales",
            Measure::Profit => "Profit",
        }
    }
}

/// Calendar month, represented by its first day so it orders and
/// serializes like a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Month(NaiveDate);

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Month(date - Days::new(u64::from(date.day0())))
    }

    pub fn start(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub sales: f64,
    pub profit: f64,
    /// Profit as a percentage of sales; `None` when sales sum to zero.
    pub margin: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductRow {
    #[serde(rename = "Product Name")]
    #[tabled(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Sales")]
    #[tabled(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Sales")]
    #[tabled(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub source: String,
    pub total_rows: usize,
    pub total_products: usize,
    pub total_regions: usize,
    pub total_sales: f64,
    pub total_profit: f64,
    pub profit_margin: Option<f64>,
}

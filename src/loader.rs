use crate::error::LoadError;
use crate::types::{Dataset, RawRow, Transaction, REQUIRED_COLUMNS};
use crate::util::{parse_date_safe, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Character encodings the loader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Latin1,
    Utf8,
}

impl Encoding {
    /// Resolve a user-facing label such as `ISO-8859-1` or `utf8`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" | "cp819" => {
                Some(Encoding::Latin1)
            }
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Utf8 => "UTF-8",
        }
    }

    fn decode(self, path: &Path, bytes: Vec<u8>) -> Result<String, LoadError> {
        match self {
            // Every Latin-1 byte maps to the code point with the same value.
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
            Encoding::Utf8 => {
                let body = match bytes.strip_prefix(UTF8_BOM) {
                    Some(rest) => rest.to_vec(),
                    None => bytes,
                };
                String::from_utf8(body).map_err(|e| LoadError::Encoding {
                    path: path.to_path_buf(),
                    encoding: self.name(),
                    offset: e.utf8_error().valid_up_to(),
                })
            }
        }
    }
}

/// Read `path`, decode it as `encoding` and parse every row into a
/// [`Transaction`]. Any bad row aborts the load.
pub fn load(path: impl AsRef<Path>, encoding: &str) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let enc = Encoding::from_label(encoding).ok_or_else(|| LoadError::UnsupportedEncoding {
        path: path.to_path_buf(),
        name: encoding.to_string(),
    })?;

    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    let text = enc.decode(path, bytes)?;

    let records = parse_transactions(path, &text)?;
    info!(
        "Loaded {} transactions from {} ({})",
        records.len(),
        path.display(),
        enc.name()
    );
    Ok(Dataset::new(path, records))
}

fn parse_transactions(path: &Path, text: &str) -> Result<Vec<Transaction>, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = rdr.headers().map_err(csv_err)?.clone();
    check_schema(path, &headers)?;

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
        out.push(RowParser { path, line }.transaction(raw)?);
    }
    Ok(out)
}

fn check_schema(path: &Path, headers: &StringRecord) -> Result<(), LoadError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Schema {
            path: path.to_path_buf(),
            missing,
        })
    }
}

/// Field conversions for one CSV line, so every failure can name its
/// location.
struct RowParser<'a> {
    path: &'a Path,
    line: u64,
}

impl RowParser<'_> {
    fn transaction(&self, row: RawRow) -> Result<Transaction, LoadError> {
        let order_date = parse_date_safe(row.order_date.as_deref()).ok_or_else(|| {
            self.error("Order Date", row.order_date.as_deref(), "unrecognized date")
        })?;
        let discount = self.number("Discount", row.discount.as_deref())?;
        if !(0.0..=1.0).contains(&discount) {
            return Err(self.error(
                "Discount",
                row.discount.as_deref(),
                "discount must be a fraction between 0 and 1",
            ));
        }
        Ok(Transaction {
            order_date,
            product_name: self.text("Product Name", row.product_name)?,
            category: self.text("Category", row.category)?,
            sub_category: self.text("Sub-Category", row.sub_category)?,
            region: self.text("Region", row.region)?,
            sales: self.number("Sales", row.sales.as_deref())?,
            profit: self.number("Profit", row.profit.as_deref())?,
            discount,
        })
    }

    fn number(&self, column: &'static str, value: Option<&str>) -> Result<f64, LoadError> {
        parse_f64_safe(value).ok_or_else(|| self.error(column, value, "not a number"))
    }

    fn text(&self, column: &'static str, value: Option<String>) -> Result<String, LoadError> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(self.error(column, value.as_deref(), "value is empty")),
        }
    }

    fn error(&self, column: &'static str, value: Option<&str>, reason: &str) -> LoadError {
        LoadError::Parse {
            path: PathBuf::from(self.path),
            line: self.line,
            column,
            value: value.unwrap_or_default().to_string(),
            reason: reason.to_string(),
        }
    }
}

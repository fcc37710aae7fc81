//! Batch configuration
//!
//! A [`RenderConfig`] is built either directly or from a TOML file:
//!
//! ```toml
//! input_dir = "invoices"
//! output_dir = "PDFs"
//! logo = "pythonhow.png"
//! company_name = "PythonHow"
//!
//! [columns]
//! identifier = "product_id"
//! description = "product_name"
//! quantity = "amount_purchased"
//! unit_price = "price_per_unit"
//! total = "total_price"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InvoiceError;

/// Sheet read from every workbook unless configured otherwise
pub const DEFAULT_SHEET: &str = "Sheet 1";

/// Column summed into the totals row unless configured otherwise
pub const DEFAULT_SUM_COLUMN: &str = "total_price";

/// Parameters for one batch run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory scanned for `*.xlsx` files
    pub input_dir: PathBuf,
    /// Directory receiving `{basename}.pdf`
    pub output_dir: PathBuf,
    /// Logo image stamped next to the company name
    pub logo: PathBuf,
    /// Company display name
    pub company_name: String,
    /// Column names looked up for each table cell
    #[serde(default)]
    pub columns: ColumnSelectors,
    /// Worksheet holding the line items
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Column summed for the totals row
    #[serde(default = "default_sum_column")]
    pub sum_column: String,
    /// Stop at the first file that fails instead of collecting failures
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_sheet() -> String {
    DEFAULT_SHEET.to_string()
}

fn default_sum_column() -> String {
    DEFAULT_SUM_COLUMN.to_string()
}

/// The five column names rendered left to right in every item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSelectors {
    pub identifier: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

impl Default for ColumnSelectors {
    fn default() -> Self {
        Self {
            identifier: "product_id".into(),
            description: "product_name".into(),
            quantity: "amount_purchased".into(),
            unit_price: "price_per_unit".into(),
            total: "total_price".into(),
        }
    }
}

impl ColumnSelectors {
    /// Selectors in rendering order
    pub fn as_array(&self) -> [&str; 5] {
        [
            &self.identifier,
            &self.description,
            &self.quantity,
            &self.unit_price,
            &self.total,
        ]
    }
}

impl RenderConfig {
    /// Create a configuration with default columns, sheet and sum column
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        logo: impl Into<PathBuf>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            logo: logo.into(),
            company_name: company_name.into(),
            columns: ColumnSelectors::default(),
            sheet: default_sheet(),
            sum_column: default_sum_column(),
            fail_fast: false,
        }
    }

    /// Replace the column selectors
    pub fn with_columns(mut self, columns: ColumnSelectors) -> Self {
        self.columns = columns;
        self
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::Config`] if the file cannot be read or the
    /// TOML is malformed or missing required fields.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InvoiceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| InvoiceError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, InvoiceError> {
        Self::parse(s, Path::new("<inline>"))
    }

    fn parse(s: &str, origin: &Path) -> Result<Self, InvoiceError> {
        toml::from_str(s).map_err(|e| InvoiceError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

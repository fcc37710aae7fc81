//! Spreadsheet invoices to PDF
//!
//! This crate converts a directory of `.xlsx` invoices into one PDF each:
//! - `source`: find spreadsheets and parse `{invoice_nr}-{date}` file names
//! - `table`: read the line-item sheet with native cell types
//! - `render` / `layout`: place the title, item table, totals and branding
//! - `pdf` / `writer`: encode with lopdf and write `{basename}.pdf`
//! - `batch`: run the whole directory sequentially
//!
//! # Example
//!
//! ```no_run
//! use invoicepdf_core::{InvoiceRenderer, RenderConfig};
//!
//! # fn example() -> Result<(), invoicepdf_core::InvoiceError> {
//! let config = RenderConfig::new("invoices", "PDFs", "pythonhow.png", "PythonHow");
//! let report = InvoiceRenderer::new(config).run()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod layout;
pub mod logo;
pub mod pdf;
pub mod render;
pub mod source;
pub mod table;
pub mod text;
pub mod writer;

pub use batch::{BatchReport, FileFailure, InvoiceRenderer};
pub use config::{ColumnSelectors, RenderConfig};
pub use error::InvoiceError;
pub use layout::LayoutCursor;
pub use logo::LogoImage;
pub use render::{render_invoice, InvoiceDocument};
pub use source::{discover_sources, parse_invoice_stem, InvoiceSource};
pub use table::{load_table, Amount, CellValue, LineItemTable};
pub use writer::write_document;

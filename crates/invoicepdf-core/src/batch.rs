//! Batch driver
//!
//! Processes every spreadsheet in the input directory one after another:
//! parse the filename, load the sheet, lay out the invoice, write the PDF.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::error::InvoiceError;
use crate::logo::LogoImage;
use crate::render::render_invoice;
use crate::source::{discover_sources, InvoiceSource};
use crate::table::load_table;
use crate::writer::write_document;

/// A spreadsheet that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// PDFs written, in processing order
    pub generated: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub processing_time_ms: u64,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Generated {} invoice(s), {} failed",
            self.generated.len(),
            self.failures.len()
        )
    }
}

/// Converts a directory of spreadsheets into PDF invoices
#[derive(Debug, Clone)]
pub struct InvoiceRenderer {
    config: RenderConfig,
}

impl InvoiceRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Run the batch.
    ///
    /// A missing input directory or unusable logo aborts the run. Other
    /// errors are recorded per file and the batch continues, unless
    /// `fail_fast` is set, in which case the first one is returned.
    pub fn run(&self) -> Result<BatchReport, InvoiceError> {
        let started = Instant::now();
        let sources = discover_sources(&self.config.input_dir)?;
        info!(
            "Processing {} spreadsheet(s) from {}",
            sources.len(),
            self.config.input_dir.display()
        );

        let mut report = BatchReport::default();
        if sources.is_empty() {
            return Ok(report);
        }

        let logo = Arc::new(LogoImage::load(&self.config.logo)?);

        for path in sources {
            match self.convert(&path, &logo) {
                Ok(output) => {
                    info!("Generated {}", output.display());
                    report.generated.push(output);
                }
                Err(err) if self.config.fail_fast || err.is_batch_fatal() => {
                    warn!(
                        "Aborting after {} generated invoice(s), {} failed: {}",
                        report.generated.len(),
                        report.failures.len(),
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                    report.failures.push(FileFailure {
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.processing_time_ms = started.elapsed().as_millis() as u64;
        info!("{} in {}ms", report.summary(), report.processing_time_ms);
        Ok(report)
    }

    /// Convert a single spreadsheet, loading the logo for this file alone
    pub fn render_file(&self, path: &Path) -> Result<PathBuf, InvoiceError> {
        let logo = Arc::new(LogoImage::load(&self.config.logo)?);
        self.convert(path, &logo)
    }

    fn convert(&self, path: &Path, logo: &Arc<LogoImage>) -> Result<PathBuf, InvoiceError> {
        let source = InvoiceSource::from_path(path)?;
        debug!(
            "Invoice {} dated {} from {}",
            source.invoice_number,
            source.invoice_date,
            path.display()
        );

        let table = load_table(&source.path, &self.config.sheet)?;
        let document = render_invoice(
            &table,
            &source.invoice_number,
            &source.invoice_date,
            &self.config,
            logo,
        )?;
        write_document(&document, &self.config.output_dir, &source.basename())
    }
}

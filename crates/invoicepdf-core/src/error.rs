use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while turning spreadsheets into invoices.
///
/// Every variant carries the path of the file (or directory) it concerns.
#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Input directory not found: {}: {source}", path.display())]
    DirectoryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unreadable spreadsheet {}: {reason}", path.display())]
    UnreadableSpreadsheet { path: PathBuf, reason: String },

    #[error("Malformed filename {}: expected '<invoice_nr>-<date>', got '{stem}'", path.display())]
    MalformedFilename { path: PathBuf, stem: String },

    #[error("Missing column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Non-numeric value '{value}' in column '{column}' row {row} of {}", path.display())]
    NonNumericTotal {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Cannot write output to {}: {source}", path.display())]
    OutputDirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load logo {}: {reason}", path.display())]
    ImageLoadError { path: PathBuf, reason: String },

    #[error("PDF encoding failed for {}: {reason}", path.display())]
    PdfEncoding { path: PathBuf, reason: String },

    #[error("Invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl InvoiceError {
    /// Path of the file or directory this error refers to
    pub fn path(&self) -> &Path {
        match self {
            InvoiceError::DirectoryNotFound { path, .. }
            | InvoiceError::UnreadableSpreadsheet { path, .. }
            | InvoiceError::MalformedFilename { path, .. }
            | InvoiceError::MissingColumn { path, .. }
            | InvoiceError::NonNumericTotal { path, .. }
            | InvoiceError::OutputDirectoryError { path, .. }
            | InvoiceError::ImageLoadError { path, .. }
            | InvoiceError::PdfEncoding { path, .. }
            | InvoiceError::Config { path, .. } => path,
        }
    }

    /// Errors that make every remaining file fail the same way.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            InvoiceError::DirectoryNotFound { .. } | InvoiceError::ImageLoadError { .. }
        )
    }

    pub(crate) fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        InvoiceError::UnreadableSpreadsheet {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_column(path: &Path, column: &str) -> Self {
        InvoiceError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_path() {
        let err = InvoiceError::missing_column(Path::new("in/1001-2024.xlsx"), "price");
        assert_eq!(
            err.to_string(),
            "Missing column 'price' in in/1001-2024.xlsx"
        );
        assert_eq!(err.path(), Path::new("in/1001-2024.xlsx"));
    }

    #[test]
    fn test_batch_fatal_classification() {
        let logo = InvoiceError::ImageLoadError {
            path: PathBuf::from("logo.png"),
            reason: "missing".into(),
        };
        assert!(logo.is_batch_fatal());

        let sheet = InvoiceError::unreadable(Path::new("a.xlsx"), "bad zip");
        assert!(!sheet.is_batch_fatal());
    }
}

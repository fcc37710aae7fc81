//! Output writer

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InvoiceError;
use crate::render::InvoiceDocument;

/// Path of the PDF generated for `basename`
pub fn output_path(output_dir: &Path, basename: &str) -> PathBuf {
    output_dir.join(format!("{}.pdf", basename))
}

/// Write `document` to `{output_dir}/{basename}.pdf`.
///
/// The directory is created (recursively) when missing and an existing file
/// at the target path is overwritten.
pub fn write_document(
    document: &InvoiceDocument,
    output_dir: &Path,
    basename: &str,
) -> Result<PathBuf, InvoiceError> {
    fs::create_dir_all(output_dir).map_err(|source| InvoiceError::OutputDirectoryError {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let bytes = document.to_pdf_bytes()?;
    let target = output_path(output_dir, basename);
    fs::write(&target, bytes).map_err(|source| InvoiceError::OutputDirectoryError {
        path: target.clone(),
        source,
    })?;

    Ok(target)
}

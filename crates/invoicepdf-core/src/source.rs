//! Input discovery
//!
//! Finds the spreadsheets in the input directory and derives the invoice
//! number and date from each file name.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::InvoiceError;

/// Extension matched during enumeration (case-sensitive)
pub const SPREADSHEET_EXTENSION: &str = "xlsx";

/// Separator between invoice number and date in a file stem
pub const STEM_SEPARATOR: char = '-';

/// One input spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSource {
    pub path: PathBuf,
    pub invoice_number: String,
    pub invoice_date: String,
}

impl InvoiceSource {
    /// Build a source from a spreadsheet path, parsing its file stem
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InvoiceError> {
        let path = path.into();
        let stem = file_stem(&path);
        let (number, date) =
            parse_invoice_stem(&stem).ok_or_else(|| InvoiceError::MalformedFilename {
                path: path.clone(),
                stem: stem.clone(),
            })?;

        Ok(Self {
            invoice_number: number.to_string(),
            invoice_date: date.to_string(),
            path,
        })
    }

    /// File stem, used as the output base name
    pub fn basename(&self) -> String {
        file_stem(&self.path)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split `"{number}-{date}"` on the first separator.
///
/// The date keeps any further hyphens, so `"1001-2024-01-15"` yields
/// `("1001", "2024-01-15")`. Returns `None` unless both parts are non-empty.
pub fn parse_invoice_stem(stem: &str) -> Option<(&str, &str)> {
    let (number, date) = stem.split_once(STEM_SEPARATOR)?;
    if number.is_empty() || date.is_empty() {
        return None;
    }
    Some((number, date))
}

/// List the spreadsheets directly inside `dir`, sorted by file name.
///
/// Only regular files with the exact extension `xlsx` are returned.
/// Office lock files (`~$name.xlsx`) are skipped.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, InvoiceError> {
    let entries = fs::read_dir(dir).map_err(|source| InvoiceError::DirectoryNotFound {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| InvoiceError::DirectoryNotFound {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(SPREADSHEET_EXTENSION) {
            continue;
        }
        if file_stem(&path).starts_with("~$") {
            debug!("Skipping lock file {}", path.display());
            continue;
        }
        paths.push(path);
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} spreadsheet(s) in {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_stem() {
        assert_eq!(
            parse_invoice_stem("10001-2023.1.18"),
            Some(("10001", "2023.1.18"))
        );
    }

    #[test]
    fn test_parse_keeps_hyphenated_date() {
        assert_eq!(
            parse_invoice_stem("1001-2024-01-15"),
            Some(("1001", "2024-01-15"))
        );
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert_eq!(parse_invoice_stem("1001"), None);
        assert_eq!(parse_invoice_stem("-2024"), None);
        assert_eq!(parse_invoice_stem("1001-"), None);
        assert_eq!(parse_invoice_stem(""), None);
    }

    #[test]
    fn test_source_from_path() {
        let source = InvoiceSource::from_path("in/1001-2024-01-01.xlsx").unwrap();
        assert_eq!(source.invoice_number, "1001");
        assert_eq!(source.invoice_date, "2024-01-01");
        assert_eq!(source.basename(), "1001-2024-01-01");
    }

    #[test]
    fn test_source_from_malformed_path() {
        let err = InvoiceSource::from_path("in/summary.xlsx").unwrap_err();
        match err {
            InvoiceError::MalformedFilename { path, stem } => {
                assert_eq!(path, PathBuf::from("in/summary.xlsx"));
                assert_eq!(stem, "summary");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "1002-2024.1.2.xlsx",
            "1001-2024.1.1.xlsx",
            "notes.txt",
            "upper-case.XLSX",
            "~$1001-2024.1.1.xlsx",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested-dir.xlsx")).unwrap();

        let found: Vec<String> = discover_sources(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["1001-2024.1.1.xlsx", "1002-2024.1.2.xlsx"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_sources(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let err = discover_sources(&missing).unwrap_err();
        assert!(matches!(err, InvoiceError::DirectoryNotFound { .. }));
        assert_eq!(err.path(), missing.as_path());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: "{n}-{d}" always splits back into (n, d)
        #[test]
        fn stem_round_trips(number in "[0-9A-Za-z_.]{1,12}", date in "[0-9A-Za-z.\\-]{1,16}") {
            let stem = format!("{}-{}", number, date);
            prop_assert_eq!(parse_invoice_stem(&stem), Some((number.as_str(), date.as_str())));
        }

        /// Property: stems without a separator never parse
        #[test]
        fn stem_without_separator_rejected(stem in "[0-9A-Za-z_.]{0,20}") {
            prop_assert_eq!(parse_invoice_stem(&stem), None);
        }
    }
}

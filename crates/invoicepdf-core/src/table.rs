//! Spreadsheet ingestion
//!
//! Reads the line-item sheet of a workbook into a [`LineItemTable`]. The
//! first row is the header; every non-blank row below it is a line item.
//! Values keep their spreadsheet type until they are displayed.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::InvoiceError;

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Partial sums kept by the unrolled float summation
const SUM_LANES: usize = 8;

/// Longest run summed without splitting in half
const SUM_BLOCK: usize = 128;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// The native value of one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => {
                if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT {
                    CellValue::Int(*f as i64)
                } else {
                    CellValue::Float(*f)
                }
            }
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => CellValue::DateTime(naive),
                None => CellValue::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => f.write_str(&format_float(*v)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// Default decimal form of a float: shortest round-trip digits, integral
/// values keep one decimal, very large or small magnitudes use an exponent.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        // Rust renders "1.5e-5"; the conventional form is "1.5e-05"
        let raw = format!("{:e}", v);
        let (mantissa, exponent) = raw.split_once('e').unwrap_or((&raw, "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(d) => ('-', d),
            None => ('+', exponent),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }

    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Sum of the totals column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Int(i64),
    Float(f64),
}

impl Amount {
    fn add(self, value: &CellValue) -> Self {
        match (self, value) {
            (Amount::Int(acc), CellValue::Int(i)) => match acc.checked_add(*i) {
                Some(sum) => Amount::Int(sum),
                None => Amount::Float(acc as f64 + *i as f64),
            },
            (Amount::Int(acc), CellValue::Float(f)) => Amount::Float(acc as f64 + f),
            (Amount::Float(acc), CellValue::Int(i)) => Amount::Float(acc + *i as f64),
            (Amount::Float(acc), CellValue::Float(f)) => Amount::Float(acc + f),
            (acc, _) => acc,
        }
    }
}

/// Pairwise float summation: a plain loop below eight values, eight running
/// partial sums up to a block of 128, and recursive halving above that.
fn pairwise_sum(values: &[f64]) -> f64 {
    let n = values.len();
    if n < SUM_LANES {
        return values.iter().fold(0.0, |acc, v| acc + v);
    }

    if n <= SUM_BLOCK {
        let mut lanes = [0.0f64; SUM_LANES];
        lanes.copy_from_slice(&values[..SUM_LANES]);
        let unrolled = n - n % SUM_LANES;
        for chunk in values[SUM_LANES..unrolled].chunks_exact(SUM_LANES) {
            for (lane, v) in lanes.iter_mut().zip(chunk) {
                *lane += v;
            }
        }
        let mut total = ((lanes[0] + lanes[1]) + (lanes[2] + lanes[3]))
            + ((lanes[4] + lanes[5]) + (lanes[6] + lanes[7]));
        for v in &values[unrolled..] {
            total += v;
        }
        return total;
    }

    let mut half = n / 2;
    half -= half % SUM_LANES;
    pairwise_sum(&values[..half]) + pairwise_sum(&values[half..])
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Int(i) => write!(f, "{}", i),
            Amount::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Tabular content of one invoice sheet
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemTable {
    /// Spreadsheet the table was read from, kept for error reporting
    pub path: PathBuf,
    columns: Vec<String>,
    rows: Vec<HashMap<String, CellValue>>,
}

impl LineItemTable {
    /// Build a table from a worksheet range whose first row is the header
    pub fn from_range(path: &Path, range: &Range<Data>) -> Result<Self, InvoiceError> {
        let mut grid = range.rows();
        let header = grid
            .next()
            .filter(|row| !row.is_empty())
            .ok_or_else(|| InvoiceError::unreadable(path, "sheet has no columns"))?;

        let names: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(idx, cell)| match CellValue::from_data(cell) {
                CellValue::Empty => format!("Unnamed: {}", idx),
                value => value.to_string(),
            })
            .collect();

        let raw_rows: Vec<Vec<CellValue>> = grid
            .map(|row| {
                let mut values: Vec<CellValue> = row.iter().map(CellValue::from_data).collect();
                values.resize(names.len(), CellValue::Empty);
                values
            })
            .filter(|values| !values.iter().all(CellValue::is_empty))
            .collect();

        Ok(Self::from_columns(path, names, raw_rows))
    }

    /// Build a table from header names and positional rows.
    ///
    /// Duplicate names are suffixed `.1`, `.2`, ... and numeric columns that
    /// hold fractions or gaps are promoted to floats.
    pub fn from_columns(path: &Path, names: Vec<String>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let columns = dedupe_column_names(names);

        for col in 0..columns.len() {
            let cells = || rows.iter().map(move |r| r.get(col).unwrap_or(&EMPTY_CELL));
            // An all-blank column with rows counts as a float column too
            let numeric = cells().all(|c| c.is_numeric() || c.is_empty());
            let needs_float = cells().any(|c| matches!(c, CellValue::Float(_) | CellValue::Empty));
            if numeric && needs_float {
                for row in rows.iter_mut() {
                    if let Some(&CellValue::Int(i)) = row.get(col) {
                        row[col] = CellValue::Float(i as f64);
                    }
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect();

        Self {
            path: path.to_path_buf(),
            columns,
            rows,
        }
    }

    /// Column names in sheet order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[HashMap<String, CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with `MissingColumn` unless `name` is a column of this table
    pub fn require_column(&self, name: &str) -> Result<(), InvoiceError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(InvoiceError::missing_column(&self.path, name))
        }
    }

    /// Value of `column` in row `index`
    pub fn value(&self, index: usize, column: &str) -> Result<&CellValue, InvoiceError> {
        self.rows
            .get(index)
            .and_then(|row| row.get(column))
            .ok_or_else(|| InvoiceError::missing_column(&self.path, column))
    }

    /// Sum of a numeric column.
    ///
    /// An all-integer column sums exactly. Once a column holds a fraction or
    /// a blank, blanks count as zero and the values are summed pairwise as
    /// floats. A table without rows sums to integer zero.
    pub fn sum_column(&self, column: &str) -> Result<Amount, InvoiceError> {
        self.require_column(column)?;

        let mut cells = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            let value = row.get(column).unwrap_or(&EMPTY_CELL);
            match value {
                CellValue::Empty | CellValue::Int(_) | CellValue::Float(_) => cells.push(value),
                other => {
                    return Err(InvoiceError::NonNumericTotal {
                        path: self.path.clone(),
                        column: column.to_string(),
                        row: idx + 1,
                        value: other.to_string(),
                    })
                }
            }
        }

        let float_column = cells
            .iter()
            .any(|c| matches!(c, CellValue::Float(_) | CellValue::Empty));
        if !float_column {
            return Ok(cells.into_iter().fold(Amount::Int(0), Amount::add));
        }

        let values: Vec<f64> = cells
            .iter()
            .map(|c| match c {
                CellValue::Int(i) => *i as f64,
                CellValue::Float(f) => *f,
                _ => 0.0,
            })
            .collect();
        Ok(Amount::Float(pairwise_sum(&values)))
    }
}

fn dedupe_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        while seen.contains(&candidate) {
            let n = counts.entry(name.clone()).or_insert(0);
            *n += 1;
            candidate = format!("{}.{}", name, n);
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Read the line-item sheet of the workbook at `path`
pub fn load_table(path: &Path, sheet: &str) -> Result<LineItemTable, InvoiceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: calamine::XlsxError| InvoiceError::unreadable(path, e.to_string()))?;

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| InvoiceError::unreadable(path, format!("sheet '{}': {}", sheet, e)))?;

    let table = LineItemTable::from_range(path, &range)?;
    debug!(
        "Loaded {} row(s), {} column(s) from {}",
        table.row_count(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

use anyhow::{Context, Result};
use std::path::Path;

/// One parsed row of the benchmark results table.
///
/// Numeric fields are coerced best-effort: a cell that fails to parse
/// becomes the documented default instead of failing the row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub algorithm: String,
    pub file: String,
    /// Declared block size in bytes (`B_bytes`), if parsable.
    pub declared_size: Option<u64>,
    /// Actual input size in bytes (`bytes`).
    pub actual_bytes: u64,
    /// Median elapsed time in milliseconds (`elapsed_ms_med`).
    pub elapsed_ms_median: f64,
    /// Throughput in MiB/s (`throughput_mib_s`).
    pub throughput_mib_per_s: f64,
    /// Hex digest (`sum_hex`), empty on aggregate rows.
    pub checksum_hex: String,
}

/// Column positions resolved from the header row.
///
/// `algo` and `file` are required; everything else defaults when the
/// column or the cell is missing.
struct Columns {
    algo: usize,
    file: usize,
    declared_size: Option<usize>,
    actual_bytes: Option<usize>,
    elapsed_ms: Option<usize>,
    throughput: Option<usize>,
    checksum: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        Ok(Self {
            algo: find("algo").context("input is missing required column `algo`")?,
            file: find("file").context("input is missing required column `file`")?,
            declared_size: find("B_bytes"),
            actual_bytes: find("bytes"),
            elapsed_ms: find("elapsed_ms_med"),
            throughput: find("throughput_mib_s"),
            checksum: find("sum_hex"),
        })
    }

    fn record(&self, row: &csv::StringRecord) -> Record {
        Record {
            algorithm: text_field(row, Some(self.algo)),
            file: text_field(row, Some(self.file)),
            declared_size: int_field(row, self.declared_size),
            actual_bytes: int_field(row, self.actual_bytes).unwrap_or(0),
            elapsed_ms_median: float_field(row, self.elapsed_ms).unwrap_or(0.0),
            throughput_mib_per_s: float_field(row, self.throughput).unwrap_or(0.0),
            checksum_hex: text_field(row, self.checksum),
        }
    }
}

fn text_field(row: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn int_field(row: &csv::StringRecord, idx: Option<usize>) -> Option<u64> {
    idx.and_then(|i| row.get(i)).and_then(parse_int)
}

fn float_field(row: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| row.get(i)).and_then(parse_float)
}

fn parse_int(cell: &str) -> Option<u64> {
    cell.trim().parse().ok()
}

fn parse_float(cell: &str) -> Option<f64> {
    cell.trim().parse().ok()
}

/// Read all data rows from a benchmark CSV, in file order.
///
/// The reader is flexible: short rows are tolerated (missing trailing
/// cells count as absent) and the blank separator lines the benchmark
/// writer emits between block sizes are skipped.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(columns.record(&row));
    }

    Ok(records)
}

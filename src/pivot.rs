use crate::record::Record;
use indexmap::IndexMap;

/// File-name value marking the totals row emitted by the benchmark.
pub const AGGREGATE_MARKER: &str = "TOTAL";

/// The two recognized algorithm labels used to pair records.
///
/// Rows whose `algo` matches neither label are dropped during the
/// pivot. The speedup ratio is contender over baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgoPair {
    pub baseline: String,
    pub contender: String,
}

impl AlgoPair {
    pub fn new(baseline: impl Into<String>, contender: impl Into<String>) -> Self {
        Self {
            baseline: baseline.into(),
            contender: contender.into(),
        }
    }
}

impl Default for AlgoPair {
    fn default() -> Self {
        Self::new("SHA-256", "PH128")
    }
}

/// The records retained for one file, at most one per algorithm.
#[derive(Debug, Clone, Default)]
pub struct FileRecords {
    pub baseline: Option<Record>,
    pub contender: Option<Record>,
}

impl FileRecords {
    /// Both sides, when both are present.
    pub fn paired(&self) -> Option<(&Record, &Record)> {
        match (&self.baseline, &self.contender) {
            (Some(baseline), Some(contender)) => Some((baseline, contender)),
            _ => None,
        }
    }
}

/// Two-level grouping of records: file name -> per-algorithm slots.
///
/// Outer iteration follows first-seen file order in the input, which
/// the time and speedup charts rely on for category ordering.
#[derive(Debug)]
pub struct PivotIndex {
    pair: AlgoPair,
    files: IndexMap<String, FileRecords>,
}

impl PivotIndex {
    /// Group records by file, keeping only the configured algorithm
    /// pair. The last record wins on duplicate (file, algorithm).
    pub fn build<I>(pair: AlgoPair, records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut files: IndexMap<String, FileRecords> = IndexMap::new();

        for record in records {
            let file = record.file.clone();
            if record.algorithm == pair.baseline {
                files.entry(file).or_default().baseline = Some(record);
            } else if record.algorithm == pair.contender {
                files.entry(file).or_default().contender = Some(record);
            }
        }

        Self { pair, files }
    }

    pub fn pair(&self) -> &AlgoPair {
        &self.pair
    }

    /// Number of distinct file names retained.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, file: &str) -> Option<&FileRecords> {
        self.files.get(file)
    }

    /// All retained files in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecords)> {
        self.files.iter().map(|(file, recs)| (file.as_str(), recs))
    }

    /// Files with records for both algorithms, in first-seen order.
    pub fn paired(&self) -> impl Iterator<Item = (&str, &Record, &Record)> {
        self.files.iter().filter_map(|(file, recs)| {
            recs.paired()
                .map(|(baseline, contender)| (file.as_str(), baseline, contender))
        })
    }
}

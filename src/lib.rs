pub mod chart;
pub mod pivot;
pub mod record;

pub use pivot::{AlgoPair, PivotIndex};
pub use record::{read_records, Record};

pub mod executable;
pub mod merge;

pub use merge::{MergeReport, SymlinkRecord, merge_package};

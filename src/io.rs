//! Plan output files.

pub mod export;

pub use self::export::{ExportedFiles, export_all};

// Adapters layer: concrete implementations of the domain ports.

pub mod source;
pub mod storage;

pub use source::{CsvRecordSource, FileRecordSource, JsonRecordSource};
pub use storage::LocalStorage;

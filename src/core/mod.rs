pub mod etl;
pub mod fleet;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{RawBox, RawBoxEntry, RawPallet, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordSource, SourceFormat, Storage};
pub use crate::utils::error::Result;

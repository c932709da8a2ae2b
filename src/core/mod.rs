pub mod engine;
pub mod loader;
pub mod pipeline;
pub mod queries;
pub mod report;

pub use crate::domain::dataset::Dataset;
pub use crate::domain::ports::{ConfigProvider, Pipeline, SourceFiles, Storage};
pub use crate::domain::report::{ReportBundle, SpendingTiers};
pub use crate::utils::error::Result;

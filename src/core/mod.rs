pub mod charts;
pub mod dealers;
pub mod engine;
pub mod export;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod table;

pub use crate::domain::model::{Frame, Record};
pub use crate::domain::ports::{DealerSource, Pipeline, RowSource, Storage};
pub use crate::utils::error::Result;
pub use engine::DashboardEngine;
pub use pipeline::DashboardPipeline;

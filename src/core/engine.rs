use crate::core::Pipeline;
use crate::domain::model::{DashboardView, Filters};
use crate::utils::error::Result;
use std::time::Instant;

pub struct DashboardEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> DashboardEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self, filters: Filters) -> Result<DashboardView> {
        let started = Instant::now();
        tracing::debug!("Building dashboard for {:?}", filters);

        let extracted = self.pipeline.extract(filters).await?;
        tracing::debug!("Extracted {} rows", extracted.frame.len());

        let prepared = self.pipeline.transform(extracted).await?;
        tracing::debug!("Prepared {} columns", prepared.frame.columns.len());

        let view = self.pipeline.load(prepared).await?;
        tracing::info!(
            "Dashboard ready: {} table rows, {} charts in {:?}",
            view.table.rows.len(),
            view.charts.len(),
            started.elapsed()
        );

        Ok(view)
    }
}

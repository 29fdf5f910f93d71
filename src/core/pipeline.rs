use crate::core::charts::{build_charts, RegionContext};
use crate::core::dealers::DealerDirectory;
use crate::core::metrics::{calculate_metrics, metric_cards};
use crate::core::normalize::prepare;
use crate::core::query::region_scope;
use crate::core::table::build_table;
use crate::core::{Pipeline, RowSource};
use crate::domain::model::{DashboardView, DataOrigin, Extracted, Filters, Frame, Prepared};
use crate::utils::error::Result;
use std::sync::Arc;

/// Store first, CSV snapshot when the store fails.
pub struct DashboardPipeline<P: RowSource, F: RowSource> {
    primary: P,
    fallback: F,
    dealers: Arc<DealerDirectory>,
}

impl<P: RowSource, F: RowSource> DashboardPipeline<P, F> {
    pub fn new(primary: P, fallback: F, dealers: Arc<DealerDirectory>) -> Self {
        Self {
            primary,
            fallback,
            dealers,
        }
    }

    async fn fetch_with_fallback(&self, filters: &Filters) -> Result<(Frame, DataOrigin)> {
        match self.primary.fetch(filters).await {
            Ok(frame) => {
                tracing::info!(
                    "Loaded {} rows from {}",
                    frame.len(),
                    self.primary.describe(filters)
                );
                Ok((frame, DataOrigin::Store))
            }
            Err(e) => {
                let file = self.fallback.describe(filters);
                tracing::warn!("⚠️ Query failed ({}); falling back to {}", e, file);
                let frame = self.fallback.fetch(filters).await?;
                Ok((frame, DataOrigin::Fallback { file }))
            }
        }
    }

    /// Same query for the selected dealer's region. Only the store can
    /// answer it; any failure just drops the comparison.
    async fn fetch_region(&self, filters: &Filters, origin: &DataOrigin) -> Option<Frame> {
        if !filters.dealer_selected() || *origin != DataOrigin::Store {
            return None;
        }
        let region = self.dealers.region_of(&filters.mobis_code)?;
        let scoped = region_scope(filters, region);

        match self.primary.fetch(&scoped).await {
            Ok(frame) if !frame.is_empty() => {
                tracing::debug!("Region {} comparison: {} rows", region, frame.len());
                Some(frame)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Region comparison for {} unavailable: {}", region, e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl<P: RowSource, F: RowSource> Pipeline for DashboardPipeline<P, F> {
    async fn extract(&self, filters: Filters) -> Result<Extracted> {
        let filters = self.dealers.reconcile(filters);
        tracing::debug!(
            "Filters: year={} group={} mobis_code={} holding={} region={}",
            filters.year,
            filters.age_group,
            filters.mobis_code,
            filters.holding,
            filters.region
        );

        let (frame, origin) = self.fetch_with_fallback(&filters).await?;
        let region_frame = self.fetch_region(&filters, &origin).await;

        Ok(Extracted {
            filters,
            origin,
            frame,
            region_frame,
        })
    }

    async fn transform(&self, data: Extracted) -> Result<Prepared> {
        let age_group = data.filters.age_group;
        Ok(Prepared {
            frame: prepare(data.frame, age_group),
            region_frame: data.region_frame.map(|f| prepare(f, age_group)),
            filters: data.filters,
            origin: data.origin,
        })
    }

    async fn load(&self, data: Prepared) -> Result<DashboardView> {
        let filters = data.filters;
        let age_group = filters.age_group;

        let metrics = calculate_metrics(&data.frame, age_group);
        let cards = metric_cards(&metrics, age_group);

        let region_dealers = self
            .dealers
            .region_of(&filters.mobis_code)
            .map(|r| self.dealers.dealers_in_region(r))
            .unwrap_or(0);
        let region = data.region_frame.as_ref().map(|frame| RegionContext {
            frame,
            dealers: region_dealers,
        });
        let charts = build_charts(&data.frame, region, age_group);
        let table = build_table(&data.frame, age_group);

        Ok(DashboardView {
            dealer_name: self.dealers.dealer_name(&filters.mobis_code),
            holding_name: self.dealers.holding_name(&filters.holding),
            region_name: self.dealers.region_name(&filters.region),
            filters,
            origin: data.origin,
            metrics,
            cards,
            charts,
            table,
        })
    }
}

use crate::domain::model::{DashboardView, Dealer, Extracted, Filters, Frame, Prepared};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Anything that can answer a filter selection with a table of model rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Where rows for `filters` come from, for logs and the data-origin badge.
    fn describe(&self, filters: &Filters) -> String;

    async fn fetch(&self, filters: &Filters) -> Result<Frame>;
}

#[async_trait]
pub trait DealerSource: Send + Sync {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, filters: Filters) -> Result<Extracted>;
    async fn transform(&self, data: Extracted) -> Result<Prepared>;
    async fn load(&self, data: Prepared) -> Result<DashboardView>;
}

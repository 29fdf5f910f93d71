//! Wires settings into sources, the dealer directory and the engine.
use crate::adapters::{CsvFallback, LocalStorage, PostgresSource};
use crate::config::Settings;
use crate::core::dealers::DealerDirectory;
use crate::core::{DashboardEngine, DashboardPipeline, DealerSource};
use crate::web::AppState;
use std::sync::Arc;

pub type StorePipeline = DashboardPipeline<PostgresSource<LocalStorage>, CsvFallback<LocalStorage>>;

pub fn postgres_source(settings: &Settings) -> PostgresSource<LocalStorage> {
    PostgresSource::new(
        settings.database.clone(),
        LocalStorage::new(&settings.data.sql_dir),
    )
}

pub fn csv_fallback(settings: &Settings) -> CsvFallback<LocalStorage> {
    CsvFallback::new(
        LocalStorage::new(&settings.data.data_dir),
        settings.data.clone(),
    )
}

/// Dealer metadata from the store, then `dealers.csv`.
pub async fn load_dealers(settings: &Settings) -> DealerDirectory {
    let store = postgres_source(settings);
    let snapshot = csv_fallback(settings);
    let sources: [&dyn DealerSource; 2] = [&store, &snapshot];
    DealerDirectory::load(&sources).await
}

pub async fn build_engine(settings: &Settings) -> (DashboardEngine<StorePipeline>, Arc<DealerDirectory>) {
    let dealers = Arc::new(load_dealers(settings).await);
    let pipeline = DashboardPipeline::new(
        postgres_source(settings),
        csv_fallback(settings),
        Arc::clone(&dealers),
    );
    (DashboardEngine::new(pipeline), dealers)
}

pub async fn build_state(settings: &Settings) -> AppState<StorePipeline> {
    let (engine, dealers) = build_engine(settings).await;
    AppState::new(engine, dealers)
}

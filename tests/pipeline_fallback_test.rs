use dnm_dashboard::config::{DataSettings, DatabaseSettings};
use dnm_dashboard::core::dealers::DealerDirectory;
use dnm_dashboard::core::{DashboardEngine, DashboardPipeline, DealerSource};
use dnm_dashboard::domain::model::{AgeGroup, DataOrigin, Filters};
use dnm_dashboard::{CsvFallback, LocalStorage, PostgresSource};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SNAPSHOT: &str = "\
Unnamed: 0,Model \\ Age,uio_10y,total_0_10,total_ro_cost,labor_hours_0_10,age_0,age_1,age_2,age_3,age_4,age_5,age_6,age_7,age_8,age_9,age_10
0,SOLARIS,1000,110,2200000,220,10,10,10,10,10,10,10,10,10,10,10
1,CRETA,500,55,1650000,110,5,5,5,5,5,5,5,5,5,5,5
2,GETZ,40,0,0,0,0,0,0,0,0,0,0,0,0,0,0
3,TOTAL,1540,165,3850000,330,15,15,15,15,15,15,15,15,15,15,15
";

fn unreachable_store() -> PostgresSource<LocalStorage> {
    let settings = DatabaseSettings {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout_secs: 1,
        ..DatabaseSettings::default()
    };
    let sql_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("sql");
    PostgresSource::new(settings, LocalStorage::new(sql_dir))
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("aug_25.csv"), SNAPSHOT).unwrap();
    std::fs::write(
        dir.path().join("dealers.csv"),
        "mobis_code,dealer_name,holding,region\nC40AA,Avto North,North Motors,North-West\n",
    )
    .unwrap();
    dir
}

async fn engine(dir: &TempDir) -> DashboardEngine<DashboardPipeline<PostgresSource<LocalStorage>, CsvFallback<LocalStorage>>> {
    let store = unreachable_store();
    let snapshot = CsvFallback::new(LocalStorage::new(dir.path()), DataSettings::default());
    let sources: [&dyn DealerSource; 2] = [&store, &snapshot];
    let dealers = Arc::new(DealerDirectory::load(&sources).await);
    assert_eq!(dealers.len(), 1);

    let pipeline = DashboardPipeline::new(
        unreachable_store(),
        CsvFallback::new(LocalStorage::new(dir.path()), DataSettings::default()),
        dealers,
    );
    DashboardEngine::new(pipeline)
}

#[tokio::test]
async fn test_unreachable_store_falls_back_to_snapshot() {
    let dir = data_dir();
    let engine = engine(&dir).await;

    let view = engine.run(Filters::for_year(2025)).await.unwrap();

    assert_eq!(
        view.origin,
        DataOrigin::Fallback {
            file: "aug_25.csv".to_string()
        }
    );
    assert_eq!(view.metrics.total_uio, 1540.0);
    assert_eq!(view.metrics.total_ro_qty, 165.0);
    assert_eq!(view.metrics.total_cost, 3_850_000.0);
    assert_eq!(view.cards[4].value, "23,333");

    // GETZ has no repair orders
    let models: Vec<&str> = view.table.rows.iter().map(|r| r.model()).collect();
    assert_eq!(models, vec!["TOTAL", "SOLARIS", "CRETA"]);
    assert_eq!(view.table.columns[0].name, "Model");
    assert!(!view.table.columns.iter().any(|c| c.id.starts_with("Unnamed")));

    let profit_x = view.charts[0].figure["data"][0]["x"].as_array().unwrap();
    assert_eq!(profit_x.len(), 3);
    assert!(!profit_x.iter().any(|m| m == "TOTAL"));
}

#[tokio::test]
async fn test_five_year_scope_from_snapshot() {
    let dir = data_dir();
    let engine = engine(&dir).await;

    let mut filters = Filters::for_year(2025);
    filters.age_group = AgeGroup::UpToFive;
    let view = engine.run(filters).await.unwrap();

    // the snapshot only carries 0-10Y amounts, so no 0-5Y RO count or CPR
    assert_eq!(view.metrics.total_ro_qty, 0.0);
    assert_eq!(view.metrics.avg_ro_cost, 0.0);
    assert_eq!(view.cards[0].title, "UIO (0-5Y)");
    assert_eq!(view.cards[4].title, "Average RO cost");
    assert_eq!(view.cards[4].value, "0");
    assert!(!view.table.columns.iter().any(|c| c.name == "CPR"));
    let bands = view.charts[5].figure["data"].as_array().unwrap();
    assert_eq!(bands.len(), 2);
}

#[tokio::test]
async fn test_missing_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let engine = engine_without_dealers(&dir);
    let err = engine.run(Filters::for_year(2025)).await.unwrap_err();
    assert!(err.to_string().contains("IO error"));
}

fn engine_without_dealers(
    dir: &TempDir,
) -> DashboardEngine<DashboardPipeline<PostgresSource<LocalStorage>, CsvFallback<LocalStorage>>> {
    DashboardEngine::new(DashboardPipeline::new(
        unreachable_store(),
        CsvFallback::new(LocalStorage::new(dir.path()), DataSettings::default()),
        Arc::new(DealerDirectory::default()),
    ))
}

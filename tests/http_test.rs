use dnm_dashboard::config::{DataSettings, DatabaseSettings};
use dnm_dashboard::core::dealers::DealerDirectory;
use dnm_dashboard::core::{DashboardEngine, DashboardPipeline, DealerSource};
use dnm_dashboard::web::{self, AppState};
use dnm_dashboard::{CsvFallback, LocalStorage, PostgresSource};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const SNAPSHOT: &str = "\
model,uio_10y,total_0_10,total_ro_cost,labor_hours_0_10,age_0,age_1,age_2,age_3,age_4,age_5,age_6,age_7,age_8,age_9,age_10
SOLARIS,1000,110,2200000,220,10,10,10,10,10,10,10,10,10,10,10
CRETA,500,55,1650000,110,5,5,5,5,5,5,5,5,5,5,5
";

const DEALERS: &str = "\
mobis_code,dealer_name,holding,region
C40AA,Avto North,North Motors,North-West
C40AB,Avto Neva,North Motors,North-West
C40BA,Yug Motors,South Group,South
";

struct TestServer {
    base: String,
    _dir: TempDir,
}

async fn start() -> TestServer {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("aug_25.csv"), SNAPSHOT).unwrap();
    std::fs::write(dir.path().join("jul_25.csv"), SNAPSHOT).unwrap();
    std::fs::write(dir.path().join("dealers.csv"), DEALERS).unwrap();

    let database = DatabaseSettings {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout_secs: 1,
        ..DatabaseSettings::default()
    };
    let sql_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("sql");
    let store = || PostgresSource::new(database.clone(), LocalStorage::new(&sql_dir));
    let snapshot = || CsvFallback::new(LocalStorage::new(dir.path()), DataSettings::default());

    let (dealer_store, dealer_snapshot) = (store(), snapshot());
    let sources: [&dyn DealerSource; 2] = [&dealer_store, &dealer_snapshot];
    let dealers = Arc::new(DealerDirectory::load(&sources).await);

    let engine = DashboardEngine::new(DashboardPipeline::new(store(), snapshot(), Arc::clone(&dealers)));
    let state = AppState::new(engine, dealers);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        web::serve(listener, state).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        _dir: dir,
    }
}

#[tokio::test]
async fn test_health() {
    let server = start().await;
    let body: Value = reqwest::get(format!("{}/health", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_dashboard_page_renders() {
    let server = start().await;
    let response = reqwest::get(format!("{}/?year=2025&holding=North%20Motors", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let html = response.text().await.unwrap();
    assert!(html.contains("DNM Dashboard"));
    assert!(html.contains("Top 10 Models by Total Profit"));
    assert!(html.contains("RO Count by Age Groups"));
    assert!(html.contains("Items data by models"));
    assert!(html.contains("C40AA - Avto North"));
    assert!(!html.contains("C40BA - Yug Motors"));
    assert!(html.contains("aug_25.csv"));
    assert!(html.contains("2,200,000"));
}

#[tokio::test]
async fn test_dashboard_json() {
    let server = start().await;
    let view: Value = reqwest::get(format!("{}/api/dashboard?year=2024&age_group=0-10Y", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["origin"]["kind"], "fallback");
    assert_eq!(view["origin"]["file"], "jul_25.csv");
    assert_eq!(view["filters"]["year"], 2024);
    assert_eq!(view["cards"].as_array().unwrap().len(), 5);
    assert_eq!(view["charts"].as_array().unwrap().len(), 6);
    assert_eq!(view["metrics"]["total_cost"], 3_850_000.0);
}

#[tokio::test]
async fn test_mobis_code_options_follow_holding() {
    let server = start().await;
    let options: Vec<Value> = reqwest::get(format!("{}/api/mobis-codes?holding=South%20Group", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let values: Vec<&str> = options.iter().map(|o| o["value"].as_str().unwrap()).collect();
    assert_eq!(values, vec!["All", "C40BA"]);

    let all: Vec<Value> = reqwest::get(format!("{}/api/mobis-codes", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_export_download() {
    let server = start().await;
    let response = reqwest::get(format!("{}/export.csv?year=2025", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"dnm_data_export_"));
    assert!(disposition.ends_with(".csv\""));

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("Model,UIO 10Y,RO qty,Amount,CPR,L/H,L/H per RO"));
    assert!(lines.next().unwrap().starts_with("SOLARIS,1000,110,2200000,20000,220,2.0"));
}

#[tokio::test]
async fn test_bad_filter_is_rejected() {
    let server = start().await;
    let response = reqwest::get(format!("{}/api/dashboard?age_group=0-7Y", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("Invalid request"));
}

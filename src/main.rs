use clap::Parser;
use dnm_dashboard::app;
use dnm_dashboard::config::{CliConfig, Command, Settings};
use dnm_dashboard::core::export::{export_filename, table_to_csv};
use dnm_dashboard::domain::model::Filters;
use dnm_dashboard::domain::ports::Storage;
use dnm_dashboard::utils::error::{DashboardError, Result};
use dnm_dashboard::utils::{logger, validation::Validate};
use dnm_dashboard::{web, LocalStorage};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let settings = match Settings::load(cli.config.as_deref()).and_then(|s| {
        s.validate()?;
        Ok(s)
    }) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let result = match cli.command() {
        Command::Serve => serve(&settings).await,
        Command::Export { out, filters } => export(&settings, out, filters.into()).await,
        Command::CheckDb => check_db(&settings).await,
        Command::ShowConfig => {
            for line in settings.summary_lines() {
                println!("{}", line);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn serve(settings: &Settings) -> Result<()> {
    tracing::info!("Starting DNM dashboard (debug: {})", settings.app.debug);
    tracing::info!("Database: {}", settings.database.display_url());

    let state = app::build_state(settings).await;
    let listener = tokio::net::TcpListener::bind(settings.app.bind_address()).await?;
    web::serve(listener, state).await
}

async fn export(settings: &Settings, out: Option<PathBuf>, filters: Filters) -> Result<()> {
    let (engine, _dealers) = app::build_engine(settings).await;
    let view = engine.run(filters).await?;
    let body = table_to_csv(&view.table)?;

    let out = out.unwrap_or_else(|| PathBuf::from(export_filename(chrono::Local::now().naive_local())));
    let path = out.to_str().ok_or_else(|| DashboardError::ValidationError {
        message: format!("output path {} is not valid UTF-8", out.display()),
    })?;
    LocalStorage::new(".").write_file(path, &body).await?;

    tracing::info!("✅ Exported {} rows", view.table.rows.len());
    println!("✅ Exported {} rows to {}", view.table.rows.len(), out.display());
    Ok(())
}

async fn check_db(settings: &Settings) -> Result<()> {
    println!("Checking {}", settings.database.display_url());
    println!("Password: {}", settings.database.masked_password());

    if app::postgres_source(settings).test_connection().await {
        println!("✅ Database connection OK");
        Ok(())
    } else {
        Err(DashboardError::QueryError {
            message: format!("no answer from {}", settings.database.display_url()),
        })
    }
}

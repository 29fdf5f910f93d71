pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

pub use adapters::{CsvFallback, LocalStorage, PostgresSource};
pub use config::{CliConfig, Settings};
pub use core::{DashboardEngine, DashboardPipeline};
pub use utils::error::{DashboardError, Result};

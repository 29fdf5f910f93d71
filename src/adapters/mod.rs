// Adapters layer: concrete implementations of the domain ports.

pub mod csv_source;
pub mod postgres;
pub mod storage;

pub use csv_source::CsvFallback;
pub use postgres::PostgresSource;
pub use storage::LocalStorage;

use crate::config::DataSettings;
use crate::core::dealers::dealers_from_frame;
use crate::domain::model::{is_selected, Dealer, Filters, Frame, Record};
use crate::domain::ports::{DealerSource, RowSource, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde_json::Value;

/// Static CSV snapshots used when the store cannot be queried.
///
/// Snapshots are already aggregated for the whole network, so only the year
/// picks the file; dealer, holding and region selections are not applied.
pub struct CsvFallback<S: Storage> {
    storage: S,
    data: DataSettings,
}

impl<S: Storage> CsvFallback<S> {
    /// `storage` should be rooted at `DATA_DIR`.
    pub fn new(storage: S, data: DataSettings) -> Self {
        Self { storage, data }
    }

    pub async fn read_frame(&self, file: &str) -> Result<Frame> {
        let bytes = self.storage.read_file(file).await?;
        parse_csv(&bytes)
    }
}

#[async_trait]
impl<S: Storage> RowSource for CsvFallback<S> {
    fn describe(&self, filters: &Filters) -> String {
        self.data.fallback_file_for(filters.year).to_string()
    }

    async fn fetch(&self, filters: &Filters) -> Result<Frame> {
        let file = self.data.fallback_file_for(filters.year);
        if filters.dealer_selected() || is_selected(&filters.holding) || is_selected(&filters.region) {
            tracing::warn!(
                "CSV snapshot {} covers all dealers; dealer/holding/region selection is not applied",
                file
            );
        }
        let frame = self.read_frame(file).await?;
        tracing::info!("Using CSV snapshot {} for {} ({} rows)", file, filters.year, frame.len());
        Ok(frame)
    }
}

#[async_trait]
impl<S: Storage> DealerSource for CsvFallback<S> {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>> {
        let frame = self.read_frame(&self.data.dealers_csv).await?;
        dealers_from_frame(&frame)
    }
}

/// Header row becomes the columns; every cell is kept as text (blank → null)
/// and typed later by normalization.
pub fn parse_csv(bytes: &[u8]) -> Result<Frame> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut frame = Frame::new(columns);

    for result in rdr.records() {
        let row = result?;
        let mut record = Record::default();
        for (column, cell) in frame.columns.iter().zip(row.iter()) {
            let value = if cell.trim().is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            record.set(column.clone(), value);
        }
        frame.push(record);
    }

    Ok(frame)
}

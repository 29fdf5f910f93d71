use crate::domain::model::{TableColumn, TableView};
use crate::utils::error::{DashboardError, Result};
use chrono::NaiveDateTime;
use serde_json::Value;

pub fn export_filename(now: NaiveDateTime) -> String {
    format!("dnm_data_export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// The table as shown: display headers, table column order, numbers at the
/// column's precision without grouping separators.
pub fn table_to_csv(table: &TableView) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(table.columns.iter().map(|c| c.name.as_str()))?;

    for row in &table.rows {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|column| cell_text(row.get(&column.id), column))
            .collect();
        wtr.write_record(&cells)?;
    }

    wtr.into_inner().map_err(|e| DashboardError::ProcessingError {
        message: format!("failed to finish CSV export: {}", e),
    })
}

fn cell_text(value: Option<&Value>, column: &TableColumn) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if column.numeric => match n.as_f64() {
            Some(v) => format!("{:.*}", column.decimals, v),
            None => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

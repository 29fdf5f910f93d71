use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::DashboardError;

/// Selector value meaning "no filter".
pub const ALL: &str = "All";

/// Model name of the summary row some sources append.
pub const TOTAL_MODEL: &str = "TOTAL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.data.get(column).and_then(Value::as_f64)
    }

    /// Missing and null cells count as zero.
    pub fn number_or_zero(&self, column: &str) -> f64 {
        self.number(column).unwrap_or(0.0)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.data.get(column).and_then(Value::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.data.insert(column.into(), value);
    }

    pub fn set_number(&mut self, column: impl Into<String>, value: f64) {
        self.set(column, number_value(value));
    }

    pub fn model(&self) -> &str {
        self.text("model").unwrap_or("")
    }

    pub fn is_total(&self) -> bool {
        self.model().trim().eq_ignore_ascii_case(TOTAL_MODEL)
    }
}

/// JSON numbers cannot hold NaN or infinity; those become null.
pub fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Column-ordered table of records, one record per model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if from == to || !self.has_column(from) {
            return;
        }
        // an existing target column is replaced by the renamed one
        self.drop_column(to);
        for column in self.columns.iter_mut() {
            if column == from {
                *column = to.to_string();
            }
        }
        for record in self.records.iter_mut() {
            if let Some(value) = record.data.remove(from) {
                record.data.insert(to.to_string(), value);
            }
        }
    }

    pub fn drop_column(&mut self, column: &str) {
        self.columns.retain(|c| c != column);
        for record in self.records.iter_mut() {
            record.data.remove(column);
        }
    }

    /// Appends a column computed from each record.
    pub fn add_column<F>(&mut self, column: &str, mut compute: F)
    where
        F: FnMut(&Record) -> Value,
    {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for record in self.records.iter_mut() {
            let value = compute(record);
            record.set(column, value);
        }
    }

    /// Records without the `TOTAL` summary row.
    pub fn model_rows(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| !r.is_total())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[default]
    #[serde(rename = "0-10Y")]
    UpToTen,
    #[serde(rename = "0-5Y")]
    UpToFive,
}

/// A named slice of vehicle ages, e.g. ages 4..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub column: &'static str,
    pub pct_column: &'static str,
    pub label: &'static str,
    pub from: u32,
    pub to: u32,
}

pub const AGE_BANDS: [AgeBand; 3] = [
    AgeBand {
        column: "age_0_3",
        pct_column: "pct_age_0_3",
        label: "0-3 years",
        from: 0,
        to: 3,
    },
    AgeBand {
        column: "age_4_5",
        pct_column: "pct_age_4_5",
        label: "4-5 years",
        from: 4,
        to: 5,
    },
    AgeBand {
        column: "age_6_10",
        pct_column: "pct_age_6_10",
        label: "6-10 years",
        from: 6,
        to: 10,
    },
];

impl AgeGroup {
    pub const ALL: [AgeGroup; 2] = [AgeGroup::UpToTen, AgeGroup::UpToFive];

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "0-10Y",
            AgeGroup::UpToFive => "0-5Y",
        }
    }

    pub fn max_age(&self) -> u32 {
        match self {
            AgeGroup::UpToTen => 10,
            AgeGroup::UpToFive => 5,
        }
    }

    pub fn uio_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "uio_10y",
            AgeGroup::UpToFive => "uio_5y",
        }
    }

    pub fn total_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "total_0_10",
            AgeGroup::UpToFive => "total_0_5",
        }
    }

    pub fn labor_hours_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "labor_hours_0_10",
            AgeGroup::UpToFive => "labor_hours_0_5",
        }
    }

    pub fn labor_amount_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "labor_amount_0_10",
            AgeGroup::UpToFive => "labor_amount_0_5",
        }
    }

    pub fn parts_amount_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "parts_amount_0_10",
            AgeGroup::UpToFive => "parts_amount_0_5",
        }
    }

    pub fn ratio_column(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "ro_ratio_of_uio_10y",
            AgeGroup::UpToFive => "ro_ratio_of_uio_5y",
        }
    }

    /// Bands shown for this scope; 0-5Y stops at the 4-5 band.
    pub fn bands(&self) -> &'static [AgeBand] {
        match self {
            AgeGroup::UpToTen => &AGE_BANDS,
            AgeGroup::UpToFive => &AGE_BANDS[..2],
        }
    }

    pub fn sql_template(&self) -> &'static str {
        match self {
            AgeGroup::UpToTen => "dnm_age_0_10.sql",
            AgeGroup::UpToFive => "dnm_age_0_5.sql",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeGroup {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-10Y" | "" => Ok(AgeGroup::UpToTen),
            "0-5Y" => Ok(AgeGroup::UpToFive),
            other => Err(DashboardError::ValidationError {
                message: format!("unknown age group '{}', expected 0-10Y or 0-5Y", other),
            }),
        }
    }
}

/// One selection of the dashboard selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub year: i32,
    pub age_group: AgeGroup,
    pub mobis_code: String,
    pub holding: String,
    pub region: String,
}

impl Filters {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            age_group: AgeGroup::default(),
            mobis_code: ALL.to_string(),
            holding: ALL.to_string(),
            region: ALL.to_string(),
        }
    }

    pub fn dealer_selected(&self) -> bool {
        is_selected(&self.mobis_code)
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self::for_year(current_year())
    }
}

pub fn is_selected(value: &str) -> bool {
    !value.trim().is_empty() && value != ALL
}

pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}

/// Last five years plus the current one, oldest first.
pub fn available_years() -> Vec<i32> {
    let current = current_year();
    (current - 5..=current).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealer {
    pub mobis_code: String,
    pub dealer_name: String,
    pub holding: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataOrigin {
    Store,
    Fallback { file: String },
}

/// Output of the extract stage.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub filters: Filters,
    pub origin: DataOrigin,
    pub frame: Frame,
    /// Same query scoped to the selected dealer's region, for comparison traces.
    pub region_frame: Option<Frame>,
}

/// Output of the transform stage: normalized frames with derived columns.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub filters: Filters,
    pub origin: DataOrigin,
    pub frame: Frame,
    pub region_frame: Option<Frame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_uio: f64,
    pub total_ro_qty: f64,
    pub total_cost: f64,
    pub total_labor_hours: f64,
    pub avg_ro_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    /// Figure document (`data` + `layout`) for the browser charting library.
    pub figure: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    pub name: String,
    pub numeric: bool,
    pub decimals: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub filters: Filters,
    pub origin: DataOrigin,
    pub metrics: Metrics,
    pub cards: Vec<MetricCard>,
    pub charts: Vec<Chart>,
    pub table: TableView,
    pub dealer_name: Option<String>,
    pub holding_name: Option<String>,
    pub region_name: Option<String>,
}

use crate::config::DatabaseSettings;
use crate::core::dealers::dealers_from_frame;
use crate::core::query::{QueryParams, SqlTemplate, SqlValue};
use crate::domain::model::{number_value, Dealer, Filters, Frame, Record};
use crate::domain::ports::{DealerSource, RowSource, Storage};
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};
use std::time::Duration;

pub const DEALERS_TEMPLATE: &str = "dealers.sql";

/// Read-only access to the RO/UIO aggregates. Every query opens its own
/// connection and closes it before returning.
pub struct PostgresSource<S: Storage> {
    settings: DatabaseSettings,
    templates: S,
}

impl<S: Storage> PostgresSource<S> {
    /// `templates` resolves SQL file names, normally rooted at `SQL_DIR`.
    pub fn new(settings: DatabaseSettings, templates: S) -> Self {
        Self { settings, templates }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .database(&self.settings.name)
            .username(&self.settings.user)
            .password(&self.settings.password)
    }

    async fn connect(&self) -> Result<PgConnection> {
        let timeout = Duration::from_secs(self.settings.connect_timeout_secs);
        tracing::debug!("Connecting to {}", self.settings.display_url());
        match tokio::time::timeout(timeout, PgConnection::connect_with(&self.connect_options())).await {
            Ok(conn) => Ok(conn?),
            Err(_) => Err(DashboardError::QueryError {
                message: format!(
                    "timed out after {}s connecting to {}:{}",
                    self.settings.connect_timeout_secs, self.settings.host, self.settings.port
                ),
            }),
        }
    }

    pub async fn load_template(&self, file: &str) -> Result<SqlTemplate> {
        let bytes = self.templates.read_file(file).await?;
        let text = String::from_utf8(bytes).map_err(|e| DashboardError::QueryError {
            message: format!("SQL template {} is not UTF-8: {}", file, e),
        })?;
        SqlTemplate::parse(file, &text)
    }

    pub async fn run(&self, template: &SqlTemplate, params: &QueryParams) -> Result<Frame> {
        let values = template.bind(params)?;
        tracing::debug!("SQL {}: {} with {:?}", template.name(), template.sql(), values);

        let mut conn = self.connect().await?;

        let mut query = sqlx::query(template.sql());
        for value in values {
            query = match value {
                SqlValue::Int(v) => query.bind(v),
                SqlValue::Text(v) => query.bind(v),
            };
        }
        let rows = query.fetch_all(&mut conn).await;

        if let Err(e) = conn.close().await {
            tracing::warn!("Closing database connection failed: {}", e);
        }

        let frame = rows_to_frame(&rows?)?;
        tracing::debug!("SQL {} returned {} rows", template.name(), frame.len());
        Ok(frame)
    }

    /// `SELECT 1` round trip.
    pub async fn test_connection(&self) -> bool {
        let result = async {
            let mut conn = self.connect().await?;
            let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut conn).await?;
            conn.close().await?;
            Ok::<_, DashboardError>(one == 1)
        }
        .await;

        match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!("❌ Database connection check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl<S: Storage> RowSource for PostgresSource<S> {
    fn describe(&self, _filters: &Filters) -> String {
        format!("postgres {}:{}/{}", self.settings.host, self.settings.port, self.settings.name)
    }

    async fn fetch(&self, filters: &Filters) -> Result<Frame> {
        let template = self.load_template(filters.age_group.sql_template()).await?;
        self.run(&template, &QueryParams::from_filters(filters)).await
    }
}

#[async_trait]
impl<S: Storage> DealerSource for PostgresSource<S> {
    async fn fetch_dealers(&self) -> Result<Vec<Dealer>> {
        let template = self.load_template(DEALERS_TEMPLATE).await?;
        let frame = self.run(&template, &QueryParams::new()).await?;
        dealers_from_frame(&frame)
    }
}

fn rows_to_frame(rows: &[PgRow]) -> Result<Frame> {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let mut frame = Frame::new(columns);
    for row in rows {
        let mut record = Record::default();
        for (idx, column) in frame.columns.iter().enumerate() {
            record.set(column.clone(), decode_cell(row, idx, column)?);
        }
        frame.push(record);
    }
    Ok(frame)
}

/// Numbers become JSON numbers, text stays text. Anything else should be
/// cast in the SQL template.
fn decode_cell(row: &PgRow, idx: usize, column: &str) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INT2" => number_value(row.try_get::<i16, _>(idx)?.into()),
        "INT4" => number_value(row.try_get::<i32, _>(idx)?.into()),
        "INT8" => number_value(row.try_get::<i64, _>(idx)? as f64),
        "FLOAT4" => number_value(row.try_get::<f32, _>(idx)?.into()),
        "FLOAT8" => number_value(row.try_get::<f64, _>(idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::String(row.try_get::<String, _>(idx)?),
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        other => {
            return Err(DashboardError::QueryError {
                message: format!(
                    "column {} has unsupported type {}; cast it to float8 or text",
                    column, other
                ),
            })
        }
    };
    Ok(value)
}

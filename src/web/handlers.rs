use crate::core::dealers::SelectOption;
use crate::core::export::{export_filename, table_to_csv};
use crate::core::Pipeline;
use crate::domain::model::{current_year, AgeGroup, DashboardView, Filters, ALL};
use crate::utils::error::{DashboardError, Result};
use crate::web::page::DashboardTemplate;
use crate::web::AppState;
use askama::Template;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// Filter selection as it arrives in the query string; absent or blank
/// fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub year: Option<String>,
    pub age_group: Option<String>,
    pub mobis_code: Option<String>,
    pub holding: Option<String>,
    pub region: Option<String>,
}

impl FilterQuery {
    pub fn into_filters(self) -> Result<Filters> {
        let year = match self.year.as_deref().map(str::trim) {
            None | Some("") => current_year(),
            Some(raw) => raw.parse::<i32>().map_err(|_| DashboardError::ValidationError {
                message: format!("year '{}' is not a number", raw),
            })?,
        };
        let latest = current_year();
        if !(1990..=latest + 1).contains(&year) {
            return Err(DashboardError::ValidationError {
                message: format!("year {} is outside 1990..={}", year, latest + 1),
            });
        }

        let age_group = self
            .age_group
            .as_deref()
            .map(str::parse::<AgeGroup>)
            .transpose()?
            .unwrap_or_default();

        Ok(Filters {
            year,
            age_group,
            mobis_code: selection(self.mobis_code),
            holding: selection(self.holding),
            region: selection(self.region),
        })
    }
}

fn selection(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => ALL.to_string(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldingQuery {
    pub holding: Option<String>,
}

async fn build_view<P: Pipeline + 'static>(state: &AppState<P>, query: FilterQuery) -> Result<DashboardView> {
    let filters = query.into_filters()?;
    state.engine.run(filters).await
}

pub async fn index<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>> {
    let view = build_view(&state, query).await?;
    let page = DashboardTemplate::new(&view, &state.dealers)?;
    Ok(Html(page.render()?))
}

pub async fn dashboard_json<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<DashboardView>> {
    Ok(Json(build_view(&state, query).await?))
}

pub async fn mobis_codes<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<HoldingQuery>,
) -> Json<Vec<SelectOption>> {
    let holding = selection(query.holding);
    Json(state.dealers.mobis_code_options(&holding))
}

pub async fn export_csv<P: Pipeline + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse> {
    let view = build_view(&state, query).await?;
    let body = table_to_csv(&view.table)?;
    let filename = export_filename(chrono::Local::now().naive_local());
    tracing::info!("Exporting {} rows as {}", view.table.rows.len(), filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    ))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

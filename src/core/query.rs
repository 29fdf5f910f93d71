//! Query parameters for the dashboard SQL templates.
//!
//! Templates are plain SQL files with `:name` placeholders. Parsing rewrites
//! every placeholder into a positional `$n` parameter, one index per distinct
//! name, so the same name can appear several times in a template:
//!
//! ```sql
//! WHERE (:selected_holding = 'All' OR d.holding = :selected_holding)
//! ```
use crate::domain::model::{Filters, ALL};
use crate::utils::error::{DashboardError, Result};
use regex::Regex;
use std::collections::BTreeMap;

pub const PARAM_YEAR: &str = "selected_year";
pub const PARAM_MOBIS_CODE: &str = "selected_mobis_code";
pub const PARAM_HOLDING: &str = "selected_holding";
pub const PARAM_REGION: &str = "selected_region";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i32),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<String, SqlValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_filters(filters: &Filters) -> Self {
        let mut params = Self::new();
        params.insert(PARAM_YEAR, SqlValue::Int(filters.year));
        params.insert(PARAM_MOBIS_CODE, SqlValue::Text(selector_value(&filters.mobis_code)));
        params.insert(PARAM_HOLDING, SqlValue::Text(selector_value(&filters.holding)));
        params.insert(PARAM_REGION, SqlValue::Text(selector_value(&filters.region)));
        params
    }

    pub fn insert(&mut self, name: &str, value: SqlValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }
}

/// Blank selections mean "no filter".
fn selector_value(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        ALL.to_string()
    } else {
        value.to_string()
    }
}

/// The selection used for the region comparison traces: whole region, every holding.
pub fn region_scope(filters: &Filters, region: &str) -> Filters {
    Filters {
        year: filters.year,
        age_group: filters.age_group,
        mobis_code: ALL.to_string(),
        holding: ALL.to_string(),
        region: region.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplate {
    name: String,
    sql: String,
    parameter_names: Vec<String>,
}

impl SqlTemplate {
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        // string literals, line comments and `::` casts are copied verbatim
        let re = Regex::new(r"('(?:[^']|'')*')|(--[^\n]*)|(::)|:([A-Za-z_][A-Za-z0-9_]*)").map_err(
            |e| DashboardError::QueryError {
                message: format!("invalid placeholder pattern: {}", e),
            },
        )?;

        let mut parameter_names: Vec<String> = Vec::new();
        let sql = re.replace_all(text, |caps: &regex::Captures| {
            let Some(param) = caps.get(4) else {
                return caps[0].to_string();
            };
            let param = param.as_str();
            let index = match parameter_names.iter().position(|n| n == param) {
                Some(i) => i + 1,
                None => {
                    parameter_names.push(param.to_string());
                    parameter_names.len()
                }
            };
            format!("${}", index)
        });

        let sql = sql.trim().trim_end_matches(';').to_string();
        if sql.is_empty() {
            return Err(DashboardError::QueryError {
                message: format!("SQL template {} is empty", name),
            });
        }

        Ok(Self {
            name: name.to_string(),
            sql,
            parameter_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Values in `$1..$n` order.
    pub fn bind(&self, params: &QueryParams) -> Result<Vec<SqlValue>> {
        self.parameter_names
            .iter()
            .map(|name| {
                params.get(name).cloned().ok_or_else(|| DashboardError::QueryError {
                    message: format!("SQL template {} references unknown parameter :{}", self.name, name),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AgeGroup;

    #[test]
    fn test_params_from_filters() {
        let filters = Filters {
            year: 2024,
            age_group: AgeGroup::UpToFive,
            mobis_code: "C40AA".to_string(),
            holding: " ".to_string(),
            region: ALL.to_string(),
        };
        let params = QueryParams::from_filters(&filters);
        assert_eq!(params.get(PARAM_YEAR), Some(&SqlValue::Int(2024)));
        assert_eq!(params.get(PARAM_MOBIS_CODE), Some(&SqlValue::Text("C40AA".to_string())));
        assert_eq!(params.get(PARAM_HOLDING), Some(&SqlValue::Text(ALL.to_string())));
    }

    #[test]
    fn test_repeated_placeholders_share_an_index() {
        let template = SqlTemplate::parse(
            "t.sql",
            "SELECT * FROM t WHERE y = :selected_year \
             AND (:selected_holding = 'All' OR holding = :selected_holding);",
        )
        .unwrap();
        assert_eq!(
            template.sql(),
            "SELECT * FROM t WHERE y = $1 AND ($2 = 'All' OR holding = $2)"
        );
        assert_eq!(template.parameter_names(), &["selected_year", "selected_holding"]);
    }

    #[test]
    fn test_casts_literals_and_comments_are_untouched() {
        let template = SqlTemplate::parse(
            "t.sql",
            "-- filter by :selected_region\nSELECT SUM(x)::float8, ':not_a_param' FROM t WHERE r = :selected_region",
        )
        .unwrap();
        assert_eq!(
            template.sql(),
            "-- filter by :selected_region\nSELECT SUM(x)::float8, ':not_a_param' FROM t WHERE r = $1"
        );
        assert_eq!(template.parameter_names(), &["selected_region"]);
    }

    #[test]
    fn test_bind_orders_values_and_reports_missing() {
        let template =
            SqlTemplate::parse("t.sql", "SELECT :selected_region, :selected_year").unwrap();
        let params = QueryParams::from_filters(&Filters::for_year(2023));
        assert_eq!(
            template.bind(&params).unwrap(),
            vec![SqlValue::Text(ALL.to_string()), SqlValue::Int(2023)]
        );

        let template = SqlTemplate::parse("t.sql", "SELECT :dealer_group").unwrap();
        assert!(matches!(
            template.bind(&params),
            Err(DashboardError::QueryError { .. })
        ));
    }

    #[test]
    fn test_empty_template_is_rejected() {
        assert!(SqlTemplate::parse("empty.sql", "  ;\n").is_err());
    }

    #[test]
    fn test_region_scope_clears_dealer_and_holding() {
        let mut filters = Filters::for_year(2025);
        filters.mobis_code = "C40AA".to_string();
        filters.holding = "North Motors".to_string();
        let scoped = region_scope(&filters, "Siberia");
        assert_eq!(scoped.mobis_code, ALL);
        assert_eq!(scoped.holding, ALL);
        assert_eq!(scoped.region, "Siberia");
        assert_eq!(scoped.year, 2025);
    }
}

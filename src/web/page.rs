//! Server-rendered dashboard page.
use crate::core::dealers::{DealerDirectory, SelectOption};
use crate::core::table::TABLE_TITLE;
use crate::domain::model::{
    available_years, AgeGroup, DashboardView, DataOrigin, Filters, MetricCard, Record, TableColumn,
};
use crate::utils::error::Result;
use crate::utils::format::format_number;
use askama::Template;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    fn from_options(options: Vec<SelectOption>, selected: &str) -> Vec<Self> {
        options
            .into_iter()
            .map(|o| OptionView {
                selected: o.value == selected,
                value: o.value,
                label: o.label,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ChartView {
    pub id: String,
    pub title: String,
    /// Figure JSON, safe to inline in a `<script>` element.
    pub figure_json: String,
}

#[derive(Debug, Clone)]
pub struct CellView {
    pub text: String,
    pub numeric: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub years: Vec<OptionView>,
    pub age_groups: Vec<OptionView>,
    pub mobis_codes: Vec<OptionView>,
    pub holdings: Vec<OptionView>,
    pub regions: Vec<OptionView>,
    pub dealer_name: Option<String>,
    pub holding_name: Option<String>,
    pub region_name: Option<String>,
    pub fallback_file: Option<String>,
    pub cards: Vec<MetricCard>,
    pub charts: Vec<ChartView>,
    pub table_title: &'static str,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<CellView>>,
    pub export_href: String,
}

impl DashboardTemplate {
    pub fn new(view: &DashboardView, dealers: &DealerDirectory) -> Result<Self> {
        let filters = &view.filters;

        let years = year_options(filters.year);
        let age_groups = AgeGroup::ALL
            .iter()
            .map(|g| OptionView {
                value: g.label().to_string(),
                label: g.label().to_string(),
                selected: *g == filters.age_group,
            })
            .collect();

        let charts = view
            .charts
            .iter()
            .map(|chart| {
                Ok(ChartView {
                    id: chart.id.clone(),
                    title: chart.title.clone(),
                    figure_json: script_safe_json(&chart.figure)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = view
            .table
            .rows
            .iter()
            .map(|row| table_cells(row, &view.table.columns))
            .collect();

        let fallback_file = match &view.origin {
            DataOrigin::Store => None,
            DataOrigin::Fallback { file } => Some(file.clone()),
        };

        Ok(Self {
            years,
            age_groups,
            mobis_codes: OptionView::from_options(
                dealers.mobis_code_options(&filters.holding),
                &filters.mobis_code,
            ),
            holdings: OptionView::from_options(dealers.holding_options(), &filters.holding),
            regions: OptionView::from_options(dealers.region_options(), &filters.region),
            dealer_name: view.dealer_name.clone(),
            holding_name: view.holding_name.clone(),
            region_name: view.region_name.clone(),
            fallback_file,
            cards: view.cards.clone(),
            charts,
            table_title: TABLE_TITLE,
            columns: view.table.columns.clone(),
            rows,
            export_href: export_href(filters),
        })
    }
}

/// Recent years plus the requested one, so the form resubmits what was asked for.
fn year_options(selected: i32) -> Vec<OptionView> {
    let mut years = available_years();
    if !years.contains(&selected) {
        years.push(selected);
        years.sort_unstable();
    }
    years
        .into_iter()
        .map(|y| OptionView {
            value: y.to_string(),
            label: y.to_string(),
            selected: y == selected,
        })
        .collect()
}

/// `</` inside an inline script would end the element early.
fn script_safe_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn table_cells(row: &Record, columns: &[TableColumn]) -> Vec<CellView> {
    columns
        .iter()
        .map(|column| {
            let text = match row.get(&column.id) {
                Some(Value::Number(n)) if column.numeric => n
                    .as_f64()
                    .map(|v| format_number(v, column.decimals))
                    .unwrap_or_else(|| n.to_string()),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            CellView {
                text,
                numeric: column.numeric,
            }
        })
        .collect()
}

pub fn export_href(filters: &Filters) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("year", &filters.year.to_string())
        .append_pair("age_group", filters.age_group.label())
        .append_pair("mobis_code", &filters.mobis_code)
        .append_pair("holding", &filters.holding)
        .append_pair("region", &filters.region)
        .finish();
    format!("/export.csv?{}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{current_year, Dealer, Metrics, TableView};
    use serde_json::json;

    fn view() -> DashboardView {
        let mut row = Record::default();
        row.set("model", json!("CRETA"));
        row.set("total_ro_cost", json!(1234567.0));
        row.set("aver_labor_hours_per_vhc", json!(1.26));

        let mut filters = Filters::for_year(2025);
        filters.holding = "North Motors".to_string();

        DashboardView {
            filters,
            origin: DataOrigin::Fallback {
                file: "aug_25.csv".to_string(),
            },
            metrics: Metrics::default(),
            cards: vec![MetricCard {
                title: "Total L/H".to_string(),
                value: "600".to_string(),
            }],
            charts: vec![crate::domain::model::Chart {
                id: "profit".to_string(),
                title: "Top 10 Models by Total Profit".to_string(),
                figure: json!({ "data": [{ "x": ["</script>"] }], "layout": {} }),
            }],
            table: TableView {
                columns: vec![
                    TableColumn {
                        id: "model".to_string(),
                        name: "Model".to_string(),
                        numeric: false,
                        decimals: 0,
                    },
                    TableColumn {
                        id: "total_ro_cost".to_string(),
                        name: "Amount".to_string(),
                        numeric: true,
                        decimals: 0,
                    },
                    TableColumn {
                        id: "aver_labor_hours_per_vhc".to_string(),
                        name: "L/H per RO".to_string(),
                        numeric: true,
                        decimals: 1,
                    },
                ],
                rows: vec![row],
            },
            dealer_name: None,
            holding_name: Some("North Motors".to_string()),
            region_name: None,
        }
    }

    #[test]
    fn test_requested_year_outside_recent_range_stays_selected() {
        let mut view = view();
        view.filters.year = 2019;
        let page = DashboardTemplate::new(&view, &dealers()).unwrap();

        let selected: Vec<&str> = page
            .years
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["2019"]);
        assert_eq!(page.years[0].value, "2019");
        assert!(page.render().unwrap().contains(r#"<option value="2019" selected>2019</option>"#));
    }

    #[test]
    fn test_recent_year_is_not_duplicated() {
        let years = year_options(current_year());
        assert_eq!(years.len(), available_years().len());
        assert_eq!(years.iter().filter(|o| o.selected).count(), 1);
    }

    fn dealers() -> DealerDirectory {
        DealerDirectory::new(vec![Dealer {
            mobis_code: "C40AA".to_string(),
            dealer_name: "Avto North".to_string(),
            holding: "North Motors".to_string(),
            region: "North-West".to_string(),
        }])
    }

    #[test]
    fn test_page_renders_view() {
        let page = DashboardTemplate::new(&view(), &dealers()).unwrap();
        assert_eq!(page.rows[0][1].text, "1,234,567");
        assert_eq!(page.rows[0][2].text, "1.3");
        assert!(page.holdings.iter().any(|o| o.value == "North Motors" && o.selected));
        assert_eq!(page.mobis_codes[1].label, "C40AA - Avto North");

        let html = page.render().unwrap();
        assert!(html.contains("Items data by models"));
        assert!(html.contains("Top 10 Models by Total Profit"));
        assert!(html.contains("aug_25.csv"));
        assert!(!html.contains("[\"</script>\"]"));
        assert!(html.contains("<\\/script>"));
    }

    #[test]
    fn test_export_href_encodes_filters() {
        let mut filters = Filters::for_year(2024);
        filters.holding = "North Motors".to_string();
        assert_eq!(
            export_href(&filters),
            "/export.csv?year=2024&age_group=0-10Y&mobis_code=All&holding=North+Motors&region=All"
        );
    }
}

//! Chart figures for the browser charting library.
//!
//! Every figure is a plain `{ "data": [...], "layout": {...} }` document so
//! the page only has to hand it to `Plotly.newPlot`.
use crate::core::normalize::{AVG_LABOR_HOURS, AVG_RO_COST, TOTAL_RO_COST};
use crate::domain::model::{AgeGroup, Chart, Frame, Record};
use serde_json::{json, Value};
use std::cmp::Ordering;

pub const TOP_N: usize = 10;
pub const PALETTE: [&str; 5] = ["#90a4ae", "#a5d6a7", "#d7ccc8", "#b0bec5", "#cfd8dc"];
pub const BACKGROUND: &str = "#3a3a3a";
const REGION_TRACE: &str = "Region Average";

pub fn chart_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Region figures for the selected dealer's region.
#[derive(Debug, Clone, Copy)]
pub struct RegionContext<'a> {
    pub frame: &'a Frame,
    /// Dealers in the region; additive columns are divided by it.
    pub dealers: usize,
}

struct TopChart {
    id: &'static str,
    title: &'static str,
    column: String,
    y_title: String,
    text_format: &'static str,
    integer_ticks: bool,
    additive: bool,
}

fn top_charts(age_group: AgeGroup) -> Vec<TopChart> {
    let ratio_title = match age_group {
        AgeGroup::UpToTen => "RO ratio from UIO 10Y",
        AgeGroup::UpToFive => "RO ratio from UIO 5Y",
    };
    vec![
        TopChart {
            id: "profit",
            title: "Top 10 Models by Total Profit",
            column: TOTAL_RO_COST.to_string(),
            y_title: "Amount".to_string(),
            text_format: "%{text:,.0f}",
            integer_ticks: true,
            additive: true,
        },
        TopChart {
            id: "labor-hours",
            title: "Top 10 Models by Total Labor Hours",
            column: age_group.labor_hours_column().to_string(),
            y_title: "L/H".to_string(),
            text_format: "%{text:,.0f}",
            integer_ticks: true,
            additive: true,
        },
        TopChart {
            id: "avg-labor-hours",
            title: "Top 10 Models by Average Labor Hours per Car",
            column: AVG_LABOR_HOURS.to_string(),
            y_title: "L/H per RO".to_string(),
            text_format: "%{text:,.1f}",
            integer_ticks: false,
            additive: false,
        },
        TopChart {
            id: "avg-ro-cost",
            title: "Top 10 Models by Average RO Cost",
            column: AVG_RO_COST.to_string(),
            y_title: "CPR".to_string(),
            text_format: "%{text:,.0f}",
            integer_ticks: true,
            additive: false,
        },
        TopChart {
            id: "ratio",
            title: "Top 10 Models by Ratio (RO/UIO)",
            column: age_group.ratio_column().to_string(),
            y_title: ratio_title.to_string(),
            text_format: "%{text:.2f}",
            integer_ticks: false,
            additive: false,
        },
    ]
}

/// The six dashboard charts, `TOTAL` row excluded from each.
pub fn build_charts(frame: &Frame, region: Option<RegionContext<'_>>, age_group: AgeGroup) -> Vec<Chart> {
    let mut charts: Vec<Chart> = top_charts(age_group)
        .iter()
        .enumerate()
        .map(|(idx, chart)| top_chart(frame, region, chart, idx))
        .collect();
    charts.push(age_band_chart(frame, age_group));
    charts
}

/// Model rows sorted by `column` descending, missing values last.
pub fn top_models<'a>(frame: &'a Frame, column: &str, n: usize) -> Vec<&'a Record> {
    let mut rows: Vec<&Record> = frame.model_rows().collect();
    rows.sort_by(|a, b| match (a.number(column), b.number(column)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.truncate(n);
    rows
}

fn models(rows: &[&Record]) -> Vec<String> {
    rows.iter().map(|r| r.model().to_string()).collect()
}

fn values(rows: &[&Record], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|r| r.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}

fn top_chart(frame: &Frame, region: Option<RegionContext<'_>>, chart: &TopChart, color: usize) -> Chart {
    let top = top_models(frame, &chart.column, TOP_N);
    let x = models(&top);

    let mut data = vec![json!({
        "type": "bar",
        "name": chart.y_title,
        "x": x,
        "y": values(&top, &chart.column),
        "text": values(&top, &chart.column),
        "texttemplate": chart.text_format,
        "textposition": "inside",
        "textfont": { "size": 11, "color": "white" },
        "marker": { "color": chart_color(color) },
    })];

    let overlay = region.and_then(|ctx| region_trace(ctx, &x, chart));
    let dual_axis = overlay.is_some();
    if let Some(trace) = overlay {
        data.push(trace);
    }

    let mut yaxis = axis(&chart.y_title);
    if chart.integer_ticks {
        yaxis["tickformat"] = json!(",d");
    }
    let mut layout = base_layout(80);
    layout["xaxis"] = x_axis();
    layout["yaxis"] = yaxis;
    if dual_axis {
        layout["yaxis2"] = json!({
            "title": { "text": REGION_TRACE, "font": { "size": 12, "family": "Arial", "color": "white" } },
            "tickfont": { "color": "white" },
            "overlaying": "y",
            "side": "right",
            "showgrid": false,
        });
    }

    Chart {
        id: chart.id.to_string(),
        title: chart.title.to_string(),
        figure: json!({ "data": data, "layout": layout }),
    }
}

/// Marker trace on the secondary axis for the region's values of the
/// dealer's top models, or `None` when the region has none of them.
fn region_trace(region: RegionContext<'_>, models: &[String], chart: &TopChart) -> Option<Value> {
    if !region.frame.has_column(&chart.column) {
        return None;
    }
    let divisor = if chart.additive && region.dealers > 0 {
        region.dealers as f64
    } else {
        1.0
    };

    let mut x = Vec::new();
    let mut y = Vec::new();
    for model in models {
        let found = region
            .frame
            .model_rows()
            .find(|r| r.model() == model)
            .and_then(|r| r.number(&chart.column));
        if let Some(value) = found {
            x.push(model.clone());
            y.push(value / divisor);
        }
    }
    if x.is_empty() {
        return None;
    }

    Some(json!({
        "type": "scatter",
        "mode": "markers",
        "name": REGION_TRACE,
        "x": x,
        "y": y,
        "yaxis": "y2",
        "marker": {
            "color": "red",
            "size": 12,
            "symbol": "circle",
            "line": { "width": 2, "color": "white" },
        },
    }))
}

fn age_band_chart(frame: &Frame, age_group: AgeGroup) -> Chart {
    let top = top_models(frame, age_group.total_column(), TOP_N);
    let x = models(&top);

    let data: Vec<Value> = age_group
        .bands()
        .iter()
        .enumerate()
        .filter(|(_, band)| frame.has_column(band.column))
        .map(|(idx, band)| {
            json!({
                "type": "bar",
                "name": band.label,
                "x": x,
                "y": values(&top, band.column),
                "text": values(&top, band.column),
                "texttemplate": "%{text:,.0f}",
                "textposition": "inside",
                "textfont": { "size": 11, "color": "white" },
                "marker": { "color": chart_color(idx) },
            })
        })
        .collect();

    let mut yaxis = axis("RO qty");
    yaxis["tickformat"] = json!(",d");
    let mut layout = base_layout(60);
    layout["barmode"] = json!("stack");
    layout["xaxis"] = x_axis();
    layout["yaxis"] = yaxis;

    Chart {
        id: "ro-by-age".to_string(),
        title: "RO Count by Age Groups".to_string(),
        figure: json!({ "data": data, "layout": layout }),
    }
}

fn axis(title: &str) -> Value {
    json!({
        "title": { "text": title, "font": { "size": 14, "family": "Arial", "color": "white" } },
        "tickfont": { "color": "white" },
        "showgrid": false,
    })
}

fn x_axis() -> Value {
    let mut xaxis = axis("Model");
    xaxis["tickangle"] = json!(-45);
    xaxis
}

fn base_layout(top_margin: u32) -> Value {
    json!({
        "margin": { "t": top_margin, "b": 60, "l": 60, "r": 60 },
        "showlegend": true,
        "plot_bgcolor": BACKGROUND,
        "paper_bgcolor": BACKGROUND,
        "font": { "color": "white" },
        "legend": {
            "orientation": "h",
            "yanchor": "bottom",
            "y": 1.02,
            "xanchor": "right",
            "x": 1,
            "font": { "color": "white" },
        },
    })
}

use crate::core::normalize::{ratio, TOTAL_RO_COST};
use crate::domain::model::{AgeGroup, Frame, MetricCard, Metrics};
use crate::utils::format::format_number;

/// Totals over the model rows; a `TOTAL` row would count everything twice.
pub fn calculate_metrics(frame: &Frame, age_group: AgeGroup) -> Metrics {
    let sum = |column: &str| -> f64 {
        if !frame.has_column(column) {
            return 0.0;
        }
        frame.model_rows().map(|r| r.number_or_zero(column)).sum()
    };

    let total_uio = sum(age_group.uio_column());
    let total_ro_qty = sum(age_group.total_column());
    let total_cost = sum(TOTAL_RO_COST);
    let total_labor_hours = sum(age_group.labor_hours_column());

    Metrics {
        total_uio,
        total_ro_qty,
        total_cost,
        total_labor_hours,
        avg_ro_cost: ratio(total_cost, total_ro_qty, 1.0),
    }
}

pub fn metric_cards(metrics: &Metrics, age_group: AgeGroup) -> Vec<MetricCard> {
    let card = |title: String, value: f64| MetricCard {
        title,
        value: format_number(value, 0),
    };
    vec![
        card(format!("UIO ({})", age_group), metrics.total_uio),
        card(format!("RO qty ({})", age_group), metrics.total_ro_qty),
        card(format!("Total cost ({})", age_group), metrics.total_cost),
        card("Total L/H".to_string(), metrics.total_labor_hours),
        card("Average RO cost".to_string(), metrics.avg_ro_cost),
    ]
}

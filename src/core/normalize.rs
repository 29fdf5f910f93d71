//! Column normalization and derived columns.
//!
//! Sources disagree on the model header and on which aggregates they ship,
//! so everything downstream works on the frame produced by [`prepare`]:
//! a `model` text column, numeric cells everywhere else, and the age bands
//! and ratios filled in where the source did not provide them.
use crate::domain::model::{number_value, AgeGroup, Frame, AGE_BANDS};
use crate::utils::format::parse_f64_safe;
use serde_json::Value;

pub const MODEL_COLUMN: &str = "model";
const MODEL_ALIASES: [&str; 2] = ["Model \\ Age", "Model"];

pub const TOTAL_RO_COST: &str = "total_ro_cost";
pub const AVG_RO_COST: &str = "avg_ro_cost";
pub const AVG_LABOR_HOURS: &str = "aver_labor_hours_per_vhc";
pub const AVG_RO_LABOR_COST: &str = "avg_ro_labor_cost";
pub const AVG_RO_PART_COST: &str = "avg_ro_part_cost";

pub fn prepare(frame: Frame, age_group: AgeGroup) -> Frame {
    let mut frame = normalize(frame);
    derive_columns(&mut frame, age_group);
    frame
}

/// Canonical `model` column, junk columns dropped, numeric coercion.
pub fn normalize(mut frame: Frame) -> Frame {
    for alias in MODEL_ALIASES {
        if !frame.has_column(MODEL_COLUMN) {
            frame.rename_column(alias, MODEL_COLUMN);
        }
    }

    let junk: Vec<String> = frame
        .columns
        .iter()
        .filter(|c| c.trim().is_empty() || c.starts_with("Unnamed"))
        .cloned()
        .collect();
    for column in junk {
        frame.drop_column(&column);
    }

    let columns = frame.columns.clone();
    for record in frame.records.iter_mut() {
        for column in &columns {
            let Some(value) = record.data.get_mut(column) else {
                continue;
            };
            *value = if column == MODEL_COLUMN {
                model_value(value)
            } else {
                numeric_value(value)
            };
        }
    }

    frame
}

fn model_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Null => Value::String(String::new()),
        other => Value::String(other.to_string()),
    }
}

fn numeric_value(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => parse_f64_safe(s).map(number_value).unwrap_or(Value::Null),
        Value::Bool(b) => number_value(if *b { 1.0 } else { 0.0 }),
        _ => Value::Null,
    }
}

fn age_column(age: u32) -> String {
    format!("age_{}", age)
}

/// Fills in age bands, RO totals and ratios that the source left out.
pub fn derive_columns(frame: &mut Frame, age_group: AgeGroup) {
    for band in AGE_BANDS {
        let sources: Vec<String> = (band.from..=band.to)
            .map(age_column)
            .filter(|c| frame.has_column(c))
            .collect();
        derive_sum(frame, band.column, &sources);
    }

    let total = age_group.total_column();
    if !scoped_to_other_group(frame, age_group) {
        let ages: Vec<String> = (0..=age_group.max_age())
            .map(age_column)
            .filter(|c| frame.has_column(c))
            .collect();
        derive_sum(frame, total, &ages);
    }

    derive_ratio(frame, AVG_RO_COST, TOTAL_RO_COST, total, 1.0);
    derive_ratio(frame, AVG_LABOR_HOURS, age_group.labor_hours_column(), total, 1.0);
    derive_ratio(frame, AVG_RO_LABOR_COST, age_group.labor_amount_column(), total, 1.0);
    derive_ratio(frame, AVG_RO_PART_COST, age_group.parts_amount_column(), total, 1.0);
    for band in age_group.bands() {
        derive_ratio(frame, band.pct_column, band.column, total, 100.0);
    }
    derive_ratio(frame, age_group.ratio_column(), total, age_group.uio_column(), 1.0);
}

/// True when the frame's aggregates were computed for another age group,
/// e.g. a 0-10Y snapshot read in 0-5Y mode. Its amounts then do not match
/// a RO count summed over this group's ages.
fn scoped_to_other_group(frame: &Frame, age_group: AgeGroup) -> bool {
    AgeGroup::ALL
        .iter()
        .filter(|other| **other != age_group)
        .any(|other| {
            frame.has_column(other.total_column()) || frame.has_column(other.labor_hours_column())
        })
}

fn derive_sum(frame: &mut Frame, target: &str, sources: &[String]) {
    if frame.has_column(target) || sources.is_empty() {
        return;
    }
    frame.add_column(target, |record| {
        number_value(sources.iter().map(|c| record.number_or_zero(c)).sum())
    });
}

/// `numerator / denominator * scale`, zero when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64, scale: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * scale
    } else {
        0.0
    }
}

fn derive_ratio(frame: &mut Frame, target: &str, numerator: &str, denominator: &str, scale: f64) {
    if frame.has_column(target) || !frame.has_column(numerator) || !frame.has_column(denominator) {
        return;
    }
    frame.add_column(target, |record| {
        number_value(ratio(
            record.number_or_zero(numerator),
            record.number_or_zero(denominator),
            scale,
        ))
    });
}

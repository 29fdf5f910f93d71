use crate::core::normalize::{
    AVG_LABOR_HOURS, AVG_RO_COST, AVG_RO_LABOR_COST, AVG_RO_PART_COST, MODEL_COLUMN, TOTAL_RO_COST,
};
use crate::domain::model::{AgeGroup, Frame, Record, TableColumn, TableView, AGE_BANDS};
use std::cmp::Ordering;

pub const TABLE_TITLE: &str = "Items data by models";

fn priority_columns(age_group: AgeGroup) -> [&'static str; 11] {
    [
        MODEL_COLUMN,
        age_group.uio_column(),
        age_group.total_column(),
        TOTAL_RO_COST,
        AVG_RO_COST,
        age_group.labor_hours_column(),
        AVG_LABOR_HOURS,
        age_group.labor_amount_column(),
        AVG_RO_LABOR_COST,
        age_group.parts_amount_column(),
        AVG_RO_PART_COST,
    ]
}

/// Header shown for `column`; unknown columns keep their own name.
pub fn display_name(column: &str, age_group: AgeGroup) -> String {
    let fixed = match column {
        MODEL_COLUMN => Some("Model"),
        TOTAL_RO_COST => Some("Amount"),
        AVG_RO_COST => Some("CPR"),
        AVG_LABOR_HOURS => Some("L/H per RO"),
        AVG_RO_LABOR_COST => Some("LPR"),
        AVG_RO_PART_COST => Some("PPR"),
        _ => None,
    };
    if let Some(name) = fixed {
        return name.to_string();
    }

    if column == age_group.uio_column() {
        return format!("UIO {}", uio_suffix(age_group));
    }
    if column == age_group.total_column() {
        return "RO qty".to_string();
    }
    if column == age_group.labor_hours_column() {
        return "L/H".to_string();
    }
    if column == age_group.labor_amount_column() {
        return "Labor".to_string();
    }
    if column == age_group.parts_amount_column() {
        return "Parts".to_string();
    }
    if column == age_group.ratio_column() {
        return format!("RO ratio from UIO {}", uio_suffix(age_group));
    }

    for band in AGE_BANDS {
        let range = format!("{}-{}Y", band.from, band.to);
        if column == band.column {
            return range;
        }
        if column == band.pct_column {
            return format!("Ratio {}", range);
        }
    }

    if let Some(age) = column
        .strip_prefix("age_")
        .and_then(|n| n.parse::<u32>().ok())
    {
        if age <= age_group.max_age() {
            return format!("{}Y", age);
        }
    }

    column.to_string()
}

fn uio_suffix(age_group: AgeGroup) -> &'static str {
    match age_group {
        AgeGroup::UpToTen => "10Y",
        AgeGroup::UpToFive => "5Y",
    }
}

/// Digits after the decimal point for a numeric column.
pub fn display_decimals(column: &str, age_group: AgeGroup) -> usize {
    if column == AVG_LABOR_HOURS {
        1
    } else if column == age_group.ratio_column() {
        2
    } else if column.starts_with("pct_") {
        1
    } else {
        0
    }
}

fn is_numeric(frame: &Frame, column: &str) -> bool {
    column != MODEL_COLUMN && frame.records.iter().any(|r| r.number(column).is_some())
}

/// Detail table: ordered and renamed columns, rows without RO count or
/// cost removed, most expensive models first.
pub fn build_table(frame: &Frame, age_group: AgeGroup) -> TableView {
    let priority = priority_columns(age_group);
    let ordered = priority
        .iter()
        .filter(|c| frame.has_column(c))
        .map(|c| c.to_string())
        .chain(
            frame
                .columns
                .iter()
                .filter(|c| !priority.contains(&c.as_str()))
                .cloned(),
        );

    let columns: Vec<TableColumn> = ordered
        .map(|id| {
            let numeric = is_numeric(frame, &id);
            TableColumn {
                name: display_name(&id, age_group),
                decimals: if numeric { display_decimals(&id, age_group) } else { 0 },
                numeric,
                id,
            }
        })
        .collect();

    let total = age_group.total_column();
    let positive = |record: &Record, column: &str| -> bool {
        !frame.has_column(column) || record.number(column).is_some_and(|v| v > 0.0)
    };
    let mut rows: Vec<Record> = frame
        .records
        .iter()
        .filter(|r| positive(r, total) && positive(r, TOTAL_RO_COST))
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        let a = a.number_or_zero(TOTAL_RO_COST);
        let b = b.number_or_zero(TOTAL_RO_COST);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });

    tracing::debug!("Table: {} rows, {} columns", rows.len(), columns.len());
    TableView { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame() -> Frame {
        let columns = ["age_0", "total_ro_cost", "model", "uio_10y", "total_0_10", "ro_ratio_of_uio_10y"];
        let mut frame = Frame::new(columns.iter().map(|c| c.to_string()).collect());
        let rows = [
            ("RIO", 3.0, 1500.0, 30.0, 10.0),
            ("CRETA", 5.0, 9000.0, 40.0, 20.0),
            ("IONIQ", 0.0, 0.0, 10.0, 0.0),
            ("SONATA", 2.0, 0.0, 10.0, 4.0),
        ];
        for (model, age_0, cost, uio, total) in rows {
            let mut record = Record::default();
            record.set("model", json!(model));
            record.set_number("age_0", age_0);
            record.set_number("total_ro_cost", cost);
            record.set_number("uio_10y", uio);
            record.set_number("total_0_10", total);
            record.set_number("ro_ratio_of_uio_10y", total / uio);
            frame.push(record);
        }
        frame
    }

    #[test]
    fn test_priority_columns_come_first() {
        let table = build_table(&frame(), AgeGroup::UpToTen);
        let ids: Vec<&str> = table.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["model", "uio_10y", "total_0_10", "total_ro_cost", "age_0", "ro_ratio_of_uio_10y"]
        );
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Model", "UIO 10Y", "RO qty", "Amount", "0Y", "RO ratio from UIO 10Y"]
        );
    }

    #[test]
    fn test_zero_rows_removed_and_sorted_by_cost() {
        let table = build_table(&frame(), AgeGroup::UpToTen);
        let models: Vec<&str> = table.rows.iter().map(|r| r.model()).collect();
        assert_eq!(models, vec!["CRETA", "RIO"]);
    }

    #[test]
    fn test_precision() {
        let table = build_table(&frame(), AgeGroup::UpToTen);
        let model = &table.columns[0];
        assert!(!model.numeric);
        let ratio = table.columns.iter().find(|c| c.id == "ro_ratio_of_uio_10y").unwrap();
        assert!(ratio.numeric);
        assert_eq!(ratio.decimals, 2);
        assert_eq!(display_decimals(AVG_LABOR_HOURS, AgeGroup::UpToTen), 1);
        assert_eq!(display_decimals("pct_age_4_5", AgeGroup::UpToTen), 1);
        assert_eq!(display_decimals(TOTAL_RO_COST, AgeGroup::UpToTen), 0);
    }

    #[test]
    fn test_display_names_per_age_group() {
        let five = AgeGroup::UpToFive;
        assert_eq!(display_name("uio_5y", five), "UIO 5Y");
        assert_eq!(display_name("total_0_5", five), "RO qty");
        assert_eq!(display_name("labor_hours_0_5", five), "L/H");
        assert_eq!(display_name("age_4_5", five), "4-5Y");
        assert_eq!(display_name("pct_age_0_3", five), "Ratio 0-3Y");
        assert_eq!(display_name("ro_ratio_of_uio_5y", five), "RO ratio from UIO 5Y");
        assert_eq!(display_name("age_5", five), "5Y");
        assert_eq!(display_name("age_7", five), "age_7");
        assert_eq!(display_name("age_6_10", AgeGroup::UpToTen), "6-10Y");
        assert_eq!(display_name("region_note", five), "region_note");
    }
}

use crate::utils::error::{DashboardError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> DashboardError {
    DashboardError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Connection and bind settings must carry a real value.
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "must not be blank"));
    }
    Ok(())
}

pub fn require_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("expected {}..={}", min, max)));
    }
    Ok(())
}

/// Directory holding SQL templates or snapshots.
pub fn require_dir(field: &str, dir: &str) -> Result<()> {
    if dir.is_empty() || dir.contains('\0') {
        return Err(invalid(field, dir, "not a usable directory path"));
    }
    Ok(())
}

/// Snapshot and dealer files are plain CSV.
pub fn require_csv_file(field: &str, file: &str) -> Result<()> {
    let is_csv = Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(invalid(field, file, "expected a .csv file"));
    }
    Ok(())
}

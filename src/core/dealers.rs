use crate::domain::model::{is_selected, Dealer, Filters, Frame, ALL};
use crate::domain::ports::DealerSource;
use crate::utils::error::{DashboardError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Selector entry as the page and the JSON API present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn all() -> Self {
        Self {
            value: ALL.to_string(),
            label: ALL.to_string(),
        }
    }
}

/// Dealer metadata: mobis code → name, holding and region.
#[derive(Debug, Clone, Default)]
pub struct DealerDirectory {
    dealers: Vec<Dealer>,
}

impl DealerDirectory {
    pub fn new(mut dealers: Vec<Dealer>) -> Self {
        dealers.sort_by(|a, b| a.mobis_code.cmp(&b.mobis_code));
        dealers.dedup_by(|a, b| a.mobis_code == b.mobis_code);
        Self { dealers }
    }

    /// Tries each source in order; an empty directory is still usable.
    pub async fn load(sources: &[&dyn DealerSource]) -> Self {
        for source in sources {
            match source.fetch_dealers().await {
                Ok(dealers) if !dealers.is_empty() => {
                    tracing::info!("Loaded {} dealers", dealers.len());
                    return Self::new(dealers);
                }
                Ok(_) => tracing::warn!("Dealer source returned no dealers"),
                Err(e) => tracing::warn!("⚠️ Dealer source failed: {}", e),
            }
        }
        tracing::warn!("No dealer metadata available; dealer selectors will only offer All");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dealers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dealers.is_empty()
    }

    pub fn dealer(&self, mobis_code: &str) -> Option<&Dealer> {
        self.dealers.iter().find(|d| d.mobis_code == mobis_code)
    }

    pub fn dealer_name(&self, mobis_code: &str) -> Option<String> {
        if !is_selected(mobis_code) {
            return None;
        }
        self.dealer(mobis_code).map(|d| d.dealer_name.clone())
    }

    pub fn holding_name(&self, holding: &str) -> Option<String> {
        if !is_selected(holding) {
            return None;
        }
        self.dealers
            .iter()
            .find(|d| d.holding == holding)
            .map(|d| d.holding.clone())
    }

    pub fn region_name(&self, region: &str) -> Option<String> {
        if !is_selected(region) {
            return None;
        }
        self.dealers
            .iter()
            .find(|d| d.region == region)
            .map(|d| d.region.clone())
    }

    pub fn region_of(&self, mobis_code: &str) -> Option<&str> {
        self.dealer(mobis_code)
            .map(|d| d.region.as_str())
            .filter(|r| !r.trim().is_empty())
    }

    pub fn mobis_codes_by_holding(&self, holding: &str) -> Vec<String> {
        self.dealers
            .iter()
            .filter(|d| !is_selected(holding) || d.holding == holding)
            .map(|d| d.mobis_code.clone())
            .collect()
    }

    pub fn mobis_codes_by_region(&self, region: &str) -> Vec<String> {
        self.dealers
            .iter()
            .filter(|d| !is_selected(region) || d.region == region)
            .map(|d| d.mobis_code.clone())
            .collect()
    }

    pub fn dealers_in_region(&self, region: &str) -> usize {
        self.dealers.iter().filter(|d| d.region == region).count()
    }

    /// `All` followed by the dealers of the holding, labelled `code - name`.
    pub fn mobis_code_options(&self, holding: &str) -> Vec<SelectOption> {
        let mut options = vec![SelectOption::all()];
        options.extend(
            self.dealers
                .iter()
                .filter(|d| !is_selected(holding) || d.holding == holding)
                .map(|d| SelectOption {
                    value: d.mobis_code.clone(),
                    label: format!("{} - {}", d.mobis_code, d.dealer_name),
                }),
        );
        options
    }

    pub fn holding_options(&self) -> Vec<SelectOption> {
        distinct_options(self.dealers.iter().map(|d| d.holding.as_str()))
    }

    pub fn region_options(&self) -> Vec<SelectOption> {
        distinct_options(self.dealers.iter().map(|d| d.region.as_str()))
    }

    /// Resets a dealer that does not belong to the selected holding or region.
    pub fn reconcile(&self, mut filters: Filters) -> Filters {
        if !filters.dealer_selected() {
            return filters;
        }
        if is_selected(&filters.holding)
            && !self.mobis_codes_by_holding(&filters.holding).contains(&filters.mobis_code)
        {
            tracing::warn!(
                "Mobis code {} does not belong to holding {}; using All",
                filters.mobis_code,
                filters.holding
            );
            filters.mobis_code = ALL.to_string();
        }
        if is_selected(&filters.region)
            && filters.dealer_selected()
            && !self.mobis_codes_by_region(&filters.region).contains(&filters.mobis_code)
        {
            tracing::warn!(
                "Mobis code {} does not belong to region {}; using All",
                filters.mobis_code,
                filters.region
            );
            filters.mobis_code = ALL.to_string();
        }
        filters
    }
}

fn distinct_options<'a>(values: impl Iterator<Item = &'a str>) -> Vec<SelectOption> {
    let distinct: BTreeSet<&str> = values.filter(|v| !v.trim().is_empty()).collect();
    let mut options = vec![SelectOption::all()];
    options.extend(distinct.into_iter().map(|v| SelectOption {
        value: v.to_string(),
        label: v.to_string(),
    }));
    options
}

/// Maps a `mobis_code, dealer_name, holding, region` table onto dealers.
pub fn dealers_from_frame(frame: &Frame) -> Result<Vec<Dealer>> {
    if !frame.is_empty() && !frame.has_column("mobis_code") {
        return Err(DashboardError::ProcessingError {
            message: "dealer table has no mobis_code column".to_string(),
        });
    }

    let text = |record: &crate::domain::model::Record, column: &str| -> String {
        match record.get(column) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    };

    Ok(frame
        .records
        .iter()
        .map(|r| Dealer {
            mobis_code: text(r, "mobis_code"),
            dealer_name: text(r, "dealer_name"),
            holding: text(r, "holding"),
            region: text(r, "region"),
        })
        .filter(|d| !d.mobis_code.is_empty())
        .collect())
}

//! Internal consistency of composite item groups.

use plend_core::CompositeGroup;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::error::StatsError;
use crate::math::variance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reliability {
    pub composite: String,
    pub items: usize,
    /// Respondents with every item present.
    pub n: usize,
    pub cronbach_alpha: f64,
}

/// Cronbach's alpha over the rows where every item of the group is present.
pub fn cronbach_alpha(
    ctx: &AnalysisContext<'_>,
    group: &CompositeGroup,
) -> Result<Reliability, StatsError> {
    let dataset = ctx.dataset();
    let ids = ctx.columns(&group.items)?;
    let k = ids.len();
    if k < 2 {
        return Err(StatsError::InvalidSpecification(format!(
            "Cronbach's alpha for '{}' needs at least two items",
            group.name
        )));
    }

    let rows = dataset.complete_rows(&ids);
    if rows.len() < 2 {
        return Err(StatsError::InsufficientData {
            analysis: "cronbach alpha",
            needed: 2,
            available: rows.len(),
        });
    }

    let item_variance_sum: f64 = ids
        .iter()
        .map(|id| {
            let values: Vec<f64> = rows.iter().map(|&r| dataset.values(*id)[r]).collect();
            variance(&values)
        })
        .sum();
    let totals: Vec<f64> = rows
        .iter()
        .map(|&r| ids.iter().map(|id| dataset.values(*id)[r]).sum())
        .collect();
    let total_variance = variance(&totals);
    if total_variance == 0.0 {
        return Err(StatsError::ZeroVariance(group.name.clone()));
    }

    let k = k as f64;
    let alpha = k / (k - 1.0) * (1.0 - item_variance_sum / total_variance);
    tracing::debug!(composite = %group.name, alpha, n = rows.len(), "cronbach alpha");

    Ok(Reliability {
        composite: group.name.clone(),
        items: ids.len(),
        n: rows.len(),
        cronbach_alpha: alpha,
    })
}

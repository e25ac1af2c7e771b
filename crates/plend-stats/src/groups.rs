//! Group comparisons: Welch t-test for two groups, one-way ANOVA for more.
//!
//! Groups come from a [`GroupingStrategy`]. A `factor` grouping is validated
//! first: the column must be integer-valued with at most `max_levels`
//! distinct values, so a continuous score is never treated as a factor.
//! Continuous columns must be split explicitly with `median_split` or
//! `quartiles`.

use std::collections::BTreeSet;

use plend_core::GroupingStrategy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::error::StatsError;
use crate::math::{f_upper_p, mean, quantile_sorted, sorted_present, t_two_sided_p, variance};

/// Group membership per row; `None` where the grouping value is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub labels: Vec<String>,
    pub assignment: Vec<Option<usize>>,
}

fn format_level(value: f64) -> String {
    format!("{value:.0}")
}

fn format_cut(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Assign rows to groups according to `strategy`.
pub fn assign_groups(
    column: &str,
    values: &[f64],
    strategy: GroupingStrategy,
    max_levels: usize,
) -> Result<Grouping, StatsError> {
    let sorted = sorted_present(values);
    if sorted.is_empty() {
        return Err(StatsError::TooFewGroups {
            column: column.to_string(),
            groups: 0,
        });
    }

    match strategy {
        GroupingStrategy::Factor => {
            let distinct: BTreeSet<u64> = sorted.iter().map(|v| v.to_bits()).collect();
            let integer_valued = sorted.iter().all(|v| v.fract() == 0.0);
            if !integer_valued || distinct.len() > max_levels {
                return Err(StatsError::GroupingNotCategorical {
                    column: column.to_string(),
                    distinct_levels: distinct.len(),
                    max_levels,
                });
            }
            let mut levels: Vec<f64> = sorted.clone();
            levels.dedup();
            let assignment = values
                .iter()
                .map(|v| {
                    if v.is_nan() {
                        None
                    } else {
                        levels.iter().position(|l| l == v)
                    }
                })
                .collect();
            Ok(Grouping {
                labels: levels.iter().copied().map(format_level).collect(),
                assignment,
            })
        }
        GroupingStrategy::MedianSplit => {
            let median = quantile_sorted(&sorted, 0.5);
            let assignment = values
                .iter()
                .map(|v| {
                    if v.is_nan() {
                        None
                    } else {
                        Some(usize::from(*v > median))
                    }
                })
                .collect();
            Ok(Grouping {
                labels: vec![
                    format!("low (<= {})", format_cut(median)),
                    format!("high (> {})", format_cut(median)),
                ],
                assignment,
            })
        }
        GroupingStrategy::Quartiles => {
            let cuts = [
                quantile_sorted(&sorted, 0.25),
                quantile_sorted(&sorted, 0.5),
                quantile_sorted(&sorted, 0.75),
            ];
            let assignment = values
                .iter()
                .map(|v| {
                    if v.is_nan() {
                        None
                    } else {
                        Some(cuts.iter().position(|c| v <= c).unwrap_or(3))
                    }
                })
                .collect();
            Ok(Grouping {
                labels: (1..=4).map(|q| format!("Q{q}")).collect(),
                assignment,
            })
        }
    }
}

/// Values of one column split by a grouping, with empty groups removed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedValues {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Rows lacking either the grouping or the compared value.
    pub excluded: usize,
}

/// Split `value` by the groups formed from `group`.
pub fn group_values(
    ctx: &AnalysisContext<'_>,
    group: &str,
    value: &str,
    strategy: GroupingStrategy,
) -> Result<GroupedValues, StatsError> {
    let dataset = ctx.dataset();
    let group_id = ctx.column(group)?;
    let value_id = ctx.column(value)?;
    let grouping = assign_groups(
        group,
        dataset.values(group_id),
        strategy,
        ctx.settings().max_levels,
    )?;

    let mut buckets = vec![Vec::new(); grouping.labels.len()];
    let mut excluded = 0;
    for (g, v) in grouping.assignment.iter().zip(dataset.values(value_id)) {
        match g {
            Some(g) if !v.is_nan() => buckets[*g].push(*v),
            _ => excluded += 1,
        }
    }

    let (labels, values): (Vec<String>, Vec<Vec<f64>>) = grouping
        .labels
        .into_iter()
        .zip(buckets)
        .filter(|(_, b)| !b.is_empty())
        .unzip();
    if labels.len() < 2 {
        return Err(StatsError::TooFewGroups {
            column: group.to_string(),
            groups: labels.len(),
        });
    }
    if excluded > 0 {
        tracing::debug!(group, value, excluded, "rows excluded from group comparison");
    }
    Ok(GroupedValues {
        labels,
        values,
        excluded,
    })
}

// ---------------------------------------------------------------------------
// Test statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WelchTest {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
    /// First group mean minus second group mean.
    pub mean_difference: f64,
    /// Standardized by the pooled standard deviation.
    pub cohens_d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnovaTest {
    pub f: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub p_value: f64,
    pub eta_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum GroupTest {
    Welch(WelchTest),
    Anova(AnovaTest),
}

impl GroupTest {
    #[must_use]
    pub const fn p_value(&self) -> f64 {
        match self {
            Self::Welch(t) => t.p_value,
            Self::Anova(a) => a.p_value,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Welch(_) => "Welch t-test",
            Self::Anova(_) => "One-way ANOVA",
        }
    }
}

/// Welch's unequal-variance t-test.
pub fn welch_t_test(a: &[f64], b: &[f64], value: &str) -> Result<WelchTest, StatsError> {
    let smallest = a.len().min(b.len());
    if smallest < 2 {
        return Err(StatsError::InsufficientData {
            analysis: "welch t-test (per group)",
            needed: 2,
            available: smallest,
        });
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (v1, v2) = (variance(a), variance(b));
    let (s1, s2) = (v1 / n1, v2 / n2);
    let se = (s1 + s2).sqrt();
    if se == 0.0 {
        return Err(StatsError::ZeroVariance(value.to_string()));
    }

    let mean_difference = mean(a) - mean(b);
    let t = mean_difference / se;
    let df = (s1 + s2).powi(2) / (s1 * s1 / (n1 - 1.0) + s2 * s2 / (n2 - 1.0));
    let pooled = (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt();

    Ok(WelchTest {
        t,
        df,
        p_value: t_two_sided_p(t, df),
        mean_difference,
        cohens_d: mean_difference / pooled,
    })
}

/// One-way ANOVA across two or more groups.
pub fn one_way_anova(groups: &[Vec<f64>], value: &str) -> Result<AnovaTest, StatsError> {
    let k = groups.len();
    let total: usize = groups.iter().map(Vec::len).sum();
    if k < 2 || total <= k {
        return Err(StatsError::InsufficientData {
            analysis: "one-way anova",
            needed: k + 1,
            available: total,
        });
    }
    let grand = groups.iter().flatten().sum::<f64>() / total as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = mean(g);
        ss_between += g.len() as f64 * (m - grand).powi(2);
        ss_within += g.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }
    if ss_between + ss_within == 0.0 {
        return Err(StatsError::ZeroVariance(value.to_string()));
    }

    let df_between = k - 1;
    let df_within = total - k;
    let f = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    Ok(AnovaTest {
        f,
        df_between,
        df_within,
        p_value: f_upper_p(f, df_between as f64, df_within as f64),
        eta_squared: ss_between / (ss_between + ss_within),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupSummary {
    pub label: String,
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupComparison {
    pub group_variable: String,
    pub value_variable: String,
    pub strategy: GroupingStrategy,
    pub groups: Vec<GroupSummary>,
    pub excluded: usize,
    pub test: GroupTest,
}

/// Compare `value` across groups of `group`: Welch for two, ANOVA for more.
pub fn compare_groups(
    ctx: &AnalysisContext<'_>,
    group: &str,
    value: &str,
    strategy: GroupingStrategy,
) -> Result<GroupComparison, StatsError> {
    let grouped = group_values(ctx, group, value, strategy)?;
    let test = if grouped.values.len() == 2 {
        GroupTest::Welch(welch_t_test(&grouped.values[0], &grouped.values[1], value)?)
    } else {
        GroupTest::Anova(one_way_anova(&grouped.values, value)?)
    };

    let groups = grouped
        .labels
        .iter()
        .zip(&grouped.values)
        .map(|(label, v)| GroupSummary {
            label: label.clone(),
            n: v.len(),
            mean: mean(v),
            sd: variance(v).sqrt(),
        })
        .collect();

    tracing::info!(
        group,
        value,
        strategy = %strategy,
        test = test.name(),
        p_value = test.p_value(),
        "group comparison"
    );
    Ok(GroupComparison {
        group_variable: group.to_string(),
        value_variable: value.to_string(),
        strategy,
        groups,
        excluded: grouped.excluded,
        test,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use plend_core::{Dataset, FieldRole};
    use rstest::rstest;

    use super::*;
    use crate::context::AnalysisSettings;

    fn dataset() -> Dataset {
        Dataset::from_columns([
            (
                "education",
                FieldRole::Demographic,
                vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, f64::NAN],
            ),
            (
                "ENT",
                FieldRole::Score,
                vec![1.2, 2.5, 3.1, 3.3, 3.9, 4.4, 4.6, 2.2, 1.7, 3.0],
            ),
            (
                "DEPNDT",
                FieldRole::Score,
                vec![2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 3.0, 2.5, 4.0],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn continuous_column_rejected_as_factor() {
        let ds = dataset();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let err = compare_groups(&ctx, "ENT", "DEPNDT", GroupingStrategy::Factor).unwrap_err();
        assert!(matches!(
            err,
            StatsError::GroupingNotCategorical { ref column, distinct_levels: 10, max_levels: 10 }
                if column == "ENT"
        ));
    }

    #[test]
    fn too_many_integer_levels_rejected() {
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let err = assign_groups("firm_size", &values, GroupingStrategy::Factor, 10).unwrap_err();
        assert!(matches!(
            err,
            StatsError::GroupingNotCategorical { distinct_levels: 12, max_levels: 10, .. }
        ));
    }

    #[test]
    fn three_level_factor_runs_anova() {
        let ds = dataset();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let cmp = compare_groups(&ctx, "education", "DEPNDT", GroupingStrategy::Factor).unwrap();
        assert_eq!(cmp.groups.len(), 3);
        assert_eq!(cmp.excluded, 1);
        let GroupTest::Anova(anova) = cmp.test else {
            panic!("expected ANOVA");
        };
        assert_eq!(anova.df_between, 2);
        assert_eq!(anova.df_within, 6);
        assert!((0.0..=1.0).contains(&anova.p_value));
        assert!((0.0..=1.0).contains(&anova.eta_squared));
    }

    #[test]
    fn median_split_runs_welch() {
        let ds = dataset();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        let cmp = compare_groups(&ctx, "ENT", "DEPNDT", GroupingStrategy::MedianSplit).unwrap();
        assert_eq!(cmp.groups.len(), 2);
        assert_eq!(cmp.groups[0].n + cmp.groups[1].n, 10);
        assert!(matches!(cmp.test, GroupTest::Welch(_)));
        assert!(cmp.groups[0].label.starts_with("low"));
    }

    #[rstest]
    #[case(GroupingStrategy::MedianSplit, 2)]
    #[case(GroupingStrategy::Quartiles, 4)]
    fn split_strategies_label_every_present_row(
        #[case] strategy: GroupingStrategy,
        #[case] expected_labels: usize,
    ) {
        let values: Vec<f64> = (1..=20).map(f64::from).chain([f64::NAN]).collect();
        let grouping = assign_groups("ENT", &values, strategy, 10).unwrap();
        assert_eq!(grouping.labels.len(), expected_labels);
        assert_eq!(grouping.assignment.iter().filter(|a| a.is_some()).count(), 20);
        assert_eq!(grouping.assignment[20], None);
    }

    #[test]
    fn constant_grouping_yields_too_few_groups() {
        let ds = Dataset::from_columns([
            ("g", FieldRole::Demographic, vec![1.0, 1.0, 1.0]),
            ("y", FieldRole::Score, vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let ctx = AnalysisContext::new(&ds, AnalysisSettings::default());
        assert!(matches!(
            compare_groups(&ctx, "g", "y", GroupingStrategy::Factor),
            Err(StatsError::TooFewGroups { groups: 1, .. })
        ));
    }

    #[test]
    fn welch_reference_values() {
        let a = [19.8, 20.4, 19.6, 17.8, 18.5, 18.9, 18.3, 18.9, 19.5, 22.0];
        let b = [28.2, 26.6, 20.1, 23.3, 25.2, 22.1, 17.7, 27.6, 20.6, 13.7];
        let t = welch_t_test(&a, &b, "y").unwrap();
        assert_relative_eq!(t.t, -2.074_0, epsilon = 1e-3);
        assert_relative_eq!(t.df, 10.209, epsilon = 1e-2);
        assert!(t.p_value > 0.05 && t.p_value < 0.08);
        assert!(t.cohens_d < 0.0);
    }

    #[test]
    fn anova_reference_values() {
        let groups = vec![
            vec![6.0, 8.0, 4.0, 5.0, 3.0, 4.0],
            vec![8.0, 12.0, 9.0, 11.0, 6.0, 8.0],
            vec![13.0, 9.0, 11.0, 8.0, 7.0, 12.0],
        ];
        let anova = one_way_anova(&groups, "y").unwrap();
        assert_relative_eq!(anova.f, 9.264_7, epsilon = 1e-3);
        assert_eq!(anova.df_within, 15);
        assert!(anova.p_value < 0.01);
    }
}

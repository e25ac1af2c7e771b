//! Composite-score builder.
//!
//! A composite is the row-wise arithmetic mean of an item group, ignoring
//! missing items. A row with no present item gets an undefined (NaN)
//! composite; downstream analyses drop such rows pairwise. Composites are
//! appended once, before any model is fitted, and raw item columns are
//! never touched.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::{ColumnId, Dataset};
use crate::enums::FieldRole;
use crate::errors::CoreError;

/// A named group of item columns averaged into one composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompositeGroup {
    pub name: String,
    pub items: Vec<String>,
}

impl CompositeGroup {
    #[must_use]
    pub fn new(name: &str, items: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            items: items.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Items named `{prefix}1` through `{prefix}{count}`.
    #[must_use]
    pub fn numbered(name: &str, prefix: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            items: (1..=count).map(|i| format!("{prefix}{i}")).collect(),
        }
    }
}

/// What the builder produced for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositeSummary {
    pub name: String,
    pub items: usize,
    /// Rows with at least one present item.
    pub defined_rows: usize,
    /// Rows where every item was missing (composite is NaN).
    pub undefined_rows: usize,
}

/// Mean of the present (non-NaN) values, or NaN when none are present.
#[must_use]
pub fn row_mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Compute every group's composite and append it to the dataset.
///
/// All groups are validated before any column is appended, so a failure
/// leaves the dataset unchanged.
pub fn build_composites(
    dataset: &mut Dataset,
    groups: &[CompositeGroup],
) -> Result<Vec<CompositeSummary>, CoreError> {
    let mut resolved: Vec<(&CompositeGroup, Vec<ColumnId>)> = Vec::with_capacity(groups.len());
    for group in groups {
        if group.items.is_empty() {
            return Err(CoreError::InvalidComposite {
                name: group.name.clone(),
                reason: "item list is empty".to_string(),
            });
        }
        if dataset.contains(&group.name) || resolved.iter().any(|(g, _)| g.name == group.name) {
            return Err(CoreError::DuplicateColumn(group.name.clone()));
        }
        let ids = dataset.column_ids(&group.items)?;
        resolved.push((group, ids));
    }

    let mut summaries = Vec::with_capacity(resolved.len());
    for (group, ids) in resolved {
        let values: Vec<f64> = (0..dataset.n_rows())
            .map(|row| row_mean(ids.iter().map(|id| dataset.values(*id)[row])))
            .collect();

        let undefined_rows = values.iter().filter(|v| v.is_nan()).count();
        if undefined_rows > 0 {
            tracing::warn!(
                composite = %group.name,
                undefined_rows,
                "rows with every item missing have an undefined composite"
            );
        }

        dataset.push_column(&group.name, FieldRole::Composite, values)?;
        summaries.push(CompositeSummary {
            name: group.name.clone(),
            items: group.items.len(),
            defined_rows: dataset.n_rows() - undefined_rows,
            undefined_rows,
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    fn items_dataset() -> Dataset {
        Dataset::from_columns([
            ("RP1", FieldRole::Item, vec![1.0, f64::NAN, f64::NAN, 4.0]),
            ("RP2", FieldRole::Item, vec![3.0, 5.0, f64::NAN, 4.0]),
            ("RP3", FieldRole::Item, vec![5.0, 3.0, f64::NAN, f64::NAN]),
        ])
        .unwrap()
    }

    #[test]
    fn row_mean_ignores_missing() {
        assert_relative_eq!(row_mean([1.0, f64::NAN, 3.0]), 2.0);
        assert!(row_mean([f64::NAN, f64::NAN]).is_nan());
        assert!(row_mean(std::iter::empty()).is_nan());
    }

    #[test]
    fn composite_is_mean_of_present_items() {
        let mut ds = items_dataset();
        let summaries =
            build_composites(&mut ds, &[CompositeGroup::numbered("RP", "RP", 3)]).unwrap();

        let rp = ds.column_id("RP").unwrap();
        let values = ds.values(rp);
        assert_relative_eq!(values[0], 3.0);
        assert_relative_eq!(values[1], 4.0);
        assert!(values[2].is_nan(), "all items missing must give NaN, not zero");
        assert_relative_eq!(values[3], 4.0);

        assert_eq!(
            summaries,
            vec![CompositeSummary {
                name: "RP".into(),
                items: 3,
                defined_rows: 3,
                undefined_rows: 1,
            }]
        );
        assert_eq!(ds.role(rp), FieldRole::Composite);
    }

    #[test]
    fn raw_items_are_not_mutated() {
        let before = items_dataset();
        let mut ds = before.clone();
        build_composites(&mut ds, &[CompositeGroup::numbered("RP", "RP", 3)]).unwrap();
        for name in ["RP1", "RP2", "RP3"] {
            let a = before.values(before.column_id(name).unwrap());
            let b = ds.values(ds.column_id(name).unwrap());
            assert!(a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits()));
        }
    }

    #[test]
    fn unknown_item_leaves_dataset_unchanged() {
        let mut ds = items_dataset();
        let groups = [
            CompositeGroup::numbered("RP", "RP", 3),
            CompositeGroup::new("EO", &["EO1"]),
        ];
        let err = build_composites(&mut ds, &groups).unwrap_err();
        assert!(matches!(err, CoreError::UnknownColumn(ref c) if c == "EO1"));
        assert!(!ds.contains("RP"));
    }

    #[test]
    fn empty_group_and_name_clash_are_rejected() {
        let mut ds = items_dataset();
        let empty = CompositeGroup {
            name: "EO".into(),
            items: vec![],
        };
        assert!(matches!(
            build_composites(&mut ds, &[empty]),
            Err(CoreError::InvalidComposite { .. })
        ));

        let clash = CompositeGroup::new("RP1", &["RP2"]);
        assert!(matches!(
            build_composites(&mut ds, &[clash]),
            Err(CoreError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn numbered_group_names_items() {
        let group = CompositeGroup::numbered("EO", "EO", 10);
        assert_eq!(group.items.first().map(String::as_str), Some("EO1"));
        assert_eq!(group.items.last().map(String::as_str), Some("EO10"));
    }
}

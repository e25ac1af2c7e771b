//! In-memory respondent table.
//!
//! One row per respondent, one numeric column per field. Missing values are
//! represented uniformly as `f64::NAN`; every analysis excludes them
//! pairwise or listwise instead of failing.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enums::FieldRole;
use crate::errors::CoreError;
use crate::schema::SurveySchema;

/// Typed handle to a column, obtained once through [`Dataset::column_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(usize);

/// Cell spellings that mean "no answer".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTokens(Vec<String>);

impl MissingTokens {
    #[must_use]
    pub fn new(tokens: &[String]) -> Self {
        Self(tokens.iter().map(|t| t.trim().to_string()).collect())
    }

    #[must_use]
    pub fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.0.iter().any(|token| token.eq_ignore_ascii_case(cell))
    }
}

impl Default for MissingTokens {
    fn default() -> Self {
        Self(vec![
            String::new(),
            "NA".to_string(),
            "NaN".to_string(),
            ".".to_string(),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    role: FieldRole,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl Dataset {
    /// An empty table with a fixed number of respondents.
    #[must_use]
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            index: HashMap::new(),
            rows,
        }
    }

    /// Load a CSV file and validate it against the schema.
    pub fn from_csv_path(
        path: &Path,
        schema: &SurveySchema,
        missing: &MissingTokens,
    ) -> Result<Self, CoreError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, schema, missing)
    }

    /// Load CSV from any reader and validate it against the schema.
    ///
    /// Declared columns must parse as numbers (or a missing token) in every
    /// row. Undeclared columns are kept when fully numeric and skipped
    /// otherwise (respondent ids, free-text answers).
    pub fn from_csv_reader<R: Read>(
        reader: R,
        schema: &SurveySchema,
        missing: &MissingTokens,
    ) -> Result<Self, CoreError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = csv.headers()?.iter().map(ToString::to_string).collect();
        let roles = schema.validate_header(&header)?;

        let records = csv.records().collect::<Result<Vec<_>, _>>()?;
        let mut dataset = Self::with_rows(records.len());

        for (position, (name, role)) in header.iter().zip(roles).enumerate() {
            let cells = records
                .iter()
                .map(|record| record.get(position).unwrap_or(""));
            match parse_column(name, cells, missing) {
                Ok(values) => {
                    dataset.push_column(name, role, values)?;
                }
                Err(error) if role == FieldRole::Extra => {
                    tracing::debug!(column = %name, %error, "skipping non-numeric undeclared column");
                }
                Err(error) => return Err(error),
            }
        }

        tracing::debug!(
            rows = dataset.n_rows(),
            columns = dataset.columns.len(),
            "loaded respondent table"
        );
        Ok(dataset)
    }

    /// Build a table directly from named columns.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (S, FieldRole, Vec<f64>)>,
        S: Into<String>,
    {
        let columns: Vec<(String, FieldRole, Vec<f64>)> = columns
            .into_iter()
            .map(|(name, role, values)| (name.into(), role, values))
            .collect();
        let rows = columns.first().map_or(0, |(_, _, values)| values.len());

        let mut dataset = Self::with_rows(rows);
        for (name, role, values) in columns {
            dataset.push_column(&name, role, values)?;
        }
        Ok(dataset)
    }

    /// Append a new column. Existing columns are never replaced.
    pub fn push_column(
        &mut self,
        name: &str,
        role: FieldRole,
        values: Vec<f64>,
    ) -> Result<ColumnId, CoreError> {
        if self.index.contains_key(name) {
            return Err(CoreError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.rows {
            return Err(CoreError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }

        let id = self.columns.len();
        self.columns.push(Column {
            name: name.to_string(),
            role,
            values,
        });
        self.index.insert(name.to_string(), id);
        Ok(ColumnId(id))
    }

    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a column name to a handle.
    pub fn column_id(&self, name: &str) -> Result<ColumnId, CoreError> {
        self.index
            .get(name)
            .copied()
            .map(ColumnId)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
    }

    /// Resolve several names at once, failing on the first unknown one.
    pub fn column_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<ColumnId>, CoreError> {
        names.iter().map(|n| self.column_id(n.as_ref())).collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn values(&self, id: ColumnId) -> &[f64] {
        &self.columns[id.0].values
    }

    #[must_use]
    pub fn name(&self, id: ColumnId) -> &str {
        &self.columns[id.0].name
    }

    #[must_use]
    pub fn role(&self, id: ColumnId) -> FieldRole {
        self.columns[id.0].role
    }

    /// Column handles in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        (0..self.columns.len()).map(ColumnId)
    }

    /// Column handles with the given role, in insertion order.
    pub fn ids_with_role(&self, role: FieldRole) -> impl Iterator<Item = ColumnId> + '_ {
        self.ids().filter(move |id| self.role(*id) == role)
    }

    /// Row indices where every listed column is present.
    #[must_use]
    pub fn complete_rows(&self, ids: &[ColumnId]) -> Vec<usize> {
        (0..self.rows)
            .filter(|&row| ids.iter().all(|id| !self.values(*id)[row].is_nan()))
            .collect()
    }

    /// Count of missing cells in a column.
    #[must_use]
    pub fn missing_count(&self, id: ColumnId) -> usize {
        self.values(id).iter().filter(|v| v.is_nan()).count()
    }
}

fn parse_column<'a, I>(name: &str, cells: I, missing: &MissingTokens) -> Result<Vec<f64>, CoreError>
where
    I: Iterator<Item = &'a str>,
{
    cells
        .enumerate()
        .map(|(row, cell)| {
            if missing.is_missing(cell) {
                return Ok(f64::NAN);
            }
            cell.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| CoreError::NonNumeric {
                    column: name.to_string(),
                    row: row + 1,
                    value: cell.to_string(),
                })
        })
        .collect()
}

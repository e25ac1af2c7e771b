//! Declared survey schema.
//!
//! The schema names every column the analyses rely on together with its
//! role. It is checked exactly once, against the input header, when a
//! [`Dataset`](crate::Dataset) is loaded; after that every analysis resolves
//! columns through [`ColumnId`](crate::ColumnId) handles instead of raw
//! strings.

use serde::{Deserialize, Serialize};

use crate::composite::CompositeGroup;
use crate::enums::FieldRole;
use crate::errors::CoreError;

/// A single declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
    /// Loading fails when a required field is absent from the header.
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySchema {
    fields: Vec<FieldSpec>,
}

impl SurveySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required scored variable (ENT, DEPNDT, ...).
    #[must_use]
    pub fn score(self, name: &str) -> Self {
        self.field(name, FieldRole::Score, true)
    }

    /// Declare an optional scored variable.
    #[must_use]
    pub fn optional_score(self, name: &str) -> Self {
        self.field(name, FieldRole::Score, false)
    }

    /// Declare an optional demographic field.
    #[must_use]
    pub fn demographic(self, name: &str) -> Self {
        self.field(name, FieldRole::Demographic, false)
    }

    /// Declare every item of a composite group as a required item column.
    #[must_use]
    pub fn item_group(self, group: &CompositeGroup) -> Self {
        group
            .items
            .iter()
            .fold(self, |schema, item| schema.field(item, FieldRole::Item, true))
    }

    /// Declare a field. Re-declaring a name keeps the first role and makes
    /// the field required if either declaration was.
    #[must_use]
    pub fn field(mut self, name: &str, role: FieldRole, required: bool) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.required |= required;
        } else {
            self.fields.push(FieldSpec {
                name: name.to_string(),
                role,
                required,
            });
        }
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check the input header against the declared fields.
    ///
    /// Returns, for each header position, the role the column will carry
    /// in the dataset (`Extra` for undeclared columns).
    pub fn validate_header(&self, header: &[String]) -> Result<Vec<FieldRole>, CoreError> {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| f.required && !header.iter().any(|h| h == &f.name))
        {
            return Err(CoreError::MissingColumn {
                column: missing.name.clone(),
            });
        }

        Ok(header
            .iter()
            .map(|name| self.get(name).map_or(FieldRole::Extra, |f| f.role))
            .collect())
    }
}

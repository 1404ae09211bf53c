//! The record model: one parsed input row plus its validation annotation.
//!
//! A [`Record`] is created by the reader, annotated exactly once by a
//! [`Validator`](crate::Validator) running on a worker, and then moved into a
//! single [`Partition`](crate::Partition) by the router.

use serde::{Deserialize, Serialize};

/// Number of fields every well-formed input row carries.
pub const FIELD_COUNT: usize = 5;

/// Column names, in input order.
pub const HEADER_COLUMNS: [&str; FIELD_COUNT] =
    ["ID Number", "Name", "Phone Number", "Email", "Gender"];

/// Name of the extra trailing column carried by the invalid partition.
pub const ERRORS_COLUMN: &str = "Errors";

/// Result of applying the field rules to one record.
///
/// Reasons keep the order in which rules were evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid { reasons: Vec<String> },
}

impl ValidationOutcome {
    /// Build an outcome from accumulated reasons; no reasons means `Valid`.
    #[must_use]
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        if reasons.is_empty() {
            Self::Valid
        } else {
            Self::Invalid { reasons }
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Reasons for failure; empty for `Valid`.
    #[must_use]
    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Valid => &[],
            Self::Invalid { reasons } => reasons,
        }
    }

    /// Reasons joined with `", "`, no trailing separator.
    #[must_use]
    pub fn joined(&self) -> String {
        self.reasons().join(", ")
    }
}

/// One member row.
///
/// Field text is stored exactly as read. Rules and routing trim as needed, and
/// sinks write the original text back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 0-based index in the parsed input sequence. Diagnostics only.
    pub position: usize,
    pub id_number: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub gender: String,
    errors: Option<Vec<String>>,
}

impl Record {
    /// Create an unannotated record.
    pub fn new(
        position: usize,
        id_number: impl Into<String>,
        name: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            position,
            id_number: id_number.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
            gender: gender.into(),
            errors: None,
        }
    }

    /// Build a record from a split row.
    ///
    /// Returns `None` when the row does not have exactly [`FIELD_COUNT`]
    /// fields; such rows are excluded from every partition.
    #[must_use]
    pub fn from_fields<S: AsRef<str>>(position: usize, fields: &[S]) -> Option<Self> {
        match fields {
            [id, name, phone, email, gender] => Some(Self::new(
                position,
                id.as_ref(),
                name.as_ref(),
                phone.as_ref(),
                email.as_ref(),
                gender.as_ref(),
            )),
            _ => None,
        }
    }

    /// Attach a validation outcome, consuming the unannotated record.
    ///
    /// An `Invalid` outcome without reasons is stored as valid.
    #[must_use]
    pub fn annotate(mut self, outcome: ValidationOutcome) -> Self {
        self.errors = match outcome {
            ValidationOutcome::Invalid { reasons } if !reasons.is_empty() => Some(reasons),
            _ => None,
        };
        self
    }

    /// `true` when a failed validation outcome is attached.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Attached reasons; empty when valid or not yet validated.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    /// Attached reasons joined with `", "`.
    #[must_use]
    pub fn joined_errors(&self) -> String {
        self.errors().join(", ")
    }

    /// Field values in [`HEADER_COLUMNS`] order.
    #[must_use]
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            self.id_number.as_str(),
            self.name.as_str(),
            self.phone_number.as_str(),
            self.email.as_str(),
            self.gender.as_str(),
        ]
    }
}

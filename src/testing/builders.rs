//! Test data builders for creating records fluently.

use crate::record::{Record, ValidationOutcome};

/// A fluent builder for one [`Record`].
///
/// Starts from a record that passes every rule and routes to `Male`; override
/// only the fields a test cares about.
///
/// # Example
///
/// ```
/// use ironsieve::testing::RecordBuilder;
/// use ironsieve::{FieldRules, Validator};
///
/// let record = RecordBuilder::new(7).phone_number("123").build();
/// assert_eq!(record.position, 7);
/// assert!(!FieldRules.validate(&record).is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
    outcome: Option<ValidationOutcome>,
}

impl RecordBuilder {
    /// A valid `Male` record at `position`.
    #[must_use]
    pub fn new(position: usize) -> Self {
        Self {
            record: Record::new(
                position,
                "12345678",
                format!("Member {position}"),
                "1234567890",
                "member@example.com",
                "Male",
            ),
            outcome: None,
        }
    }

    #[must_use]
    pub fn id_number(mut self, value: impl Into<String>) -> Self {
        self.record.id_number = value.into();
        self
    }

    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.record.name = value.into();
        self
    }

    #[must_use]
    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.record.phone_number = value.into();
        self
    }

    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.record.email = value.into();
        self
    }

    #[must_use]
    pub fn gender(mut self, value: impl Into<String>) -> Self {
        self.record.gender = value.into();
        self
    }

    /// Pre-annotate the record with failure reasons, as a worker would.
    #[must_use]
    pub fn with_errors<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outcome = Some(ValidationOutcome::from_reasons(
            reasons.into_iter().map(Into::into).collect(),
        ));
        self
    }

    #[must_use]
    pub fn build(self) -> Record {
        match self.outcome {
            Some(outcome) => self.record.annotate(outcome),
            None => self.record,
        }
    }
}

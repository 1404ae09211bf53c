//! Field-shape validation for member records.
//!
//! Validation checks format, not meaning: an identifier must look like an
//! identifier, a phone number like a phone number, an email like an email.
//! A failed check is a [`ValidationOutcome::Invalid`], never an error, so a
//! bad row can not stop a run.
//!
//! # Example
//!
//! ```
//! use ironsieve::{FieldRules, Record, Validator};
//!
//! let record = Record::new(0, "1", "John", "2", "bad", "Female");
//! let outcome = FieldRules.validate(&record);
//! assert_eq!(outcome.joined(), "Invalid ID Number, Invalid Phone Number, Invalid Email");
//! ```

use crate::record::{Record, ValidationOutcome};
use regex::Regex;
use std::sync::LazyLock;

/// Reason attached when the identifier is not 8 digits.
pub const INVALID_ID_NUMBER: &str = "Invalid ID Number";
/// Reason attached when the phone number is not 10 digits.
pub const INVALID_PHONE_NUMBER: &str = "Invalid Phone Number";
/// Reason attached when the email does not match the address pattern.
pub const INVALID_EMAIL: &str = "Invalid Email";

// `\d` would accept any Unicode digit.
static ID_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9]{8}$"));
static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9]{10}$"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$")
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in validation pattern must compile")
}

/// Rule evaluation for one record.
///
/// Implementations must be pure: the worker pool calls `validate` from many
/// threads at once without synchronization.
pub trait Validator: Send + Sync {
    /// Validate a record and report every failed rule.
    fn validate(&self, record: &Record) -> ValidationOutcome;
}

/// The standard identifier / phone / email rule set.
///
/// All three rules always run; failures accumulate in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRules;

impl Validator for FieldRules {
    fn validate(&self, record: &Record) -> ValidationOutcome {
        combine_outcomes(vec![
            check(is_valid_id_number(&record.id_number), INVALID_ID_NUMBER),
            check(is_valid_phone_number(&record.phone_number), INVALID_PHONE_NUMBER),
            check(is_valid_email(&record.email), INVALID_EMAIL),
        ])
    }
}

fn check(passed: bool, reason: &str) -> ValidationOutcome {
    if passed {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Invalid {
            reasons: vec![reason.to_string()],
        }
    }
}

/// `true` when the trimmed value is exactly 8 ASCII digits.
#[must_use]
pub fn is_valid_id_number(value: &str) -> bool {
    ID_NUMBER.is_match(value.trim())
}

/// `true` when the trimmed value is exactly 10 ASCII digits.
#[must_use]
pub fn is_valid_phone_number(value: &str) -> bool {
    PHONE_NUMBER.is_match(value.trim())
}

/// `true` when the trimmed value is a full match of the address pattern.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Combine multiple outcomes, keeping reasons in input order.
#[must_use]
pub fn combine_outcomes(outcomes: Vec<ValidationOutcome>) -> ValidationOutcome {
    let mut all_reasons = Vec::new();
    for outcome in outcomes {
        if let ValidationOutcome::Invalid { mut reasons } = outcome {
            all_reasons.append(&mut reasons);
        }
    }
    ValidationOutcome::from_reasons(all_reasons)
}

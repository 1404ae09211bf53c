//! Validators that misbehave on purpose, for exercising pool failure paths.

use crate::record::{Record, ValidationOutcome};
use crate::validation::{FieldRules, Validator};
use std::thread;
use std::time::Duration;

/// Runs [`FieldRules`] but panics on the record at `position`.
#[derive(Debug, Clone, Copy)]
pub struct PanickingValidator {
    pub position: usize,
}

impl Validator for PanickingValidator {
    fn validate(&self, record: &Record) -> ValidationOutcome {
        assert!(
            record.position != self.position,
            "injected fault at position {}",
            self.position
        );
        FieldRules.validate(record)
    }
}

/// Runs [`FieldRules`] after sleeping `delay` per record.
#[derive(Debug, Clone, Copy)]
pub struct SlowValidator {
    pub delay: Duration,
}

impl Validator for SlowValidator {
    fn validate(&self, record: &Record) -> ValidationOutcome {
        thread::sleep(self.delay);
        FieldRules.validate(record)
    }
}

/// Runs [`FieldRules`], sleeping longer for earlier positions.
///
/// Early batches finish last, so results arrive in reverse completion order.
#[derive(Debug, Clone, Copy)]
pub struct ReverseDelayValidator {
    pub total: usize,
    pub step: Duration,
}

impl Validator for ReverseDelayValidator {
    fn validate(&self, record: &Record) -> ValidationOutcome {
        let remaining = self.total.saturating_sub(record.position);
        thread::sleep(self.step * u32::try_from(remaining).unwrap_or(u32::MAX));
        FieldRules.validate(record)
    }
}

/// Runs [`FieldRules`], then leaves `linger` of extra work queued on the
/// worker's pool for every record.
///
/// Batch results arrive on time, but the pool can not drain until the extra
/// work is done.
#[derive(Debug, Clone, Copy)]
pub struct LingeringValidator {
    pub linger: Duration,
}

impl Validator for LingeringValidator {
    fn validate(&self, record: &Record) -> ValidationOutcome {
        let linger = self.linger;
        rayon::spawn(move || thread::sleep(linger));
        FieldRules.validate(record)
    }
}

//! Feature building for loan amount model inference.
//!
//! Validates a raw application against a profile and assembles the feature
//! vector in the exact slot order the profile's estimator was trained on.

use std::collections::HashMap;
use tracing::debug;

use crate::contract::encoding::{
    FrequencyScheme, PaymentStatus, SavingFrequency, StatusScheme, BASELINE_FREQUENCY,
};
use crate::contract::schema::{Bound, Encoder, FeatureProfile, FieldKind, FieldSpec};
use crate::error::ValidationError;
use crate::types::application::RawApplicationInput;

/// Ordered, named model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<&'static str>,
    values: Vec<f32>,
}

impl FeatureVector {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, name: &'static str, value: f32) {
        self.names.push(name);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in slot order, as passed to the estimator
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Value of a named slot
    pub fn get(&self, name: &str) -> Option<f32> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.names.iter().copied().zip(self.values.iter().copied())
    }
}

/// A field after parsing and bound checks
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue {
    Number(f64),
    Frequency(SavingFrequency),
    Status(PaymentStatus),
}

impl FieldValue {
    fn numeric(self) -> f64 {
        match self {
            FieldValue::Number(n) => n,
            FieldValue::Frequency(f) => f.code() as f64,
            FieldValue::Status(s) => s.ordinal() as f64,
        }
    }
}

/// Transforms raw applications into model input for one profile.
///
/// Validation runs in a fixed order: presence of required fields, the
/// joined/created year rule, per-field parsing and bounds, then one-hot
/// group exclusivity. The first failure is returned.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    profile: &'static FeatureProfile,
}

impl FeatureBuilder {
    pub fn new(profile: &'static FeatureProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'static FeatureProfile {
        self.profile
    }

    pub fn feature_count(&self) -> usize {
        self.profile.feature_count()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.profile.feature_names()
    }

    /// Validate `raw` and build its feature vector
    pub fn build(&self, raw: &RawApplicationInput) -> Result<FeatureVector, ValidationError> {
        let profile = self.profile;

        if let Some(spec) = profile.fields.iter().find(|f| f.required && !raw.contains(f.name)) {
            return Err(ValidationError::missing(spec.name));
        }

        if let Some(years) = profile.year_order {
            let joined = raw.integer(years.joined)?;
            let created = raw.integer(years.created)?;
            if joined < created {
                return Err(ValidationError::JoinedBeforeCreated {
                    field: years.joined.to_string(),
                    joined,
                    created,
                });
            }
        }

        let mut values = HashMap::with_capacity(profile.fields.len());
        for spec in profile.fields {
            if !raw.contains(spec.name) {
                continue;
            }
            values.insert(spec.name, parse_field(raw, spec)?);
        }

        for group in profile.one_hot_groups {
            let set = group
                .columns
                .iter()
                .filter(|c| values.get(*c).map(|v| v.numeric() == 1.0).unwrap_or(false))
                .count();
            if set != 1 {
                return Err(ValidationError::invalid(
                    group.name,
                    format!("exactly one one-hot column must be 1, found {}", set),
                ));
            }
        }

        let mut features = FeatureVector::with_capacity(profile.slots.len());
        for slot in profile.slots {
            let value = encode(&slot.encoder, &values)? as f32;
            // Derived slots can overflow f32 even when every input fits
            if !value.is_finite() {
                return Err(ValidationError::invalid(slot.name, "out of range"));
            }
            features.push(slot.name, value);
        }

        debug!(
            profile = %profile.name,
            features = features.len(),
            "Feature vector built"
        );

        Ok(features)
    }
}

fn parse_field(raw: &RawApplicationInput, spec: &FieldSpec) -> Result<FieldValue, ValidationError> {
    let name = spec.name;
    let value = match spec.kind {
        FieldKind::Integer => FieldValue::Number(raw.integer(name)? as f64),
        FieldKind::Decimal => FieldValue::Number(raw.decimal(name)?),
        FieldKind::Flag => FieldValue::Number(bool_value(raw.flag(name)?)),
        FieldKind::Bit => FieldValue::Number(bool_value(raw.bit(name)?)),
        FieldKind::Employment => FieldValue::Number(bool_value(employment(raw, name)?)),
        FieldKind::Frequency(scheme) => FieldValue::Frequency(frequency(raw, name, scheme)?),
        FieldKind::Status(scheme) => FieldValue::Status(status(raw, name, scheme)?),
    };

    if let FieldValue::Number(n) = value {
        if !(n as f32).is_finite() {
            return Err(ValidationError::invalid(name, "out of range"));
        }
        check_bound(name, n, spec.bound)?;
    }
    Ok(value)
}

fn check_bound(name: &str, value: f64, bound: Bound) -> Result<(), ValidationError> {
    match bound {
        Bound::Any => Ok(()),
        Bound::NonNegative if value < 0.0 => {
            Err(ValidationError::invalid(name, "must be non-negative"))
        }
        Bound::AtLeast(min) if value < min as f64 => {
            Err(ValidationError::invalid(name, format!("must be at least {}", min)))
        }
        _ => Ok(()),
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn employment(raw: &RawApplicationInput, name: &str) -> Result<bool, ValidationError> {
    match raw.get(name) {
        Some(serde_json::Value::String(s)) => Ok(s.trim().eq_ignore_ascii_case("employed")),
        _ => raw.flag(name),
    }
}

fn frequency(
    raw: &RawApplicationInput,
    name: &str,
    scheme: FrequencyScheme,
) -> Result<SavingFrequency, ValidationError> {
    match scheme {
        FrequencyScheme::Labels => {
            let label = raw.text(name)?;
            Ok(SavingFrequency::from_label(label).unwrap_or_else(|| {
                debug!(field = name, label, "Unrecognised saving frequency, using baseline");
                BASELINE_FREQUENCY
            }))
        }
        FrequencyScheme::Codes => {
            let code = raw.integer(name)?;
            SavingFrequency::from_code(code).ok_or_else(|| {
                ValidationError::invalid(name, "must be 1 (daily), 2 (weekly) or 3 (monthly)")
            })
        }
    }
}

fn status(
    raw: &RawApplicationInput,
    name: &str,
    scheme: StatusScheme,
) -> Result<PaymentStatus, ValidationError> {
    match scheme {
        StatusScheme::Labels => {
            let label = raw.text(name)?;
            PaymentStatus::from_label(label).ok_or_else(|| {
                let expected: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.label()).collect();
                ValidationError::invalid(
                    name,
                    format!("unknown status {:?}, expected one of {}", label, expected.join(", ")),
                )
            })
        }
        StatusScheme::ModelCodes => {
            let code = raw.integer(name)?;
            PaymentStatus::from_model_code(code)
                .ok_or_else(|| ValidationError::invalid(name, "must be between 0 and 4"))
        }
        StatusScheme::BackendCodes => Ok(PaymentStatus::from_backend_code(raw.integer(name)?)),
    }
}

fn encode(
    encoder: &Encoder,
    values: &HashMap<&'static str, FieldValue>,
) -> Result<f64, ValidationError> {
    let lookup = |field: &'static str| {
        values
            .get(field)
            .copied()
            .ok_or_else(|| ValidationError::missing(field))
    };

    match *encoder {
        Encoder::Value(field) => Ok(lookup(field)?.numeric()),
        Encoder::TotalCycles {
            explicit,
            times_per_period,
            frequency,
        } => {
            if let Some(value) = explicit.and_then(|f| values.get(f)) {
                return Ok(value.numeric());
            }
            let times = lookup(times_per_period)?.numeric();
            let per_year = match lookup(frequency)? {
                FieldValue::Frequency(f) => f.cycles_per_year(),
                _ => BASELINE_FREQUENCY.cycles_per_year(),
            };
            Ok(times * per_year as f64)
        }
        Encoder::FrequencyIs(field, expected) => match lookup(field)? {
            FieldValue::Frequency(f) => Ok(bool_value(f == expected)),
            _ => Err(ValidationError::invalid(field, "not a saving frequency")),
        },
        Encoder::StatusIs(field, expected) => match lookup(field)? {
            FieldValue::Status(s) => Ok(bool_value(s == expected)),
            _ => Err(ValidationError::invalid(field, "not a payment status")),
        },
    }
}

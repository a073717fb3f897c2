//! Declarative feature contract: input fields, encoders and slot order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::contract::encoding::{FrequencyScheme, PaymentStatus, SavingFrequency, StatusScheme};

/// Named deployment profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    /// String labels for frequency and status, derived cycle count, age and employment
    #[default]
    LabelledV1,
    /// Integer codes for frequency and status, explicit cycle count
    CodedV2,
    /// Integer codes with the backend's wider status scale
    BackendV3,
    /// Model columns supplied already encoded
    PreEncoded,
}

impl ProfileName {
    pub const ALL: [ProfileName; 4] = [
        ProfileName::LabelledV1,
        ProfileName::CodedV2,
        ProfileName::BackendV3,
        ProfileName::PreEncoded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileName::LabelledV1 => "labelled_v1",
            ProfileName::CodedV2 => "coded_v2",
            ProfileName::BackendV3 => "backend_v3",
            ProfileName::PreEncoded => "pre_encoded",
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown contract profile: {}", s))
    }
}

/// How a raw field is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
    /// Truthy value coerced to 0/1
    Flag,
    /// "employed" → 1, any other label → 0
    Employment,
    /// Strict 0/1 column of a pre-encoded one-hot group
    Bit,
    Frequency(FrequencyScheme),
    Status(StatusScheme),
}

/// Lower bound applied to numeric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Any,
    NonNegative,
    AtLeast(i64),
}

/// One input field of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub bound: Bound,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind, bound: Bound) -> Self {
        Self {
            name,
            kind,
            bound,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, bound: Bound) -> Self {
        Self {
            name,
            kind,
            bound,
            required: false,
        }
    }
}

/// Computes one feature slot from validated fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// Numeric value of a field; categorical fields yield their ordinal code
    Value(&'static str),
    /// Explicit cycle count when supplied, otherwise times-per-period
    /// multiplied by the frequency's cycles per year
    TotalCycles {
        explicit: Option<&'static str>,
        times_per_period: &'static str,
        frequency: &'static str,
    },
    /// 1 when the frequency field equals the given value
    FrequencyIs(&'static str, SavingFrequency),
    /// 1 when the status field equals the given value
    StatusIs(&'static str, PaymentStatus),
}

/// A named slot of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSlot {
    pub name: &'static str,
    pub encoder: Encoder,
}

impl FeatureSlot {
    pub const fn new(name: &'static str, encoder: Encoder) -> Self {
        Self { name, encoder }
    }
}

/// Membership year must not precede the group's creation year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearOrder {
    pub joined: &'static str,
    pub created: &'static str,
}

/// Pre-encoded columns of which exactly one must be set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHotGroup {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// A complete, versioned feature contract
#[derive(Debug, PartialEq, Eq)]
pub struct FeatureProfile {
    pub name: ProfileName,
    /// Prediction route served for this profile
    pub route: &'static str,
    pub fields: &'static [FieldSpec],
    pub year_order: Option<YearOrder>,
    pub one_hot_groups: &'static [OneHotGroup],
    /// Slot order the estimator was trained on
    pub slots: &'static [FeatureSlot],
}

impl FeatureProfile {
    pub fn feature_count(&self) -> usize {
        self.slots.len()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.name).collect()
    }

    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_round_trip() {
        for name in ProfileName::ALL {
            assert_eq!(name.as_str().parse::<ProfileName>(), Ok(name));
        }
        assert!("v5".parse::<ProfileName>().is_err());
    }

    #[test]
    fn test_profile_name_deserializes_snake_case() {
        let name: ProfileName = serde_json::from_str("\"backend_v3\"").unwrap();
        assert_eq!(name, ProfileName::BackendV3);
    }
}

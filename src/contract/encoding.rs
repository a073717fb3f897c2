//! Categorical domains and their input schemes

use serde::Serialize;

/// How often a savings group collects contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl SavingFrequency {
    pub const ALL: [SavingFrequency; 3] = [
        SavingFrequency::Daily,
        SavingFrequency::Weekly,
        SavingFrequency::Monthly,
    ];

    /// Collection periods per year
    pub fn cycles_per_year(self) -> i64 {
        match self {
            SavingFrequency::Daily => 365,
            SavingFrequency::Weekly => 52,
            SavingFrequency::Monthly => 12,
        }
    }

    /// Parse a case-insensitive label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(SavingFrequency::Daily),
            "weekly" => Some(SavingFrequency::Weekly),
            "monthly" => Some(SavingFrequency::Monthly),
            _ => None,
        }
    }

    /// Parse the backend code (1 = daily, 2 = weekly, 3 = monthly)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SavingFrequency::Daily),
            2 => Some(SavingFrequency::Weekly),
            3 => Some(SavingFrequency::Monthly),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            SavingFrequency::Daily => 1,
            SavingFrequency::Weekly => 2,
            SavingFrequency::Monthly => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SavingFrequency::Daily => "daily",
            SavingFrequency::Weekly => "weekly",
            SavingFrequency::Monthly => "monthly",
        }
    }
}

/// Repayment record of a member's recent loans, worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PaymentStatus {
    Poor,
    Bad,
    Good,
    Better,
    Excellent,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Poor,
        PaymentStatus::Bad,
        PaymentStatus::Good,
        PaymentStatus::Better,
        PaymentStatus::Excellent,
    ];

    /// Position on the model's native 0..=4 scale
    pub fn ordinal(self) -> i64 {
        match self {
            PaymentStatus::Poor => 0,
            PaymentStatus::Bad => 1,
            PaymentStatus::Good => 2,
            PaymentStatus::Better => 3,
            PaymentStatus::Excellent => 4,
        }
    }

    /// Parse a case-insensitive label ("Poor" .. "Excellent")
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "poor" => Some(PaymentStatus::Poor),
            "bad" => Some(PaymentStatus::Bad),
            "good" => Some(PaymentStatus::Good),
            "better" => Some(PaymentStatus::Better),
            "excellent" => Some(PaymentStatus::Excellent),
            _ => None,
        }
    }

    /// Parse a code on the model's native scale (0 = Poor .. 4 = Excellent)
    pub fn from_model_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.ordinal() == code)
    }

    /// Compress a backend status code onto the model scale.
    ///
    /// The backend scores 0 = no loans, 1 = poor .. 5 = excellent. Members
    /// without loans share the lowest tier; unknown codes fall back to it.
    pub fn from_backend_code(code: i64) -> Self {
        match code {
            0 | 1 => PaymentStatus::Poor,
            2 => PaymentStatus::Bad,
            3 => PaymentStatus::Good,
            4 => PaymentStatus::Better,
            5 => PaymentStatus::Excellent,
            _ => PaymentStatus::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Poor => "Poor",
            PaymentStatus::Bad => "Bad",
            PaymentStatus::Good => "Good",
            PaymentStatus::Better => "Better",
            PaymentStatus::Excellent => "Excellent",
        }
    }
}

/// Accepted representation of a saving frequency field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyScheme {
    /// "daily" / "weekly" / "monthly"; anything else falls back to monthly
    Labels,
    /// 1 / 2 / 3; anything else is rejected
    Codes,
}

/// Accepted representation of a payment status field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScheme {
    /// "Poor" .. "Excellent"; anything else is rejected
    Labels,
    /// 0..=4; anything else is rejected
    ModelCodes,
    /// 0..=5 compressed by [`PaymentStatus::from_backend_code`]
    BackendCodes,
}

/// Frequency assumed for unrecognised labels. Matches the 12-per-year
/// fallback of the cycle derivation.
pub const BASELINE_FREQUENCY: SavingFrequency = SavingFrequency::Monthly;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_per_year() {
        assert_eq!(SavingFrequency::Daily.cycles_per_year(), 365);
        assert_eq!(SavingFrequency::Weekly.cycles_per_year(), 52);
        assert_eq!(SavingFrequency::Monthly.cycles_per_year(), 12);
        assert_eq!(BASELINE_FREQUENCY.cycles_per_year(), 12);
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!(SavingFrequency::from_label(" Weekly "), Some(SavingFrequency::Weekly));
        assert_eq!(SavingFrequency::from_label("fortnightly"), None);
        assert_eq!(SavingFrequency::from_code(1), Some(SavingFrequency::Daily));
        assert_eq!(SavingFrequency::from_code(4), None);

        for frequency in SavingFrequency::ALL {
            assert_eq!(SavingFrequency::from_code(frequency.code()), Some(frequency));
            assert_eq!(SavingFrequency::from_label(frequency.label()), Some(frequency));
        }
    }

    #[test]
    fn test_backend_status_remap() {
        assert_eq!(PaymentStatus::from_backend_code(0), PaymentStatus::Poor);
        assert_eq!(PaymentStatus::from_backend_code(1), PaymentStatus::Poor);
        assert_eq!(PaymentStatus::from_backend_code(2), PaymentStatus::Bad);
        assert_eq!(PaymentStatus::from_backend_code(3), PaymentStatus::Good);
        assert_eq!(PaymentStatus::from_backend_code(4), PaymentStatus::Better);
        assert_eq!(PaymentStatus::from_backend_code(5), PaymentStatus::Excellent);
        assert_eq!(PaymentStatus::from_backend_code(6), PaymentStatus::Poor);
        assert_eq!(PaymentStatus::from_backend_code(-1), PaymentStatus::Poor);
    }

    #[test]
    fn test_status_scales() {
        assert_eq!(PaymentStatus::from_model_code(0), Some(PaymentStatus::Poor));
        assert_eq!(PaymentStatus::from_model_code(4), Some(PaymentStatus::Excellent));
        assert_eq!(PaymentStatus::from_model_code(5), None);
        assert_eq!(PaymentStatus::from_label("excellent"), Some(PaymentStatus::Excellent));
        assert_eq!(PaymentStatus::from_label("NoLoans"), None);
        assert!(PaymentStatus::Poor < PaymentStatus::Excellent);
    }
}

//! Deployed feature contracts.
//!
//! Each profile pins the field names callers send and the exact slot order
//! its estimator was trained on. Slot order differs between profiles even
//! where the slot names agree; never reorder an existing profile, add a new
//! one instead.

use crate::contract::encoding::{FrequencyScheme, StatusScheme};
use crate::contract::schema::{
    Bound, Encoder, FeatureProfile, FeatureSlot, FieldSpec, OneHotGroup, ProfileName,
    YearOrder,
};

use crate::contract::encoding::PaymentStatus::{Bad, Better, Excellent, Good, Poor};
use crate::contract::encoding::SavingFrequency::{Daily, Monthly, Weekly};
use crate::contract::schema::Bound::{AtLeast, NonNegative};
use crate::contract::schema::Encoder::{FrequencyIs, StatusIs, Value};
use crate::contract::schema::FieldKind::{Bit, Decimal, Employment, Flag, Frequency, Integer, Status};

/// Earliest year accepted by the backend for group creation and membership
pub const MIN_YEAR: i64 = 1900;

const IKIMINA_YEARS: YearOrder = YearOrder {
    joined: "user_joined_year",
    created: "ikimina_created_year",
};

/// Look up the profile for a name
pub fn profile(name: ProfileName) -> &'static FeatureProfile {
    match name {
        ProfileName::LabelledV1 => &LABELLED_V1,
        ProfileName::CodedV2 => &CODED_V2,
        ProfileName::BackendV3 => &BACKEND_V3,
        ProfileName::PreEncoded => &PRE_ENCODED,
    }
}

// ---------------------------------------------------------------------------
// labelled_v1
// ---------------------------------------------------------------------------

pub static LABELLED_V1: FeatureProfile = FeatureProfile {
    name: ProfileName::LabelledV1,
    route: "/predict-loan",
    fields: &[
        FieldSpec::required("saving_times_per_period", Integer, NonNegative),
        FieldSpec::required("completed_saving_cycles", Integer, NonNegative),
        FieldSpec::required("user_savings_made", Integer, NonNegative),
        FieldSpec::required("total_current_saving", Decimal, NonNegative),
        FieldSpec::required("ikimina_created_year", Integer, NonNegative),
        FieldSpec::required("user_joined_year", Integer, NonNegative),
        FieldSpec::required("user_age", Integer, NonNegative),
        FieldSpec::required("has_guardian", Flag, Bound::Any),
        FieldSpec::required("employment_status", Employment, Bound::Any),
        FieldSpec::required("saving_frequency", Frequency(FrequencyScheme::Labels), Bound::Any),
        FieldSpec::required("recent_loan_payment_status", Status(StatusScheme::Labels), Bound::Any),
    ],
    year_order: Some(IKIMINA_YEARS),
    one_hot_groups: &[],
    slots: &[
        FeatureSlot::new("SavingTimesPerPeriod", Value("saving_times_per_period")),
        FeatureSlot::new(
            "TotalSavingCycles",
            Encoder::TotalCycles {
                explicit: None,
                times_per_period: "saving_times_per_period",
                frequency: "saving_frequency",
            },
        ),
        FeatureSlot::new("CompletedSavingCycles", Value("completed_saving_cycles")),
        FeatureSlot::new("UserSavingsMade", Value("user_savings_made")),
        FeatureSlot::new("TotalCurrentSaving", Value("total_current_saving")),
        FeatureSlot::new("IkiminaCreatedYear", Value("ikimina_created_year")),
        FeatureSlot::new("UserJoinedYear", Value("user_joined_year")),
        FeatureSlot::new("Age", Value("user_age")),
        FeatureSlot::new("HasGuardian", Value("has_guardian")),
        FeatureSlot::new("IsEmployed", Value("employment_status")),
        FeatureSlot::new("SavingFrequency_daily", FrequencyIs("saving_frequency", Daily)),
        FeatureSlot::new("SavingFrequency_monthly", FrequencyIs("saving_frequency", Monthly)),
        FeatureSlot::new("SavingFrequency_weekly", FrequencyIs("saving_frequency", Weekly)),
        FeatureSlot::new("RecentLoanPaymentStatus_Bad", StatusIs("recent_loan_payment_status", Bad)),
        FeatureSlot::new("RecentLoanPaymentStatus_Better", StatusIs("recent_loan_payment_status", Better)),
        FeatureSlot::new(
            "RecentLoanPaymentStatus_Excellent",
            StatusIs("recent_loan_payment_status", Excellent),
        ),
        FeatureSlot::new("RecentLoanPaymentStatus_Good", StatusIs("recent_loan_payment_status", Good)),
        FeatureSlot::new("RecentLoanPaymentStatus_Poor", StatusIs("recent_loan_payment_status", Poor)),
    ],
};

// ---------------------------------------------------------------------------
// coded_v2 / backend_v3
// ---------------------------------------------------------------------------

/// Slot order shared by the integer-coded profiles
const CODED_SLOTS: &[FeatureSlot] = &[
    FeatureSlot::new("SavingTimesPerPeriod", Value("saving_times_per_period")),
    FeatureSlot::new(
        "TotalSavingCycles",
        Encoder::TotalCycles {
            explicit: Some("total_saving_cycles"),
            times_per_period: "saving_times_per_period",
            frequency: "saving_frequency",
        },
    ),
    FeatureSlot::new("CompletedSavingCycles", Value("completed_saving_cycles")),
    FeatureSlot::new("UserSavingsMade", Value("user_savings_made")),
    FeatureSlot::new("TotalCurrentSaving", Value("total_current_saving")),
    FeatureSlot::new("IkiminaCreatedYear", Value("ikimina_created_year")),
    FeatureSlot::new("UserJoinedYear", Value("user_joined_year")),
    FeatureSlot::new("HasGuardian", Value("has_guardian")),
    FeatureSlot::new("SavingFrequency_daily", FrequencyIs("saving_frequency", Daily)),
    FeatureSlot::new("SavingFrequency_weekly", FrequencyIs("saving_frequency", Weekly)),
    FeatureSlot::new("SavingFrequency_monthly", FrequencyIs("saving_frequency", Monthly)),
    FeatureSlot::new(
        "RecentLoanPaymentStatus_Excellent",
        StatusIs("recent_loan_payment_status", Excellent),
    ),
    FeatureSlot::new("RecentLoanPaymentStatus_Better", StatusIs("recent_loan_payment_status", Better)),
    FeatureSlot::new("RecentLoanPaymentStatus_Good", StatusIs("recent_loan_payment_status", Good)),
    FeatureSlot::new("RecentLoanPaymentStatus_Bad", StatusIs("recent_loan_payment_status", Bad)),
    FeatureSlot::new("RecentLoanPaymentStatus_Poor", StatusIs("recent_loan_payment_status", Poor)),
];

pub static CODED_V2: FeatureProfile = FeatureProfile {
    name: ProfileName::CodedV2,
    route: "/predict-loan",
    fields: &[
        FieldSpec::required("saving_times_per_period", Integer, NonNegative),
        FieldSpec::required("total_saving_cycles", Integer, NonNegative),
        FieldSpec::required("completed_saving_cycles", Integer, NonNegative),
        FieldSpec::required("user_savings_made", Integer, NonNegative),
        FieldSpec::required("total_current_saving", Decimal, NonNegative),
        FieldSpec::required("ikimina_created_year", Integer, NonNegative),
        FieldSpec::required("user_joined_year", Integer, NonNegative),
        FieldSpec::required("has_guardian", Flag, Bound::Any),
        FieldSpec::required("saving_frequency", Frequency(FrequencyScheme::Codes), Bound::Any),
        FieldSpec::required(
            "recent_loan_payment_status",
            Status(StatusScheme::ModelCodes),
            Bound::Any,
        ),
    ],
    year_order: Some(IKIMINA_YEARS),
    one_hot_groups: &[],
    slots: CODED_SLOTS,
};

pub static BACKEND_V3: FeatureProfile = FeatureProfile {
    name: ProfileName::BackendV3,
    route: "/predict-loan",
    fields: &[
        FieldSpec::required("saving_times_per_period", Integer, NonNegative),
        FieldSpec::optional("total_saving_cycles", Integer, NonNegative),
        FieldSpec::required("completed_saving_cycles", Integer, NonNegative),
        FieldSpec::required("user_savings_made", Integer, NonNegative),
        FieldSpec::required("total_current_saving", Decimal, NonNegative),
        FieldSpec::required("ikimina_created_year", Integer, AtLeast(MIN_YEAR)),
        FieldSpec::required("user_joined_year", Integer, AtLeast(MIN_YEAR)),
        FieldSpec::required("has_guardian", Flag, Bound::Any),
        FieldSpec::required("saving_frequency", Frequency(FrequencyScheme::Codes), Bound::Any),
        FieldSpec::required(
            "recent_loan_payment_status",
            Status(StatusScheme::BackendCodes),
            Bound::Any,
        ),
    ],
    year_order: Some(IKIMINA_YEARS),
    one_hot_groups: &[],
    slots: CODED_SLOTS,
};

// ---------------------------------------------------------------------------
// pre_encoded
// ---------------------------------------------------------------------------

const FREQUENCY_COLUMNS: &[&str] = &[
    "SavingFrequency_daily",
    "SavingFrequency_monthly",
    "SavingFrequency_weekly",
];

const STATUS_COLUMNS: &[&str] = &[
    "RecentLoanPaymentStatus_Bad",
    "RecentLoanPaymentStatus_Better",
    "RecentLoanPaymentStatus_Excellent",
    "RecentLoanPaymentStatus_Good",
    "RecentLoanPaymentStatus_Poor",
];

pub static PRE_ENCODED: FeatureProfile = FeatureProfile {
    name: ProfileName::PreEncoded,
    route: "/predict",
    fields: &[
        FieldSpec::required("SavingTimesPerPeriod", Integer, NonNegative),
        FieldSpec::required("TotalSavingCycles", Integer, NonNegative),
        FieldSpec::required("CompletedSavingCycles", Integer, NonNegative),
        FieldSpec::required("UserSavingsMade", Integer, NonNegative),
        FieldSpec::required("TotalCurrentSaving", Decimal, NonNegative),
        FieldSpec::required("IkiminaCreatedYear", Integer, NonNegative),
        FieldSpec::required("UserJoinedYear", Integer, NonNegative),
        FieldSpec::required("Age", Integer, NonNegative),
        FieldSpec::required("HasGuardian", Flag, Bound::Any),
        FieldSpec::required("IsEmployed", Flag, Bound::Any),
        FieldSpec::required("SavingFrequency_daily", Bit, Bound::Any),
        FieldSpec::required("SavingFrequency_monthly", Bit, Bound::Any),
        FieldSpec::required("SavingFrequency_weekly", Bit, Bound::Any),
        FieldSpec::required("RecentLoanPaymentStatus_Bad", Bit, Bound::Any),
        FieldSpec::required("RecentLoanPaymentStatus_Better", Bit, Bound::Any),
        FieldSpec::required("RecentLoanPaymentStatus_Excellent", Bit, Bound::Any),
        FieldSpec::required("RecentLoanPaymentStatus_Good", Bit, Bound::Any),
        FieldSpec::required("RecentLoanPaymentStatus_Poor", Bit, Bound::Any),
    ],
    year_order: Some(YearOrder {
        joined: "UserJoinedYear",
        created: "IkiminaCreatedYear",
    }),
    one_hot_groups: &[
        OneHotGroup {
            name: "SavingFrequency",
            columns: FREQUENCY_COLUMNS,
        },
        OneHotGroup {
            name: "RecentLoanPaymentStatus",
            columns: STATUS_COLUMNS,
        },
    ],
    slots: &[
        FeatureSlot::new("SavingTimesPerPeriod", Value("SavingTimesPerPeriod")),
        FeatureSlot::new("TotalSavingCycles", Value("TotalSavingCycles")),
        FeatureSlot::new("CompletedSavingCycles", Value("CompletedSavingCycles")),
        FeatureSlot::new("UserSavingsMade", Value("UserSavingsMade")),
        FeatureSlot::new("TotalCurrentSaving", Value("TotalCurrentSaving")),
        FeatureSlot::new("IkiminaCreatedYear", Value("IkiminaCreatedYear")),
        FeatureSlot::new("UserJoinedYear", Value("UserJoinedYear")),
        FeatureSlot::new("Age", Value("Age")),
        FeatureSlot::new("HasGuardian", Value("HasGuardian")),
        FeatureSlot::new("IsEmployed", Value("IsEmployed")),
        FeatureSlot::new("SavingFrequency_daily", Value("SavingFrequency_daily")),
        FeatureSlot::new("SavingFrequency_monthly", Value("SavingFrequency_monthly")),
        FeatureSlot::new("SavingFrequency_weekly", Value("SavingFrequency_weekly")),
        FeatureSlot::new("RecentLoanPaymentStatus_Bad", Value("RecentLoanPaymentStatus_Bad")),
        FeatureSlot::new("RecentLoanPaymentStatus_Better", Value("RecentLoanPaymentStatus_Better")),
        FeatureSlot::new(
            "RecentLoanPaymentStatus_Excellent",
            Value("RecentLoanPaymentStatus_Excellent"),
        ),
        FeatureSlot::new("RecentLoanPaymentStatus_Good", Value("RecentLoanPaymentStatus_Good")),
        FeatureSlot::new("RecentLoanPaymentStatus_Poor", Value("RecentLoanPaymentStatus_Poor")),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::schema::FieldKind;
    use std::collections::HashSet;

    #[test]
    fn test_slot_counts() {
        assert_eq!(LABELLED_V1.feature_count(), 18);
        assert_eq!(CODED_V2.feature_count(), 16);
        assert_eq!(BACKEND_V3.feature_count(), 16);
        assert_eq!(PRE_ENCODED.feature_count(), 18);
    }

    #[test]
    fn test_labelled_order() {
        assert_eq!(
            LABELLED_V1.feature_names(),
            vec![
                "SavingTimesPerPeriod",
                "TotalSavingCycles",
                "CompletedSavingCycles",
                "UserSavingsMade",
                "TotalCurrentSaving",
                "IkiminaCreatedYear",
                "UserJoinedYear",
                "Age",
                "HasGuardian",
                "IsEmployed",
                "SavingFrequency_daily",
                "SavingFrequency_monthly",
                "SavingFrequency_weekly",
                "RecentLoanPaymentStatus_Bad",
                "RecentLoanPaymentStatus_Better",
                "RecentLoanPaymentStatus_Excellent",
                "RecentLoanPaymentStatus_Good",
                "RecentLoanPaymentStatus_Poor",
            ]
        );
        // The pre-encoded contract feeds the same model columns
        assert_eq!(LABELLED_V1.feature_names(), PRE_ENCODED.feature_names());
    }

    #[test]
    fn test_coded_order() {
        let names = CODED_V2.feature_names();
        assert_eq!(names[8..11], ["SavingFrequency_daily", "SavingFrequency_weekly", "SavingFrequency_monthly"]);
        assert_eq!(names[11], "RecentLoanPaymentStatus_Excellent");
        assert_eq!(names[15], "RecentLoanPaymentStatus_Poor");
    }

    #[test]
    fn test_profiles_are_self_consistent() {
        for name in ProfileName::ALL {
            let p = profile(name);
            assert_eq!(p.name, name);

            let slot_names: HashSet<_> = p.slots.iter().map(|s| s.name).collect();
            assert_eq!(slot_names.len(), p.slots.len(), "{} has duplicate slots", name);

            let field_names: HashSet<_> = p.fields.iter().map(|f| f.name).collect();
            assert_eq!(field_names.len(), p.fields.len(), "{} has duplicate fields", name);

            // Every field an encoder reads must be declared
            for slot in p.slots {
                let reads: Vec<&str> = match slot.encoder {
                    Encoder::Value(f) | Encoder::FrequencyIs(f, _) | Encoder::StatusIs(f, _) => vec![f],
                    Encoder::TotalCycles {
                        explicit,
                        times_per_period,
                        frequency,
                    } => explicit
                        .into_iter()
                        .chain([times_per_period, frequency])
                        .collect(),
                };
                for field in reads {
                    assert!(p.field(field).is_some(), "{}: {} reads undeclared {}", name, slot.name, field);
                }
            }

            if let Some(years) = p.year_order {
                assert!(p.field(years.joined).is_some());
                assert!(p.field(years.created).is_some());
            }
            for group in p.one_hot_groups {
                for column in group.columns {
                    assert_eq!(p.field(column).map(|f| f.kind), Some(FieldKind::Bit));
                }
            }
        }
    }

    #[test]
    fn test_backend_profile_makes_cycles_optional() {
        let required = BACKEND_V3.required_fields();
        assert!(!required.contains(&"total_saving_cycles"));
        assert!(CODED_V2.required_fields().contains(&"total_saving_cycles"));
    }
}

//! Feature contract: versioned profiles and the builder that applies them

pub mod builder;
pub mod encoding;
pub mod profiles;
pub mod schema;

pub use builder::{FeatureBuilder, FeatureVector};
pub use encoding::{PaymentStatus, SavingFrequency};
pub use profiles::profile;
pub use schema::{FeatureProfile, ProfileName};

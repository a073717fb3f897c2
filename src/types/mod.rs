//! Request and response types of the scoring gateway

pub mod application;
pub mod response;

pub use application::RawApplicationInput;
pub use response::{ErrorResponse, PredictionResponse};

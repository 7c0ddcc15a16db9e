//! Form validation: single-field format checks, the declarative rule
//! engine, and the per-step rule tables built on it.

pub mod fields;
pub mod rules;
pub mod steps;

mod errors;

pub use errors::FieldErrors;
pub use fields::{
    validate_amount, validate_date, validate_ein, validate_email, validate_mls,
    validate_percentage, validate_phone, validate_zip,
};
pub use steps::{
    MLS_FORMAT_MESSAGE, NO_CLIENTS_MESSAGE, invalid_steps, validate_all, validate_step,
};

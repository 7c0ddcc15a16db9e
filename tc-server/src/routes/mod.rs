pub mod cover_sheet;
pub mod documents;
pub mod error;
pub mod health;
pub mod transactions;

pub use error::{ApiError, ApiResult, ErrorResponse};

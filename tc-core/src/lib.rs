pub mod db;
pub mod form;
pub mod models;
pub mod submission;
pub mod template;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use db::repository::{RepositoryError, TransactionRepository};
pub use form::{FormStore, FormStoreError};
pub use models::*;
pub use validation::{FieldErrors, validate_all, validate_step};

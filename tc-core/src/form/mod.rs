mod store;

pub use store::{FormStore, FormStoreError};

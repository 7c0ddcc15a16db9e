pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::{DOCUMENT_URL_PREFIX, SqliteRepository};

//! Hosted record-store backend: transactions live in a remote table reached
//! over REST, cover sheets in an object-storage bucket.

mod http;

pub mod factory;
pub mod field_map;
pub mod repository;
pub mod storage;

pub use factory::HostedRepositoryFactory;
pub use field_map::{FieldMap, FieldMapError};
pub use repository::HostedRepository;
pub use storage::StorageClient;

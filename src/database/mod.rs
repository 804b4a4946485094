pub mod memory;
pub mod postgres_service;
pub mod repository;

pub use memory::MemoryRepository;
pub use postgres_service::PostgresRepository;
pub use repository::{Repository, RepositoryError, RepositoryResult};

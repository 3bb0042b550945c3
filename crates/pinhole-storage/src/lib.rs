//! Repository implementations for Pinhole.

pub mod memory;
pub mod mysql;
pub mod timeout;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use pinhole_core::repository::{ReadRepository, Repository, Result, VisitUpdate};
pub use pinhole_core::StorageError;
pub use timeout::TimeoutRepository;

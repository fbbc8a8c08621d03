//! certprep-store: attempt repositories.
//!
//! Implements [`AttemptRepository`](certprep_core::traits::AttemptRepository)
//! in memory and as a JSON file, plus the configuration that picks one.

pub mod config;
pub mod json;
pub mod memory;
pub mod retry;

pub use certprep_core::error::RepositoryError;
pub use config::{
    create_repository, load_config_from, open_repository, CertprepConfig, StoreConfig,
};
pub use json::JsonFileAttemptStore;
pub use memory::InMemoryAttemptStore;
pub use retry::RetryingRepository;

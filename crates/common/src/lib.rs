//! Common utilities and shared types for memento.
//!
//! This crate provides foundational components used across all memento crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Consistency reports**: Partial-failure values shared by the lifecycle
//!   manager and the HTTP layer ([`PartialUpload`], [`InconsistencyWarning`])
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Object storage backends (local, in-memory, S3-compatible)
//!
//! # Example
//!
//! ```no_run
//! use memento_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {} (storage: {:?})", id, config.storage);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod consistency;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use consistency::{
    FailureStage, FileFailure, InconsistencyKind, InconsistencyWarning, PartialUpload,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, MemoryStorage, SharedStorage, StorageBackend, StorageConfig, StoredObject,
    build_storage, generate_storage_key,
};

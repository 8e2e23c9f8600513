//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LoggingConfig (validated, immutable)
//!     → LoggerRegistry::configure_all
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → registry swaps every named pipeline
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A rejected reload keeps every current logger

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::EnvironmentConfig;
pub use schema::LoggerConfig;
pub use schema::LoggingConfig;
pub use schema::ServerConfig;

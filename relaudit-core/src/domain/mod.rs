pub mod catalog;
pub mod dependency;
pub mod error;
pub mod integrity;
pub mod plan;
pub mod report;
pub mod sql;

// Shorthand re-exports
pub use error::{DomainError, QueryError};

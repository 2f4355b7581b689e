// relaudit-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: the Connector contract every engine implements.
pub mod ports;

// 2. Domain: catalog model, dependency and integrity results, SQL generation,
// audit plan and report aggregation. Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: DuckDB / DataFusion adapters, YAML configuration, files.
pub mod infrastructure;

// 4. Application: catalog reading, the two checkers and the audit runner.
pub mod application;

pub mod error;

pub use error::RelauditError;

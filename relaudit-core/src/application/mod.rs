// relaudit-core/src/application/mod.rs

pub mod audit;
pub mod catalog_reader;
pub mod engine;
pub mod integrity;
pub mod normalization;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support;

// --- RE-EXPORTS (FACADE) ---
// The CLI only needs `use relaudit_core::application::{run_audit, AuditOptions, CatalogReader};`

pub use audit::{AuditOptions, run_audit};
pub use catalog_reader::CatalogReader;
pub use integrity::IntegrityChecker;
pub use normalization::NormalizationChecker;

pub mod audit;
pub mod connection;
pub mod project;

pub use audit::{AuditConfig, DependencySpec, EdgeSpec, ExecutionConfig};
pub use connection::{ConnectionOutput, ConnectionProfile, Engine, load_connections, resolve_output};
pub use project::load_audit_config;

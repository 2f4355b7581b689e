// relaudit-core/src/domain/catalog/mod.rs

pub mod edge;
pub mod snapshot;
pub mod table;

pub use edge::{EdgeOrigin, ForeignKeyEdge};
pub use snapshot::CatalogSnapshot;
pub use table::{ColumnRef, TableRef, TableSchema};

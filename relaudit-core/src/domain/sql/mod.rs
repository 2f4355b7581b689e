// relaudit-core/src/domain/sql/mod.rs

pub mod queries;
pub mod quoter;

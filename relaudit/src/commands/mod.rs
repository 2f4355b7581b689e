// relaudit/src/commands/mod.rs

pub mod audit;
pub mod catalog;
pub mod project;

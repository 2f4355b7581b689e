// relaudit-core/src/domain/sql/quoter.rs

use sqlparser::ast::{Ident, Value};

use crate::domain::catalog::TableRef;

/// Double-quoted identifier, embedded quotes doubled.
pub fn ident(name: &str) -> String {
    Ident::with_quote('"', name).to_string()
}

/// `"schema"."table"`
pub fn table(table: &TableRef) -> String {
    format!("{}.{}", ident(&table.schema), ident(&table.name))
}

/// `alias."column"`
pub fn qualified(alias: &str, column: &str) -> String {
    format!("{}.{}", alias, ident(column))
}

/// Single-quoted string literal for catalog lookups.
pub fn literal(value: &str) -> String {
    Value::SingleQuotedString(value.to_string()).to_string()
}

pub fn ident_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

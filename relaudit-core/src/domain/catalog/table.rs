// relaudit-core/src/domain/catalog/table.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::DomainError;

/// Qualified table name. Unique within one catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parses `table` or `schema.table`, falling back to `default_schema`.
    pub fn parse(raw: &str, default_schema: &str) -> Result<Self, DomainError> {
        let parts: Vec<&str> = raw.split('.').map(str::trim).collect();
        match parts.as_slice() {
            [name] if !name.is_empty() => Ok(Self::new(default_schema, *name)),
            [schema, name] if !schema.is_empty() && !name.is_empty() => {
                Ok(Self::new(*schema, *name))
            }
            _ => Err(DomainError::InvalidTableName(raw.to_string())),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableRef,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// A table as seen by the catalog reader: its columns (in ordinal order) and
/// its declared primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: TableRef,
    pub columns: Vec<ColumnRef>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableSchema {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The single primary-key column, if the key is neither composite nor missing.
    pub fn single_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [key] => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn non_key_columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns
            .iter()
            .filter(|c| !self.primary_key.contains(&c.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unqualified_uses_default_schema() {
        let t = TableRef::parse("students", "main").unwrap();
        assert_eq!(t, TableRef::new("main", "students"));
        assert_eq!(t.to_string(), "main.students");
    }

    #[test]
    fn test_parse_qualified() {
        let t = TableRef::parse("registrar.enrollments", "main").unwrap();
        assert_eq!(t.schema, "registrar");
        assert_eq!(t.name, "enrollments");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TableRef::parse("", "main").is_err());
        assert!(TableRef::parse("a.b.c", "main").is_err());
        assert!(TableRef::parse(".students", "main").is_err());
    }

    #[test]
    fn test_single_key() {
        let table = TableRef::new("main", "grades");
        let col = |n: &str| ColumnRef {
            table: table.clone(),
            name: n.into(),
            data_type: "INTEGER".into(),
            is_nullable: false,
        };
        let mut schema = TableSchema {
            table: table.clone(),
            columns: vec![col("sid"), col("cid"), col("grade")],
            primary_key: vec!["sid".into()],
        };
        assert_eq!(schema.single_key(), Some("sid"));
        assert_eq!(schema.non_key_columns().count(), 2);

        schema.primary_key.push("cid".into());
        assert_eq!(schema.single_key(), None);
        assert_eq!(schema.non_key_columns().count(), 1);
    }
}

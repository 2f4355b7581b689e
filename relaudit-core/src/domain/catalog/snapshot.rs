// relaudit-core/src/domain/catalog/snapshot.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::edge::{EdgeOrigin, ForeignKeyEdge};
use super::table::{TableRef, TableSchema};
use crate::domain::error::DomainError;

/// Everything the catalog reader learned about one schema during one run.
/// Built once, never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub tables: Vec<TableSchema>,
    pub edges: Vec<ForeignKeyEdge>,
}

impl CatalogSnapshot {
    /// Builds a snapshot, rejecting duplicate table names.
    pub fn new(
        tables: Vec<TableSchema>,
        declared: Vec<ForeignKeyEdge>,
    ) -> Result<Self, DomainError> {
        for (i, t) in tables.iter().enumerate() {
            if tables[..i].iter().any(|prev| prev.table == t.table) {
                return Err(DomainError::DuplicateTable(t.table.to_string()));
            }
        }

        let mut edges: Vec<ForeignKeyEdge> = Vec::with_capacity(declared.len());
        for edge in declared {
            if !edges.iter().any(|e| e.same_relationship(&edge)) {
                edges.push(edge);
            }
        }

        Ok(Self { tables, edges })
    }

    pub fn table(&self, table: &TableRef) -> Option<&TableSchema> {
        self.tables.iter().find(|t| &t.table == table)
    }

    pub fn table_refs(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.iter().map(|t| &t.table)
    }

    /// Declared edges whose child is `table`. Empty is a valid answer.
    pub fn edges_from<'a>(&'a self, table: &'a TableRef) -> impl Iterator<Item = &'a ForeignKeyEdge> {
        self.edges.iter().filter(move |e| &e.child == table)
    }

    pub fn require_table(&self, table: &TableRef) -> Result<&TableSchema, DomainError> {
        self.table(table)
            .ok_or_else(|| DomainError::UnknownTable(table.to_string()))
    }

    pub fn require_columns(&self, table: &TableRef, columns: &[String]) -> Result<(), DomainError> {
        let schema = self.require_table(table)?;
        match columns.iter().find(|c| !schema.has_column(c)) {
            Some(missing) => Err(DomainError::UnknownColumn {
                table: table.to_string(),
                column: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Replaces the primary key of each listed table with the configured one.
    /// Engines without declared constraints rely on this for inference and sweeps.
    pub fn with_primary_keys(mut self, keys: &[(TableRef, Vec<String>)]) -> Result<Self, DomainError> {
        for (table, columns) in keys {
            if columns.is_empty() {
                return Err(DomainError::InvalidCandidate {
                    subject: format!("key of {}", table),
                    reason: "a primary key needs at least one column".into(),
                });
            }
            self.require_columns(table, columns)?;
            if let Some(schema) = self.tables.iter_mut().find(|t| &t.table == table) {
                schema.primary_key = columns.clone();
            }
        }
        Ok(self)
    }

    /// Naming-convention inference for databases that declare no constraints.
    ///
    /// A parent with a single-column primary key `k` is referenced by every other
    /// table owning a column literally named `k`. Key names shared by several
    /// parents are ambiguous and skipped. Edges already present in `known`
    /// (declared or manual) on the same child columns are not repeated.
    pub fn infer_edges(&self, known: &[ForeignKeyEdge]) -> Vec<ForeignKeyEdge> {
        let mut parents_by_key: HashMap<&str, Vec<&TableSchema>> = HashMap::new();
        for t in &self.tables {
            if let Some(key) = t.single_key() {
                parents_by_key.entry(key).or_default().push(t);
            }
        }

        let mut inferred = Vec::new();
        for child in &self.tables {
            for column in &child.columns {
                let Some(parents) = parents_by_key.get(column.name.as_str()) else {
                    continue;
                };
                let parent = match parents.as_slice() {
                    [only] if only.table != child.table => *only,
                    [_] => continue,
                    _ => {
                        if !parents.iter().any(|p| p.table == child.table) {
                            warn!(
                                child = %child.table,
                                column = %column.name,
                                "Ambiguous key name shared by {} parents, not inferring",
                                parents.len()
                            );
                        }
                        continue;
                    }
                };

                let already_known = known.iter().chain(self.edges.iter()).any(|e| {
                    e.child == child.table && e.child_columns == [column.name.clone()]
                });
                if already_known {
                    continue;
                }

                inferred.push(ForeignKeyEdge::new(
                    child.table.clone(),
                    vec![column.name.clone()],
                    parent.table.clone(),
                    vec![column.name.clone()],
                    EdgeOrigin::Inferred,
                ));
            }
        }
        inferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ColumnRef;

    fn table(name: &str, cols: &[&str], pk: &[&str]) -> TableSchema {
        let t = TableRef::new("main", name);
        TableSchema {
            columns: cols
                .iter()
                .map(|c| ColumnRef {
                    table: t.clone(),
                    name: c.to_string(),
                    data_type: "INTEGER".into(),
                    is_nullable: true,
                })
                .collect(),
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
            table: t,
        }
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let res = CatalogSnapshot::new(
            vec![table("a", &["id"], &["id"]), table("a", &["id"], &["id"])],
            vec![],
        );
        assert!(matches!(res, Err(DomainError::DuplicateTable(_))));
    }

    #[test]
    fn test_table_without_edges_is_not_an_error() {
        let snap = CatalogSnapshot::new(vec![table("students", &["sid"], &["sid"])], vec![])
            .unwrap();
        let students = TableRef::new("main", "students");
        assert_eq!(snap.edges_from(&students).count(), 0);
    }

    #[test]
    fn test_infer_edges_from_key_names() {
        let snap = CatalogSnapshot::new(
            vec![
                table("students", &["sid", "name", "level"], &["sid"]),
                table("courses", &["cid", "title"], &["cid"]),
                table("enrollments", &["sid", "cid"], &[]),
            ],
            vec![],
        )
        .unwrap();

        let inferred = snap.infer_edges(&[]);
        let rendered: Vec<String> = inferred.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "main.enrollments(sid) -> main.students(sid)",
                "main.enrollments(cid) -> main.courses(cid)",
            ]
        );
        assert!(inferred.iter().all(|e| e.origin == EdgeOrigin::Inferred));
    }

    #[test]
    fn test_infer_skips_ambiguous_and_known() {
        let snap = CatalogSnapshot::new(
            vec![
                table("a", &["id"], &["id"]),
                table("b", &["id"], &["id"]),
                table("c", &["id", "sid"], &[]),
                table("students", &["sid"], &["sid"]),
            ],
            vec![],
        )
        .unwrap();
        let known = vec![ForeignKeyEdge::new(
            TableRef::new("main", "c"),
            vec!["sid".into()],
            TableRef::new("main", "students"),
            vec!["sid".into()],
            EdgeOrigin::Manual,
        )];

        // `id` is the key of both a and b (and c's `id` is ambiguous), `sid` is already known.
        assert!(snap.infer_edges(&known).is_empty());
    }

    #[test]
    fn test_configured_keys_replace_reported_ones() {
        let snap = CatalogSnapshot::new(
            vec![
                table("students", &["sid", "name"], &[]),
                table("enrollments", &["sid", "cid"], &[]),
            ],
            vec![],
        )
        .unwrap();
        assert!(snap.infer_edges(&[]).is_empty());

        let students = TableRef::new("main", "students");
        let snap = snap
            .with_primary_keys(&[(students.clone(), vec!["sid".into()])])
            .unwrap();
        assert_eq!(snap.table(&students).unwrap().single_key(), Some("sid"));
        let rendered: Vec<String> = snap.infer_edges(&[]).iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered, vec!["main.enrollments(sid) -> main.students(sid)"]);
    }

    #[test]
    fn test_configured_keys_must_exist() {
        let snap = CatalogSnapshot::new(vec![table("students", &["sid"], &[])], vec![]).unwrap();
        let students = TableRef::new("main", "students");
        assert!(matches!(
            snap.clone().with_primary_keys(&[(students.clone(), vec!["id".into()])]),
            Err(DomainError::UnknownColumn { .. })
        ));
        assert!(matches!(
            snap.clone().with_primary_keys(&[(students, vec![])]),
            Err(DomainError::InvalidCandidate { .. })
        ));
        assert!(matches!(
            snap.with_primary_keys(&[(TableRef::new("main", "ghosts"), vec!["id".into()])]),
            Err(DomainError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_require_columns() {
        let snap =
            CatalogSnapshot::new(vec![table("payments", &["sid", "amount"], &[])], vec![]).unwrap();
        let payments = TableRef::new("main", "payments");
        assert!(snap.require_columns(&payments, &["amount".into()]).is_ok());
        assert!(matches!(
            snap.require_columns(&payments, &["fee".into()]),
            Err(DomainError::UnknownColumn { .. })
        ));
        assert!(matches!(
            snap.require_table(&TableRef::new("main", "nope")),
            Err(DomainError::UnknownTable(_))
        ));
    }
}

// relaudit-core/src/domain/plan.rs

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{CatalogSnapshot, ForeignKeyEdge, TableRef};
use crate::domain::dependency::{DependencyCandidate, NullPolicy};
use crate::domain::error::DomainError;

pub const COMPOSITE_KEY_SKIP: &str = "composite or missing primary key not considered";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    /// Check the foreign keys the database declares.
    pub include_declared: bool,
    /// Also check edges guessed from key column names.
    pub infer_edges: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            include_declared: true,
            infer_edges: false,
        }
    }
}

/// What the caller asked for, before it is checked against the catalog.
#[derive(Debug, Clone, Default)]
pub struct AuditRequest {
    pub schema: String,
    pub catalog: CatalogOptions,
    /// Manually supplied edges, for databases without declared constraints.
    pub edges: Vec<ForeignKeyEdge>,
    pub dependencies: Vec<DependencyCandidate>,
    /// Tables to sweep for dependencies between non-key columns.
    pub normalization: Vec<TableRef>,
    /// Primary keys supplied by configuration; they replace what the engine reports.
    pub primary_keys: Vec<(TableRef, Vec<String>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepStatus {
    Run,
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct NormalizationSweep {
    pub table: TableRef,
    pub status: SweepStatus,
    /// Every ordered pair (X, Y) of distinct non-key columns as `X -> Y`.
    pub pairs: Vec<DependencyCandidate>,
}

/// One unit of work for the worker pool.
#[derive(Debug, Clone)]
pub enum CheckTask {
    Integrity(ForeignKeyEdge),
    Dependency(DependencyCandidate),
    Sweep {
        sweep: usize,
        candidate: DependencyCandidate,
    },
}

/// The request resolved against one catalog snapshot. Every table and column
/// it mentions is known to exist.
#[derive(Debug, Clone, Default)]
pub struct AuditPlan {
    pub tables: Vec<TableRef>,
    pub edges: Vec<ForeignKeyEdge>,
    pub dependencies: Vec<DependencyCandidate>,
    pub sweeps: Vec<NormalizationSweep>,
}

impl AuditPlan {
    pub fn resolve(catalog: &CatalogSnapshot, request: &AuditRequest) -> Result<Self, DomainError> {
        for edge in &request.edges {
            validate_edge(catalog, edge)?;
        }
        for candidate in &request.dependencies {
            candidate.validate_shape()?;
            catalog.require_columns(&candidate.table, &candidate.pair_columns())?;
        }

        let mut edges: Vec<ForeignKeyEdge> = Vec::new();
        let mut push_unique = |edge: ForeignKeyEdge| {
            if !edges.iter().any(|e| e.same_relationship(&edge)) {
                edges.push(edge);
            }
        };
        request.edges.iter().cloned().for_each(&mut push_unique);
        if request.catalog.include_declared {
            catalog.edges.iter().cloned().for_each(&mut push_unique);
        }
        if request.catalog.infer_edges {
            catalog
                .infer_edges(&request.edges)
                .into_iter()
                .for_each(&mut push_unique);
        }

        let mut sweeps: Vec<NormalizationSweep> = Vec::new();
        for table in &request.normalization {
            if sweeps.iter().any(|s| &s.table == table) {
                continue;
            }
            sweeps.push(plan_sweep(catalog, table)?);
        }

        Ok(Self {
            tables: catalog.table_refs().cloned().collect(),
            edges,
            dependencies: request.dependencies.clone(),
            sweeps,
        })
    }

    /// Tasks in report order: edges, then dependencies, then sweep pairs.
    pub fn tasks(&self) -> Vec<CheckTask> {
        let edges = self.edges.iter().cloned().map(CheckTask::Integrity);
        let deps = self.dependencies.iter().cloned().map(CheckTask::Dependency);
        let sweeps = self.sweeps.iter().enumerate().flat_map(|(idx, s)| {
            s.pairs.iter().cloned().map(move |candidate| CheckTask::Sweep {
                sweep: idx,
                candidate,
            })
        });
        edges.chain(deps).chain(sweeps).collect()
    }
}

fn validate_edge(catalog: &CatalogSnapshot, edge: &ForeignKeyEdge) -> Result<(), DomainError> {
    if edge.child_columns.is_empty() || edge.child_columns.len() != edge.parent_columns.len() {
        return Err(DomainError::InvalidCandidate {
            subject: edge.to_string(),
            reason: format!(
                "child lists {} column(s), parent lists {}",
                edge.child_columns.len(),
                edge.parent_columns.len()
            ),
        });
    }
    catalog.require_columns(&edge.child, &edge.child_columns)?;
    catalog.require_columns(&edge.parent, &edge.parent_columns)?;
    Ok(())
}

fn plan_sweep(catalog: &CatalogSnapshot, table: &TableRef) -> Result<NormalizationSweep, DomainError> {
    let schema = catalog.require_table(table)?;
    if schema.single_key().is_none() {
        return Ok(NormalizationSweep {
            table: table.clone(),
            status: SweepStatus::Skipped(COMPOSITE_KEY_SKIP.to_string()),
            pairs: Vec::new(),
        });
    }

    let non_key: Vec<&str> = schema.non_key_columns().map(|c| c.name.as_str()).collect();
    let mut pairs = Vec::new();
    for x in &non_key {
        for y in &non_key {
            if x != y {
                pairs.push(
                    DependencyCandidate::new(
                        table.clone(),
                        vec![x.to_string()],
                        vec![y.to_string()],
                    )
                    .with_null_policy(NullPolicy::Exclude),
                );
            }
        }
    }

    Ok(NormalizationSweep {
        table: table.clone(),
        status: SweepStatus::Run,
        pairs,
    })
}

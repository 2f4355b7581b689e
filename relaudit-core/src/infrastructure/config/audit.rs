// relaudit-core/src/infrastructure/config/audit.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::domain::catalog::{EdgeOrigin, ForeignKeyEdge, TableRef};
use crate::domain::dependency::{DependencyCandidate, NullPolicy};
use crate::domain::error::DomainError;
use crate::domain::plan::{AuditRequest, CatalogOptions};

// `name` or `schema.name`; each part a plain identifier.
static TABLE_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_$]+(\.[A-Za-z0-9_$]+)?$"));
static COLUMN_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_$]+$"));

/// Contents of `relaudit.yaml`.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct AuditConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(rename = "config-paths", default)]
    pub config_paths: Vec<String>,

    #[serde(default)]
    pub catalog: CatalogOptions,

    #[serde(default)]
    #[validate(nested)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub integrity: Vec<EdgeSpec>,

    #[serde(default)]
    #[validate(nested)]
    pub dependencies: Vec<DependencySpec>,

    #[serde(default)]
    #[validate(custom(function = "validate_table_list"))]
    pub normalization: Vec<String>,

    /// `table: [columns]`, for engines that report no primary keys.
    #[serde(default)]
    #[validate(custom(function = "validate_keys"))]
    pub keys: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ExecutionConfig {
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 64, message = "concurrency must be between 1 and 64"))]
    pub concurrency: usize,

    /// Run-level budget. Checks still pending when it expires report "timeout".
    #[serde(default)]
    #[validate(range(min = 1))]
    pub timeout_secs: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: None,
        }
    }
}

/// A manually supplied edge. `parent_columns` defaults to the child's names.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[validate(schema(function = "validate_edge_arity"))]
pub struct EdgeSpec {
    #[validate(custom(function = "validate_table_name"))]
    pub child: String,

    #[validate(
        length(min = 1, message = "an edge needs at least one column"),
        custom(function = "validate_columns")
    )]
    pub columns: Vec<String>,

    #[validate(custom(function = "validate_table_name"))]
    pub parent: String,

    #[serde(default)]
    #[validate(custom(function = "validate_columns"))]
    pub parent_columns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct DependencySpec {
    #[validate(custom(function = "validate_table_name"))]
    pub table: String,

    #[validate(
        length(min = 1, message = "determinant cannot be empty"),
        custom(function = "validate_columns")
    )]
    pub determinant: Vec<String>,

    #[validate(
        length(min = 1, message = "dependent cannot be empty"),
        custom(function = "validate_columns")
    )]
    pub dependent: Vec<String>,

    #[serde(default)]
    pub nulls: NullPolicy,
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_concurrency() -> usize {
    4
}

impl AuditConfig {
    /// Builds the engine-independent request; unqualified names land in `default_schema`.
    pub fn to_request(&self, default_schema: &str) -> Result<AuditRequest, DomainError> {
        let edges = self
            .integrity
            .iter()
            .map(|spec| spec.to_edge(default_schema))
            .collect::<Result<Vec<_>, _>>()?;

        let dependencies = self
            .dependencies
            .iter()
            .map(|spec| {
                Ok(DependencyCandidate::new(
                    TableRef::parse(&spec.table, default_schema)?,
                    spec.determinant.clone(),
                    spec.dependent.clone(),
                )
                .with_null_policy(spec.nulls))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let normalization = self
            .normalization
            .iter()
            .map(|t| TableRef::parse(t, default_schema))
            .collect::<Result<Vec<_>, _>>()?;

        let primary_keys = self
            .keys
            .iter()
            .map(|(table, columns)| Ok((TableRef::parse(table, default_schema)?, columns.clone())))
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(AuditRequest {
            schema: default_schema.to_string(),
            catalog: self.catalog,
            edges,
            dependencies,
            normalization,
            primary_keys,
        })
    }
}

impl EdgeSpec {
    fn to_edge(&self, default_schema: &str) -> Result<ForeignKeyEdge, DomainError> {
        let parent_columns = if self.parent_columns.is_empty() {
            self.columns.clone()
        } else {
            self.parent_columns.clone()
        };
        Ok(ForeignKeyEdge::new(
            TableRef::parse(&self.child, default_schema)?,
            self.columns.clone(),
            TableRef::parse(&self.parent, default_schema)?,
            parent_columns,
            EdgeOrigin::Manual,
        ))
    }
}

// --- VALIDATORS ---

fn check_pattern(
    pattern: &LazyLock<Result<Regex, regex::Error>>,
    value: &str,
    code: &'static str,
) -> Result<(), ValidationError> {
    let Ok(re) = &**pattern else {
        return Err(ValidationError::new("identifier_pattern"));
    };
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(code)
            .with_message(Cow::Owned(format!("'{}' is not a valid identifier", value))))
    }
}

fn validate_table_name(value: &str) -> Result<(), ValidationError> {
    check_pattern(&TABLE_NAME, value, "table_name")
}

fn validate_table_list(tables: &[String]) -> Result<(), ValidationError> {
    tables.iter().try_for_each(|t| validate_table_name(t))
}

fn validate_columns(columns: &[String]) -> Result<(), ValidationError> {
    columns
        .iter()
        .try_for_each(|c| check_pattern(&COLUMN_NAME, c, "column_name"))
}

fn validate_keys(keys: &BTreeMap<String, Vec<String>>) -> Result<(), ValidationError> {
    for (table, columns) in keys {
        validate_table_name(table)?;
        if columns.is_empty() {
            return Err(ValidationError::new("empty_key")
                .with_message(Cow::Owned(format!("key of '{}' lists no columns", table))));
        }
        validate_columns(columns)?;
    }
    Ok(())
}

fn validate_edge_arity(edge: &EdgeSpec) -> Result<(), ValidationError> {
    if edge.parent_columns.is_empty() || edge.parent_columns.len() == edge.columns.len() {
        return Ok(());
    }
    Err(ValidationError::new("edge_arity").with_message(Cow::Owned(format!(
        "{} -> {}: {} child column(s) but {} parent column(s)",
        edge.child,
        edge.parent,
        edge.columns.len(),
        edge.parent_columns.len()
    ))))
}

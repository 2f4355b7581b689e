// relaudit-core/src/domain/report.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::TableRef;
use crate::domain::dependency::DependencyResult;
use crate::domain::integrity::IntegrityResult;
use crate::domain::plan::{AuditPlan, SweepStatus};

/// One requested check, in the order it was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    Integrity(IntegrityResult),
    Dependency(DependencyResult),
}

impl AuditEntry {
    pub fn passed(&self) -> bool {
        match self {
            AuditEntry::Integrity(r) => r.passed(),
            AuditEntry::Dependency(r) => r.passed(),
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            AuditEntry::Integrity(r) => r.error.is_some(),
            AuditEntry::Dependency(r) => r.error.is_some(),
        }
    }
}

/// What a worker hands back for one task of the plan.
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    Integrity(IntegrityResult),
    Dependency(DependencyResult),
    /// One column pair of a normalization sweep; `sweep` indexes `AuditPlan::sweeps`.
    Sweep {
        sweep: usize,
        result: DependencyResult,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "note", rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
    /// A check needed for the verdict failed to run.
    Unknown(String),
    Skipped(String),
    NotChecked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => write!(f, "Y"),
            Verdict::No => write!(f, "N"),
            Verdict::Unknown(_) => write!(f, "?"),
            Verdict::Skipped(reason) => write!(f, "skipped ({})", reason),
            Verdict::NotChecked => write!(f, "-"),
        }
    }
}

/// Per-table roll-up: "RI: Y/N, Normalized: Y/N".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: TableRef,
    pub referential_integrity: Verdict,
    pub normalized: Verdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub entries: Vec<AuditEntry>,
    pub tables: Vec<TableSummary>,
    pub pass: bool,
}

impl AuditReport {
    pub fn integrity_results(&self) -> impl Iterator<Item = &IntegrityResult> {
        self.entries.iter().filter_map(|e| match e {
            AuditEntry::Integrity(r) => Some(r),
            AuditEntry::Dependency(_) => None,
        })
    }

    pub fn dependency_results(&self) -> impl Iterator<Item = &DependencyResult> {
        self.entries.iter().filter_map(|e| match e {
            AuditEntry::Dependency(r) => Some(r),
            AuditEntry::Integrity(_) => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.passed()).count()
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_error()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct ReportAggregator;

impl ReportAggregator {
    /// Orders outcomes by task index (never by completion order) and folds
    /// them into the report.
    pub fn aggregate(plan: &AuditPlan, mut outcomes: Vec<(usize, CheckOutcome)>) -> AuditReport {
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut entries = Vec::with_capacity(outcomes.len());
        let mut sweep_results: Vec<Vec<DependencyResult>> = vec![Vec::new(); plan.sweeps.len()];

        for (_, outcome) in outcomes {
            match outcome {
                CheckOutcome::Integrity(r) => entries.push(AuditEntry::Integrity(r)),
                CheckOutcome::Dependency(r) => entries.push(AuditEntry::Dependency(r)),
                CheckOutcome::Sweep { sweep, result } => {
                    if let Some(slot) = sweep_results.get_mut(sweep) {
                        slot.push(result);
                    }
                }
            }
        }

        let tables = plan
            .tables
            .iter()
            .map(|table| {
                let mut findings = Vec::new();
                let referential_integrity = integrity_verdict(table, &entries, &mut findings);
                let normalized = match plan.sweeps.iter().position(|s| &s.table == table) {
                    Some(idx) => normalization_verdict(
                        &plan.sweeps[idx].status,
                        &sweep_results[idx],
                        &mut findings,
                    ),
                    None => Verdict::NotChecked,
                };
                TableSummary {
                    table: table.clone(),
                    referential_integrity,
                    normalized,
                    findings,
                }
            })
            .collect();

        let pass = entries.iter().all(AuditEntry::passed);

        AuditReport {
            entries,
            tables,
            pass,
        }
    }
}

/// A table with no checked outgoing edge satisfies integrity by convention.
fn integrity_verdict(
    table: &TableRef,
    entries: &[AuditEntry],
    findings: &mut Vec<String>,
) -> Verdict {
    let mut verdict = Verdict::Yes;
    for entry in entries {
        let AuditEntry::Integrity(r) = entry else {
            continue;
        };
        if &r.edge.child != table {
            continue;
        }
        if let Some(err) = &r.error {
            findings.push(format!("{}: {}", r.edge, err));
            if verdict == Verdict::Yes {
                verdict = Verdict::Unknown(err.reason.clone());
            }
        } else if r.violation_count > 0 {
            findings.push(format!("{}: {} orphan row(s)", r.edge, r.violation_count));
            verdict = Verdict::No;
        }
    }
    verdict
}

fn normalization_verdict(
    status: &SweepStatus,
    results: &[DependencyResult],
    findings: &mut Vec<String>,
) -> Verdict {
    if let SweepStatus::Skipped(reason) = status {
        return Verdict::Skipped(reason.clone());
    }

    let mut verdict = Verdict::Yes;
    for r in results {
        if let Some(err) = &r.error {
            findings.push(format!("{}: {}", r.candidate, err));
            if verdict == Verdict::Yes {
                verdict = Verdict::Unknown(err.reason.clone());
            }
        } else if r.is_transitive_violation() {
            findings.push(format!("dependency on non-key {}", r.candidate));
            verdict = Verdict::No;
        }
    }
    verdict
}

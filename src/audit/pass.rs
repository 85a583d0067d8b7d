//! # Audit Pass
//!
//! One full enumeration pass: every query goes to the oracle under the request budget,
//! failures are handled per [`QueryErrorPolicy`], and the collected results are aggregated
//! against the subject catalog.
//!
//! Queries fan out up to `burst` at a time, but results are consumed in enumeration order,
//! and the tree is only built once all of them are in.

use super::aggregator::{Aggregator, PermissionTree};
use super::catalog::SubjectCatalog;
use crate::config::{AuditConfig, QueryErrorPolicy};
use crate::error::{AuditError, AuditReport, Issue, IssueKind};
use crate::model::{Query, QueryResult};
use crate::oracle::{AuthorizationOracle, OracleError};
use crate::runtime::RequestBudget;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

/// Everything a pass produced
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    pub tree: PermissionTree,
    /// Successful results in enumeration order
    pub results: Vec<QueryResult>,
    pub report: AuditReport,
}

impl PassOutcome {
    /// A pass is complete when nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.report.is_clean()
    }
}

/// Run every query and aggregate the results
///
/// Returns an error only for a query failure under [`QueryErrorPolicy::FailFast`];
/// resolution failures and catalog listing failures end up in the report.
#[tracing::instrument(name = "audit.pass", skip_all, fields(policy = ?config.query_error_policy))]
pub async fn run_pass<I>(
    oracle: &dyn AuthorizationOracle,
    catalog: SubjectCatalog,
    queries: I,
    config: &AuditConfig,
    budget: &RequestBudget,
) -> Result<PassOutcome, AuditError>
where
    I: IntoIterator<Item = Query>,
{
    let mut report = AuditReport::default();
    report.extend(catalog.issues);

    let width = usize::try_from(config.burst).unwrap_or(usize::MAX).max(1);
    let mut checks = stream::iter(queries)
        .map(|query| async move {
            budget.acquire().await;
            let verdict = oracle.check(&query).await;
            (query, verdict)
        })
        .buffered(width);

    let mut results = Vec::new();
    let mut queries_run = 0usize;
    while let Some((query, verdict)) = checks.next().await {
        queries_run += 1;
        match verdict {
            Ok(result) => {
                debug!(
                    "{}: {} RoleBindings, {} ClusterRoleBindings",
                    query,
                    result.namespaced_bindings.len(),
                    result.cluster_bindings.len()
                );
                results.push(result);
            }
            Err(err @ OracleError::Resolution(_)) => {
                let err = err.into_audit_error(&query);
                warn!("Skipping {}: {}", query, err);
                report.record(Issue::skipped_query(IssueKind::Resolution, &query, err.to_string()));
            }
            Err(err @ OracleError::Query(_)) => match config.query_error_policy {
                QueryErrorPolicy::FailFast => {
                    error!("Aborting pass, {} failed: {}", query, err);
                    return Err(err.into_audit_error(&query));
                }
                QueryErrorPolicy::SkipAndRecord => {
                    warn!("Skipping {}: {}", query, err);
                    report.record(Issue::skipped_query(IssueKind::Query, &query, err.to_string()));
                }
            },
        }
    }

    let mut aggregator = Aggregator::new(catalog.subjects);
    for result in &results {
        aggregator.fold(result);
    }
    let uncatalogued = aggregator.uncatalogued_subjects().count();
    if uncatalogued > 0 {
        info!(
            "{} subjects hold grants without appearing in any listed binding",
            uncatalogued
        );
    }
    let tree = aggregator.finish();

    info!(
        "Audit pass finished: {} queries, {} results, {} subjects, {} issues",
        queries_run,
        results.len(),
        tree.len(),
        report.issues.len()
    );

    Ok(PassOutcome {
        tree,
        results,
        report,
    })
}

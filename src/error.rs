//! # Audit Errors
//!
//! Error types for an audit pass, classified by how far they propagate:
//! discovery and serialization errors abort the pass, resolution and listing errors are
//! recorded and skipped, query errors follow the configured [`QueryErrorPolicy`](crate::config::QueryErrorPolicy).

use crate::model::Query;
use serde::Serialize;
use thiserror::Error;

/// Audit pass error
#[derive(Debug, Error)]
pub enum AuditError {
    /// API resources could not be enumerated
    #[error("discovery failed: {0}")]
    Discovery(String),
    /// Resource/verb could not be mapped to a group-version-resource
    #[error("cannot resolve {verb} {resource}: {message}")]
    Resolution {
        resource: String,
        verb: String,
        message: String,
    },
    /// Authorization check failed
    #[error("who-can query '{query}' failed: {message}")]
    Query { query: String, message: String },
    /// Listing bindings for one source failed
    #[error("listing bindings for {scope} failed: {message}")]
    Listing { scope: String, message: String },
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Classification of a recorded, non-fatal problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    Resolution,
    Query,
    Listing,
}

/// One skipped query or failed listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    /// Listing source: a namespace name, `namespaces` or `cluster`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn skipped_query(kind: IssueKind, query: &Query, message: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: Some(query.namespace.clone()),
            resource: Some(query.resource.clone()),
            verb: Some(query.verb.clone()),
            scope: None,
            message: message.into(),
        }
    }

    pub fn listing(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Listing,
            namespace: None,
            resource: None,
            verb: None,
            scope: Some(scope.into()),
            message: message.into(),
        }
    }
}

/// Machine-readable summary of everything a pass skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub issues: Vec<Issue>,
}

impl AuditReport {
    pub fn record(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_query_issue_serialization() {
        let issue = Issue::skipped_query(
            IssueKind::Resolution,
            &Query::new("default", "widgets", "get"),
            "the server doesn't have a resource type \"widgets\"",
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "resolution");
        assert_eq!(json["namespace"], "default");
        assert_eq!(json["resource"], "widgets");
        assert_eq!(json["verb"], "get");
        assert!(json.get("scope").is_none());
    }

    #[test]
    fn test_report_counts() {
        let mut report = AuditReport::default();
        assert!(report.is_clean());
        report.record(Issue::listing("kube-public", "forbidden"));
        report.record(Issue::listing("cluster", "forbidden"));
        report.record(Issue::skipped_query(
            IssueKind::Query,
            &Query::new("default", "pods", "get"),
            "timeout",
        ));
        assert!(!report.is_clean());
        assert_eq!(report.count(IssueKind::Listing), 2);
        assert_eq!(report.count(IssueKind::Query), 1);
        assert_eq!(report.count(IssueKind::Resolution), 0);
    }
}

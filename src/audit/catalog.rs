//! # Subject Catalog
//!
//! Collects the distinct subjects referenced by every RoleBinding (in every namespace) and
//! every ClusterRoleBinding.
//!
//! Listing is partial-failure tolerant: a namespace that cannot be listed is recorded as an
//! issue and skipped, and a failed ClusterRoleBinding listing keeps the subjects already
//! collected from namespaces.

use crate::error::{AuditError, Issue};
use crate::model::{GrantingBinding, Subject};
use crate::runtime::RequestBudget;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Source of bindings for the catalog
#[async_trait]
pub trait BindingLister: Send + Sync {
    /// Names of all namespaces in the cluster
    async fn list_namespaces(&self) -> Result<Vec<String>, AuditError>;

    /// RoleBindings in one namespace
    async fn list_role_bindings(&self, namespace: &str) -> Result<Vec<GrantingBinding>, AuditError>;

    /// All ClusterRoleBindings
    async fn list_cluster_role_bindings(&self) -> Result<Vec<GrantingBinding>, AuditError>;
}

/// Deduplicated subjects plus the listings that failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectCatalog {
    pub subjects: BTreeSet<Subject>,
    pub issues: Vec<Issue>,
}

impl SubjectCatalog {
    fn add_bindings(&mut self, bindings: &[GrantingBinding]) {
        for binding in bindings {
            self.subjects.extend(binding.subjects.iter().cloned());
        }
    }
}

/// Collect subjects from every namespace-scoped and cluster-scoped binding
///
/// Namespace listings run with at most `concurrency` in flight; results are merged here,
/// by a single writer.
#[tracing::instrument(name = "audit.catalog.collect", skip_all, fields(concurrency = concurrency))]
pub async fn collect_subjects(
    lister: &dyn BindingLister,
    budget: &RequestBudget,
    concurrency: usize,
) -> SubjectCatalog {
    let mut catalog = SubjectCatalog::default();

    budget.acquire().await;
    let namespaces = match lister.list_namespaces().await {
        Ok(namespaces) => namespaces,
        Err(e) => {
            warn!("Unable to list namespaces, RoleBinding subjects will be missing: {}", e);
            catalog.issues.push(Issue::listing("namespaces", e.to_string()));
            Vec::new()
        }
    };
    debug!("Listing RoleBindings in {} namespaces", namespaces.len());

    let mut listings = stream::iter(namespaces)
        .map(|namespace| async move {
            budget.acquire().await;
            let result = lister.list_role_bindings(&namespace).await;
            (namespace, result)
        })
        .buffer_unordered(concurrency.max(1));

    let mut namespace_issues = Vec::new();
    while let Some((namespace, result)) = listings.next().await {
        match result {
            Ok(bindings) => {
                debug!(namespace = %namespace, "Listed {} RoleBindings", bindings.len());
                catalog.add_bindings(&bindings);
            }
            Err(e) => {
                warn!(namespace = %namespace, "Unable to list RoleBindings: {}", e);
                namespace_issues.push(Issue::listing(namespace, e.to_string()));
            }
        }
    }
    // Completion order is arbitrary; report failures in namespace order.
    namespace_issues.sort_by(|a, b| a.scope.cmp(&b.scope));
    catalog.issues.extend(namespace_issues);

    budget.acquire().await;
    match lister.list_cluster_role_bindings().await {
        Ok(bindings) => {
            debug!("Listed {} ClusterRoleBindings", bindings.len());
            catalog.add_bindings(&bindings);
        }
        Err(e) => {
            warn!("Unable to list ClusterRoleBindings: {}", e);
            catalog.issues.push(Issue::listing("cluster", e.to_string()));
        }
    }

    info!(
        "Subject catalog collected: {} subjects, {} listing failures",
        catalog.subjects.len(),
        catalog.issues.len()
    );
    catalog
}

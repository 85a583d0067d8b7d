//! # Binding References
//!
//! Named grants returned by the authorization oracle and listed by the subject catalog.
//! Only the name, scope and subject list matter here; the role rules behind a binding
//! are resolved by the oracle.

use super::subject::Subject;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use tracing::warn;

/// Where a binding lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingScope {
    /// A RoleBinding in the given namespace
    Namespaced(String),
    /// A ClusterRoleBinding
    Cluster,
}

/// Opaque reference to a RoleBinding or ClusterRoleBinding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingRef {
    pub name: String,
    pub scope: BindingScope,
}

impl BindingRef {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: BindingScope::Namespaced(namespace.into()),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: BindingScope::Cluster,
        }
    }

    /// Namespace of a RoleBinding, `None` for a ClusterRoleBinding
    pub fn namespace(&self) -> Option<&str> {
        match &self.scope {
            BindingScope::Namespaced(ns) => Some(ns),
            BindingScope::Cluster => None,
        }
    }
}

/// A binding together with every subject it grants to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantingBinding {
    pub binding: BindingRef,
    pub subjects: Vec<Subject>,
}

impl GrantingBinding {
    pub fn new(binding: BindingRef, subjects: Vec<Subject>) -> Self {
        Self { binding, subjects }
    }

    pub fn from_role_binding(rb: &RoleBinding) -> Self {
        let name = rb.metadata.name.clone().unwrap_or_default();
        let namespace = rb.metadata.namespace.clone().unwrap_or_default();
        let subjects = convert_subjects(&name, rb.subjects.as_deref().unwrap_or_default());
        Self::new(BindingRef::namespaced(namespace, name), subjects)
    }

    pub fn from_cluster_role_binding(crb: &ClusterRoleBinding) -> Self {
        let name = crb.metadata.name.clone().unwrap_or_default();
        let subjects = convert_subjects(&name, crb.subjects.as_deref().unwrap_or_default());
        Self::new(BindingRef::cluster(name), subjects)
    }
}

/// Subjects with an unrecognised kind are skipped with a warning
fn convert_subjects(binding: &str, subjects: &[k8s_openapi::api::rbac::v1::Subject]) -> Vec<Subject> {
    subjects
        .iter()
        .filter_map(|s| match Subject::try_from(s) {
            Ok(subject) => Some(subject),
            Err(e) => {
                warn!(binding = binding, "Skipping subject '{}': {}", s.name, e);
                None
            }
        })
        .collect()
}

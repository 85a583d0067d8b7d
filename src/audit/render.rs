//! # Rendering
//!
//! Walks a finished [`PermissionTree`] and emits ordered arrays, so output order is fixed and
//! subject identities never need to be map keys:
//!
//! ```json
//! [{"kind": "User", "name": "alice",
//!   "permissions": [{"namespace": "default",
//!     "resources": [{"name": "pods",
//!       "verbs": [{"name": "get", "roleBindings": ["rb-1"]}]}]}]}]
//! ```
//!
//! Empty binding lists are omitted. `namespace` appears on service-account subjects only.
//! All-namespaces results are rendered under the empty namespace key; the raw per-query dump
//! keeps the `"*"` the query was made with.

use super::aggregator::{Grants, NamespaceGrants, PermissionTree, ResourceGrants, VerbGrants};
use crate::constants::ALL_NAMESPACES;
use crate::error::AuditError;
use crate::model::{GrantingBinding, NamespaceScope, QueryResult, ResourceRef, Subject, SubjectKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    pub kind: SubjectKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub permissions: Vec<NamespaceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceEntry {
    pub namespace: String,
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subresource: Option<String>,
    pub verbs: Vec<VerbEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub role_bindings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster_role_bindings: Vec<String>,
}

/// Render the tree as ordered subject entries
pub fn render(tree: &PermissionTree) -> Vec<SubjectEntry> {
    tree.iter()
        .map(|(subject, namespaces)| render_subject(subject, namespaces))
        .collect()
}

fn render_subject(subject: &Subject, namespaces: &NamespaceGrants) -> SubjectEntry {
    SubjectEntry {
        kind: subject.kind(),
        name: subject.name().to_string(),
        namespace: subject.namespace().map(str::to_string),
        permissions: namespaces
            .iter()
            .filter_map(|(namespace, resources)| render_namespace(namespace, resources))
            .collect(),
    }
}

// Levels with no binding below them are dropped.
fn render_namespace(
    namespace: &NamespaceScope,
    resources: &ResourceGrants,
) -> Option<NamespaceEntry> {
    let resources: Vec<ResourceEntry> = resources
        .iter()
        .filter_map(|(resource, verbs)| render_resource(resource, verbs))
        .collect();
    (!resources.is_empty()).then(|| NamespaceEntry {
        namespace: namespace.key().to_string(),
        resources,
    })
}

fn render_resource(resource: &ResourceRef, verbs: &VerbGrants) -> Option<ResourceEntry> {
    let verbs: Vec<VerbEntry> = verbs
        .iter()
        .filter(|(_, grants)| !grants.is_empty())
        .map(|(verb, grants)| render_verb(verb, grants))
        .collect();
    (!verbs.is_empty()).then(|| ResourceEntry {
        name: resource.name.clone(),
        subresource: resource.subresource.clone(),
        verbs,
    })
}

fn render_verb(verb: &str, grants: &Grants) -> VerbEntry {
    VerbEntry {
        name: verb.to_string(),
        role_bindings: grants.role_bindings().to_vec(),
        cluster_role_bindings: grants.cluster_role_bindings().to_vec(),
    }
}

/// Serialize the tree as a JSON array
pub fn to_json(tree: &PermissionTree, pretty: bool) -> Result<String, AuditError> {
    let entries = render(tree);
    let json = if pretty {
        serde_json::to_string_pretty(&entries)?
    } else {
        serde_json::to_string(&entries)?
    };
    Ok(json)
}

/// One query result, one row per (binding, subject)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawResultEntry {
    pub resource: String,
    pub verb: String,
    pub namespace: String,
    pub role_bindings: Vec<RawBindingEntry>,
    pub cluster_role_bindings: Vec<RawBindingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawBindingEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubjectKind,
    pub subject: String,
    /// Namespace of the RoleBinding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sa_namespace: Option<String>,
}

/// Per-query view of the results, before aggregation
pub fn render_raw(results: &[QueryResult]) -> Vec<RawResultEntry> {
    results
        .iter()
        .map(|result| RawResultEntry {
            resource: result.resource.to_string(),
            verb: result.verb.clone(),
            namespace: raw_namespace(&result.namespace).to_string(),
            role_bindings: raw_bindings(&result.namespaced_bindings),
            cluster_role_bindings: raw_bindings(&result.cluster_bindings),
        })
        .collect()
}

/// Raw rows keep the namespace as queried, `"*"` included
fn raw_namespace(namespace: &NamespaceScope) -> &str {
    match namespace {
        NamespaceScope::All => ALL_NAMESPACES,
        NamespaceScope::Named(ns) => ns,
    }
}

fn raw_bindings(bindings: &[GrantingBinding]) -> Vec<RawBindingEntry> {
    bindings
        .iter()
        .flat_map(|granting| {
            granting.subjects.iter().map(move |subject| RawBindingEntry {
                name: granting.binding.name.clone(),
                kind: subject.kind(),
                subject: subject.name().to_string(),
                namespace: granting.binding.namespace().map(str::to_string),
                sa_namespace: subject.namespace().map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{aggregate, Aggregator};
    use crate::model::{BindingRef, Query};
    use serde_json::json;

    #[test]
    fn test_empty_permissions_rendered() {
        let tree = aggregate(vec![Subject::group("system:masters")], &[] as &[QueryResult]);
        let json = serde_json::to_value(render(&tree)).unwrap();
        assert_eq!(
            json,
            json!([{"kind": "Group", "name": "system:masters", "permissions": []}])
        );
    }

    #[test]
    fn test_service_account_namespace_and_subresource() {
        let sa = Subject::service_account("build", "ci");
        let result = QueryResult::new(
            &Query::new("*", "pods/log", "get"),
            Vec::new(),
            vec![GrantingBinding::new(BindingRef::cluster("log-reader"), vec![sa.clone()])],
        );
        let tree = aggregate(vec![sa], [&result]);

        let json = serde_json::to_value(render(&tree)).unwrap();
        assert_eq!(
            json,
            json!([{
                "kind": "ServiceAccount",
                "name": "ci",
                "namespace": "build",
                "permissions": [{
                    "namespace": "",
                    "resources": [{
                        "name": "pods",
                        "subresource": "log",
                        "verbs": [{"name": "get", "clusterRoleBindings": ["log-reader"]}]
                    }]
                }]
            }])
        );
    }

    #[test]
    fn test_raw_rows_per_subject() {
        let result = QueryResult::new(
            &Query::new("default", "secrets", "get"),
            vec![GrantingBinding::new(
                BindingRef::namespaced("default", "rb-1"),
                vec![Subject::user("alice"), Subject::service_account("ops", "bot")],
            )],
            Vec::new(),
        );

        let json = serde_json::to_value(render_raw(&[result])).unwrap();
        assert_eq!(
            json,
            json!([{
                "resource": "secrets",
                "verb": "get",
                "namespace": "default",
                "role-bindings": [
                    {"name": "rb-1", "type": "User", "subject": "alice", "namespace": "default"},
                    {"name": "rb-1", "type": "ServiceAccount", "subject": "bot",
                     "namespace": "default", "sa-namespace": "ops"}
                ],
                "cluster-role-bindings": []
            }])
        );
    }

    #[test]
    fn test_raw_rows_keep_all_namespaces_sentinel() {
        let result = QueryResult::new(
            &Query::new("*", "nodes", "list"),
            Vec::new(),
            vec![GrantingBinding::new(
                BindingRef::cluster("node-reader"),
                vec![Subject::group("ops")],
            )],
        );

        let json = serde_json::to_value(render_raw(&[result])).unwrap();
        assert_eq!(json[0]["namespace"], "*");
        assert_eq!(
            json[0]["cluster-role-bindings"],
            json!([{"name": "node-reader", "type": "Group", "subject": "ops"}])
        );
    }

    #[test]
    fn test_levels_without_bindings_are_not_rendered() {
        let alice = Subject::user("alice");
        let mut aggregator = Aggregator::new(vec![alice.clone()]);
        aggregator.ensure_path(
            &alice,
            &NamespaceScope::parse("team-a"),
            &ResourceRef::parse("pods"),
            "get",
        );
        aggregator
            .ensure_path(
                &alice,
                &NamespaceScope::parse("default"),
                &ResourceRef::parse("secrets"),
                "get",
            )
            .insert_role_binding("rb-1");
        aggregator.ensure_path(
            &alice,
            &NamespaceScope::parse("default"),
            &ResourceRef::parse("configmaps"),
            "list",
        );

        let json = serde_json::to_value(render(&aggregator.finish())).unwrap();
        assert_eq!(
            json,
            json!([{
                "kind": "User",
                "name": "alice",
                "permissions": [{
                    "namespace": "default",
                    "resources": [{
                        "name": "secrets",
                        "verbs": [{"name": "get", "roleBindings": ["rb-1"]}]
                    }]
                }]
            }])
        );
    }
}

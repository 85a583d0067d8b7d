//! # Query Enumerator
//!
//! Produces every `(namespace, resource, verb)` query for a pass.
//!
//! Ordering is namespace-major, then resource, then verb, each in input order. The aggregator
//! records binding names in arrival order, so this ordering decides binding-name order in
//! the final tree.

use crate::error::AuditError;
use crate::model::Query;

/// An API resource and the verbs the server supports on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    /// Plural resource name, possibly `resource/subresource`
    pub name: String,
    pub verbs: Vec<String>,
}

impl DiscoveredResource {
    pub fn new(name: impl Into<String>, verbs: &[&str]) -> Self {
        Self {
            name: name.into(),
            verbs: verbs.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

/// Flatten discovered resources into `(resource, verb)` pairs, preserving order
pub fn resource_verb_pairs(resources: &[DiscoveredResource]) -> Vec<(String, String)> {
    resources
        .iter()
        .flat_map(|r| r.verbs.iter().map(move |v| (r.name.clone(), v.clone())))
        .collect()
}

/// Cross product of namespaces and `(resource, verb)` pairs
///
/// Names are passed through unchanged; sub-resource splitting is the oracle's job.
/// Duplicate namespaces are not removed here. The returned iterator holds no state beyond
/// the borrowed inputs, so cloning it restarts the sequence.
pub fn enumerate<'a>(
    namespaces: &'a [String],
    pairs: &'a [(String, String)],
) -> Result<impl Iterator<Item = Query> + Clone + 'a, AuditError> {
    if namespaces.is_empty() {
        return Err(AuditError::Config(
            "cannot enumerate queries without namespaces".to_string(),
        ));
    }

    Ok(namespaces.iter().flat_map(move |ns| {
        pairs
            .iter()
            .map(move |(resource, verb)| Query::new(ns.as_str(), resource.as_str(), verb.as_str()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_namespace_major_order() {
        let namespaces = strings(&["default", "kube-system"]);
        let pairs = resource_verb_pairs(&[
            DiscoveredResource::new("pods", &["get", "list"]),
            DiscoveredResource::new("secrets", &["get"]),
        ]);

        let queries: Vec<Query> = enumerate(&namespaces, &pairs).unwrap().collect();
        assert_eq!(
            queries,
            vec![
                Query::new("default", "pods", "get"),
                Query::new("default", "pods", "list"),
                Query::new("default", "secrets", "get"),
                Query::new("kube-system", "pods", "get"),
                Query::new("kube-system", "pods", "list"),
                Query::new("kube-system", "secrets", "get"),
            ]
        );
    }

    #[test]
    fn test_names_passed_through() {
        let namespaces = strings(&["*"]);
        let pairs = resource_verb_pairs(&[
            DiscoveredResource::new("pods/log", &["get"]),
            DiscoveredResource::new("/metrics", &["get"]),
        ]);

        let queries: Vec<Query> = enumerate(&namespaces, &pairs).unwrap().collect();
        assert_eq!(queries[0].resource, "pods/log");
        assert_eq!(queries[1].resource, "/metrics");
        assert_eq!(queries[0].namespace, "*");
    }

    #[test]
    fn test_duplicates_not_removed() {
        let namespaces = strings(&["default", "default"]);
        let pairs = vec![("pods".to_string(), "get".to_string())];
        assert_eq!(enumerate(&namespaces, &pairs).unwrap().count(), 2);
    }

    #[test]
    fn test_restartable() {
        let namespaces = strings(&["a", "b"]);
        let pairs = vec![("pods".to_string(), "get".to_string())];
        let queries = enumerate(&namespaces, &pairs).unwrap();
        let first: Vec<Query> = queries.clone().collect();
        let second: Vec<Query> = queries.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_namespaces_rejected() {
        let pairs = vec![("pods".to_string(), "get".to_string())];
        assert!(matches!(enumerate(&[], &pairs), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_resource_without_verbs_yields_nothing() {
        let pairs = resource_verb_pairs(&[DiscoveredResource::new("bindings", &[])]);
        assert!(pairs.is_empty());
    }
}

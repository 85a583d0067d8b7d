//! # Permission Aggregator
//!
//! Folds query results into a subject-centric [`PermissionTree`]:
//! `Subject → namespace → resource → verb → {roleBindings, clusterRoleBindings}`.
//!
//! The tree is seeded with every catalog subject so subjects without grants still appear.
//! Subjects that only show up in a binding's subject list are added as they are seen.
//! Leaves are created lazily by [`Aggregator::ensure_path`], and only when a binding
//! actually grants to a subject, so a query with no granting bindings leaves no trace.

use crate::model::{NamespaceScope, QueryResult, ResourceRef, Subject};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Binding names granting one verb on one resource in one namespace
///
/// Names keep first-seen order and appear at most once per list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    role_bindings: Vec<String>,
    cluster_role_bindings: Vec<String>,
}

impl Grants {
    pub fn role_bindings(&self) -> &[String] {
        &self.role_bindings
    }

    pub fn cluster_role_bindings(&self) -> &[String] {
        &self.cluster_role_bindings
    }

    /// Returns `false` if the name was already present
    pub fn insert_role_binding(&mut self, name: &str) -> bool {
        insert_unique(&mut self.role_bindings, name)
    }

    /// Returns `false` if the name was already present
    pub fn insert_cluster_role_binding(&mut self, name: &str) -> bool {
        insert_unique(&mut self.cluster_role_bindings, name)
    }

    pub fn is_empty(&self) -> bool {
        self.role_bindings.is_empty() && self.cluster_role_bindings.is_empty()
    }
}

fn insert_unique(names: &mut Vec<String>, name: &str) -> bool {
    if names.iter().any(|n| n == name) {
        return false;
    }
    names.push(name.to_string());
    true
}

/// Verb → grants
pub type VerbGrants = BTreeMap<String, Grants>;
/// Resource → verb → grants
pub type ResourceGrants = BTreeMap<ResourceRef, VerbGrants>;
/// Namespace → resource → verb → grants
pub type NamespaceGrants = BTreeMap<NamespaceScope, ResourceGrants>;

/// Aggregated permissions of every known subject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTree {
    subjects: BTreeMap<Subject, NamespaceGrants>,
}

impl PermissionTree {
    /// Subjects in identity order with their permissions
    pub fn iter(&self) -> impl Iterator<Item = (&Subject, &NamespaceGrants)> {
        self.subjects.iter()
    }

    pub fn permissions(&self, subject: &Subject) -> Option<&NamespaceGrants> {
        self.subjects.get(subject)
    }

    pub fn grants(
        &self,
        subject: &Subject,
        namespace: &NamespaceScope,
        resource: &ResourceRef,
        verb: &str,
    ) -> Option<&Grants> {
        self.subjects
            .get(subject)?
            .get(namespace)?
            .get(resource)?
            .get(verb)
    }

    pub fn contains_subject(&self, subject: &Subject) -> bool {
        self.subjects.contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Single writer building a [`PermissionTree`]
#[derive(Debug, Default)]
pub struct Aggregator {
    tree: PermissionTree,
    catalog: BTreeSet<Subject>,
}

impl Aggregator {
    /// Seed the tree with one empty entry per catalog subject
    pub fn new(catalog: impl IntoIterator<Item = Subject>) -> Self {
        let catalog: BTreeSet<Subject> = catalog.into_iter().collect();
        let subjects = catalog
            .iter()
            .map(|s| (s.clone(), NamespaceGrants::new()))
            .collect();
        Self {
            tree: PermissionTree { subjects },
            catalog,
        }
    }

    /// Leaf for `(subject, namespace, resource, verb)`, created on first access
    ///
    /// Levels left without a binding are kept in the tree but not rendered.
    pub fn ensure_path(
        &mut self,
        subject: &Subject,
        namespace: &NamespaceScope,
        resource: &ResourceRef,
        verb: &str,
    ) -> &mut Grants {
        let namespaces = match self.tree.subjects.entry(subject.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(subject = %subject, "Recording subject not present in the catalog");
                entry.insert(NamespaceGrants::new())
            }
        };
        namespaces
            .entry(namespace.clone())
            .or_default()
            .entry(resource.clone())
            .or_default()
            .entry(verb.to_string())
            .or_default()
    }

    /// Fold one query result into the tree
    pub fn fold(&mut self, result: &QueryResult) {
        for granting in &result.namespaced_bindings {
            for subject in &granting.subjects {
                self.ensure_path(subject, &result.namespace, &result.resource, &result.verb)
                    .insert_role_binding(&granting.binding.name);
            }
        }
        for granting in &result.cluster_bindings {
            for subject in &granting.subjects {
                self.ensure_path(subject, &result.namespace, &result.resource, &result.verb)
                    .insert_cluster_role_binding(&granting.binding.name);
            }
        }
    }

    /// Subjects that were seen in grants but not in the catalog
    pub fn uncatalogued_subjects(&self) -> impl Iterator<Item = &Subject> {
        self.tree
            .subjects
            .keys()
            .filter(|s| !self.catalog.contains(*s))
    }

    /// Freeze the tree
    pub fn finish(self) -> PermissionTree {
        self.tree
    }
}

/// Build the permission tree from a catalog and results in arrival order
pub fn aggregate<'a>(
    catalog: impl IntoIterator<Item = Subject>,
    results: impl IntoIterator<Item = &'a QueryResult>,
) -> PermissionTree {
    let mut aggregator = Aggregator::new(catalog);
    for result in results {
        aggregator.fold(result);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingRef, GrantingBinding, Query};

    #[test]
    fn test_insert_unique_keeps_first_seen_order() {
        let mut grants = Grants::default();
        assert!(grants.insert_role_binding("rb-2"));
        assert!(grants.insert_role_binding("rb-1"));
        assert!(!grants.insert_role_binding("rb-2"));
        assert_eq!(grants.role_bindings(), ["rb-2", "rb-1"]);
        assert!(grants.cluster_role_bindings().is_empty());
    }

    #[test]
    fn test_ensure_path_creates_intermediate_levels() {
        let mut aggregator = Aggregator::new(Vec::new());
        let alice = Subject::user("alice");
        let ns = NamespaceScope::parse("default");
        let pods = ResourceRef::parse("pods");

        aggregator
            .ensure_path(&alice, &ns, &pods, "get")
            .insert_cluster_role_binding("view");
        assert!(aggregator
            .ensure_path(&alice, &ns, &pods, "get")
            .cluster_role_bindings()
            .contains(&"view".to_string()));

        let tree = aggregator.finish();
        assert!(tree.grants(&alice, &ns, &pods, "get").is_some());
        assert!(tree.grants(&alice, &ns, &pods, "list").is_none());
    }

    #[test]
    fn test_binding_without_subjects_creates_nothing() {
        let query = Query::new("default", "pods", "get");
        let result = QueryResult::new(
            &query,
            vec![GrantingBinding::new(
                BindingRef::namespaced("default", "orphan"),
                Vec::new(),
            )],
            Vec::new(),
        );

        let tree = aggregate(vec![Subject::user("alice")], [&result]);
        assert_eq!(tree.len(), 1);
        assert!(tree
            .permissions(&Subject::user("alice"))
            .is_some_and(BTreeMap::is_empty));
    }

    #[test]
    fn test_uncatalogued_subjects_reported() {
        let query = Query::new("default", "pods", "get");
        let result = QueryResult::new(
            &query,
            Vec::new(),
            vec![GrantingBinding::new(
                BindingRef::cluster("view"),
                vec![Subject::user("alice"), Subject::group("ops")],
            )],
        );

        let mut aggregator = Aggregator::new(vec![Subject::user("alice")]);
        aggregator.fold(&result);
        let extra: Vec<&Subject> = aggregator.uncatalogued_subjects().collect();
        assert_eq!(extra, vec![&Subject::group("ops")]);
    }
}

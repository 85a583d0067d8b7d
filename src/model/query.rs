//! # Queries and Results
//!
//! A query is one `(namespace, resource, verb)` triple; a result is the oracle's verdict for it.

use super::binding::GrantingBinding;
use crate::constants::{ALL_NAMESPACES, ALL_NAMESPACES_KEY};
use std::fmt;

/// Namespace a query runs against
///
/// `All` is what the `"*"` sentinel becomes. It sorts before every named namespace and is
/// rendered under [`ALL_NAMESPACES_KEY`], never as a literal `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl NamespaceScope {
    pub fn parse(namespace: &str) -> Self {
        if namespace == ALL_NAMESPACES {
            NamespaceScope::All
        } else {
            NamespaceScope::Named(namespace.to_string())
        }
    }

    /// Key used in the permission tree output
    pub fn key(&self) -> &str {
        match self {
            NamespaceScope::All => ALL_NAMESPACES_KEY,
            NamespaceScope::Named(ns) => ns,
        }
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceScope::All => f.write_str("<all namespaces>"),
            NamespaceScope::Named(ns) => f.write_str(ns),
        }
    }
}

/// Resource name split into resource and optional sub-resource
///
/// `pods/log` becomes `pods` + `log`. A name starting with `/` is a non-resource URL
/// and is kept whole.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub name: String,
    pub subresource: Option<String>,
}

impl ResourceRef {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('/') {
            return Self {
                name: raw.to_string(),
                subresource: None,
            };
        }
        match raw.split_once('/') {
            Some((name, sub)) => Self {
                name: name.to_string(),
                subresource: Some(sub.to_string()),
            },
            None => Self {
                name: raw.to_string(),
                subresource: None,
            },
        }
    }

    pub fn is_non_resource_url(&self) -> bool {
        self.name.starts_with('/')
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subresource {
            Some(sub) => write!(f, "{}/{}", self.name, sub),
            None => f.write_str(&self.name),
        }
    }
}

/// One `(namespace, resource, verb)` query, with raw, unsplit names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub namespace: String,
    pub resource: String,
    pub verb: String,
}

impl Query {
    pub fn new(
        namespace: impl Into<String>,
        resource: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            resource: resource.into(),
            verb: verb.into(),
        }
    }

    pub fn scope(&self) -> NamespaceScope {
        NamespaceScope::parse(&self.namespace)
    }

    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::parse(&self.resource)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} in {}", self.verb, self.resource, self.scope())
    }
}

/// The oracle's answer to one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub resource: ResourceRef,
    pub verb: String,
    pub namespace: NamespaceScope,
    pub namespaced_bindings: Vec<GrantingBinding>,
    pub cluster_bindings: Vec<GrantingBinding>,
}

impl QueryResult {
    pub fn new(
        query: &Query,
        namespaced_bindings: Vec<GrantingBinding>,
        cluster_bindings: Vec<GrantingBinding>,
    ) -> Self {
        Self {
            resource: query.resource_ref(),
            verb: query.verb.clone(),
            namespace: query.scope(),
            namespaced_bindings,
            cluster_bindings,
        }
    }

    /// A verdict with no granting bindings
    pub fn empty(query: &Query) -> Self {
        Self::new(query, Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.namespaced_bindings.is_empty() && self.cluster_bindings.is_empty()
    }
}

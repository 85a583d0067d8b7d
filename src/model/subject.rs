//! # Subjects
//!
//! Identity of a user, group or service account referenced by a binding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of an RBAC subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl SubjectKind {
    /// The `kind` string used by `rbac.authorization.k8s.io/v1` subjects
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::Group => "Group",
            SubjectKind::ServiceAccount => "ServiceAccount",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject kind string that is not User, Group or ServiceAccount
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown subject kind '{0}'")]
pub struct UnknownSubjectKind(pub String);

impl FromStr for SubjectKind {
    type Err = UnknownSubjectKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(SubjectKind::User),
            "Group" => Ok(SubjectKind::Group),
            "ServiceAccount" => Ok(SubjectKind::ServiceAccount),
            other => Err(UnknownSubjectKind(other.to_string())),
        }
    }
}

/// Subject identity: `(kind, name, namespace)`
///
/// The namespace is only kept for service accounts; for users and groups it is always `None`,
/// so two subjects compare equal exactly when they name the same principal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subject {
    kind: SubjectKind,
    name: String,
    namespace: Option<String>,
}

impl Subject {
    pub fn new(kind: SubjectKind, name: impl Into<String>, namespace: Option<String>) -> Self {
        let namespace = match kind {
            SubjectKind::ServiceAccount => namespace.filter(|ns| !ns.is_empty()),
            SubjectKind::User | SubjectKind::Group => None,
        };
        Self {
            kind,
            name: name.into(),
            namespace,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(SubjectKind::User, name, None)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(SubjectKind::Group, name, None)
    }

    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SubjectKind::ServiceAccount, name, Some(namespace.into()))
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of a service account subject
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}:{}", self.kind, self.name),
        }
    }
}

impl TryFrom<&k8s_openapi::api::rbac::v1::Subject> for Subject {
    type Error = UnknownSubjectKind;

    fn try_from(subject: &k8s_openapi::api::rbac::v1::Subject) -> Result<Self, Self::Error> {
        let kind = subject.kind.parse::<SubjectKind>()?;
        Ok(Subject::new(kind, subject.name.clone(), subject.namespace.clone()))
    }
}

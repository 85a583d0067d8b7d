//! # Authorization Oracle
//!
//! The seam to the external authorization check: given one query, which bindings grant it.
//! Rule matching lives entirely behind this trait.

mod who_can;

pub use who_can::{classify_who_can_error, parse_who_can_output, who_can_args, WhoCanOracle};

use crate::error::AuditError;
use crate::model::{Query, QueryResult};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single authorization check
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// Resource/verb cannot be mapped to a group-version-resource
    #[error("resolving resource: {0}")]
    Resolution(String),
    /// The check itself failed
    #[error("check: {0}")]
    Query(String),
}

impl OracleError {
    pub fn into_audit_error(self, query: &Query) -> AuditError {
        match self {
            OracleError::Resolution(message) => AuditError::Resolution {
                resource: query.resource.clone(),
                verb: query.verb.clone(),
                message,
            },
            OracleError::Query(message) => AuditError::Query {
                query: query.to_string(),
                message,
            },
        }
    }
}

/// Answers "which bindings grant verb V on resource R in namespace N?"
///
/// Implementations must treat a `"*"` namespace as an all-namespaces query and must not
/// pass it on literally.
#[async_trait]
pub trait AuthorizationOracle: Send + Sync {
    async fn check(&self, query: &Query) -> Result<QueryResult, OracleError>;
}

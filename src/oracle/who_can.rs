//! # kubectl-who-can Oracle
//!
//! Runs `kubectl-who-can VERB RESOURCE ... --output json` for each query and parses the
//! RoleBindings and ClusterRoleBindings it prints.

use super::{AuthorizationOracle, OracleError};
use crate::error::AuditError;
use crate::model::{GrantingBinding, NamespaceScope, Query, QueryResult};
use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::{ClusterRoleBinding, RoleBinding};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

/// JSON printed by `kubectl-who-can --output json`
///
/// Empty lists come out as `null`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhoCanOutput {
    #[serde(default)]
    role_bindings: Option<Vec<RoleBinding>>,
    #[serde(default)]
    cluster_role_bindings: Option<Vec<ClusterRoleBinding>>,
}

/// Oracle backed by the `kubectl-who-can` binary
#[derive(Debug, Clone)]
pub struct WhoCanOracle {
    binary: PathBuf,
}

impl WhoCanOracle {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the binary by name on `PATH`, or accept an explicit path
    pub fn locate(binary: &str) -> Result<Self, AuditError> {
        let path = which::which(binary).map_err(|e| {
            AuditError::Config(format!(
                "{binary} not found: {e}. Install kubectl-who-can or set WHO_CAN_BINARY"
            ))
        })?;
        info!("Using authorization oracle at {}", path.display());
        Ok(Self::new(path))
    }
}

/// Command-line arguments for one query
///
/// `pods/log` is passed as `pods --subresource log`. Non-resource URLs are passed literally
/// and without a namespace, since they are not namespaced.
pub fn who_can_args(query: &Query) -> Vec<String> {
    let resource = query.resource_ref();
    let mut args = vec![query.verb.clone(), resource.name.clone()];

    if let Some(sub) = &resource.subresource {
        args.push("--subresource".to_string());
        args.push(sub.clone());
    }

    if !resource.is_non_resource_url() {
        match query.scope() {
            NamespaceScope::All => args.push("--all-namespaces".to_string()),
            NamespaceScope::Named(ns) => {
                args.push("--namespace".to_string());
                args.push(ns);
            }
        }
    }

    args.push("--output".to_string());
    args.push("json".to_string());
    args
}

/// Parse `kubectl-who-can --output json` into a query result
pub fn parse_who_can_output(query: &Query, stdout: &str) -> Result<QueryResult, OracleError> {
    let output: WhoCanOutput = serde_json::from_str(stdout)
        .map_err(|e| OracleError::Query(format!("unable to parse who-can output: {e}")))?;

    let namespaced = output
        .role_bindings
        .unwrap_or_default()
        .iter()
        .map(GrantingBinding::from_role_binding)
        .collect();
    let cluster = output
        .cluster_role_bindings
        .unwrap_or_default()
        .iter()
        .map(GrantingBinding::from_cluster_role_binding)
        .collect();

    Ok(QueryResult::new(query, namespaced, cluster))
}

/// Classify a failed run from its stderr
///
/// Failures to map the resource onto the server's API are resolution errors; anything
/// else (connectivity, authentication, timeouts) is a query error.
pub fn classify_who_can_error(stderr: &str) -> OracleError {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    if lower.contains("resolving resource")
        || lower.contains("doesn't have a resource type")
        || lower.contains("no matches for")
        || lower.contains("not found in the server's resource list")
    {
        return OracleError::Resolution(message);
    }

    OracleError::Query(message)
}

#[async_trait]
impl AuthorizationOracle for WhoCanOracle {
    async fn check(&self, query: &Query) -> Result<QueryResult, OracleError> {
        let args = who_can_args(query);
        debug!("who-can {}", args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                OracleError::Query(format!("failed to execute {}: {e}", self.binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_who_can_error(&stderr));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| OracleError::Query(format!("who-can output is not UTF-8: {e}")))?;
        parse_who_can_output(query, &stdout)
    }
}

//! # Audit Pass Configuration
//!
//! Namespaces, request budget and query error policy.

use crate::constants::{
    DEFAULT_BURST, DEFAULT_NAMESPACES, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_WHO_CAN_BINARY,
    WHO_CAN_CONFIG_ENV,
};
use crate::error::AuditError;
use serde::Deserialize;
use std::str::FromStr;

/// What to do when an authorization check fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum QueryErrorPolicy {
    /// Abort the pass on the first failed check
    #[default]
    FailFast,
    /// Record the failed check and continue
    SkipAndRecord,
}

impl FromStr for QueryErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(QueryErrorPolicy::FailFast),
            "skip-and-record" | "skip" => Ok(QueryErrorPolicy::SkipAndRecord),
            other => Err(format!(
                "unknown query error policy '{other}', expected 'fail-fast' or 'skip-and-record'"
            )),
        }
    }
}

/// Shape of the `WHO_CAN_CONFIG` YAML document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument {
    /// Extra namespaces queried after the defaults
    #[serde(default, alias = "extraNamespaces")]
    namespaces: Vec<String>,
    #[serde(default)]
    requests_per_second: Option<f64>,
    #[serde(default)]
    burst: Option<u32>,
    #[serde(default)]
    query_error_policy: Option<QueryErrorPolicy>,
}

/// Audit pass configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    /// Namespaces always queried
    /// Default: `default`, `kube-system`
    pub namespaces: Vec<String>,
    /// Caller-supplied namespaces queried after the defaults
    pub extra_namespaces: Vec<String>,
    /// Client-side request budget (requests per second)
    pub requests_per_second: f64,
    /// Client-side request burst; also bounds concurrent oracle queries
    pub burst: u32,
    pub query_error_policy: QueryErrorPolicy,
    /// Name or path of the `kubectl-who-can` binary
    pub who_can_binary: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            namespaces: DEFAULT_NAMESPACES.iter().map(|ns| (*ns).to_string()).collect(),
            extra_namespaces: Vec::new(),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst: DEFAULT_BURST,
            query_error_policy: QueryErrorPolicy::default(),
            who_can_binary: DEFAULT_WHO_CAN_BINARY.to_string(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Result<Self, AuditError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `WHO_CAN_CONFIG` is applied first, individual variables override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuditError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(WHO_CAN_CONFIG_ENV) {
            Some(doc) if !doc.trim().is_empty() => Self::from_yaml(&doc)?,
            _ => Self::default(),
        };

        config.requests_per_second =
            var_or_default(&lookup, "WHO_CAN_QPS", config.requests_per_second);
        config.burst = var_or_default(&lookup, "WHO_CAN_BURST", config.burst);
        config.query_error_policy = var_or_default(
            &lookup,
            "WHO_CAN_QUERY_ERROR_POLICY",
            config.query_error_policy,
        );
        if let Some(binary) = lookup("WHO_CAN_BINARY").filter(|b| !b.is_empty()) {
            config.who_can_binary = binary;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a `WHO_CAN_CONFIG` YAML document on top of the defaults
    pub fn from_yaml(doc: &str) -> Result<Self, AuditError> {
        let parsed: ConfigDocument = serde_yaml::from_str(doc)
            .map_err(|e| AuditError::Config(format!("unable to parse {WHO_CAN_CONFIG_ENV}: {e}")))?;

        let defaults = Self::default();
        Ok(Self {
            extra_namespaces: parsed.namespaces,
            requests_per_second: parsed
                .requests_per_second
                .unwrap_or(defaults.requests_per_second),
            burst: parsed.burst.unwrap_or(defaults.burst),
            query_error_policy: parsed
                .query_error_policy
                .unwrap_or(defaults.query_error_policy),
            ..defaults
        })
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            return Err(AuditError::Config(format!(
                "requestsPerSecond must be greater than 0, got {}",
                self.requests_per_second
            )));
        }
        if self.burst == 0 {
            return Err(AuditError::Config("burst must be at least 1".to_string()));
        }
        if self.query_namespaces().is_empty() {
            return Err(AuditError::Config(
                "at least one namespace must be queried".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults followed by extras, first occurrence wins, blanks dropped
    pub fn query_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = Vec::new();
        for ns in self.namespaces.iter().chain(&self.extra_namespaces) {
            let ns = ns.trim();
            if !ns.is_empty() && !namespaces.iter().any(|seen| seen == ns) {
                namespaces.push(ns.to_string());
            }
        }
        namespaces
    }
}

/// Read a variable or return the default value
fn var_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

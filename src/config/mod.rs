//! # Audit Configuration
//!
//! The option set for an audit pass, loaded from the `WHO_CAN_CONFIG` YAML document and
//! environment variables, then overridden by CLI flags in `main`.
//!
//! All configuration has documented defaults; see [`crate::constants`].

mod audit;

pub use audit::{AuditConfig, QueryErrorPolicy};

use crate::error::AuditError;

/// Load configuration from the process environment with defaults
pub fn load_config() -> Result<AuditConfig, AuditError> {
    AuditConfig::from_env()
}

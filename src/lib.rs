//! Who-Can Audit Library
//!
//! This library provides the permission-aggregation engine behind the `who-can-audit` binary:
//! it turns per-query authorization verdicts into a subject-centric permission tree.
//! Tests are included in the module files and under `tests/`.

pub mod audit;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod kube_lister;
pub mod model;
pub mod oracle;
pub mod runtime;

pub use error::{AuditError, AuditReport, Issue, IssueKind};
pub use model::*;

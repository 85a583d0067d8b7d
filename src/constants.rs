//! # Constants
//!
//! Default values shared by configuration, the audit pass and the CLI.

/// Namespaces every audit pass queries before any caller-supplied extras
pub const DEFAULT_NAMESPACES: [&str; 2] = ["default", "kube-system"];

/// Client-side request budget (requests per second)
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 50.0;

/// Client-side request budget (burst size, also the oracle fan-out width)
pub const DEFAULT_BURST: u32 = 50;

/// Namespace sentinel meaning "all namespaces" in a query
pub const ALL_NAMESPACES: &str = "*";

/// Key under which all-namespaces results are rendered in the permission tree
pub const ALL_NAMESPACES_KEY: &str = "";

/// Environment variable holding the YAML audit configuration
pub const WHO_CAN_CONFIG_ENV: &str = "WHO_CAN_CONFIG";

/// Default name of the external authorization oracle binary
pub const DEFAULT_WHO_CAN_BINARY: &str = "kubectl-who-can";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "who_can_audit=info";

/// Exit status for a pass that completed but recorded skipped queries or listing failures
pub const EXIT_CODE_PARTIAL: u8 = 2;

/// Exit status for a fatal error
pub const EXIT_CODE_FATAL: u8 = 1;

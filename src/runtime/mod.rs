//! # Runtime Module
//!
//! Process-level runtime components: initialization of TLS, tracing and the Kubernetes
//! client, and the client-side request budget.

pub mod budget;
pub mod initialization;

pub use budget::RequestBudget;
pub use initialization::{create_client, init_tracing, install_crypto_provider};

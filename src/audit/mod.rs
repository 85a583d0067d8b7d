//! # Audit Engine
//!
//! The permission-aggregation engine, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `enumerator` - Cross product of namespaces and (resource, verb) pairs
//! - `catalog` - Distinct subjects referenced by any binding in the cluster
//! - `aggregator` - Subject → namespace → resource → verb → bindings tree
//! - `render` - Ordered JSON representation of the tree
//! - `pass` - One full enumeration pass against an authorization oracle

pub mod aggregator;
pub mod catalog;
pub mod enumerator;
pub mod pass;
pub mod render;

pub use aggregator::{aggregate, Aggregator, Grants, PermissionTree};
pub use catalog::{collect_subjects, BindingLister, SubjectCatalog};
pub use enumerator::{enumerate, resource_verb_pairs, DiscoveredResource};
pub use pass::{run_pass, PassOutcome};
pub use render::{render, render_raw, to_json};

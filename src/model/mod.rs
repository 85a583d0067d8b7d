//! # Data Model
//!
//! Value types shared by the enumerator, the oracle, the subject catalog and the aggregator.

mod binding;
mod query;
mod subject;

pub use binding::{BindingRef, BindingScope, GrantingBinding};
pub use query::{NamespaceScope, Query, QueryResult, ResourceRef};
pub use subject::{Subject, SubjectKind, UnknownSubjectKind};

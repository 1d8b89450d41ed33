//! Relationship context
//!
//! The derived "best known value" view of an entity:
//! - `models` — `RelationshipContext`, `ValueSource`, divergence report
//! - `resolver` — precedence walk and divergence detection

pub mod models;
pub mod resolver;

pub use models::{ContextReport, ContextStatus, Divergence, RelationshipContext, ValueSource};
pub use resolver::{ContextResolver, ResolverConfig, VALUE_PRECEDENCE};

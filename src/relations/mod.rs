//! Relationship graph
//!
//! Typed, logically undirected edges between portal records:
//! - `models` — the `Relationship` edge and its metadata
//! - `manager` — linking, unlinking, and the linked/available partitioner
//! - `expansion` — one-hop transitive closure

pub mod expansion;
pub mod manager;
pub mod models;

pub use expansion::ExpansionEngine;
pub use manager::{record_visible, LinkOutcome, RelationManager, Viewer};
pub use models::{RelatedPartition, RelationMetadata, Relationship};

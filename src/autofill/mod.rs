//! Autofill
//!
//! Non-destructive value suggestion for record edit forms:
//! - `field_map` — static per-kind target-field → context-field maps
//! - `orchestrator` — deterministic rules, context fill, AI enrichment

pub mod field_map;
pub mod orchestrator;

pub use field_map::{field_map, ContextField};
pub use orchestrator::{is_blank, AutofillConfig, AutofillOrchestrator};

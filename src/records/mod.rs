//! Portal records
//!
//! The closed record type system the relationship graph operates on,
//! plus the storage seam:
//! - `models` — `EntityKind`/`EntityRef`, record structs, `PortalRecord`
//! - `traits` — the abstract `RecordStore`
//! - `memory` — in-memory reference implementation

pub mod memory;
pub mod models;
pub mod traits;

pub use memory::MemoryStore;
pub use models::*;
pub use traits::RecordStore;

//! Board domain model.
//!
//! # Responsibility
//! - Define the Board → Column → Card → ChecklistItem records shared by the
//!   repository, service and shell layers.
//!
//! # Invariants
//! - Relations are plain foreign-key fields; no record owns another.
//! - `position` is meaningful only inside the record's sibling scope.

pub mod board;
pub mod card;

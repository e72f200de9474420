//! Repository layer: the hierarchy store and its ordering engine.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for boards, cards and
//!   checklists.
//! - Keep SQL, position sequencing and cascade walks inside the repository
//!   boundary.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidReference`,
//!   `ConsistencyViolation`) in addition to DB transport errors.
//! - Every sibling scope a write touches is verified gap-free before commit.

pub mod board_repo;
pub mod card_repo;
mod cascade;
pub mod checklist_repo;
pub mod error;
pub mod ordering;
mod seed;
pub mod store;

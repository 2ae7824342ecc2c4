//! Layout-reconstruction pipeline stages.
//!
//! Each submodule implements exactly one transformation; keeping them
//! separate makes each independently testable and keeps the contract values
//! (rejection thresholds, bullet glyph, density) in one obvious place each.
//!
//! ## Data Flow
//!
//! ```text
//! page geometry ──▶ normalize ──▶ segment ──▶ filter ──▶ text units
//!       │                                                    │
//!       └─▶ find_tables ──▶ extract grid ──▶ table ──▶ table units
//! ```
//!
//! 1. [`normalize`] — quote normalisation, garbled-glyph removal
//! 2. [`segment`]   — blank-line paragraph grouping, bullet re-splitting,
//!    noise rejection
//! 3. [`table`]     — cell grid to markdown, empty-column drop
//! 4. [`page`]      — per-page orchestration: geometric table exclusion,
//!    typed unit emission (text units first, then tables)

pub mod normalize;
pub mod page;
pub mod segment;
pub mod table;

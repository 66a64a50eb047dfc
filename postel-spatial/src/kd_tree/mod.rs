//! In-memory two-dimensional k-d tree.
//!
//! The tree is arena backed and keyed by caller supplied identifiers:
//! - Insertion places every entry as a leaf, alternating the split axis per level
//! - Removal uses the classic k-d deletion (minimum replacement), so the
//!   ordering invariant holds for every descendant after any removal
//! - Nearest, k-nearest and radius queries are exact branch-and-bound searches
//!
//! The tree does not rebalance. Its shape depends on insertion order.

pub mod kd_types;
mod kd_impl;

pub use kd_impl::KdTree;
pub use kd_types::{Axis, IntegrityReport, Placement, SpatialError, SpatialResult};

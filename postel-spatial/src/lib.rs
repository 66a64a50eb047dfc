//! # Postel Spatial - Point Index for Postel Topologies
//!
//! This crate provides the proximity index used by the Postel topology
//! engine: a two-dimensional k-d tree over keyed points.
//!
//! ## Features
//!
//! - **Exact Queries**: Nearest, k-nearest and radius searches with backtracking
//! - **Full Deletion**: Removal restructures the subtree instead of leaving holes
//! - **Inspectable**: Per-key placement (axis, depth, links) and an integrity checker
//! - **Generic Keys**: Any `Copy + Eq + Hash` identifier
//!
//! The tree is not internally synchronized. Callers that share it across
//! threads wrap it in their own lock together with whatever else must change
//! in the same critical section.
//!
//! ## Example
//!
//! ```rust
//! use postel_spatial::{Axis, KdTree};
//!
//! let mut tree = KdTree::new();
//! tree.insert(1u64, 10.0, 10.0)?;
//! tree.insert(2, 90.0, 90.0)?;
//! tree.insert(3, 50.0, 50.0)?;
//!
//! let (key, _distance) = tree.nearest(48.0, 48.0).unwrap();
//! assert_eq!(key, 3);
//! assert_eq!(tree.placement(&1).unwrap().axis, Axis::Y);
//!
//! tree.remove(&3)?;
//! assert_eq!(tree.nearest(48.0, 48.0).unwrap().0, 1);
//! # Ok::<(), postel_spatial::SpatialError>(())
//! ```

pub mod kd_tree;

pub use kd_tree::{Axis, IntegrityReport, KdTree, Placement, SpatialError, SpatialResult};

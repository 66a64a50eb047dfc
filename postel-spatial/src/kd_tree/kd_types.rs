//! Core types for the k-d tree implementation.
//!
//! This module defines the fundamental types used throughout the tree:
//! - Error types and result types
//! - The split axis
//! - Placement views and integrity reports

use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in k-d tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    #[error("Key {0} is already indexed")]
    DuplicateKey(String),

    #[error("Key {0} is not indexed")]
    KeyNotFound(String),
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Arena slot index.
pub(crate) type SlotId = usize;

// ============================================================================
// Axis
// ============================================================================

/// The coordinate a tree slot splits on.
///
/// The numeric values are part of the public contract: `0` splits on `y`,
/// `1` splits on `x`. The root always splits on [`Axis::Y`] and the axis
/// flips at every level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    /// Split on the `y` coordinate (axis 0).
    Y = 0,
    /// Split on the `x` coordinate (axis 1).
    X = 1,
}

impl Axis {
    /// Axis used by the root slot.
    pub const ROOT: Axis = Axis::Y;

    /// Returns the axis used one level deeper.
    #[inline]
    pub fn flip(self) -> Axis {
        match self {
            Axis::Y => Axis::X,
            Axis::X => Axis::Y,
        }
    }

    /// Returns the numeric axis value (0 or 1).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Picks the coordinate this axis splits on.
    #[inline]
    pub fn coord(self, x: f64, y: f64) -> f64 {
        match self {
            Axis::Y => y,
            Axis::X => x,
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Y => write!(f, "y"),
            Axis::X => write!(f, "x"),
        }
    }
}

// ============================================================================
// Placement
// ============================================================================

/// Structural position of a key inside the tree.
///
/// Links are reported as keys, never as internal slot indices, and are only
/// valid until the next mutation of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<K> {
    /// Split axis of the slot holding the key.
    pub axis: Axis,
    /// Distance from the root (the root has depth 0).
    pub depth: usize,
    pub parent: Option<K>,
    pub left: Option<K>,
    pub right: Option<K>,
}

// ============================================================================
// Integrity
// ============================================================================

/// Result of a structural integrity check
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// Total slots reached from the root
    pub nodes_checked: usize,
    /// Deepest level reached (root = 0)
    pub max_depth: usize,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            max_depth: 0,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

/// One arena slot.
#[derive(Clone)]
pub(crate) struct Slot<K> {
    pub(crate) key: K,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) axis: Axis,
    pub(crate) parent: Option<SlotId>,
    pub(crate) left: Option<SlotId>,
    pub(crate) right: Option<SlotId>,
}

impl<K> Slot<K> {
    #[inline]
    pub(crate) fn split_value(&self) -> f64 {
        self.axis.coord(self.x, self.y)
    }

    #[inline]
    pub(crate) fn distance_squared(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

impl<K: Debug> Debug for Slot<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("key", &self.key)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("axis", &self.axis)
            .finish()
    }
}

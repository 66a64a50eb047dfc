/// Returns true iff `0 <= x < width` and `0 <= y < height`.
///
/// NaN and infinite coordinates never pass since every comparison against
/// them fails.
#[inline]
pub fn validate(x: f64, y: f64, width: u32, height: u32) -> bool {
    (0.0..f64::from(width)).contains(&x) && (0.0..f64::from(height)).contains(&y)
}

/// Snapshot of the configured plane.
///
/// Coordinates handed to the engine are shifted by `origin` on both axes
/// before they are checked, and the same shift maps them onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    pub origin: f64,
}

impl Plane {
    pub fn new(width: u32, height: u32, origin: f64) -> Self {
        Plane {
            width,
            height,
            origin,
        }
    }

    /// Checks a plane coordinate against the bounds after the origin shift.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        validate(x + self.origin, y + self.origin, self.width, self.height)
    }

    /// Maps a plane coordinate to the canvas position the renderer draws at.
    #[inline]
    pub fn canvas_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.origin, y + self.origin)
    }
}

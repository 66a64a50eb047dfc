//! Configuration management for the topology engine.

use std::fmt::Debug;
use std::sync::Arc;

use crate::common::{
    atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_NODE_POINT_SIZE,
    DEFAULT_NODE_RADIUS_SIZE, DEFAULT_ORIGIN, DEFAULT_PLANE_HEIGHT, DEFAULT_PLANE_WIDTH,
};
use crate::errors::{ErrorKind, PostelError, PostelResult};
use crate::topology::Plane;

/// Process-wide settings shared by the engine and the rendering collaborator.
///
/// The plane fields drive bounds validation; the node sizes are only read by
/// the renderer when it draws a node's point and radius markers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigSettings {
    pub width: u32,
    pub height: u32,
    /// Offset added to both coordinates before bounds checks and drawing.
    pub origin: f64,
    pub node_point_size: u32,
    pub node_radius_size: u32,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        ConfigSettings {
            width: DEFAULT_PLANE_WIDTH,
            height: DEFAULT_PLANE_HEIGHT,
            origin: DEFAULT_ORIGIN,
            node_point_size: DEFAULT_NODE_POINT_SIZE,
            node_radius_size: DEFAULT_NODE_RADIUS_SIZE,
        }
    }
}

/// Public interface for topology configuration.
///
/// Clones share the same settings. The settings sit behind their own lock,
/// independent of the topology lock; readers copy a snapshot out and release
/// it immediately. Writes are accepted until [`PostelConfig::initialize`] is
/// called (engine construction does this), after which the configuration is
/// read-only.
///
/// # Examples
///
/// ```rust
/// use postel::postel_config::PostelConfig;
///
/// let config = PostelConfig::new();
/// config.set_plane_size(100, 100)?;
/// config.initialize();
/// assert!(config.set_origin(5.0).is_err());
/// assert_eq!(config.plane().width, 100);
/// # Ok::<(), postel::errors::PostelError>(())
/// ```
#[derive(Clone)]
pub struct PostelConfig {
    inner: Arc<PostelConfigInner>,
}

impl Default for PostelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PostelConfig {
    /// Creates a new configuration instance with default values.
    pub fn new() -> Self {
        PostelConfig {
            inner: Arc::new(PostelConfigInner::new()),
        }
    }

    /// Returns a copy of all settings.
    pub fn settings(&self) -> ConfigSettings {
        self.inner.settings()
    }

    /// Returns the plane bounds used for validation.
    pub fn plane(&self) -> Plane {
        let settings = self.settings();
        Plane::new(settings.width, settings.height, settings.origin)
    }

    pub fn width(&self) -> u32 {
        self.settings().width
    }

    pub fn height(&self) -> u32 {
        self.settings().height
    }

    pub fn origin(&self) -> f64 {
        self.settings().origin
    }

    pub fn node_point_size(&self) -> u32 {
        self.settings().node_point_size
    }

    pub fn node_radius_size(&self) -> u32 {
        self.settings().node_radius_size
    }

    /// Sets the plane dimensions.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized or if either dimension is zero.
    pub fn set_plane_size(&self, width: u32, height: u32) -> PostelResult<()> {
        if width == 0 || height == 0 {
            log::error!("Rejected plane size {}x{}", width, height);
            return Err(PostelError::new(
                &format!("Plane dimensions must be positive, got {}x{}", width, height),
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.inner.update(|settings| {
            settings.width = width;
            settings.height = height;
        })
    }

    /// Sets the origin offset applied to both coordinates.
    ///
    /// # Errors
    ///
    /// Returns error if already initialized or if the offset is not finite.
    pub fn set_origin(&self, origin: f64) -> PostelResult<()> {
        if !origin.is_finite() {
            log::error!("Rejected origin offset {}", origin);
            return Err(PostelError::new(
                &format!("Origin offset must be finite, got {}", origin),
                ErrorKind::InvalidConfiguration,
            ));
        }
        self.inner.update(|settings| settings.origin = origin)
    }

    /// Sets the size of the point marker the renderer draws per node.
    pub fn set_node_point_size(&self, size: u32) -> PostelResult<()> {
        Self::check_marker_size("point", size)?;
        self.inner.update(|settings| settings.node_point_size = size)
    }

    /// Sets the size of the radius marker the renderer draws per node.
    pub fn set_node_radius_size(&self, size: u32) -> PostelResult<()> {
        Self::check_marker_size("radius", size)?;
        self.inner.update(|settings| settings.node_radius_size = size)
    }

    /// Freezes the configuration. Idempotent.
    pub fn initialize(&self) {
        self.inner.initialize()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    fn check_marker_size(marker: &str, size: u32) -> PostelResult<()> {
        if size == 0 {
            log::error!("Rejected {} marker size 0", marker);
            return Err(PostelError::new(
                &format!("Node {} size must be positive", marker),
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(())
    }
}

impl Debug for PostelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostelConfig")
            .field("settings", &self.settings())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

struct ConfigState {
    settings: ConfigSettings,
    initialized: bool,
}

struct PostelConfigInner {
    state: Atomic<ConfigState>,
}

impl PostelConfigInner {
    fn new() -> Self {
        PostelConfigInner {
            state: atomic(ConfigState {
                settings: ConfigSettings::default(),
                initialized: false,
            }),
        }
    }

    fn settings(&self) -> ConfigSettings {
        self.state.read_with(|state| state.settings)
    }

    fn is_initialized(&self) -> bool {
        self.state.read_with(|state| state.initialized)
    }

    fn initialize(&self) {
        self.state.write_with(|state| state.initialized = true)
    }

    fn update(&self, apply: impl FnOnce(&mut ConfigSettings)) -> PostelResult<()> {
        self.state.write_with(|state| {
            if state.initialized {
                log::error!("Configuration change rejected after initialization");
                return Err(PostelError::new(
                    "Configuration is already initialized and cannot be changed",
                    ErrorKind::InvalidConfiguration,
                ));
            }
            apply(&mut state.settings);
            Ok(())
        })
    }
}

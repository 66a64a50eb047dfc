use crate::common::POSTEL_VERSION;
use crate::errors::{PostelError, PostelResult};
use crate::postel_config::PostelConfig;
use crate::topology::TopologyEngine;

/// Builder for creating and configuring a topology engine.
///
/// `TopologyBuilder` provides a fluent API for configuring the plane before
/// the engine is created. The first configuration error is captured and
/// returned from [`TopologyBuilder::build`]; later setters are skipped.
///
/// # Examples
///
/// ```rust
/// use postel::topology::TopologyEngine;
///
/// let engine = TopologyEngine::builder()
///     .plane_size(100, 100)
///     .origin(0.0)
///     .build()?;
/// assert_eq!(engine.config().width(), 100);
///
/// // invalid values surface on build
/// assert!(TopologyEngine::builder().plane_size(0, 10).build().is_err());
/// # Ok::<(), postel::errors::PostelError>(())
/// ```
#[derive(Default)]
pub struct TopologyBuilder {
    error: Option<PostelError>,
    config: PostelConfig,
}

impl TopologyBuilder {
    /// Creates a builder with the default 2048x2048 plane and zero origin.
    pub fn new() -> Self {
        TopologyBuilder {
            error: None,
            config: PostelConfig::new(),
        }
    }

    /// Sets the plane dimensions. Both must be positive.
    pub fn plane_size(mut self, width: u32, height: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_plane_size(width, height) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the origin offset added to coordinates before bounds checks.
    pub fn origin(mut self, origin: f64) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_origin(origin) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn node_point_size(mut self, size: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_node_point_size(size) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn node_radius_size(mut self, size: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_node_radius_size(size) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Freezes the configuration and creates the engine.
    ///
    /// # Errors
    ///
    /// Returns the first error captured by a setter.
    pub fn build(self) -> PostelResult<TopologyEngine> {
        if let Some(e) = self.error {
            log::error!("Failed to build topology engine: {}", e);
            return Err(e);
        }

        self.config.initialize();
        let settings = self.config.settings();
        log::info!(
            "Postel {} topology engine ready on a {}x{} plane with origin {}",
            POSTEL_VERSION,
            settings.width,
            settings.height,
            settings.origin
        );
        Ok(TopologyEngine::new(self.config))
    }
}

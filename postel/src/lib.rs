//! # Postel - Concurrent Topology Engine
//!
//! Postel keeps a live registry of point nodes on a bounded 2-D plane and
//! answers identity and proximity queries while the set is mutated from many
//! threads. Nodes are indexed by a k-d tree from the `postel_spatial` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use postel::topology::{TopologyEngine, TopologyEventInfo, TopologyEventListener, TopologyEvents};
//!
//! let engine = TopologyEngine::builder()
//!     .plane_size(100, 100)
//!     .build()?;
//!
//! engine.subscribe(TopologyEventListener::new(|info: TopologyEventInfo| {
//!     if info.event() == TopologyEvents::NodeRemoved {
//!         // release the primitive drawn for info.render_handle()
//!     }
//!     Ok(())
//! }))?;
//!
//! let id1 = engine.add(10.0, 10.0)?;
//! let _id2 = engine.add(90.0, 90.0)?;
//! let id3 = engine.add(50.0, 50.0)?;
//! assert_eq!(engine.nearest(48.0, 48.0)?.id, id3);
//!
//! engine.remove(id3)?;
//! assert_eq!(engine.nearest(48.0, 48.0)?.id, id1);
//!
//! engine.shutdown()?;
//! # Ok::<(), postel::errors::PostelError>(())
//! ```
//!
//! ## Modules
//!
//! - [`common`] - Shared constants, lock helpers and the event bus
//! - [`errors`] - Error types
//! - [`postel_builder`] - Engine builder
//! - [`postel_config`] - Plane configuration
//! - [`topology`] - Nodes, bounds validation and the engine itself

pub mod common;
pub mod errors;
pub mod postel_builder;
pub mod postel_config;
pub mod topology;

pub use postel_spatial::{Axis, IntegrityReport};

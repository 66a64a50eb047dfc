//! Node lifecycle, bounds validation and the engine facade.

mod bounds;
mod engine;
mod event;
mod identity;
mod node;
mod registry;

pub use bounds::*;
pub use engine::*;
pub use event::*;
pub(crate) use identity::*;
pub use node::*;
pub(crate) use registry::*;

// plane constants
pub const DEFAULT_PLANE_WIDTH: u32 = 2048;
pub const DEFAULT_PLANE_HEIGHT: u32 = 2048;
pub const DEFAULT_ORIGIN: f64 = 0.0;

// rendering constants
pub const DEFAULT_NODE_POINT_SIZE: u32 = 16;
pub const DEFAULT_NODE_RADIUS_SIZE: u32 = 128;

// identity constants
pub const FIRST_NODE_ID: u64 = 1;

// event constants
pub const TOPOLOGY_EVENT: &str = "topology_event";

// postel constants
pub const POSTEL_VERSION: &str = env!("CARGO_PKG_VERSION");

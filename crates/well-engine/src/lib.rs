pub mod bridge;
pub mod core;
pub mod well;

// Re-export key types at crate root for convenience
pub use crate::bridge::protocol::WireMessage;
pub use crate::bridge::transport::{Endpoint, TransportError};
pub use crate::core::physics::{OrbHandle, OrbMaterial, WellBounds, WellError, WellWorld};
pub use crate::core::rng::Rng;
pub use crate::core::time::FixedTimestep;
pub use crate::well::render::{OrbTransform, RenderLoop};
pub use crate::well::surface::{WellConfig, WellSurface};
pub use crate::well::sync::{clamp_center, OrbSync};
pub use crate::well::word::{orb_radius, Word, ORB_BASE_DIAMETER, ORB_VOTE_STEP};

//! Core 3-D space-colonization tree growth and tube skinning library.
//!
//! Main components:
//! - [`attractor`]: the attraction points a domain grows towards.
//! - [`distribution`]: point-cloud shapes used to seed attractors.
//! - [`limb`]: the append-only limb arena.
//! - [`growth`]: one space-colonization growth step.
//! - [`trunk`]: straight trunk growth before attraction starts.
//! - [`mesh`]: thickness propagation and tube mesh generation.
//! - [`simulation`]: a whole tree (branches + roots) ticked together.
//! - [`config`]: parameters for all of the above.
//! - [`influence_buffer`]: per-limb scratch space used during growth.
//! - [`error`]: the crate error type.
//! - [`types`]: shared ids and enums.

pub mod attractor;
pub mod config;
pub mod distribution;
pub mod error;
pub mod growth;
pub mod influence_buffer;
pub mod limb;
pub mod mesh;
pub mod simulation;
pub mod trunk;
pub mod types;

pub use error::{KauriError, Result};

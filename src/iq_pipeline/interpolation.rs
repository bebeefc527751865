//! Generic trigger-driven interpolation engine
//!
//! A tuning tree is walked top-down with one [`LevelSearch`] per level, each selecting
//! up to three children through [`locate`], then blended bottom-up by a [`LeafBlender`]
//! until the root holds a single interpolated parameter block.

mod blend;
mod node;
mod region;
mod tree;


pub use blend::{Blendable, LeafBlender, LinearBlender, lerp, lerp_i32, lerp_slice};
pub use node::{ChildSelection, MAX_CHILDREN, TreePayload, TuningNode};
pub use region::{InterpolationOutcome, TriggerRegion, interpolation_ratio, locate, locate_by};
pub use tree::{InterpolationTree, LevelSearch, TreeLevel};

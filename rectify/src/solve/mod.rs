//! Closed-form right-angle solvers.
pub mod aspect;
pub mod depth;

pub use aspect::AspectEstimate;
pub use depth::{BaseFrame, DepthEstimate};

//! A retained entity graph for positioning, lighting and animating effect entities.
//!
//! Holds the entity hierarchy and advances transform animations; drawing is left to
//! whatever consumes the graph.

mod easing;
mod entity;
mod interpolate;
mod scene;
mod transform;

pub use easing::*;
pub use entity::*;
pub use interpolate::*;
pub use scene::*;
pub use transform::*;

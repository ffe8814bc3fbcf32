//! Pure 2D transform math.
//!
//! - [`transform2d`] – decomposed transform, matrix composition and decomposition
//! - [`rect`] – rectangles and the bounds accumulator
//! - [`geometry`] – angles and polygon containment
//!
//! Everything here is stateless; the world-aware wrappers live in
//! [`crate::systems::propagate_transforms`].

pub mod geometry;
pub mod rect;
pub mod transform2d;

pub use geometry::{angle_between, point_in_polygon};
pub use rect::{Bounds, Rect};
pub use transform2d::{Transform2D, reparent_matrix};

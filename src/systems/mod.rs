//! World-level operations on the render node tree.
//!
//! Submodules overview:
//! - [`propagate_transforms`] – world transform propagation and tree helpers
//! - [`sync`] – component to transform sync in both directions
//! - [`render_tree`] – creating, removing and reparenting render nodes
//! - [`selection`] – selection container, composite components, handling lock
//! - [`camera`] – bounding rectangles and view fitting

pub mod camera;
pub mod propagate_transforms;
pub mod render_tree;
pub mod selection;
pub mod sync;

//! ECS components of render nodes.
//!
//! Every live scene entity is mirrored by one render node: an ECS entity
//! carrying the components below, linked to its parent with `ChildOf`.
//!
//! Submodules overview:
//! - [`globaltransform2d`] – computed world-space matrix
//! - [`localtransform`] – editable transform relative to the render parent
//! - [`nodecontent`] – intrinsic content rectangle and selection hit area
//! - [`scenenode`] – link back to the logical entity, scene root marker
//! - [`selectioncontainer`] – marker for the synthetic selection node
//! - [`zindex`] – draw order among siblings

pub mod globaltransform2d;
pub mod localtransform;
pub mod nodecontent;
pub mod scenenode;
pub mod selectioncontainer;
pub mod zindex;

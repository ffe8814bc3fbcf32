//! ECS resources shared by the editor systems.
//!
//! Submodules overview:
//! - [`editorconfig`] – interaction tuning loaded from an INI file
//! - [`handlinglock`] – exclusive handling lock and its snapshot
//! - [`nodeindex`] – entity id to render node lookup
//! - [`pendingrender`] – coalesced render request flag
//! - [`renderer`] – the drawing backend seam and a headless implementation
//! - [`selection`] – the current selection

pub mod editorconfig;
pub mod handlinglock;
pub mod nodeindex;
pub mod pendingrender;
pub mod renderer;
pub mod selection;

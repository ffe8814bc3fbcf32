//! Commands and notifications.
//!
//! Submodules overview:
//! - [`scenecmd`] – typed commands that change the scene
//! - [`bus`] – command queue, editor events and subscription filters

pub mod bus;
pub mod scenecmd;

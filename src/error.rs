//! Error type shared by the store, the selection and the handles.
//!
//! Lock violations are programming errors in the caller and are returned as
//! errors. Data-shape anomalies (mixed or missing components, degenerate
//! geometry) never reach this type: they are logged and skipped where they
//! occur.

use crate::handles::{AnchorDirection, HandleRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("handling already held by {holder:?}, {requested:?} cannot begin")]
    HandlingLocked {
        holder: HandleRef,
        requested: HandleRef,
    },
    #[error("{caller:?} cannot end handling held by {holder:?}")]
    NotHandlingHolder {
        caller: HandleRef,
        holder: Option<HandleRef>,
    },
    #[error("anchor direction {0:?} combines opposite sides")]
    ConflictingAnchorDirection(AnchorDirection),
    #[error("anchor direction {0:?} does not name a side for its axis")]
    InvalidAnchor(AnchorDirection),
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("entity '{0}' already exists")]
    DuplicateEntity(String),
    #[error("entity '{id}' cannot be placed under '{parent}': cycle in parent chain")]
    CyclicParent { id: String, parent: String },
    #[error("component '{id}' is a {expected}, got a {found}")]
    ComponentTypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

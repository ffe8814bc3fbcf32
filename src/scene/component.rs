//! Typed scene components.
//!
//! A [`SceneComponent`] is an identified, typed value attached to an entity.
//! On the wire it is a flat tagged object:
//!
//! ```json
//! { "id": "transformation.position", "type": "point", "x": 10, "y": 4 }
//! ```
//!
//! The `type` tag selects which fields are valid and never changes once the
//! component exists.

use serde::{Deserialize, Serialize};

/// Ids of the components the transform core reads and writes.
pub mod ids {
    pub const POSITION: &str = "transformation.position";
    pub const SCALE: &str = "transformation.scale";
    /// Rotation in degrees, stored as a range.
    pub const ROTATION: &str = "transformation.rotation";
    /// Skew in degrees.
    pub const SKEW: &str = "transformation.skew";
    pub const PIVOT: &str = "transformation.pivot";
    pub const SIZE: &str = "transformation.size";

    /// Marker shared by every transformation id, also used as their group.
    /// Such components are never marked mixed in a composite.
    pub const TRANSFORMATION: &str = "transformation";
}

/// Typed payload of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentValue {
    Point {
        x: f64,
        y: f64,
    },
    Range {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Size {
        width: f64,
        height: f64,
        #[serde(rename = "localWidth")]
        local_width: f64,
        #[serde(rename = "localHeight")]
        local_height: f64,
    },
    Boolean {
        #[serde(rename = "bool")]
        value: bool,
    },
    Index {
        index: i64,
    },
    String {
        value: String,
    },
    Color {
        value: u32,
        alpha: f64,
    },
}

impl ComponentValue {
    /// The `type` tag of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Range { .. } => "range",
            Self::Size { .. } => "size",
            Self::Boolean { .. } => "boolean",
            Self::Index { .. } => "index",
            Self::String { .. } => "string",
            Self::Color { .. } => "color",
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneComponent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Set on composite values whose sources disagree. Display only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mixed: bool,
    #[serde(flatten)]
    pub value: ComponentValue,
}

impl SceneComponent {
    pub fn new(id: impl Into<String>, value: ComponentValue) -> Self {
        Self {
            id: id.into(),
            group: None,
            mixed: false,
            value,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn point(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(id, ComponentValue::Point { x, y })
    }

    pub fn range(id: impl Into<String>, value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::new(
            id,
            ComponentValue::Range {
                value,
                min,
                max,
                step,
            },
        )
    }

    pub fn size(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(
            id,
            ComponentValue::Size {
                width,
                height,
                local_width: width,
                local_height: height,
            },
        )
    }

    pub fn boolean(id: impl Into<String>, value: bool) -> Self {
        Self::new(id, ComponentValue::Boolean { value })
    }

    pub fn index(id: impl Into<String>, index: i64) -> Self {
        Self::new(id, ComponentValue::Index { index })
    }

    pub fn string(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            id,
            ComponentValue::String {
                value: value.into(),
            },
        )
    }

    pub fn color(id: impl Into<String>, value: u32, alpha: f64) -> Self {
        Self::new(id, ComponentValue::Color { value, alpha })
    }

    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// Whether this component belongs to the collective transform of a
    /// selection rather than to per-entity data.
    pub fn is_transformation(&self) -> bool {
        self.id.contains(ids::TRANSFORMATION)
    }
}

/// The full set of transformation components for a node at `(x, y)` whose
/// content is `width` by `height`.
pub fn transformation_components(x: f64, y: f64, width: f64, height: f64) -> Vec<SceneComponent> {
    vec![
        SceneComponent::point(ids::POSITION, x, y).with_group(ids::TRANSFORMATION),
        SceneComponent::point(ids::SCALE, 1.0, 1.0).with_group(ids::TRANSFORMATION),
        SceneComponent::range(ids::ROTATION, 0.0, -180.0, 180.0, 1.0).with_group(ids::TRANSFORMATION),
        SceneComponent::point(ids::SKEW, 0.0, 0.0).with_group(ids::TRANSFORMATION),
        SceneComponent::point(ids::PIVOT, 0.0, 0.0).with_group(ids::TRANSFORMATION),
        SceneComponent::size(ids::SIZE, width, height).with_group(ids::TRANSFORMATION),
    ]
}

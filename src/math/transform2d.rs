//! Decomposed 2D transform and its affine matrix.
//!
//! A [`Transform2D`] is the editable form of a node transform: position,
//! scale, skew, rotation and pivot. The composed matrix follows the usual
//! scene-graph convention:
//!
//! ```text
//! local = T(position) * R(rotation, skew) * S(scale) * T(-pivot)
//! world = parent_world * local
//! ```
//!
//! The pivot is the point in local space that lands on `position` in parent
//! space, so rotation and scale happen around it.

use glam::{DAffine2, DMat2, DVec2};
use std::f64::consts::TAU;

/// Angles closer than this are treated as equal when deciding whether a
/// matrix carries skew.
const SKEW_EPSILON: f64 = 1e-10;
/// Column lengths below this are treated as collapsed (zero scale).
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Editable 2D transform. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: DVec2,
    pub scale: DVec2,
    pub skew: DVec2,
    pub rotation: f64,
    pub pivot: DVec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        position: DVec2::ZERO,
        scale: DVec2::ONE,
        skew: DVec2::ZERO,
        rotation: 0.0,
        pivot: DVec2::ZERO,
    };

    /// Transform with only a translation.
    pub fn from_position(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, sx: f64, sy: f64) -> Self {
        self.scale = DVec2::new(sx, sy);
        self
    }

    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }

    pub fn with_skew(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.skew = DVec2::new(skew_x, skew_y);
        self
    }

    pub fn with_pivot(mut self, x: f64, y: f64) -> Self {
        self.pivot = DVec2::new(x, y);
        self
    }

    /// Linear part (rotation, skew and scale) of the matrix.
    pub fn linear(&self) -> DMat2 {
        let (sin_a, cos_a) = (self.rotation + self.skew.y).sin_cos();
        let (sin_c, cos_c) = (self.rotation - self.skew.x).sin_cos();
        DMat2::from_cols(
            DVec2::new(cos_a * self.scale.x, sin_a * self.scale.x),
            DVec2::new(-sin_c * self.scale.y, cos_c * self.scale.y),
        )
    }

    /// Composes the local affine matrix.
    pub fn matrix(&self) -> DAffine2 {
        let linear = self.linear();
        let translation = self.position - linear * self.pivot;
        DAffine2::from_mat2_translation(linear, translation)
    }

    /// Decomposes `matrix` into this transform, keeping the current pivot.
    ///
    /// The signs of the current scale are used as hints: a node that was
    /// flipped keeps a negative scale instead of turning into a skewed one.
    /// The result always recomposes to `matrix`.
    pub fn set_from_matrix(&mut self, matrix: &DAffine2) {
        let linear = matrix.matrix2;
        let mut sign = DVec2::new(sign_of(self.scale.x), sign_of(self.scale.y));
        let det = linear.determinant();
        if det * sign.x * sign.y < 0.0 {
            sign.x = -sign.x;
        }

        let x_axis = linear.x_axis * sign.x;
        let y_axis = linear.y_axis * sign.y;
        let x_len = x_axis.length();
        let y_len = y_axis.length();

        let mut skew_y = x_axis.y.atan2(x_axis.x);
        let mut skew_x = -(-y_axis.x).atan2(y_axis.y);
        if x_len < DEGENERATE_EPSILON {
            skew_y = -skew_x;
        } else if y_len < DEGENERATE_EPSILON {
            skew_x = -skew_y;
        }

        let delta = (skew_x + skew_y).abs();
        if delta < SKEW_EPSILON || (TAU - delta).abs() < SKEW_EPSILON {
            self.rotation = skew_y;
            self.skew = DVec2::ZERO;
        } else {
            self.rotation = 0.0;
            self.skew = DVec2::new(skew_x, skew_y);
        }

        self.scale = DVec2::new(sign.x * x_len, sign.y * y_len);
        self.position = matrix.translation + linear * self.pivot;
    }
}

fn sign_of(value: f64) -> f64 {
    if value < 0.0 { -1.0 } else { 1.0 }
}

/// Local matrix that keeps a node's world matrix when it is placed under a
/// parent whose world matrix is `parent_world`.
///
/// Returns `None` when the parent matrix cannot be inverted.
pub fn reparent_matrix(node_world: &DAffine2, parent_world: &DAffine2) -> Option<DAffine2> {
    if parent_world.matrix2.determinant().abs() < DEGENERATE_EPSILON {
        return None;
    }
    Some(parent_world.inverse() * *node_world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPSILON: f64 = 1e-9;

    fn matrix_approx_eq(a: &DAffine2, b: &DAffine2) -> bool {
        a.abs_diff_eq(*b, EPSILON)
    }

    #[test]
    fn identity_matrix() {
        assert!(matrix_approx_eq(
            &Transform2D::IDENTITY.matrix(),
            &DAffine2::IDENTITY
        ));
    }

    #[test]
    fn pivot_lands_on_position() {
        let t = Transform2D::from_position(30.0, 40.0)
            .with_scale(2.0, 3.0)
            .with_rotation(0.7)
            .with_pivot(5.0, 5.0);
        let p = t.matrix().transform_point2(t.pivot);
        assert!(p.abs_diff_eq(t.position, EPSILON));
    }

    #[test]
    fn decompose_rotation_and_scale() {
        let original = Transform2D::from_position(10.0, -4.0)
            .with_scale(2.0, 0.5)
            .with_rotation(FRAC_PI_4);
        let mut t = Transform2D::IDENTITY;
        t.set_from_matrix(&original.matrix());
        assert!((t.rotation - FRAC_PI_4).abs() < EPSILON);
        assert!(t.scale.abs_diff_eq(DVec2::new(2.0, 0.5), EPSILON));
        assert!(t.skew.abs_diff_eq(DVec2::ZERO, EPSILON));
        assert!(t.position.abs_diff_eq(original.position, EPSILON));
    }

    #[test]
    fn decompose_keeps_flip_as_negative_scale() {
        let original = Transform2D::from_position(1.0, 2.0)
            .with_scale(-2.0, 1.0)
            .with_rotation(0.3);
        let mut t = Transform2D::IDENTITY.with_scale(-1.0, 1.0);
        t.set_from_matrix(&original.matrix());
        assert!(t.scale.x < 0.0);
        assert!(matrix_approx_eq(&t.matrix(), &original.matrix()));
    }

    #[test]
    fn decompose_unhinted_flip_recomposes() {
        let original = Transform2D::IDENTITY.with_scale(1.0, -3.0);
        let mut t = Transform2D::IDENTITY;
        t.set_from_matrix(&original.matrix());
        assert!(matrix_approx_eq(&t.matrix(), &original.matrix()));
    }

    #[test]
    fn decompose_skew() {
        let original = Transform2D::from_position(3.0, 4.0)
            .with_scale(1.5, 2.0)
            .with_skew(0.2, -0.1);
        let mut t = Transform2D::IDENTITY;
        t.set_from_matrix(&original.matrix());
        assert!(matrix_approx_eq(&t.matrix(), &original.matrix()));
    }

    #[test]
    fn decompose_keeps_pivot() {
        let original = Transform2D::from_position(3.0, 4.0)
            .with_rotation(PI)
            .with_pivot(7.0, 1.0);
        let mut t = Transform2D::IDENTITY.with_pivot(7.0, 1.0);
        t.set_from_matrix(&original.matrix());
        assert!(t.pivot.abs_diff_eq(DVec2::new(7.0, 1.0), EPSILON));
        assert!(matrix_approx_eq(&t.matrix(), &original.matrix()));
    }

    #[test]
    fn decompose_collapsed_axis_keeps_rotation() {
        let original = Transform2D::IDENTITY
            .with_scale(0.0, 2.0)
            .with_rotation(FRAC_PI_2);
        let mut t = Transform2D::IDENTITY;
        t.set_from_matrix(&original.matrix());
        assert!((t.rotation - FRAC_PI_2).abs() < EPSILON);
        assert!(t.skew.abs_diff_eq(DVec2::ZERO, EPSILON));
    }

    #[test]
    fn reparent_matrix_rejects_degenerate_parent() {
        let parent = Transform2D::IDENTITY.with_scale(0.0, 1.0).matrix();
        assert!(reparent_matrix(&DAffine2::IDENTITY, &parent).is_none());
    }
}

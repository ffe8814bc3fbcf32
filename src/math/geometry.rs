//! Small geometric helpers shared by the handles and the bounds helper.

use glam::DVec2;
use std::f64::consts::PI;

/// Signed angle, in radians, of the vector `point - origin`, in `(-π, π]`.
pub fn angle_between(origin: DVec2, point: DVec2) -> f64 {
    let delta = point - origin;
    let angle = delta.y.atan2(delta.x);
    if angle <= -PI { PI } else { angle }
}

/// Even-odd containment test; works for either winding order.
pub fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

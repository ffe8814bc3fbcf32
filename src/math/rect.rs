//! Axis-aligned rectangles and a bounds accumulator.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Degenerate rectangle returned for empty bounds.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [DVec2; 4] {
        let min = self.min();
        let max = self.max();
        [
            min,
            DVec2::new(max.x, min.y),
            max,
            DVec2::new(min.x, max.y),
        ]
    }

    /// Rectangle scaled by `factor` around its center.
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        let center = self.center();
        let half = self.size() * 0.5 * factor;
        Self::from_min_max(center - half, center + half)
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Axis-aligned bounds of this rectangle after `matrix`.
    pub fn transformed(&self, matrix: &DAffine2) -> Self {
        let mut bounds = Bounds::default();
        bounds.add_rect(self, matrix);
        bounds.rect()
    }
}

/// Running min/max accumulator used to union rectangles and points.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    min: DVec2,
    max: DVec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn add_point(&mut self, point: DVec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Adds the four corners of `rect` mapped through `matrix`.
    pub fn add_rect(&mut self, rect: &Rect, matrix: &DAffine2) {
        for corner in rect.corners() {
            self.add_point(matrix.transform_point2(corner));
        }
    }

    pub fn add_bounds(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.add_point(other.min);
        self.add_point(other.max);
    }

    /// Union as a rectangle; [`Rect::ZERO`] when nothing was added.
    pub fn rect(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::from_min_max(self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn empty_bounds_are_zero_rect() {
        assert_eq!(Bounds::default().rect(), Rect::ZERO);
    }

    #[test]
    fn union_of_two_rects() {
        let mut bounds = Bounds::default();
        bounds.add_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), &DAffine2::IDENTITY);
        bounds.add_rect(
            &Rect::new(0.0, 0.0, 10.0, 10.0),
            &DAffine2::from_translation(DVec2::new(20.0, 0.0)),
        );
        assert_eq!(bounds.rect(), Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(bounds.rect().center(), DVec2::new(15.0, 5.0));
    }

    #[test]
    fn rotated_rect_bounds() {
        let rect = Rect::new(0.0, 0.0, 10.0, 4.0);
        let r = rect.transformed(&DAffine2::from_angle(FRAC_PI_2));
        assert!((r.width - 4.0).abs() < 1e-9);
        assert!((r.height - 10.0).abs() < 1e-9);
    }

    #[test]
    fn scaled_about_center_keeps_center() {
        let rect = Rect::new(10.0, 10.0, 20.0, 10.0);
        let big = rect.scaled_about_center(2.0);
        assert_eq!(big.center(), rect.center());
        assert_eq!(big.size(), DVec2::new(40.0, 20.0));
    }
}

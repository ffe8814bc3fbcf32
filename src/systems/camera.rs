//! Bounds of node sets and view fitting.

use bevy_ecs::prelude::*;
use glam::{DAffine2, DVec2};
use log::warn;
use serde::Serialize;

use super::propagate_transforms::{global_matrix, local_bounds};
use crate::math::{Bounds, Rect, reparent_matrix};

/// Union of each node's local bounds mapped into `space` (world space when
/// `None`). An empty node list yields [`Rect::ZERO`].
pub fn get_bounding_rect(world: &World, nodes: &[Entity], space: Option<Entity>) -> Rect {
    let space_world = space
        .map(|s| global_matrix(world, s))
        .unwrap_or(DAffine2::IDENTITY);
    let mut bounds = Bounds::default();
    for &node in nodes {
        let Some(to_space) = reparent_matrix(&global_matrix(world, node), &space_world) else {
            warn!("bounding rect: degenerate space {:?}", space);
            return Rect::ZERO;
        };
        bounds.add_rect(&local_bounds(world, node), &to_space);
    }
    bounds.rect()
}

/// Camera placement that shows a rectangle inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewFit {
    pub center: DVec2,
    pub zoom: f64,
}

/// Centers `rect` in a `viewport` and picks the largest zoom that keeps
/// `padding` free on every side. Degenerate rectangles keep zoom 1.
pub fn fit_view(rect: &Rect, viewport: DVec2, padding: f64) -> ViewFit {
    let center = rect.center();
    let available = (viewport - DVec2::splat(2.0 * padding)).max(DVec2::ONE);
    let size = rect.size().abs();
    let zoom = if size.x <= 0.0 || size.y <= 0.0 {
        1.0
    } else {
        (available.x / size.x).min(available.y / size.y)
    };
    ViewFit { center, zoom }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_zero_rect() {
        let world = World::new();
        assert_eq!(get_bounding_rect(&world, &[], None), Rect::ZERO);
    }

    #[test]
    fn fit_uses_limiting_axis() {
        let fit = fit_view(&Rect::new(0.0, 0.0, 100.0, 50.0), DVec2::new(240.0, 240.0), 20.0);
        assert_eq!(fit.center, DVec2::new(50.0, 25.0));
        assert!((fit.zoom - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fit_degenerate_rect() {
        let fit = fit_view(&Rect::ZERO, DVec2::new(100.0, 100.0), 0.0);
        assert_eq!(fit.zoom, 1.0);
    }
}

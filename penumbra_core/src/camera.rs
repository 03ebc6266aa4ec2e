// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera offset and visibility culling.
//!
//! Culling runs in two phases so that cameras with expensive transforms can
//! reject cheaply before transforming and definitively afterwards:
//!
//! 1. [`CameraView::should_cull_pre_transform`] sees only the resolved
//!    state (opacity check).
//! 2. [`CameraView::should_cull_post_transform`] sees the camera-adjusted
//!    pixel rectangle and runs the bounds test from [`cull_rect`].

use kurbo::{Rect, Size, Vec2};

use crate::state::TransformState;

/// Multiple of a rotated rectangle's longer side added to the rejection
/// margin.
pub const ROTATION_MARGIN_FACTOR: f64 = 1.5;

/// Returns whether `rect` should be culled against a viewport of `viewport`
/// size anchored at the origin.
///
/// With `rotation == 0` the test is exact: a rectangle is culled iff it has
/// no positive-area overlap with the viewport. With any other rotation the
/// rectangle is inflated by [`ROTATION_MARGIN_FACTOR`] times its longer side
/// first, which may keep some off-screen rectangles but never culls a
/// visible one.
#[must_use]
pub fn cull_rect(rect: Rect, rotation: f64, viewport: Size) -> bool {
    let rect = rect.abs();
    let margin = if rotation == 0.0 {
        0.0
    } else {
        ROTATION_MARGIN_FACTOR * rect.width().max(rect.height())
    };
    rect.x1 + margin <= 0.0
        || rect.y1 + margin <= 0.0
        || rect.x0 - margin >= viewport.width
        || rect.y0 - margin >= viewport.height
}

/// A view onto the scene used for culling and placement.
pub trait CameraView {
    /// Offset subtracted from every non-static rectangle.
    fn offset(&self) -> Vec2;

    /// Cheap rejection before any camera transform.
    fn should_cull_pre_transform(&self, state: &TransformState) -> bool {
        state.opacity() <= 0.0
    }

    /// Definitive rejection of a camera-adjusted rectangle.
    fn should_cull_post_transform(&self, rect: Rect, rotation: f64, viewport: Size) -> bool {
        cull_rect(rect, rotation, viewport)
    }

    /// Moves a world-space rectangle into view space.
    fn apply(&self, rect: Rect) -> Rect {
        rect - self.offset()
    }
}

/// A plain translating camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    /// World position shown at the top-left of the viewport.
    pub offset: Vec2,
}

impl Camera {
    /// Creates a camera at the given offset.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            offset: Vec2::new(x, y),
        }
    }

    /// Translates the camera.
    pub fn move_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }
}

impl CameraView for Camera {
    fn offset(&self) -> Vec2 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Size = Size::new(100.0, 100.0);

    #[test]
    fn unrotated_inside_is_kept() {
        assert!(!cull_rect(Rect::new(10.0, 10.0, 20.0, 20.0), 0.0, VIEW));
    }

    #[test]
    fn unrotated_partial_overlap_is_kept() {
        assert!(!cull_rect(Rect::new(-5.0, -5.0, 1.0, 1.0), 0.0, VIEW));
        assert!(!cull_rect(Rect::new(99.0, 50.0, 140.0, 60.0), 0.0, VIEW));
    }

    #[test]
    fn unrotated_touching_edge_is_culled() {
        assert!(cull_rect(Rect::new(-10.0, 0.0, 0.0, 10.0), 0.0, VIEW));
        assert!(cull_rect(Rect::new(100.0, 0.0, 110.0, 10.0), 0.0, VIEW));
        assert!(cull_rect(Rect::new(0.0, 100.0, 10.0, 120.0), 0.0, VIEW));
    }

    #[test]
    fn rotation_inflates_margin() {
        // 10 px left of the viewport: culled unrotated, kept once rotated.
        let r = Rect::new(-30.0, 0.0, -10.0, 20.0);
        assert!(cull_rect(r, 0.0, VIEW));
        assert!(!cull_rect(r, 45.0, VIEW));
        // Beyond 1.5x the longer side it is culled even when rotated.
        let far = Rect::new(-60.0, 0.0, -40.0, 20.0);
        assert!(cull_rect(far, 45.0, VIEW));
    }

    #[test]
    fn camera_applies_offset() {
        let cam = Camera::new(50.0, -10.0);
        let r = cam.apply(Rect::new(60.0, 0.0, 70.0, 10.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn pre_transform_rejects_transparent() {
        let cam = Camera::default();
        let mut s = TransformState::default();
        assert!(!cam.should_cull_pre_transform(&s));
        s.color.a = 0.0;
        assert!(cam.should_cull_pre_transform(&s));
    }
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node transform state and its composition operator.
//!
//! A [`TransformState`] is plain data. Resolving a node combines its local
//! state with its parent's resolved state via [`TransformState::compose`]:
//!
//! | field    | combination                         |
//! |----------|-------------------------------------|
//! | position | `child + parent`                    |
//! | scale    | `child * parent` (component-wise)   |
//! | rotation | `child + parent` (degrees)          |
//! | blend    | `max(child, parent)` by ordinal     |
//! | color    | `child * parent` (including alpha)  |
//! | z        | `child + parent`                    |
//!
//! Positions are summed, not scaled: an ancestor's scale affects the size of
//! descendants' drawn rectangles but not where they are placed.

use kurbo::Vec2;

use crate::color::{BlendMode, Color};

/// Position, scale, rotation, blend, tint, and depth of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformState {
    /// Offset in pixels.
    pub position: Vec2,
    /// Component-wise scale factor.
    pub scale: Vec2,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Blend mode used when drawing.
    pub blend: BlendMode,
    /// Multiplicative tint; alpha is the opacity.
    pub color: Color,
    /// Depth used for z-ordering.
    pub z: f32,
}

impl TransformState {
    /// The neutral element of [`compose`](Self::compose).
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        rotation: 0.0,
        blend: BlendMode::None,
        color: Color::WHITE,
        z: 0.0,
    };

    /// Combines this (child) state with a parent's resolved state.
    #[must_use]
    pub fn compose(&self, parent: &Self) -> Self {
        Self {
            position: self.position + parent.position,
            scale: Vec2::new(self.scale.x * parent.scale.x, self.scale.y * parent.scale.y),
            rotation: self.rotation + parent.rotation,
            blend: self.blend.max(parent.blend),
            color: self.color.modulate(parent.color),
            z: self.z + parent.z,
        }
    }

    /// Returns the opacity (the alpha channel of the tint).
    #[inline]
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.color.a
    }
}

impl Default for TransformState {
    /// Identity placement drawn with alpha blending.
    fn default() -> Self {
        Self {
            blend: BlendMode::Alpha,
            ..Self::IDENTITY
        }
    }
}

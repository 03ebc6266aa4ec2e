// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draws for one frame.

use alloc::vec::Vec;

use kurbo::Rect;
use penumbra_core::backend::Blit;
use penumbra_core::color::{BlendMode, Color};
use penumbra_core::scene::TextureId;
use penumbra_core::target::Target;

/// What a [`RenderItem`] draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawOp {
    /// A textured rectangle.
    Blit(Blit),
    /// A solid or outlined rectangle.
    Rect {
        /// Destination in target pixels.
        rect: Rect,
        /// Fill or stroke color.
        color: Color,
        /// Whether the interior is filled.
        filled: bool,
        /// Blend operator.
        blend: BlendMode,
    },
}

impl DrawOp {
    /// Returns the blend operator of this draw.
    #[must_use]
    pub fn blend(&self) -> BlendMode {
        match self {
            Self::Blit(b) => b.blend,
            Self::Rect { blend, .. } => *blend,
        }
    }

    /// Returns the destination rectangle of this draw.
    #[must_use]
    pub fn dst(&self) -> Rect {
        match self {
            Self::Blit(b) => b.dst,
            Self::Rect { rect, .. } => *rect,
        }
    }
}

/// A single draw command, with the target that was active when it was issued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderItem {
    /// Destination of the draw.
    pub target: Target,
    /// The draw itself.
    pub op: DrawOp,
}

impl RenderItem {
    /// Returns the blit, if this item is one.
    #[must_use]
    pub fn as_blit(&self) -> Option<&Blit> {
        match &self.op {
            DrawOp::Blit(b) => Some(b),
            DrawOp::Rect { .. } => None,
        }
    }
}

/// The ordered draws of a single frame.
///
/// Items are in issue order, which is back-to-front within each target.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Frame this plan belongs to.
    pub frame: u64,
    /// Draws in issue order.
    pub items: Vec<RenderItem>,
    /// Number of render-target pushes during the frame.
    pub pushes: u32,
}

impl RenderPlan {
    /// Creates an empty plan for `frame`.
    #[must_use]
    pub fn new(frame: u64) -> Self {
        Self {
            frame,
            items: Vec::new(),
            pushes: 0,
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
        self.pushes = 0;
    }

    /// Iterates over the draws that landed on `target`.
    pub fn on(&self, target: Target) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items.iter().filter(move |item| item.target == target)
    }

    /// Iterates over every blit that sampled `texture`.
    pub fn blits_of(&self, texture: TextureId) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items
            .iter()
            .filter(move |item| item.as_blit().is_some_and(|b| b.texture == texture))
    }

    /// Textures blitted to `target`, in draw order.
    #[must_use]
    pub fn textures_on(&self, target: Target) -> Vec<TextureId> {
        self.on(target)
            .filter_map(RenderItem::as_blit)
            .map(|b| b.texture)
            .collect()
    }

    /// Number of draws issued into an offscreen target.
    #[must_use]
    pub fn offscreen_draws(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.target != Target::Screen)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn blit(texture: u32) -> Blit {
        Blit {
            texture: TextureId(texture),
            src: None,
            dst: Rect::new(0.0, 0.0, 4.0, 4.0),
            blend: BlendMode::Alpha,
            color: Color::WHITE,
            rotation: 0.0,
            anchor: Point::ZERO,
        }
    }

    #[test]
    fn filters_by_target_and_texture() {
        let mut plan = RenderPlan::new(3);
        let canvas = Target::Texture(TextureId(9));
        plan.items.push(RenderItem {
            target: canvas,
            op: DrawOp::Blit(blit(1)),
        });
        plan.items.push(RenderItem {
            target: Target::Screen,
            op: DrawOp::Blit(blit(9)),
        });
        plan.items.push(RenderItem {
            target: Target::Screen,
            op: DrawOp::Rect {
                rect: Rect::new(0.0, 0.0, 1.0, 1.0),
                color: Color::BLACK,
                filled: true,
                blend: BlendMode::None,
            },
        });

        assert_eq!(plan.textures_on(Target::Screen), [TextureId(9)]);
        assert_eq!(plan.textures_on(canvas), [TextureId(1)]);
        assert_eq!(plan.blits_of(TextureId(1)).count(), 1);
        assert_eq!(plan.offscreen_draws(), 1);
        assert_eq!(plan.items[2].op.blend(), BlendMode::None);

        plan.clear();
        assert!(plan.items.is_empty());
        assert_eq!(plan.frame, 3);
    }
}

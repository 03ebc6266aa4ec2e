// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A renderer that records draws instead of executing them.

use alloc::collections::BTreeMap;
use core::mem;

use kurbo::{Rect, Size};
use penumbra_core::backend::{Blit, Renderer, TextureHandle};
use penumbra_core::color::{BlendMode, Color};
use penumbra_core::scene::TextureId;
use penumbra_core::target::{RenderTargetStack, Target};

use crate::plan::{DrawOp, RenderItem, RenderPlan};

/// Records every draw of a frame into a [`RenderPlan`].
///
/// Draws are routed through a [`RenderTargetStack`], so each recorded item
/// carries the target that was active when it was issued. The plan under
/// construction is available through [`current`](Self::current); at
/// [`end_frame`](Renderer::end_frame) it becomes the [`last`](Self::last)
/// plan and the frame counter advances.
#[derive(Clone, Debug)]
pub struct PlanRenderer {
    screen: Size,
    time_factor: f64,
    frame: u64,
    targets: RenderTargetStack,
    sizes: BTreeMap<TextureId, Size>,
    current: RenderPlan,
    last: Option<RenderPlan>,
}

impl PlanRenderer {
    /// Creates a renderer with a screen of the given size and a time factor
    /// of one sixtieth of a second.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            screen: Size::new(width, height),
            time_factor: 1.0 / 60.0,
            frame: 0,
            targets: RenderTargetStack::new(),
            sizes: BTreeMap::new(),
            current: RenderPlan::new(0),
            last: None,
        }
    }

    /// Sets the duration reported for the previous frame.
    pub fn set_time_factor(&mut self, seconds: f64) {
        self.time_factor = seconds;
    }

    /// Resizes the screen target.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.screen = Size::new(width, height);
    }

    /// Records the size of a texture so that it reports correctly as a
    /// render target. Unregistered textures report the screen size.
    pub fn register_texture(&mut self, texture: &TextureHandle) {
        self.sizes.insert(texture.id, texture.size());
    }

    /// The plan being recorded for the current frame.
    #[must_use]
    pub fn current(&self) -> &RenderPlan {
        &self.current
    }

    /// The plan of the most recently finished frame.
    #[must_use]
    pub fn last(&self) -> Option<&RenderPlan> {
        self.last.as_ref()
    }

    /// Takes the plan of the most recently finished frame.
    pub fn take_last(&mut self) -> Option<RenderPlan> {
        self.last.take()
    }

    /// The active draw destination.
    #[must_use]
    pub fn active_target(&self) -> Target {
        self.targets.active()
    }

    /// Total pops issued with nothing pushed.
    #[must_use]
    pub fn unmatched_pops(&self) -> u64 {
        self.targets.unmatched_pops()
    }

    fn record(&mut self, op: DrawOp) {
        self.current.items.push(RenderItem {
            target: self.targets.active(),
            op,
        });
    }
}

impl Renderer for PlanRenderer {
    fn push_render_target(&mut self, texture: TextureId) {
        self.targets.push(texture);
        self.current.pushes += 1;
    }

    fn pop_render_target(&mut self) {
        self.targets.pop();
    }

    fn blit(&mut self, blit: &Blit) {
        self.record(DrawOp::Blit(*blit));
    }

    fn draw_rect(&mut self, rect: Rect, color: Color, filled: bool, blend: BlendMode) {
        self.record(DrawOp::Rect {
            rect,
            color,
            filled,
            blend,
        });
    }

    fn frame_id(&self) -> u64 {
        self.frame
    }

    fn time_factor(&self) -> f64 {
        self.time_factor
    }

    fn target_size(&self) -> Size {
        match self.targets.active() {
            Target::Screen => self.screen,
            Target::Texture(id) => self.sizes.get(&id).copied().unwrap_or(self.screen),
        }
    }

    fn begin_frame(&mut self) {
        self.targets.reset();
        self.current = RenderPlan::new(self.frame);
    }

    fn end_frame(&mut self) {
        let plan = mem::replace(&mut self.current, RenderPlan::new(self.frame + 1));
        self.last = Some(plan);
        self.frame += 1;
    }
}

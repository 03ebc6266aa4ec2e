// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first render traversal.
//!
//! Parents are resolved before their children, containers draw their render
//! list in order, and canvas-backed nodes build their texture before
//! compositing it onto whatever target is active.

use core::mem;

use kurbo::{Point, Rect};

use crate::backend::{Blit, Renderer};
use crate::camera::CameraView;
use crate::color::BlendMode;
use crate::scene::{NodeId, NodeKind, Scene};
use crate::trace::{FrameStats, RenderListEvent, Tracer};

/// Per-traversal state threaded through every render call.
pub(crate) struct RenderCx<'r, 't, 's> {
    pub(crate) renderer: &'r mut dyn Renderer,
    pub(crate) camera: &'r dyn CameraView,
    pub(crate) tracer: &'t mut Tracer<'s>,
    pub(crate) frame: u64,
    pub(crate) stats: FrameStats,
}

impl RenderCx<'_, '_, '_> {
    /// Rectangle covering the whole active target.
    pub(crate) fn full_target(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.renderer.target_size())
    }
}

impl Scene {
    /// Renders the whole scene.
    pub fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        camera: &dyn CameraView,
        tracer: &mut Tracer<'_>,
    ) -> FrameStats {
        let root = self.root();
        self.render_subtree(root, renderer, camera, tracer)
    }

    /// Renders one node and its subtree onto the active target.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn render_subtree(
        &mut self,
        id: NodeId,
        renderer: &mut dyn Renderer,
        camera: &dyn CameraView,
        tracer: &mut Tracer<'_>,
    ) -> FrameStats {
        self.validate(id);
        let frame = renderer.frame_id();
        let mut cx = RenderCx {
            renderer,
            camera,
            tracer,
            frame,
            stats: FrameStats::default(),
        };
        self.prepare_shadows(&mut cx);
        self.sync_dirty();
        self.render_node(id.idx, &mut cx);
        cx.stats
    }

    pub(crate) fn render_node(&mut self, idx: u32, cx: &mut RenderCx<'_, '_, '_>) {
        match self.kind[idx as usize] {
            NodeKind::Sprite(_) | NodeKind::Shape(_) => self.render_entity(idx, None, cx),
            NodeKind::Group(_) => self.render_group(idx, cx),
            NodeKind::Canvas(_) => self.render_canvas(idx, cx),
            NodeKind::Lighting(_) | NodeKind::Shadow(_) => self.render_compositor(idx, cx),
            NodeKind::Grid(_) => self.render_grid(idx, cx),
        }
    }

    /// Draws a leaf, optionally overriding its resolved blend mode.
    pub(crate) fn render_entity(
        &mut self,
        idx: u32,
        blend: Option<BlendMode>,
        cx: &mut RenderCx<'_, '_, '_>,
    ) {
        let viewport = cx.renderer.target_size();
        if !self.visible_idx(idx, cx.camera, viewport) {
            cx.stats.culled += 1;
            return;
        }
        let i = idx as usize;
        let state = self.resolved[i];
        let dst = self.screen_rect(idx, cx.camera);
        let blend = blend.unwrap_or(state.blend);
        match &self.kind[i] {
            NodeKind::Sprite(s) => cx.renderer.blit(&Blit {
                texture: s.texture.id,
                src: s.src,
                dst,
                blend,
                color: state.color,
                rotation: state.rotation,
                anchor: s.entity.anchor,
            }),
            NodeKind::Shape(s) => cx.renderer.draw_rect(dst, state.color, s.filled, blend),
            _ => return,
        }
        cx.stats.drawn += 1;
    }

    fn render_group(&mut self, idx: u32, cx: &mut RenderCx<'_, '_, '_>) {
        if !self.flags[idx as usize].visible {
            return;
        }
        let state = self.resolve_idx(idx);
        if cx.camera.should_cull_pre_transform(&state) {
            return;
        }
        self.render_children(idx, None, cx);
    }

    /// Draws the render list of `idx`, rebuilding it first if needed.
    ///
    /// With `blend`, every entry is drawn as a leaf with that blend mode.
    pub(crate) fn render_children(
        &mut self,
        idx: u32,
        blend: Option<BlendMode>,
        cx: &mut RenderCx<'_, '_, '_>,
    ) {
        let i = idx as usize;
        let Some(layering) = self.kind[i].layering_mut() else {
            return;
        };
        let rebuild = layering.needs_rebuild(cx.frame);
        let flattened = layering.order.break_groups;
        let mut entries = mem::take(&mut layering.entries);

        if rebuild {
            entries.clear();
            let viewport = cx.renderer.target_size();
            self.collect_render_list(idx, cx.camera, viewport, &mut entries);
            cx.stats.lists_rebuilt += 1;
            cx.tracer.render_list(&RenderListEvent {
                frame_index: cx.frame,
                node: self.handle(idx),
                len: entries.len(),
                flattened,
            });
        }

        for &c in &entries {
            match blend {
                Some(b) => self.render_entity(c, Some(b), cx),
                None => self.render_node(c, cx),
            }
        }

        if let Some(layering) = self.kind[i].layering_mut() {
            layering.entries = entries;
            if rebuild {
                layering.built_at = Some(cx.frame);
                layering.invalid = false;
            }
        }
    }

    fn render_canvas(&mut self, idx: u32, cx: &mut RenderCx<'_, '_, '_>) {
        let i = idx as usize;
        if !self.flags[i].visible {
            return;
        }
        let state = self.resolve_idx(idx);
        let NodeKind::Canvas(canvas) = &self.kind[i] else {
            return;
        };
        let (texture, clear, composite) = (canvas.texture, canvas.clear, canvas.composite);

        cx.renderer.push_render_target(texture.id);
        if let Some(color) = clear {
            let full = cx.full_target();
            cx.renderer.draw_rect(full, color, true, BlendMode::None);
        }
        self.render_children(idx, None, cx);
        cx.renderer.pop_render_target();

        if composite && !cx.camera.should_cull_pre_transform(&state) {
            let full = cx.full_target();
            cx.renderer.blit(&Blit {
                texture: texture.id,
                src: None,
                dst: full,
                blend: state.blend,
                color: state.color,
                rotation: 0.0,
                anchor: Point::ZERO,
            });
            cx.stats.drawn += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Size, Vec2};

    use super::*;
    use crate::camera::Camera;
    use crate::testing::Recorder;

    #[test]
    fn repeated_render_in_one_frame_sees_moves() {
        let mut scene = Scene::new();
        let root = scene.root();
        let leaf = scene.create_shape(Size::new(10.0, 10.0), true);
        scene.add(root, leaf).unwrap();
        scene.set_position(leaf, Vec2::new(500.0, 0.0));
        let mut renderer = Recorder::new(100.0, 100.0);
        let mut camera = Camera::default();

        let stats = scene.render(&mut renderer, &camera, &mut Tracer::none());
        assert_eq!(stats.drawn, 0);

        // The frame counter has not advanced.
        scene.set_position(leaf, Vec2::new(20.0, 20.0));
        let stats = scene.render(&mut renderer, &camera, &mut Tracer::none());
        assert_eq!(stats.drawn, 1);

        camera.move_by(Vec2::new(200.0, 0.0));
        let stats = scene.render(&mut renderer, &camera, &mut Tracer::none());
        assert_eq!(stats.drawn, 0);
        assert_eq!(renderer.ops.len(), 1);
    }
}

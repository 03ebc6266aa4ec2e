// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit engine context.
//!
//! [`Context`] owns the scene and the animator queue and runs one frame at a
//! time:
//!
//! ```text
//!   begin_frame ──► Render ──► Animate ──► Release ──► end_frame
//! ```
//!
//! It is constructed once at startup and dropped (after
//! [`shutdown`](Context::shutdown)) at exit; there is no global state.

use crate::animator::AnimatorQueue;
use crate::backend::{Renderer, ResourceManager};
use crate::camera::CameraView;
use crate::scene::Scene;
use crate::trace::{
    FrameBeginEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};

/// Scene plus animators, driven one frame at a time.
#[derive(Debug, Default)]
pub struct Context {
    scene: Scene,
    animators: AnimatorQueue,
    frames: u64,
}

impl Context {
    /// Creates a context with an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the scene for mutation.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Returns the animator queue for registration and removal.
    pub fn animators(&mut self) -> &mut AnimatorQueue {
        &mut self.animators
    }

    /// Returns the number of frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame: render the scene, advance the animators by the
    /// renderer's time factor, and hand released textures back.
    pub fn run_frame<M: ResourceManager + ?Sized>(
        &mut self,
        renderer: &mut dyn Renderer,
        resources: &mut M,
        camera: &dyn CameraView,
        tracer: &mut Tracer<'_>,
    ) -> FrameSummary {
        renderer.begin_frame();
        let frame_index = renderer.frame_id();
        let dt = renderer.time_factor();
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            time_factor: dt,
        });

        phase(tracer, frame_index, PhaseKind::Render, true);
        let stats = self.scene.render(renderer, camera, tracer);
        phase(tracer, frame_index, PhaseKind::Render, false);

        phase(tracer, frame_index, PhaseKind::Animate, true);
        let animators_finished = self.animators.run(&mut self.scene, dt);
        phase(tracer, frame_index, PhaseKind::Animate, false);

        phase(tracer, frame_index, PhaseKind::Release, true);
        let textures_released = self.scene.release_textures(resources);
        phase(tracer, frame_index, PhaseKind::Release, false);

        renderer.end_frame();
        self.frames += 1;

        let summary = FrameSummary {
            frame_index,
            stats,
            animators_finished,
            textures_released,
        };
        tracer.frame_summary(&summary);
        summary
    }

    /// Destroys every node under the root and releases all textures the
    /// scene still holds. Returns the number of texture references released.
    pub fn shutdown<M: ResourceManager + ?Sized>(mut self, resources: &mut M) -> usize {
        let root = self.scene.root();
        let children: alloc::vec::Vec<_> = self.scene.children(root).collect();
        for child in children {
            // Children of the root are never grid cells, so destroy cannot fail.
            let _ = self.scene.destroy(child);
        }
        // Detached nodes are unreachable from the root but may still hold
        // textures.
        for idx in 0..self.scene.len {
            let id = self.scene.handle(idx);
            if idx != self.scene.root && self.scene.is_alive(id) && self.scene.parent(id).is_none() {
                let _ = self.scene.destroy(id);
            }
        }
        self.scene.release_textures(resources)
    }
}

fn phase(tracer: &mut Tracer<'_>, frame_index: u64, phase: PhaseKind, begin: bool) {
    if begin {
        tracer.phase_begin(&PhaseBeginEvent { frame_index, phase });
    } else {
        tracer.phase_end(&PhaseEndEvent { frame_index, phase });
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;
    use crate::animator::{Tween, TweenProperty};
    use crate::camera::Camera;
    use crate::color::Color;
    use crate::compositor::CompositorSpec;
    use crate::testing::{Recorder, Resources};

    #[test]
    fn run_frame_renders_then_animates() {
        let mut cx = Context::new();
        let mut resources = Resources::default();
        let mut renderer = Recorder::new(64.0, 64.0);
        let scene = cx.scene_mut();
        let root = scene.root();
        let leaf = scene.create_shape(kurbo::Size::new(4.0, 4.0), true);
        scene.add(root, leaf).unwrap();
        cx.animators().register(Tween::new(
            leaf,
            TweenProperty::Position {
                from: Vec2::ZERO,
                to: Vec2::new(8.0, 0.0),
            },
            1.0,
        ));

        let summary = cx.run_frame(&mut renderer, &mut resources, &Camera::default(), &mut Tracer::none());
        assert_eq!(summary.frame_index, 0);
        assert_eq!(summary.stats.drawn, 1);
        // The recorder reports half a second per frame.
        assert_eq!(cx.scene().local(leaf).position, Vec2::new(4.0, 0.0));
        assert_eq!(renderer.frame, 1);

        let summary = cx.run_frame(&mut renderer, &mut resources, &Camera::default(), &mut Tracer::none());
        assert_eq!(summary.frame_index, 1);
        assert_eq!(summary.animators_finished, 1);
        assert_eq!(cx.frames(), 2);
    }

    #[test]
    fn destroyed_textures_are_released_at_end_of_frame() {
        let mut cx = Context::new();
        let mut resources = Resources::default();
        let mut renderer = Recorder::new(64.0, 64.0);
        let light = cx
            .scene_mut()
            .create_light(&mut resources, "glow", Color::WHITE)
            .unwrap();
        cx.scene_mut().destroy(light).unwrap();

        let summary = cx.run_frame(&mut renderer, &mut resources, &Camera::default(), &mut Tracer::none());
        assert_eq!(summary.textures_released, 1);
        assert_eq!(resources.released.len(), 1);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut cx = Context::new();
        let mut resources = Resources::default();
        let scene = cx.scene_mut();
        let root = scene.root();
        let lighting = scene
            .create_lighting_layer(&mut resources, "canvas", 64, 64, CompositorSpec::LIGHTING)
            .unwrap();
        scene.add(root, lighting).unwrap();
        let light = scene.create_light(&mut resources, "glow", Color::WHITE).unwrap();
        scene.add(lighting, light).unwrap();
        let _loose = scene.create_light(&mut resources, "spare", Color::WHITE).unwrap();

        assert_eq!(cx.shutdown(&mut resources), 3);
        assert_eq!(resources.released.len(), 3);
    }
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lighting and shadow compositors.
//!
//! Both layers own a blank canvas texture and follow the same
//! accumulate-then-composite pipeline:
//!
//! 1. If the layer needs a rebuild, push its canvas, clear it to the ambient
//!    color, draw every child into it, and pop.
//! 2. Always blit the canvas over the active target with
//!    [`BlendMode::Multiplicative`].
//!
//! The layers differ only in polarity. A **lighting** layer starts from a
//! black ambient ("no light") and draws [`SpriteRole::Light`] sprites with
//! [`BlendMode::Additive`], so overlapping lights brighten further. A
//! **shadow** layer starts from a white ambient ("no shadow") and draws
//! [`SpriteRole::ShadowCaster`] sprites with [`BlendMode::Alpha`] and a dark
//! tint.
//!
//! # Rebuild state machine
//!
//! A layer is either [`Clean`](CompositorState::Clean) or
//! [`NeedsRebuild`](CompositorState::NeedsRebuild). It moves to
//! `NeedsRebuild` when a child is added or removed, when any state under it
//! (or its own) changes, and when its ambient color changes. A render also
//! rebuilds when the camera offset differs from the previous render. Skipping
//! a rebuild while `Clean` never changes the drawn result.
//!
//! Layers are composited in paint order, so place them after everything they
//! should affect.
//!
//! # Tracked shadows
//!
//! A shadow caster may [`track`](Scene::track) another node. At the start of
//! every render the caster's local position and depth are set so that its
//! resolved values mirror the target's, plus an offset. A caster whose
//! target is destroyed or no longer reachable from the root is destroyed.

use alloc::vec::Vec;

use kurbo::Vec2;

use crate::backend::{Blit, ResourceManager, TextureHandle};
use crate::color::{BlendMode, Color};
use crate::error::{FactoryError, SceneError};
use crate::render::RenderCx;
use crate::scene::{NodeId, NodeKind, Scene, SpriteRole, Tracking};
use crate::trace::{CanvasRebuildEvent, CompositorKind, RebuildReason, ShadowDetachedEvent};
use crate::zorder::Layering;

/// Initial settings of a lighting or shadow layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorSpec {
    /// Color the canvas is cleared to before children are drawn.
    pub ambient: Color,
    /// Rebuild on every render, disabling the clean-skip optimization.
    pub always_refresh: bool,
}

impl CompositorSpec {
    /// Black ambient, dirty-triggered rebuilds.
    pub const LIGHTING: Self = Self {
        ambient: Color::BLACK,
        always_refresh: false,
    };

    /// White ambient, dirty-triggered rebuilds.
    pub const SHADOW: Self = Self {
        ambient: Color::WHITE,
        always_refresh: false,
    };
}

/// Whether a compositor canvas reflects its current content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositorState {
    /// The canvas matches the last render.
    Clean,
    /// The canvas must be rebuilt before it is composited.
    NeedsRebuild,
}

/// Canvas and rebuild state shared by lighting and shadow layers.
#[derive(Clone, Debug)]
pub struct Compositor {
    pub(crate) canvas: TextureHandle,
    pub(crate) ambient: Color,
    pub(crate) always_refresh: bool,
    pub(crate) state: CompositorState,
    pub(crate) last_camera: Option<Vec2>,
    pub(crate) rebuilds: u64,
    pub(crate) layering: Layering,
}

impl Compositor {
    fn new(canvas: TextureHandle, spec: CompositorSpec) -> Self {
        Self {
            canvas,
            ambient: spec.ambient,
            always_refresh: spec.always_refresh,
            state: CompositorState::NeedsRebuild,
            last_camera: None,
            rebuilds: 0,
            layering: Layering::default(),
        }
    }

    /// Returns the canvas texture.
    #[must_use]
    pub fn canvas(&self) -> TextureHandle {
        self.canvas
    }

    /// Returns the ambient color.
    #[must_use]
    pub fn ambient(&self) -> Color {
        self.ambient
    }

    /// Whether the layer rebuilds on every render.
    #[must_use]
    pub fn always_refresh(&self) -> bool {
        self.always_refresh
    }

    /// Returns the rebuild state.
    #[must_use]
    pub fn state(&self) -> CompositorState {
        self.state
    }

    /// Number of times the canvas has been rebuilt.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub(crate) fn invalidate(&mut self) {
        self.state = CompositorState::NeedsRebuild;
    }
}

impl Scene {
    /// Creates a detached lighting layer backed by a new blank texture.
    ///
    /// # Errors
    ///
    /// Propagates the resource manager's failure unmodified.
    pub fn create_lighting_layer<M: ResourceManager + ?Sized>(
        &mut self,
        resources: &mut M,
        name: &str,
        width: u32,
        height: u32,
        spec: CompositorSpec,
    ) -> Result<NodeId, FactoryError<M::Error>> {
        let canvas = resources
            .create_blank_texture(name, width, height)
            .map_err(FactoryError::Resource)?;
        let id = self.alloc(NodeKind::Lighting(Compositor::new(canvas, spec)));
        self.flags[id.idx as usize].atomic = true;
        Ok(id)
    }

    /// Creates a detached shadow layer backed by a new blank texture.
    ///
    /// # Errors
    ///
    /// Propagates the resource manager's failure unmodified.
    pub fn create_shadow_layer<M: ResourceManager + ?Sized>(
        &mut self,
        resources: &mut M,
        name: &str,
        width: u32,
        height: u32,
        spec: CompositorSpec,
    ) -> Result<NodeId, FactoryError<M::Error>> {
        let canvas = resources
            .create_blank_texture(name, width, height)
            .map_err(FactoryError::Resource)?;
        let id = self.alloc(NodeKind::Shadow(Compositor::new(canvas, spec)));
        self.flags[id.idx as usize].atomic = true;
        Ok(id)
    }

    /// Creates a detached light sprite from a named texture.
    ///
    /// The light is anchored at its center and tinted with `color`.
    ///
    /// # Errors
    ///
    /// Propagates the resource manager's failure unmodified.
    pub fn create_light<M: ResourceManager + ?Sized>(
        &mut self,
        resources: &mut M,
        texture: &str,
        color: Color,
    ) -> Result<NodeId, FactoryError<M::Error>> {
        self.create_role_sprite(resources, texture, color, SpriteRole::Light, BlendMode::Additive)
    }

    /// Creates a detached shadow-caster sprite from a named texture.
    ///
    /// The caster is anchored at its center and tinted with `color`, usually
    /// a dark, translucent shade.
    ///
    /// # Errors
    ///
    /// Propagates the resource manager's failure unmodified.
    pub fn create_shadow<M: ResourceManager + ?Sized>(
        &mut self,
        resources: &mut M,
        texture: &str,
        color: Color,
    ) -> Result<NodeId, FactoryError<M::Error>> {
        self.create_role_sprite(
            resources,
            texture,
            color,
            SpriteRole::ShadowCaster,
            BlendMode::Alpha,
        )
    }

    fn create_role_sprite<M: ResourceManager + ?Sized>(
        &mut self,
        resources: &mut M,
        texture: &str,
        color: Color,
        role: SpriteRole,
        blend: BlendMode,
    ) -> Result<NodeId, FactoryError<M::Error>> {
        let handle = resources
            .get_texture(texture)
            .map_err(FactoryError::Resource)?;
        let id = self.create_sprite(handle);
        let i = id.idx as usize;
        if let Some(sprite) = self.kind[i].sprite_mut() {
            sprite.role = role;
            sprite.entity.anchor = kurbo::Point::new(0.5, 0.5);
        }
        self.local[i].color = color;
        self.local[i].blend = blend;
        Ok(id)
    }

    /// Makes a shadow caster mirror `target`'s resolved position and depth,
    /// shifted by `offset`, on every render.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotTrackable`] if `caster` is not a shadow caster.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn track(&mut self, caster: NodeId, target: NodeId, offset: Vec2) -> Result<(), SceneError> {
        self.validate(caster);
        self.validate(target);
        match self.kind[caster.idx as usize].sprite_mut() {
            Some(sprite) if sprite.role == SpriteRole::ShadowCaster && caster != target => {
                sprite.tracking = Some(Tracking { target, offset });
                Ok(())
            }
            _ => Err(SceneError::NotTrackable { node: caster }),
        }
    }

    /// Stops a shadow caster from mirroring its target.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotTrackable`] if `caster` is not a shadow caster.
    pub fn untrack(&mut self, caster: NodeId) -> Result<(), SceneError> {
        self.validate(caster);
        match self.kind[caster.idx as usize].sprite_mut() {
            Some(sprite) if sprite.role == SpriteRole::ShadowCaster => {
                sprite.tracking = None;
                Ok(())
            }
            _ => Err(SceneError::NotTrackable { node: caster }),
        }
    }

    /// Sets the ambient color of a lighting layer.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotACompositor`] if `id` is not a lighting layer.
    pub fn set_ambient_color(&mut self, id: NodeId, color: Color) -> Result<(), SceneError> {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            NodeKind::Lighting(c) => {
                set_ambient(c, color);
                Ok(())
            }
            _ => Err(SceneError::NotACompositor { node: id }),
        }
    }

    /// Sets the ambient color of a shadow layer.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotACompositor`] if `id` is not a shadow layer.
    pub fn set_ambient_shadow(&mut self, id: NodeId, color: Color) -> Result<(), SceneError> {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            NodeKind::Shadow(c) => {
                set_ambient(c, color);
                Ok(())
            }
            _ => Err(SceneError::NotACompositor { node: id }),
        }
    }

    /// Makes a lighting or shadow layer rebuild on every render.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotACompositor`] if `id` is neither layer kind.
    pub fn set_always_refresh(&mut self, id: NodeId, always: bool) -> Result<(), SceneError> {
        self.validate(id);
        let Some(c) = self.kind[id.idx as usize].compositor_mut() else {
            return Err(SceneError::NotACompositor { node: id });
        };
        c.always_refresh = always;
        Ok(())
    }

    /// Mirrors tracked shadow casters onto their targets and destroys casters
    /// whose target left the scene.
    pub(crate) fn prepare_shadows(&mut self, cx: &mut RenderCx<'_, '_, '_>) {
        self.sync_dirty();
        let mut orphans: Vec<(u32, u32)> = Vec::new();
        for layer in 0..self.len {
            if !matches!(self.kind[layer as usize], NodeKind::Shadow(_)) {
                continue;
            }
            for k in 0..self.children[layer as usize].len() {
                let caster = self.children[layer as usize][k];
                let tracking = self.kind[caster as usize]
                    .sprite()
                    .and_then(|s| s.tracking());
                let Some(tracking) = tracking else {
                    continue;
                };
                if !self.is_alive(tracking.target) || !self.is_attached(tracking.target) {
                    orphans.push((layer, caster));
                    continue;
                }
                let target = self.resolve_idx(tracking.target.idx);
                let base = self.resolve_idx(layer);
                let position = target.position - base.position + tracking.offset;
                let z = target.z - base.z;
                let id = self.handle(caster);
                self.set_position(id, position);
                self.set_zindex(id, z);
            }
        }
        for (layer, caster) in orphans {
            let caster_id = self.handle(caster);
            let layer_id = self.handle(layer);
            if self.destroy(caster_id).is_ok() {
                cx.stats.shadows_detached += 1;
                cx.tracer.shadow_detached(&ShadowDetachedEvent {
                    frame_index: cx.frame,
                    layer: layer_id,
                    caster: caster_id,
                });
            }
        }
    }

    pub(crate) fn render_compositor(&mut self, idx: u32, cx: &mut RenderCx<'_, '_, '_>) {
        let i = idx as usize;
        if !self.flags[i].visible {
            return;
        }
        let state = self.resolve_idx(idx);
        let (kind, blend) = match self.kind[i] {
            NodeKind::Lighting(_) => (CompositorKind::Lighting, BlendMode::Additive),
            NodeKind::Shadow(_) => (CompositorKind::Shadow, BlendMode::Alpha),
            _ => return,
        };
        let camera = cx.camera.offset();
        let Some(comp) = self.kind[i].compositor_mut() else {
            return;
        };
        let reason = if comp.always_refresh {
            Some(RebuildReason::AlwaysRefresh)
        } else if comp.state == CompositorState::NeedsRebuild {
            Some(RebuildReason::Content)
        } else if comp.last_camera != Some(camera) {
            Some(RebuildReason::CameraMoved)
        } else {
            None
        };
        comp.last_camera = Some(camera);
        let (canvas, ambient) = (comp.canvas, comp.ambient);

        if let Some(reason) = reason {
            comp.layering.invalidate();
            cx.renderer.push_render_target(canvas.id);
            let full = cx.full_target();
            cx.renderer.draw_rect(full, ambient, true, BlendMode::None);
            self.render_children(idx, Some(blend), cx);
            cx.renderer.pop_render_target();

            if let Some(comp) = self.kind[i].compositor_mut() {
                comp.state = CompositorState::Clean;
                comp.rebuilds += 1;
            }
            cx.stats.canvas_rebuilds += 1;
            cx.tracer.canvas_rebuild(&CanvasRebuildEvent {
                frame_index: cx.frame,
                node: self.handle(idx),
                kind,
                reason,
            });
        }

        if !cx.camera.should_cull_pre_transform(&state) {
            let full = cx.full_target();
            cx.renderer.blit(&Blit {
                texture: canvas.id,
                src: None,
                dst: full,
                blend: BlendMode::Multiplicative,
                color: state.color,
                rotation: 0.0,
                anchor: kurbo::Point::ZERO,
            });
            cx.stats.drawn += 1;
        }
    }
}

fn set_ambient(c: &mut Compositor, color: Color) {
    if c.ambient != color {
        c.ambient = color;
        c.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::testing::{Recorder, Resources};
    use crate::trace::Tracer;
    use crate::zorder::ZOrder;

    fn lit_scene(resources: &mut Resources) -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let lighting = scene
            .create_lighting_layer(resources, "light-canvas", 100, 100, CompositorSpec::LIGHTING)
            .unwrap();
        scene.add(root, lighting).unwrap();
        let light = scene.create_light(resources, "glow", Color::WHITE).unwrap();
        scene.add(lighting, light).unwrap();
        (scene, lighting, light)
    }

    fn rebuilds(scene: &Scene, id: NodeId) -> u64 {
        scene.kind(id).compositor().unwrap().rebuild_count()
    }

    #[test]
    fn lighting_rejects_non_lights() {
        let mut resources = Resources::default();
        let (mut scene, lighting, _) = lit_scene(&mut resources);
        let plain = scene.create_shape(kurbo::Size::new(1.0, 1.0), true);
        assert_eq!(
            scene.add(lighting, plain),
            Err(SceneError::NotALight {
                lighting,
                child: plain
            })
        );
    }

    #[test]
    fn shadow_rejects_lights() {
        let mut resources = Resources::default();
        let mut scene = Scene::new();
        let shadow = scene
            .create_shadow_layer(&mut resources, "shadow", 10, 10, CompositorSpec::SHADOW)
            .unwrap();
        let light = scene.create_light(&mut resources, "glow", Color::WHITE).unwrap();
        assert_eq!(
            scene.add(shadow, light),
            Err(SceneError::NotAShadowCaster {
                shadow,
                child: light
            })
        );
    }

    #[test]
    fn factory_propagates_resource_errors() {
        let mut resources = Resources::default();
        let mut scene = Scene::new();
        let err = scene
            .create_light(&mut resources, "missing", Color::WHITE)
            .unwrap_err();
        assert!(matches!(err, FactoryError::Resource(name) if name == "missing"));
    }

    #[test]
    fn second_render_skips_rebuild() {
        let mut resources = Resources::default();
        let (mut scene, lighting, _) = lit_scene(&mut resources);
        let mut renderer = Recorder::new(100.0, 100.0);
        let cam = Camera::default();

        scene.render(&mut renderer, &cam, &mut Tracer::none());
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 1);
    }

    #[test]
    fn mutations_and_camera_moves_trigger_rebuild() {
        let mut resources = Resources::default();
        let (mut scene, lighting, light) = lit_scene(&mut resources);
        let mut renderer = Recorder::new(100.0, 100.0);
        let mut cam = Camera::default();
        scene.render(&mut renderer, &cam, &mut Tracer::none());

        scene.set_position(light, Vec2::new(5.0, 5.0));
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 2);

        cam.move_by(Vec2::new(1.0, 0.0));
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 3);

        scene.set_ambient_color(lighting, Color::rgb(0.2, 0.2, 0.2)).unwrap();
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 4);

        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 4);
    }

    #[test]
    fn camera_rebuild_refreshes_a_slow_light_list() {
        let mut resources = Resources::default();
        let (mut scene, lighting, light) = lit_scene(&mut resources);
        scene
            .set_zorder(lighting, ZOrder::INSERTION.with_refresh_interval(8))
            .unwrap();
        scene.set_position(light, Vec2::new(150.0, 50.0));
        let glow = scene.kind(light).sprite().unwrap().texture().id;
        let mut renderer = Recorder::new(100.0, 100.0);
        let mut cam = Camera::default();
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(renderer.blits_of(glow), 0);

        cam.move_by(Vec2::new(100.0, 0.0));
        scene.render(&mut renderer, &cam, &mut Tracer::none());
        assert_eq!(rebuilds(&scene, lighting), 2);
        assert_eq!(renderer.blits_of(glow), 1);
    }

    #[test]
    fn always_refresh_rebuilds_every_render() {
        let mut resources = Resources::default();
        let (mut scene, lighting, _) = lit_scene(&mut resources);
        scene.set_always_refresh(lighting, true).unwrap();
        let mut renderer = Recorder::new(100.0, 100.0);
        let cam = Camera::default();
        for _ in 0..3 {
            scene.render(&mut renderer, &cam, &mut Tracer::none());
        }
        assert_eq!(rebuilds(&scene, lighting), 3);
    }

    #[test]
    fn ambient_setters_check_layer_kind() {
        let mut resources = Resources::default();
        let (mut scene, lighting, _) = lit_scene(&mut resources);
        assert_eq!(
            scene.set_ambient_shadow(lighting, Color::WHITE),
            Err(SceneError::NotACompositor { node: lighting })
        );
        let root = scene.root();
        assert_eq!(
            scene.set_always_refresh(root, true),
            Err(SceneError::NotACompositor { node: root })
        );
    }

    #[test]
    fn tracked_shadow_mirrors_target() {
        let mut resources = Resources::default();
        let mut scene = Scene::new();
        let root = scene.root();
        let hero = scene.create_shape(kurbo::Size::new(8.0, 8.0), true);
        scene.add(root, hero).unwrap();
        scene.set_position(hero, Vec2::new(40.0, 30.0));
        scene.set_zindex(hero, 2.0);
        let shadow = scene
            .create_shadow_layer(&mut resources, "shadow", 100, 100, CompositorSpec::SHADOW)
            .unwrap();
        scene.add(root, shadow).unwrap();
        scene.set_position(shadow, Vec2::new(10.0, 0.0));
        let caster = scene
            .create_shadow(&mut resources, "blob", Color::new(0.0, 0.0, 0.0, 0.5))
            .unwrap();
        scene.add(shadow, caster).unwrap();
        scene.track(caster, hero, Vec2::new(0.0, 4.0)).unwrap();

        let mut renderer = Recorder::new(100.0, 100.0);
        scene.render(&mut renderer, &Camera::default(), &mut Tracer::none());
        let r = scene.resolved(caster);
        assert_eq!(r.position, Vec2::new(40.0, 34.0));
        assert_eq!(r.z, 2.0);
    }

    #[test]
    fn shadow_of_removed_target_is_destroyed() {
        let mut resources = Resources::default();
        let mut scene = Scene::new();
        let root = scene.root();
        let hero = scene.create_shape(kurbo::Size::new(8.0, 8.0), true);
        scene.add(root, hero).unwrap();
        let shadow = scene
            .create_shadow_layer(&mut resources, "shadow", 100, 100, CompositorSpec::SHADOW)
            .unwrap();
        scene.add(root, shadow).unwrap();
        let caster = scene
            .create_shadow(&mut resources, "blob", Color::BLACK)
            .unwrap();
        scene.add(shadow, caster).unwrap();
        scene.track(caster, hero, Vec2::ZERO).unwrap();

        let mut renderer = Recorder::new(100.0, 100.0);
        scene.render(&mut renderer, &Camera::default(), &mut Tracer::none());
        assert!(scene.is_alive(caster));

        scene.remove(root, hero).unwrap();
        let stats = scene.render(&mut renderer, &Camera::default(), &mut Tracer::none());
        assert!(!scene.is_alive(caster));
        assert_eq!(stats.shadows_detached, 1);
        assert_eq!(scene.children(shadow).len(), 0);
    }

    #[test]
    fn only_casters_can_track() {
        let mut resources = Resources::default();
        let (mut scene, _, light) = lit_scene(&mut resources);
        let root = scene.root();
        assert_eq!(
            scene.track(light, root, Vec2::ZERO),
            Err(SceneError::NotTrackable { node: light })
        );
    }
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::backend::{ResourceManager, TextureHandle};
use crate::color::{BlendMode, Color};
use crate::dirty;
use crate::error::SceneError;
use crate::state::TransformState;
use crate::zorder::{Layering, ZOrder};

use super::id::{INVALID, NodeId};
use super::kind::{Canvas, Entity, NodeFlags, NodeKind, Shape, Sprite, SpriteRole};
use super::traverse::Children;

/// Struct-of-arrays storage for the whole scene tree.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// A scene always has a root group, created by [`new`](Self::new), which
/// cannot be removed or destroyed. Newly created nodes are detached; attach
/// them with [`add`](Self::add) or [`insert`](Self::insert).
#[derive(Debug)]
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Local properties (set by callers) --
    pub(crate) local: Vec<TransformState>,
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) kind: Vec<NodeKind>,

    // -- Resolved properties (written by resolve) --
    pub(crate) resolved: Vec<TransformState>,
    pub(crate) resolved_static: Vec<bool>,
    pub(crate) target_rect: Vec<Rect>,
    pub(crate) stale: Vec<bool>,
    pub(crate) stamp: Vec<u64>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) next_stamp: u64,

    // -- Lifecycle tracking --
    pub(crate) root: u32,
    pub(crate) released: Vec<TextureHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding only a root group.
    #[must_use]
    pub fn new() -> Self {
        let mut scene = Self {
            parent: Vec::new(),
            children: Vec::new(),
            local: Vec::new(),
            flags: Vec::new(),
            kind: Vec::new(),
            resolved: Vec::new(),
            resolved_static: Vec::new(),
            target_rect: Vec::new(),
            stale: Vec::new(),
            stamp: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            next_stamp: 0,
            root: INVALID,
            released: Vec::new(),
        };
        scene.root = scene.alloc(NodeKind::Group(Layering::default())).idx;
        scene
    }

    /// Returns the root group.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.handle(self.root)
    }

    // -- Allocation API --

    /// Creates a detached container that draws its children in insertion
    /// order.
    pub fn create_group(&mut self) -> NodeId {
        self.alloc(NodeKind::Group(Layering::default()))
    }

    /// Creates a detached container with the given ordering policy.
    pub fn create_zgroup(&mut self, order: ZOrder) -> NodeId {
        self.alloc(NodeKind::Group(Layering::new(order)))
    }

    /// Creates a detached sprite drawing the whole texture.
    ///
    /// The sprite's size is the texture size and its anchor is the top-left
    /// corner.
    pub fn create_sprite(&mut self, texture: TextureHandle) -> NodeId {
        self.alloc(NodeKind::Sprite(Sprite {
            entity: Entity {
                size: texture.size(),
                anchor: Point::ZERO,
            },
            texture,
            src: None,
            role: SpriteRole::Plain,
            tracking: None,
        }))
    }

    /// Creates a detached sprite drawing a sub-region of a texture.
    pub fn create_sprite_region(&mut self, texture: TextureHandle, src: Rect) -> NodeId {
        let id = self.create_sprite(texture);
        if let Some(sprite) = self.kind[id.idx as usize].sprite_mut() {
            sprite.src = Some(src);
            sprite.entity.size = src.size();
        }
        id
    }

    /// Creates a detached rectangle leaf.
    pub fn create_shape(&mut self, size: Size, filled: bool) -> NodeId {
        self.alloc(NodeKind::Shape(Shape {
            entity: Entity {
                size,
                anchor: Point::ZERO,
            },
            filled,
        }))
    }

    /// Creates a detached canvas drawing its children into `texture`.
    ///
    /// The canvas is cleared to transparent before each build and composited
    /// onto the enclosing target afterwards.
    pub fn create_canvas(&mut self, texture: TextureHandle) -> NodeId {
        self.alloc(NodeKind::Canvas(Canvas {
            texture,
            clear: Some(Color::TRANSPARENT),
            composite: true,
            layering: Layering::default(),
        }))
    }

    /// Destroys a node and its whole subtree, freeing their slots for reuse.
    ///
    /// Textures held by the destroyed nodes are queued until the next
    /// [`release_textures`](Self::release_textures).
    ///
    /// # Errors
    ///
    /// [`SceneError::RootIsFixed`] for the root, [`SceneError::FixedGrid`] for
    /// a grid cell. Nothing is destroyed in either case.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.validate(id);
        let idx = id.idx;
        if idx == self.root {
            return Err(SceneError::RootIsFixed);
        }
        let p = self.parent[idx as usize];
        if p != INVALID {
            if self.kind[p as usize].caps().fixed_grid {
                return Err(SceneError::FixedGrid {
                    grid: self.handle(p),
                });
            }
            self.unlink(idx);
        }
        self.free_subtree(idx);
        Ok(())
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns whether the node is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if cur == self.root {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    /// Returns the number of live nodes, the root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` to `container`'s children.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add(&mut self, container: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert(container, usize::MAX, child)
    }

    /// Inserts `child` at `index` in `container`'s children. Indices past the
    /// end append.
    ///
    /// Marks the child's subtree for re-resolution under its new ancestry.
    ///
    /// # Errors
    ///
    /// Fails without modifying the scene if `container` cannot hold
    /// children, is a grid, or would become its own descendant, if `child`
    /// already has a parent or is the root, or if a lighting or shadow layer
    /// is offered a sprite of the wrong role.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn insert(
        &mut self,
        container: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), SceneError> {
        self.validate(container);
        self.validate(child);
        self.check_attach(container, child)?;

        let p = container.idx;
        let c = child.idx;
        let siblings = &mut self.children[p as usize];
        let at = index.min(siblings.len());
        siblings.insert(at, c);
        self.parent[c as usize] = p;

        // Child depends on parent for TRANSFORM; parent depends on child for
        // CANVAS and TOPOLOGY.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);
        let _ = self.dirty.add_dependency(p, c, dirty::CANVAS);
        let _ = self.dirty.add_dependency(p, c, dirty::TOPOLOGY);

        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.mark_structure(p);
        Ok(())
    }

    /// Detaches `child` from `container`.
    ///
    /// The child and its subtree stay alive and can be attached elsewhere.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAChild`] if `child` is not a direct child of
    /// `container`, [`SceneError::FixedGrid`] if `container` is a grid.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove(&mut self, container: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.validate(container);
        self.validate(child);
        if self.parent[child.idx as usize] != container.idx {
            return Err(SceneError::NotAChild { container, child });
        }
        if self.kind[container.idx as usize].caps().fixed_grid {
            return Err(SceneError::FixedGrid { grid: container });
        }
        self.unlink(child.idx);
        Ok(())
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.handle(p))
        }
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, &self.children[id.idx as usize])
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local state of a node.
    #[must_use]
    pub fn local(&self, id: NodeId) -> TransformState {
        self.validate(id);
        self.local[id.idx as usize]
    }

    /// Returns the flags of a node.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the variant data of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Replaces the whole local state of a node.
    pub fn set_state(&mut self, id: NodeId, state: TransformState) {
        let z = self.local(id).z;
        if self.update_local(id, |s| *s = state) && z.to_bits() != state.z.to_bits() {
            self.dirty.mark_with(id.idx, dirty::TOPOLOGY, &EagerPolicy);
        }
    }

    /// Sets the local position.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) {
        let _ = self.update_local(id, |s| s.position = position);
    }

    /// Offsets the local position.
    pub fn move_by(&mut self, id: NodeId, delta: Vec2) {
        let _ = self.update_local(id, |s| s.position += delta);
    }

    /// Sets the local scale.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        let _ = self.update_local(id, |s| s.scale = scale);
    }

    /// Sets the local rotation, in degrees.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        let _ = self.update_local(id, |s| s.rotation = degrees);
    }

    /// Sets the local tint, alpha included.
    pub fn set_color(&mut self, id: NodeId, color: Color) {
        let _ = self.update_local(id, |s| s.color = color);
    }

    /// Sets the alpha of the local tint.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        let _ = self.update_local(id, |s| s.color.a = opacity);
    }

    /// Sets the local blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, blend: BlendMode) {
        let _ = self.update_local(id, |s| s.blend = blend);
    }

    /// Sets the local depth used for z-ordering.
    ///
    /// Render lists above the node are rebuilt on their next draw.
    pub fn set_zindex(&mut self, id: NodeId, z: f32) {
        if self.update_local(id, |s| s.z = z) {
            self.dirty.mark_with(id.idx, dirty::TOPOLOGY, &EagerPolicy);
        }
    }

    /// Shows or hides a node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        let flags = &mut self.flags[id.idx as usize];
        if flags.visible == visible {
            return;
        }
        flags.visible = visible;
        self.mark_structure(id.idx);
    }

    /// Makes a node (and its descendants) ignore the camera offset.
    pub fn set_static(&mut self, id: NodeId, is_static: bool) {
        self.validate(id);
        let flags = &mut self.flags[id.idx as usize];
        if flags.is_static == is_static {
            return;
        }
        flags.is_static = is_static;
        self.touch(id.idx);
    }

    /// Keeps a container intact when an ancestor flattens nested groups.
    pub fn set_atomic(&mut self, id: NodeId, atomic: bool) {
        self.validate(id);
        let flags = &mut self.flags[id.idx as usize];
        if flags.atomic == atomic {
            return;
        }
        flags.atomic = atomic;
        self.dirty.mark_with(id.idx, dirty::TOPOLOGY, &EagerPolicy);
    }

    /// Sets the normalized placement and rotation origin of a leaf.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAnEntity`] if the node is not a sprite or shape.
    pub fn set_anchor(&mut self, id: NodeId, anchor: Point) -> Result<(), SceneError> {
        self.update_entity(id, |e| e.anchor = anchor)
    }

    /// Sets the unscaled size of a leaf.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAnEntity`] if the node is not a sprite or shape.
    pub fn set_size(&mut self, id: NodeId, size: Size) -> Result<(), SceneError> {
        self.update_entity(id, |e| e.size = size)
    }

    /// Sets the texture region a sprite samples, or `None` for the whole
    /// texture. The sprite keeps its size.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotASprite`] if the node is not a sprite.
    pub fn set_source(&mut self, id: NodeId, src: Option<Rect>) -> Result<(), SceneError> {
        self.validate(id);
        let Some(sprite) = self.kind[id.idx as usize].sprite_mut() else {
            return Err(SceneError::NotASprite { node: id });
        };
        if sprite.src != src {
            sprite.src = src;
            self.dirty.mark_with(id.idx, dirty::CANVAS, &EagerPolicy);
        }
        Ok(())
    }

    /// Sets the clear color of a canvas, or `None` to keep previous content.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAContainer`] if the node is not a canvas.
    pub fn set_canvas_clear(&mut self, id: NodeId, clear: Option<Color>) -> Result<(), SceneError> {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            NodeKind::Canvas(c) => c.clear = clear,
            _ => return Err(SceneError::NotAContainer { node: id }),
        }
        self.dirty.mark_with(id.idx, dirty::CANVAS, &EagerPolicy);
        Ok(())
    }

    /// Chooses whether a canvas blits its texture after building it.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAContainer`] if the node is not a canvas.
    pub fn set_canvas_composite(&mut self, id: NodeId, composite: bool) -> Result<(), SceneError> {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            NodeKind::Canvas(c) => c.composite = composite,
            _ => return Err(SceneError::NotAContainer { node: id }),
        }
        self.dirty.mark_with(id.idx, dirty::CANVAS, &EagerPolicy);
        Ok(())
    }

    /// Changes the ordering policy of a z-sortable container.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAContainer`] if the node has no render list.
    pub fn set_zorder(&mut self, id: NodeId, order: ZOrder) -> Result<(), SceneError> {
        self.validate(id);
        let Some(layering) = self.kind[id.idx as usize].layering_mut() else {
            return Err(SceneError::NotAContainer { node: id });
        };
        layering.order = order;
        self.dirty.mark_with(id.idx, dirty::TOPOLOGY, &EagerPolicy);
        Ok(())
    }

    // -- Resource lifetime --

    /// Returns the textures queued for release.
    #[must_use]
    pub fn pending_releases(&self) -> &[TextureHandle] {
        &self.released
    }

    /// Hands every queued texture back to the resource manager and returns
    /// how many were released.
    pub fn release_textures<M: ResourceManager + ?Sized>(&mut self, resources: &mut M) -> usize {
        let count = self.released.len();
        for texture in self.released.drain(..) {
            resources.release(texture);
        }
        count
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live raw slot.
    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Allocates a detached node.
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.local[i] = TransformState::default();
            self.flags[i] = NodeFlags::default();
            self.kind[i] = kind;
            self.resolved[i] = TransformState::default();
            self.resolved_static[i] = false;
            self.target_rect[i] = Rect::ZERO;
            self.stale[i] = true;
            self.stamp[i] = 0;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.local.push(TransformState::default());
            self.flags.push(NodeFlags::default());
            self.kind.push(kind);
            self.resolved.push(TransformState::default());
            self.resolved_static.push(false);
            self.target_rect.push(Rect::ZERO);
            self.stale.push(true);
            self.stamp.push(0);
            self.generation.push(0);
            idx
        };
        self.handle(idx)
    }

    /// Checks every precondition of attaching `child` under `container`.
    fn check_attach(&self, container: NodeId, child: NodeId) -> Result<(), SceneError> {
        let p = container.idx;
        let c = child.idx;
        let caps = self.kind[p as usize].caps();
        if !caps.container {
            return Err(SceneError::NotAContainer { node: container });
        }
        if caps.fixed_grid {
            return Err(SceneError::FixedGrid { grid: container });
        }
        if c == self.root {
            return Err(SceneError::RootIsFixed);
        }
        if self.parent[c as usize] != INVALID {
            return Err(SceneError::AlreadyParented { child });
        }
        let mut cur = p;
        while cur != INVALID {
            if cur == c {
                return Err(SceneError::WouldCycle { container, child });
            }
            cur = self.parent[cur as usize];
        }
        let role = self.kind[c as usize].sprite().map(Sprite::role);
        match self.kind[p as usize] {
            NodeKind::Lighting(_) if role != Some(SpriteRole::Light) => {
                Err(SceneError::NotALight {
                    lighting: container,
                    child,
                })
            }
            NodeKind::Shadow(_) if role != Some(SpriteRole::ShadowCaster) => {
                Err(SceneError::NotAShadowCaster {
                    shadow: container,
                    child,
                })
            }
            _ => Ok(()),
        }
    }

    /// Removes `idx` from its parent's child list and drops its edges.
    pub(crate) fn unlink(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let siblings = &mut self.children[p as usize];
        if let Some(pos) = siblings.iter().position(|&c| c == idx) {
            siblings.remove(pos);
        }
        self.parent[idx as usize] = INVALID;

        self.dirty.remove_dependency(idx, p, dirty::TRANSFORM);
        self.dirty.remove_dependency(p, idx, dirty::CANVAS);
        self.dirty.remove_dependency(p, idx, dirty::TOPOLOGY);

        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.mark_structure(p);
    }

    /// Frees `idx` and every descendant, queueing their textures.
    pub(crate) fn free_subtree(&mut self, idx: u32) {
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            let slot = i as usize;
            stack.append(&mut self.children[slot]);
            let kind = mem::replace(&mut self.kind[slot], NodeKind::Group(Layering::default()));
            kind.collect_textures(&mut self.released);
            self.dirty.remove_key(i);
            self.parent[slot] = INVALID;
            // Bump generation so old handles immediately fail validation.
            self.generation[slot] += 1;
            self.free_list.push(i);
        }
    }

    /// Applies `f` to the local state and invalidates if it changed.
    ///
    /// Returns whether the state changed.
    fn update_local(&mut self, id: NodeId, f: impl FnOnce(&mut TransformState)) -> bool {
        self.validate(id);
        let slot = &mut self.local[id.idx as usize];
        let mut next = *slot;
        f(&mut next);
        if next == *slot {
            return false;
        }
        *slot = next;
        self.touch(id.idx);
        true
    }

    fn update_entity(&mut self, id: NodeId, f: impl FnOnce(&mut Entity)) -> Result<(), SceneError> {
        self.validate(id);
        let Some(entity) = self.kind[id.idx as usize].entity_mut() else {
            return Err(SceneError::NotAnEntity { node: id });
        };
        f(entity);
        self.touch(id.idx);
        Ok(())
    }

    /// Invalidates the resolved state of `idx`'s subtree and the canvases
    /// above it.
    pub(crate) fn touch(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::TRANSFORM, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::CANVAS, &EagerPolicy);
    }

    /// Invalidates the render lists and canvases above `idx`.
    pub(crate) fn mark_structure(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::CANVAS, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::TOPOLOGY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::scene::TextureId;

    fn texture(id: u32) -> TextureHandle {
        TextureHandle {
            id: TextureId(id),
            width: 16,
            height: 8,
        }
    }

    #[test]
    fn create_and_destroy() {
        let mut scene = Scene::new();
        let id = scene.create_group();
        assert!(scene.is_alive(id));
        scene.destroy(id).unwrap();
        assert!(!scene.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut scene = Scene::new();
        let id1 = scene.create_group();
        scene.destroy(id1).unwrap();
        let id2 = scene.create_group();
        // id2 reuses the same slot but has a different generation.
        assert!(!scene.is_alive(id1));
        assert!(scene.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_and_query_children() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.create_group();
        let b = scene.create_group();
        scene.add(root, a).unwrap();
        scene.add(root, b).unwrap();

        assert_eq!(scene.parent(a), Some(root));
        let kids: Vec<_> = scene.children(root).collect();
        assert_eq!(kids, vec![a, b]);
        assert!(scene.is_attached(b));
    }

    #[test]
    fn insert_places_child_at_index() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.create_group();
        let b = scene.create_group();
        let c = scene.create_group();
        scene.add(root, a).unwrap();
        scene.add(root, c).unwrap();
        scene.insert(root, 1, b).unwrap();

        let kids: Vec<_> = scene.children(root).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn remove_detaches_but_keeps_alive() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.create_group();
        scene.add(root, a).unwrap();
        scene.remove(root, a).unwrap();

        assert!(scene.is_alive(a));
        assert_eq!(scene.parent(a), None);
        assert!(!scene.is_attached(a));
        assert_eq!(scene.children(root).len(), 0);
    }

    #[test]
    fn double_parenting_is_rejected() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.create_group();
        let b = scene.create_group();
        scene.add(root, a).unwrap();
        scene.add(root, b).unwrap();

        assert_eq!(
            scene.add(b, a),
            Err(SceneError::AlreadyParented { child: a })
        );
        // The failed call left the tree untouched.
        assert_eq!(scene.parent(a), Some(root));
        assert_eq!(scene.children(b).len(), 0);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut scene = Scene::new();
        let a = scene.create_group();
        let b = scene.create_group();
        scene.add(a, b).unwrap();
        assert_eq!(
            scene.add(b, a),
            Err(SceneError::WouldCycle {
                container: b,
                child: a
            })
        );
        assert_eq!(
            scene.add(a, a),
            Err(SceneError::WouldCycle {
                container: a,
                child: a
            })
        );
    }

    #[test]
    fn leaves_cannot_hold_children() {
        let mut scene = Scene::new();
        let leaf = scene.create_shape(Size::new(4.0, 4.0), true);
        let other = scene.create_group();
        assert_eq!(
            scene.add(leaf, other),
            Err(SceneError::NotAContainer { node: leaf })
        );
    }

    #[test]
    fn remove_requires_direct_child() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.create_group();
        let b = scene.create_group();
        scene.add(root, a).unwrap();
        scene.add(a, b).unwrap();
        assert_eq!(
            scene.remove(root, b),
            Err(SceneError::NotAChild {
                container: root,
                child: b
            })
        );
    }

    #[test]
    fn root_is_fixed() {
        let mut scene = Scene::new();
        let root = scene.root();
        let g = scene.create_group();
        assert_eq!(scene.destroy(root), Err(SceneError::RootIsFixed));
        assert_eq!(scene.add(g, root), Err(SceneError::RootIsFixed));
    }

    #[test]
    fn destroy_frees_subtree_and_queues_textures() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.create_group();
        let sprite = scene.create_sprite(texture(7));
        scene.add(root, group).unwrap();
        scene.add(group, sprite).unwrap();
        let before = scene.node_count();

        scene.destroy(group).unwrap();

        assert!(!scene.is_alive(group));
        assert!(!scene.is_alive(sprite));
        assert_eq!(scene.node_count(), before - 2);
        assert_eq!(scene.pending_releases(), &[texture(7)]);
        assert_eq!(scene.children(root).len(), 0);
    }

    #[test]
    fn sprite_takes_texture_size() {
        let mut scene = Scene::new();
        let s = scene.create_sprite(texture(1));
        let entity = scene.kind(s).entity().copied().unwrap();
        assert_eq!(entity.size, Size::new(16.0, 8.0));
        assert_eq!(entity.anchor, Point::ZERO);

        let r = scene.create_sprite_region(texture(1), Rect::new(0.0, 0.0, 4.0, 4.0));
        let entity = scene.kind(r).entity().copied().unwrap();
        assert_eq!(entity.size, Size::new(4.0, 4.0));
    }

    #[test]
    fn set_source_changes_region_only() {
        let mut scene = Scene::new();
        let s = scene.create_sprite(texture(1));
        let region = Rect::new(8.0, 0.0, 16.0, 8.0);
        scene.set_source(s, Some(region)).unwrap();
        let sprite = scene.kind(s).sprite().unwrap();
        assert_eq!(sprite.src(), Some(region));
        assert_eq!(sprite.entity.size, Size::new(16.0, 8.0));

        let g = scene.create_group();
        assert_eq!(
            scene.set_source(g, None),
            Err(SceneError::NotASprite { node: g })
        );
    }

    #[test]
    fn set_anchor_rejects_containers() {
        let mut scene = Scene::new();
        let g = scene.create_group();
        assert_eq!(
            scene.set_anchor(g, Point::new(0.5, 0.5)),
            Err(SceneError::NotAnEntity { node: g })
        );
    }

    #[test]
    fn setters_update_local_state() {
        let mut scene = Scene::new();
        let id = scene.create_group();
        scene.set_position(id, Vec2::new(3.0, 4.0));
        scene.move_by(id, Vec2::new(1.0, 1.0));
        scene.set_scale(id, Vec2::new(2.0, 2.0));
        scene.set_rotation(id, 90.0);
        scene.set_opacity(id, 0.5);
        scene.set_blend_mode(id, BlendMode::Additive);
        scene.set_zindex(id, 3.0);

        let local = scene.local(id);
        assert_eq!(local.position, Vec2::new(4.0, 5.0));
        assert_eq!(local.scale, Vec2::new(2.0, 2.0));
        assert_eq!(local.rotation, 90.0);
        assert_eq!(local.color.a, 0.5);
        assert_eq!(local.blend, BlendMode::Additive);
        assert_eq!(local.z, 3.0);
    }

    #[test]
    fn release_textures_drains_queue() {
        struct Counting(Vec<TextureHandle>);
        impl ResourceManager for Counting {
            type Error = ();
            fn get_texture(&mut self, _: &str) -> Result<TextureHandle, ()> {
                Err(())
            }
            fn create_blank_texture(&mut self, _: &str, _: u32, _: u32) -> Result<TextureHandle, ()> {
                Err(())
            }
            fn release(&mut self, texture: TextureHandle) {
                self.0.push(texture);
            }
        }

        let mut scene = Scene::new();
        let s = scene.create_sprite(texture(3));
        scene.destroy(s).unwrap();
        let mut resources = Counting(Vec::new());
        assert_eq!(scene.release_textures(&mut resources), 1);
        assert_eq!(resources.0, vec![texture(3)]);
        assert!(scene.pending_releases().is_empty());
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_set_position() {
        let mut scene = Scene::new();
        let id = scene.create_group();
        scene.destroy(id).unwrap();
        scene.set_position(id, Vec2::ZERO);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_add() {
        let mut scene = Scene::new();
        let root = scene.root();
        let id = scene.create_group();
        scene.destroy(id).unwrap();
        let _ = scene.add(root, id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_parent() {
        let mut scene = Scene::new();
        let id = scene.create_group();
        scene.destroy(id).unwrap();
        let _ = scene.parent(id);
    }
}

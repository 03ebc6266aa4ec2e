// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-list construction for z-sortable containers.
//!
//! Every z-sortable container (groups, canvases, lighting and shadow layers)
//! caches a *render list*: the visible children it will draw, in draw order.
//! Building a list:
//!
//! 1. Gather children that are currently visible (see
//!    [`Scene::is_really_visible`]).
//! 2. With [`break_groups`](ZOrder::break_groups), replace every non-atomic
//!    plain group by its own gathered children, and every non-atomic grid by
//!    the cells in its visible window, recursively, so nested content joins
//!    one global ordering. Canvas-backed containers and nodes flagged
//!    [`atomic`](crate::scene::NodeFlags::atomic) stay single entries.
//! 3. With [`sorted`](ZOrder::sorted), stable-sort by depth: the resolved
//!    (ancestor-inclusive) depth when breaking groups, the local depth
//!    otherwise.
//!
//! With the default [`refresh_interval`](ZOrder::refresh_interval) of `1` a
//! list is rebuilt on every render pass. Larger intervals reuse the list for
//! that many frames, so moves and camera changes show up late; structural,
//! visibility-flag, and depth changes beneath the container still rebuild it
//! immediately, as does a lighting or shadow layer rebuilding its canvas.

use alloc::vec::Vec;

use kurbo::Size;

use crate::camera::CameraView;
use crate::error::SceneError;
use crate::scene::{NodeId, NodeKind, Scene};

/// Ordering policy of a z-sortable container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZOrder {
    /// Sort entries by depth. Unsorted lists keep insertion order.
    pub sorted: bool,
    /// Flatten nested non-atomic groups and grids into this list.
    pub break_groups: bool,
    /// Frames between list rebuilds; `1` (or `0`) rebuilds on every render
    /// pass.
    pub refresh_interval: u32,
}

impl ZOrder {
    /// Insertion order, rebuilt every frame.
    pub const INSERTION: Self = Self {
        sorted: false,
        break_groups: false,
        refresh_interval: 1,
    };

    /// Sorted by local depth, rebuilt every frame.
    pub const SORTED: Self = Self {
        sorted: true,
        break_groups: false,
        refresh_interval: 1,
    };

    /// Sorted by resolved depth across nested groups, rebuilt every frame.
    pub const FLATTENED: Self = Self {
        sorted: true,
        break_groups: true,
        refresh_interval: 1,
    };

    /// Returns this policy with a different refresh interval.
    #[must_use]
    pub const fn with_refresh_interval(self, frames: u32) -> Self {
        Self {
            refresh_interval: frames,
            ..self
        }
    }
}

impl Default for ZOrder {
    fn default() -> Self {
        Self::INSERTION
    }
}

/// Ordering policy plus the cached render list of one container.
#[derive(Clone, Debug, Default)]
pub struct Layering {
    pub(crate) order: ZOrder,
    pub(crate) entries: Vec<u32>,
    pub(crate) built_at: Option<u64>,
    pub(crate) invalid: bool,
}

impl Layering {
    /// Creates an empty, never-built list with the given policy.
    #[must_use]
    pub fn new(order: ZOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Returns the ordering policy.
    #[must_use]
    pub fn order(&self) -> ZOrder {
        self.order
    }

    /// Returns the frame the list was last built in.
    #[must_use]
    pub fn built_at(&self) -> Option<u64> {
        self.built_at
    }

    pub(crate) fn invalidate(&mut self) {
        self.invalid = true;
    }

    pub(crate) fn needs_rebuild(&self, frame: u64) -> bool {
        if self.invalid || self.order.refresh_interval <= 1 {
            return true;
        }
        let interval = u64::from(self.order.refresh_interval);
        match self.built_at {
            None => true,
            Some(built) => frame < built || frame - built >= interval,
        }
    }
}

impl Scene {
    /// Builds the render list of a z-sortable container without caching it.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAContainer`] if the node has no render list.
    pub fn render_order(
        &mut self,
        container: NodeId,
        camera: &dyn CameraView,
        viewport: Size,
    ) -> Result<Vec<NodeId>, SceneError> {
        self.validate(container);
        if self.kind[container.idx as usize].layering().is_none() {
            return Err(SceneError::NotAContainer { node: container });
        }
        self.sync_dirty();
        let mut entries = Vec::new();
        self.collect_render_list(container.idx, camera, viewport, &mut entries);
        Ok(entries.into_iter().map(|idx| self.handle(idx)).collect())
    }

    /// Gathers, flattens, and sorts the render list of `idx` into `out`.
    pub(crate) fn collect_render_list(
        &mut self,
        idx: u32,
        camera: &dyn CameraView,
        viewport: Size,
        out: &mut Vec<u32>,
    ) {
        let Some(order) = self.kind[idx as usize].layering().map(Layering::order) else {
            return;
        };
        self.gather(idx, order.break_groups, camera, viewport, out);
        if !order.sorted {
            return;
        }
        let mut keyed: Vec<(f32, u32)> = Vec::with_capacity(out.len());
        for &c in out.iter() {
            let z = if order.break_groups {
                self.resolve_idx(c).z
            } else {
                self.local[c as usize].z
            };
            keyed.push((z, c));
        }
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        out.clear();
        out.extend(keyed.into_iter().map(|(_, c)| c));
    }

    fn gather(
        &mut self,
        idx: u32,
        flatten: bool,
        camera: &dyn CameraView,
        viewport: Size,
        out: &mut Vec<u32>,
    ) {
        for k in 0..self.children[idx as usize].len() {
            let c = self.children[idx as usize][k];
            self.gather_one(c, flatten, camera, viewport, out);
        }
    }

    fn gather_one(
        &mut self,
        c: u32,
        flatten: bool,
        camera: &dyn CameraView,
        viewport: Size,
        out: &mut Vec<u32>,
    ) {
        if !self.visible_idx(c, camera, viewport) {
            return;
        }
        if !(flatten && self.flattens(c)) {
            out.push(c);
            return;
        }
        if self.kind[c as usize].grid().is_some() {
            // Only the windowed cells join the list.
            for cell in self.visible_cells(c, camera, viewport) {
                self.gather_one(cell, true, camera, viewport, out);
            }
        } else {
            self.gather(c, true, camera, viewport, out);
        }
    }

    /// Plain groups and grids are opened up unless flagged atomic.
    fn flattens(&self, idx: u32) -> bool {
        matches!(self.kind[idx as usize], NodeKind::Group(_) | NodeKind::Grid(_))
            && !self.flags[idx as usize].atomic
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Size, Vec2};

    use super::*;
    use crate::camera::Camera;
    use crate::grid::GridSpec;

    const VIEWPORT: Size = Size::new(100.0, 100.0);

    fn leaf(scene: &mut Scene, parent: NodeId, z: f32) -> NodeId {
        let id = scene.create_shape(Size::new(10.0, 10.0), true);
        scene.add(parent, id).unwrap();
        scene.set_zindex(id, z);
        id
    }

    #[test]
    fn sorts_siblings_by_local_depth() {
        let mut scene = Scene::new();
        let group = scene.create_zgroup(ZOrder::SORTED);
        let root = scene.root();
        scene.add(root, group).unwrap();
        let a = leaf(&mut scene, group, 3.0);
        let b = leaf(&mut scene, group, 1.0);
        let c = leaf(&mut scene, group, 2.0);

        let order = scene.render_order(group, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn unsorted_keeps_insertion_order() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = leaf(&mut scene, root, 3.0);
        let b = leaf(&mut scene, root, 1.0);
        let order = scene.render_order(root, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn break_groups_interleaves_by_resolved_depth() {
        let mut scene = Scene::new();
        let top = scene.create_zgroup(ZOrder::FLATTENED);
        let root = scene.root();
        scene.add(root, top).unwrap();
        let flat = leaf(&mut scene, top, 5.0);
        let nested = scene.create_group();
        scene.add(top, nested).unwrap();
        scene.set_zindex(nested, 1.0);
        let low = leaf(&mut scene, nested, 0.0);
        let high = leaf(&mut scene, nested, 10.0);

        let order = scene.render_order(top, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![low, flat, high]);
    }

    #[test]
    fn atomic_groups_stay_intact() {
        let mut scene = Scene::new();
        let top = scene.create_zgroup(ZOrder::FLATTENED);
        let root = scene.root();
        scene.add(root, top).unwrap();
        let flat = leaf(&mut scene, top, 5.0);
        let nested = scene.create_group();
        scene.add(top, nested).unwrap();
        scene.set_atomic(nested, true);
        let _inner = leaf(&mut scene, nested, 10.0);

        let order = scene.render_order(top, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![nested, flat]);
    }

    #[test]
    fn break_groups_interleaves_grid_cells() {
        let mut scene = Scene::new();
        let top = scene.create_zgroup(ZOrder::FLATTENED);
        let root = scene.root();
        scene.add(root, top).unwrap();
        let grid = scene
            .create_grid(GridSpec::uniform(2, 1, 10.0), |s, _, _| {
                s.create_shape(Size::new(10.0, 10.0), true)
            })
            .unwrap();
        scene.add(top, grid).unwrap();
        let near = scene.cell(grid, 0, 0).unwrap();
        let far = scene.cell(grid, 1, 0).unwrap();
        scene.set_zindex(far, 10.0);
        let actor = leaf(&mut scene, top, 5.0);

        let order = scene.render_order(top, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![near, actor, far]);

        // An atomic grid sorts as one entry at its own depth.
        scene.set_atomic(grid, true);
        let order = scene.render_order(top, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![grid, actor]);
    }

    #[test]
    fn flattened_grid_contributes_only_its_window() {
        let mut scene = Scene::new();
        let top = scene.create_zgroup(ZOrder::FLATTENED);
        let root = scene.root();
        scene.add(root, top).unwrap();
        let grid = scene
            .create_grid(GridSpec::uniform(50, 50, 10.0), |s, _, _| {
                s.create_shape(Size::new(10.0, 10.0), true)
            })
            .unwrap();
        scene.add(top, grid).unwrap();

        let order = scene.render_order(top, &Camera::default(), VIEWPORT).unwrap();
        // The 12x12 window holds the 10x10 on-screen cells.
        assert_eq!(order.len(), 100);
    }

    #[test]
    fn invisible_children_are_skipped() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = leaf(&mut scene, root, 0.0);
        let b = leaf(&mut scene, root, 0.0);
        scene.set_position(b, Vec2::new(1000.0, 0.0));
        let order = scene.render_order(root, &Camera::default(), VIEWPORT).unwrap();
        assert_eq!(order, vec![a]);
    }

    #[test]
    fn refresh_interval_bounds_staleness() {
        let mut layering = Layering::new(ZOrder::SORTED.with_refresh_interval(3));
        assert!(layering.needs_rebuild(0));
        layering.built_at = Some(10);
        assert!(!layering.needs_rebuild(10));
        assert!(!layering.needs_rebuild(12));
        assert!(layering.needs_rebuild(13));
        layering.invalidate();
        assert!(layering.needs_rebuild(10));
    }

    #[test]
    fn default_interval_rebuilds_every_pass() {
        let mut layering = Layering::new(ZOrder::SORTED);
        layering.built_at = Some(4);
        assert!(layering.needs_rebuild(4));
    }
}

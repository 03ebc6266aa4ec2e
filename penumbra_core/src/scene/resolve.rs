// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy resolution of world-space state.
//!
//! Resolution follows a push-invalidate, pull-recompute pattern:
//!
//! 1. **Push**: Setters mark dirty channels eagerly (see
//!    [`dirty`](crate::dirty)). [`sync_dirty`](Scene::sync_dirty) drains the
//!    channels and folds them into per-node `stale` flags, compositor states,
//!    and render-list validity.
//! 2. **Pull**: Reading a node's resolved state recomputes it only if it is
//!    stale, first resolving the parent chain on demand. A node therefore
//!    never composes against a stale ancestor, whatever order reads happen
//!    in.
//!
//! Leaf grid cells carry no TRANSFORM edge to their grid. A cell is re-resolved
//! when the grid itself is stale, or when the grid's `last_updated` stamp is
//! newer than the stamp the cell recorded at its last resolve.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::dirty;
use crate::state::TransformState;

use super::id::{INVALID, NodeId};
use super::store::Scene;

impl Scene {
    /// Returns the resolved (ancestor-inclusive) state of a node.
    ///
    /// Always consistent with the current local values of the node and all of
    /// its ancestors, regardless of when it is called.
    pub fn resolved(&mut self, id: NodeId) -> TransformState {
        self.validate(id);
        self.sync_dirty();
        self.resolve_idx(id.idx)
    }

    /// Returns the pixel-space rectangle of a leaf, before the camera offset.
    ///
    /// Containers report an empty rectangle.
    pub fn target_rect(&mut self, id: NodeId) -> Rect {
        self.validate(id);
        self.sync_dirty();
        self.resolve_idx(id.idx);
        self.target_rect[id.idx as usize]
    }

    /// Returns whether the cached resolved state of a node is out of date.
    pub fn needs_resolve(&mut self, id: NodeId) -> bool {
        self.validate(id);
        self.sync_dirty();
        self.is_stale(id.idx)
    }

    /// Resolves every node reachable from the root, parents before children.
    pub fn resolve_all(&mut self) {
        self.sync_dirty();
        let mut stack = alloc::vec![self.root];
        while let Some(idx) = stack.pop() {
            self.resolve_idx(idx);
            stack.extend(self.children[idx as usize].iter().rev().copied());
        }
    }

    /// Drains the dirty channels into stale flags, compositor states, and
    /// render-list validity.
    pub(crate) fn sync_dirty(&mut self) {
        let transforms: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &transforms {
            self.stale[idx as usize] = true;
            if let Some(c) = self.kind[idx as usize].compositor_mut() {
                c.invalidate();
            }
        }

        let canvases: Vec<u32> = self
            .dirty
            .drain(dirty::CANVAS)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &canvases {
            if let Some(c) = self.kind[idx as usize].compositor_mut() {
                c.invalidate();
            }
        }

        let structure: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &structure {
            if let Some(l) = self.kind[idx as usize].layering_mut() {
                l.invalidate();
            }
        }
    }

    /// Whether `idx` must be recomputed before its cache can be read.
    pub(crate) fn is_stale(&self, idx: u32) -> bool {
        let i = idx as usize;
        if self.stale[i] {
            return true;
        }
        let p = self.parent[i];
        if p == INVALID {
            return false;
        }
        match self.kind[p as usize].grid() {
            Some(grid) => self.stale[p as usize] || grid.last_updated > self.stamp[i],
            None => false,
        }
    }

    /// Returns the resolved state of `idx`, recomputing it (and any stale
    /// ancestor) first.
    ///
    /// Callers must have run [`sync_dirty`](Self::sync_dirty) since the last
    /// mutation.
    pub(crate) fn resolve_idx(&mut self, idx: u32) -> TransformState {
        let i = idx as usize;
        if !self.is_stale(idx) {
            return self.resolved[i];
        }

        let p = self.parent[i];
        let (state, inherited_static) = if p == INVALID {
            (self.local[i], false)
        } else {
            let parent_state = self.resolve_idx(p);
            (
                self.local[i].compose(&parent_state),
                self.resolved_static[p as usize],
            )
        };

        self.resolved[i] = state;
        self.resolved_static[i] = inherited_static || self.flags[i].is_static;
        if let Some(entity) = self.kind[i].entity() {
            self.target_rect[i] = entity.target_rect(state.position, state.scale);
        }
        self.stale[i] = false;

        if let Some(grid) = self.kind[i].grid_mut() {
            self.next_stamp += 1;
            grid.last_updated = self.next_stamp;
        }
        if p != INVALID
            && let Some(grid) = self.kind[p as usize].grid()
        {
            self.stamp[i] = grid.last_updated;
        }
        state
    }
}

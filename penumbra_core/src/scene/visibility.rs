// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility queries against a camera and viewport.

use kurbo::{Rect, Size};

use crate::camera::CameraView;

use super::id::NodeId;
use super::kind::NodeKind;
use super::store::Scene;

impl Scene {
    /// Returns whether any part of the node would be drawn.
    ///
    /// A node is invisible if its visible flag is off or its resolved alpha is
    /// zero. A leaf is then tested against `viewport` after subtracting the
    /// camera offset (static nodes ignore the camera). A container is visible
    /// if any child is; a grid only consults the cells in its visible window.
    /// Canvas-backed containers always report visible since they composite a
    /// full target.
    pub fn is_really_visible(
        &mut self,
        id: NodeId,
        camera: &dyn CameraView,
        viewport: Size,
    ) -> bool {
        self.validate(id);
        self.sync_dirty();
        self.visible_idx(id.idx, camera, viewport)
    }

    /// Camera-adjusted pixel rectangle of a resolved leaf.
    pub(crate) fn screen_rect(&self, idx: u32, camera: &dyn CameraView) -> Rect {
        let i = idx as usize;
        let rect = self.target_rect[i];
        if self.resolved_static[i] {
            rect
        } else {
            camera.apply(rect)
        }
    }

    pub(crate) fn visible_idx(&mut self, idx: u32, camera: &dyn CameraView, viewport: Size) -> bool {
        let i = idx as usize;
        if !self.flags[i].visible {
            return false;
        }
        let state = self.resolve_idx(idx);
        if camera.should_cull_pre_transform(&state) {
            return false;
        }
        match self.kind[i] {
            NodeKind::Sprite(_) | NodeKind::Shape(_) => {
                let rect = self.screen_rect(idx, camera);
                !camera.should_cull_post_transform(rect, state.rotation, viewport)
            }
            NodeKind::Canvas(_) | NodeKind::Lighting(_) | NodeKind::Shadow(_) => true,
            NodeKind::Grid(_) => {
                let cells = self.visible_cells(idx, camera, viewport);
                cells
                    .into_iter()
                    .any(|c| self.visible_idx(c, camera, viewport))
            }
            NodeKind::Group(_) => {
                for k in 0..self.children[i].len() {
                    let c = self.children[i][k];
                    if self.visible_idx(c, camera, viewport) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

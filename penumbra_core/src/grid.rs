// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size tiled grids with windowed traversal.
//!
//! A grid is built once from a [`GridSpec`] and a cell factory; its cells
//! cannot be added, removed, or destroyed individually afterwards. Cell `(col,
//! row)` is placed at `(col * distance.x, row * distance.y)` relative to the
//! grid.
//!
//! Rendering and visibility queries only visit the cells inside the window
//! returned by [`visible_range`] on each axis, so their cost depends on the
//! viewport, not on the grid size.
//!
//! Cells may be leaves (a tile map) or containers (a map of nodes). Leaf
//! cells are not wired into the TRANSFORM channel. Every time the grid
//! itself re-resolves it bumps a `last_updated` stamp; a leaf cell
//! re-resolves when that stamp is newer than the one it recorded, so moving
//! a tile map costs nothing until cells are actually read. Container cells
//! keep an ordinary TRANSFORM edge so the move reaches their descendants.
//!
//! Under a group-breaking ancestor a non-atomic grid contributes the cells
//! of its visible window to the ancestor's render list (see
//! [`zorder`](crate::zorder)).

use alloc::vec::Vec;
use core::ops::Range;

use kurbo::{Point, Size, Vec2};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::camera::CameraView;
use crate::dirty;
use crate::error::SceneError;
use crate::render::RenderCx;
use crate::scene::{INVALID, NodeId, NodeKind, Scene};

/// Dimensions and spacing of a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Number of columns.
    pub cols: u32,
    /// Number of rows.
    pub rows: u32,
    /// Unscaled size of one cell, used for the visible window.
    pub cell_size: Size,
    /// Offset between neighboring cells. Both components must be positive.
    pub distance: Vec2,
    /// Extra cells visited beyond the nominal window on every side.
    pub overscan: u32,
}

impl GridSpec {
    /// Square cells of side `cell`, packed edge to edge.
    #[must_use]
    pub fn uniform(cols: u32, rows: u32, cell: f64) -> Self {
        Self {
            cols,
            rows,
            cell_size: Size::new(cell, cell),
            distance: Vec2::new(cell, cell),
            overscan: 0,
        }
    }

    /// Returns this spec with a different overscan.
    #[must_use]
    pub fn with_overscan(self, overscan: u32) -> Self {
        Self { overscan, ..self }
    }
}

/// Grid payload of a [`NodeKind::Grid`] node.
#[derive(Clone, Debug)]
pub struct Grid {
    pub(crate) spec: GridSpec,
    /// Row-major cell slots.
    pub(crate) cells: Vec<u32>,
    pub(crate) last_updated: u64,
}

impl Grid {
    /// Returns the grid's dimensions and spacing.
    #[must_use]
    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    /// Stamp bumped every time the grid re-resolves.
    #[must_use]
    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }
}

/// Returns the indices of cells visible along one axis.
///
/// `offset` is the camera-adjusted position of cell 0, `cell` its (scaled)
/// extent, and `distance` the spacing between cells. The first index is the
/// first cell whose far edge lies past the viewport origin:
/// `floor((-offset - cell) / distance) + 1 - overscan` for negative offsets,
/// `0` otherwise. The window spans
/// `ceil((viewport + cell) / distance) + 1 + 2 * overscan` cells. Both ends
/// are clamped to `0..=len`.
#[must_use]
pub fn visible_range(
    offset: f64,
    cell: f64,
    distance: f64,
    viewport: f64,
    overscan: u32,
    len: u32,
) -> Range<u32> {
    let overscan = f64::from(overscan);
    let first = if offset >= 0.0 {
        0.0
    } else {
        ((-offset - cell) / distance).floor() + 1.0 - overscan
    };
    let count = ((viewport + cell) / distance).ceil() + 1.0 + 2.0 * overscan;
    let len = f64::from(len);
    let start = first.clamp(0.0, len);
    let end = (first + count).clamp(start, len);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "both ends are clamped to 0..=len, which fits in u32"
    )]
    let (start, end) = (start as u32, end as u32);
    start..end
}

impl Scene {
    /// Creates a detached grid, calling `make_cell(scene, col, row)` once per
    /// cell in row-major order.
    ///
    /// Each cell must be a fresh detached node. Leaves make a tile map;
    /// groups or other containers make a map of nodes whose contents are
    /// rendered and flattened like any other subtree. The grid positions each
    /// cell; any position the factory set is overwritten.
    ///
    /// # Errors
    ///
    /// [`SceneError::AlreadyParented`] if the factory returns a node that
    /// already has a parent (including a cell it returned before), and
    /// [`SceneError::RootIsFixed`] for the root. The grid and the cells built
    /// so far are destroyed; the offending node stays alive and detached.
    ///
    /// # Panics
    ///
    /// Panics if a distance component is not positive, or if the factory
    /// returns a stale handle.
    pub fn create_grid<F>(&mut self, spec: GridSpec, mut make_cell: F) -> Result<NodeId, SceneError>
    where
        F: FnMut(&mut Self, u32, u32) -> NodeId,
    {
        assert!(
            spec.distance.x > 0.0 && spec.distance.y > 0.0,
            "grid distance must be positive, got {:?}",
            spec.distance
        );
        let grid = self.alloc(NodeKind::Grid(Grid {
            spec,
            cells: Vec::new(),
            last_updated: 0,
        }));
        let g = grid.idx;

        for row in 0..spec.rows {
            for col in 0..spec.cols {
                let cell = make_cell(self, col, row);
                self.validate(cell);
                let c = cell.idx;
                let err = if c == self.root {
                    Some(SceneError::RootIsFixed)
                } else if self.parent[c as usize] != INVALID || c == g {
                    Some(SceneError::AlreadyParented { child: cell })
                } else {
                    None
                };
                if let Some(err) = err {
                    if self.parent[c as usize] == g {
                        // Freeing the grid drops its edges to the cell.
                        self.children[g as usize].retain(|&k| k != c);
                        self.parent[c as usize] = INVALID;
                        self.stale[c as usize] = true;
                    }
                    self.free_subtree(g);
                    return Err(err);
                }

                self.parent[c as usize] = g;
                self.children[g as usize].push(c);
                // Cells feed CANVAS and TOPOLOGY upward. Leaf cells take no
                // TRANSFORM edge from the grid; container cells need one to
                // reach their descendants.
                let _ = self.dirty.add_dependency(g, c, dirty::CANVAS);
                let _ = self.dirty.add_dependency(g, c, dirty::TOPOLOGY);
                if !self.kind[c as usize].is_entity() {
                    let _ = self.dirty.add_dependency(c, g, dirty::TRANSFORM);
                }
                self.local[c as usize].position = Vec2::new(
                    f64::from(col) * spec.distance.x,
                    f64::from(row) * spec.distance.y,
                );
                self.stale[c as usize] = true;
            }
        }

        let cells = self.children[g as usize].clone();
        if let Some(data) = self.kind[g as usize].grid_mut() {
            data.cells = cells;
        }
        Ok(grid)
    }

    /// Returns the cell at `(col, row)`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAGrid`] or [`SceneError::CellOutOfRange`].
    pub fn cell(&self, grid: NodeId, col: u32, row: u32) -> Result<NodeId, SceneError> {
        self.validate(grid);
        let Some(data) = self.kind[grid.idx as usize].grid() else {
            return Err(SceneError::NotAGrid { node: grid });
        };
        if col >= data.spec.cols || row >= data.spec.rows {
            return Err(SceneError::CellOutOfRange { grid, col, row });
        }
        Ok(self.handle(data.cells[(row * data.spec.cols + col) as usize]))
    }

    /// Returns the cell covering `point`, given relative to the grid's
    /// origin in the grid's resolved scale, or `None` outside the grid.
    ///
    /// The column is `floor(x / (distance.x * scale.x))`, likewise for rows.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAGrid`] if `grid` is not a grid.
    pub fn cell_at(&mut self, grid: NodeId, point: Point) -> Result<Option<NodeId>, SceneError> {
        self.validate(grid);
        if self.kind[grid.idx as usize].grid().is_none() {
            return Err(SceneError::NotAGrid { node: grid });
        }
        self.sync_dirty();
        let scale = self.resolve_idx(grid.idx).scale;
        let Some(data) = self.kind[grid.idx as usize].grid() else {
            return Err(SceneError::NotAGrid { node: grid });
        };
        let col = (point.x / (data.spec.distance.x * scale.x)).floor();
        let row = (point.y / (data.spec.distance.y * scale.y)).floor();
        if !(0.0..f64::from(data.spec.cols)).contains(&col)
            || !(0.0..f64::from(data.spec.rows)).contains(&row)
        {
            return Ok(None);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "both indices were checked against the grid size"
        )]
        let (col, row) = (col as u32, row as u32);
        Ok(Some(self.handle(data.cells[(row * data.spec.cols + col) as usize])))
    }

    /// Calls `f(scene, cell, col, row)` for every cell in row-major order.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAGrid`] if `grid` is not a grid.
    pub fn apply_to_all<F>(&mut self, grid: NodeId, mut f: F) -> Result<(), SceneError>
    where
        F: FnMut(&mut Self, NodeId, u32, u32),
    {
        self.validate(grid);
        let Some(data) = self.kind[grid.idx as usize].grid() else {
            return Err(SceneError::NotAGrid { node: grid });
        };
        let cols = data.spec.cols;
        let cells = data.cells.clone();
        for (i, c) in (0_u32..).zip(cells) {
            let id = self.handle(c);
            f(self, id, i % cols, i / cols);
        }
        Ok(())
    }

    /// Returns the visible column and row ranges of a grid.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAGrid`] if `grid` is not a grid.
    pub fn grid_window(
        &mut self,
        grid: NodeId,
        camera: &dyn CameraView,
        viewport: Size,
    ) -> Result<(Range<u32>, Range<u32>), SceneError> {
        self.validate(grid);
        if self.kind[grid.idx as usize].grid().is_none() {
            return Err(SceneError::NotAGrid { node: grid });
        }
        self.sync_dirty();
        Ok(self.window_idx(grid.idx, camera, viewport))
    }

    fn window_idx(
        &mut self,
        idx: u32,
        camera: &dyn CameraView,
        viewport: Size,
    ) -> (Range<u32>, Range<u32>) {
        let state = self.resolve_idx(idx);
        let Some(data) = self.kind[idx as usize].grid() else {
            return (0..0, 0..0);
        };
        let spec = data.spec;
        let mut origin = state.position;
        if !self.resolved_static[idx as usize] {
            origin -= camera.offset();
        }
        let cols = visible_range(
            origin.x,
            spec.cell_size.width * state.scale.x.abs(),
            spec.distance.x,
            viewport.width,
            spec.overscan,
            spec.cols,
        );
        let rows = visible_range(
            origin.y,
            spec.cell_size.height * state.scale.y.abs(),
            spec.distance.y,
            viewport.height,
            spec.overscan,
            spec.rows,
        );
        (cols, rows)
    }

    /// Row-major slots of the cells inside the visible window.
    pub(crate) fn visible_cells(
        &mut self,
        idx: u32,
        camera: &dyn CameraView,
        viewport: Size,
    ) -> Vec<u32> {
        let (cols, rows) = self.window_idx(idx, camera, viewport);
        let Some(data) = self.kind[idx as usize].grid() else {
            return Vec::new();
        };
        let stride = data.spec.cols;
        let mut out = Vec::with_capacity(cols.len() * rows.len());
        for row in rows {
            for col in cols.clone() {
                out.push(data.cells[(row * stride + col) as usize]);
            }
        }
        out
    }

    pub(crate) fn render_grid(&mut self, idx: u32, cx: &mut RenderCx<'_, '_, '_>) {
        if !self.flags[idx as usize].visible {
            return;
        }
        let state = self.resolve_idx(idx);
        if cx.camera.should_cull_pre_transform(&state) {
            return;
        }
        let viewport = cx.renderer.target_size();
        for c in self.visible_cells(idx, cx.camera, viewport) {
            self.render_node(c, cx);
        }
    }
}

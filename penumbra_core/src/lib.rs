// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene graph and compositing for real-time 2D rendering.
//!
//! `penumbra_core` provides a tree of positionable, scalable, colorable nodes
//! whose world-space state is resolved lazily and cached, together with the
//! machinery that turns that tree into draw calls each frame. It is `no_std`
//! compatible (with `alloc`) and stores nodes in slot arrays addressed by
//! generational handles.
//!
//! # Architecture
//!
//! ```text
//!   setters ──► dirty channels (eager push) ──► stale flags
//!                                                   │
//!   Context::run_frame()                            ▼
//!     ├─ Scene::render() ── resolve (lazy pull) ── cull ── z-order list
//!     │        │                                              │
//!     │        ├─ Canvas / Lighting / Shadow ── render-target stack
//!     │        └─ Grid ── windowed visible range
//!     ├─ AnimatorQueue::run()
//!     └─ Scene::release_textures()
//! ```
//!
//! **[`state`]**: [`TransformState`](state::TransformState) and its
//! composition operator.
//!
//! **[`scene`]**: The node store: allocation, topology, properties, lazy
//! resolution, and visibility.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! TRANSFORM propagates to descendants; CANVAS and TOPOLOGY propagate to
//! ancestors.
//!
//! **[`camera`]**: Camera offset and the two-phase culling contract.
//!
//! **[`zorder`]**: Render-list construction with optional group breaking.
//!
//! **[`target`]**: The LIFO render-target stack used by canvas nodes.
//!
//! **[`compositor`]**: Lighting and shadow canvases.
//!
//! **[`grid`]**: Fixed-size tiled grids with windowed traversal.
//!
//! **[`backend`]**: The renderer and resource-manager collaborator traits.
//!
//! **[`animator`]**: Per-frame animator queue and tweens.
//!
//! **[`context`]**: Explicit engine context running the frame loop.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animator;
pub mod backend;
pub mod camera;
pub mod color;
pub mod compositor;
pub mod context;
pub mod dirty;
pub mod error;
pub mod grid;
mod render;
pub mod scene;
pub mod state;
pub mod target;
#[cfg(test)]
mod testing;
pub mod trace;
pub mod zorder;

pub use error::{FactoryError, SceneError};

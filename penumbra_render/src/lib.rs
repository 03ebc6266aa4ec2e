// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-plan recording and in-memory texture pooling for penumbra.
//!
//! This crate provides collaborators that sit between
//! [`penumbra_core`]'s scene traversal and a concrete graphics backend:
//!
//! - [`RenderItem`]: a single draw, tagged with the target it landed on
//! - [`RenderPlan`]: the ordered draws of one frame
//! - [`PlanRenderer`]: a [`Renderer`](penumbra_core::backend::Renderer)
//!   that records every call into a [`RenderPlan`]
//! - [`TexturePool`]: a reference-counted
//!   [`ResourceManager`](penumbra_core::backend::ResourceManager)
//!
//! Backends replay a finished plan against their own API; tests inspect it
//! directly.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod plan;
mod pool;
mod renderer;

pub use plan::{DrawOp, RenderItem, RenderPlan};
pub use pool::{PoolError, TexturePool};
pub use renderer::PlanRenderer;

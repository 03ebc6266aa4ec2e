// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph data model.
//!
//! A *node* is an element of the scene tree. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - Topology: a parent link and an ordered child list.
//! - A [`NodeKind`] from a closed set: groups, sprites, shapes, canvases,
//!   lighting and shadow layers, and grids.
//! - **Local state** set by the caller: position, scale, rotation, blend,
//!   color, and depth, packed in a [`TransformState`](crate::state::TransformState).
//! - **Resolved state**, the composition of the local state with every
//!   ancestor's, computed lazily on read and cached until invalidated.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Property mutations mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)):
//!
//! - **TRANSFORM**: Propagates to all descendants, since resolved state is
//!   inherited.
//! - **CANVAS**: Propagates to all ancestors, so lighting and shadow layers
//!   above a changed node rebuild their canvas.
//! - **TOPOLOGY**: Propagates to all ancestors, so cached render lists are
//!   rebuilt after structural or visibility changes.

mod id;
mod kind;
mod resolve;
mod store;
mod traverse;
mod visibility;

pub use id::{INVALID, NodeId, TextureId};
pub use kind::{
    Canvas, Caps, Entity, NodeFlags, NodeKind, Shape, Sprite, SpriteRole, Tracking,
};
pub use store::Scene;
pub use traverse::Children;

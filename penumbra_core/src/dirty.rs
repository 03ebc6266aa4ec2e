// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Penumbra uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! push invalidation through the scene graph at the moment a property
//! changes. Actual recomputation is deferred until the next read.
//!
//! # Propagation semantics
//!
//! - **Downward**: [`TRANSFORM`] has dependency edges from child to parent
//!   and is marked with [`EagerPolicy`](understory_dirty::EagerPolicy).
//!   Marking a node marks its whole subtree, because every descendant's
//!   resolved state is a function of its ancestor chain.
//!
//! - **Upward**: [`CANVAS`] and [`TOPOLOGY`] have edges from parent to
//!   child, so marking a node eagerly marks every ancestor. CANVAS tells
//!   lighting and shadow compositors that something under them changed;
//!   TOPOLOGY tells containers that their cached render list is invalid.
//!
//! Leaf grid cells are exempt from TRANSFORM edges: a grid refreshes them
//! lazily by comparing update stamps, so moving a tile map never touches
//! every cell. Container cells keep the edge so the move reaches their
//! descendants.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. The scene drains all channels
//! into per-node stale flags, compositor states, and render-list flags
//! before any resolve.

use understory_dirty::Channel;

/// Local state changed: Every descendant's resolved state is stale.
pub const TRANSFORM: Channel = Channel::new(0);

/// Something that affects drawn output changed: Ancestor canvases must
/// rebuild.
pub const CANVAS: Channel = Channel::new(1);

/// Children were added, removed, or re-flagged: Ancestor render lists must
/// be rebuilt.
pub const TOPOLOGY: Channel = Channel::new(2);

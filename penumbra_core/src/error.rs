// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural-misuse errors.
//!
//! Every variant describes a programmer error. The operation that reports it
//! leaves the scene exactly as it was; nothing is partially applied.

use crate::animator::AnimatorId;
use crate::scene::NodeId;

/// Errors produced by scene mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The child is already attached to a container.
    #[error("{child:?} already has a parent; remove it first")]
    AlreadyParented {
        /// The node that was being attached.
        child: NodeId,
    },

    /// The node is not a direct child of the given container.
    #[error("{child:?} is not a child of {container:?}")]
    NotAChild {
        /// The container named by the caller.
        container: NodeId,
        /// The node named by the caller.
        child: NodeId,
    },

    /// The node cannot hold children.
    #[error("{node:?} is not a container")]
    NotAContainer {
        /// The offending node.
        node: NodeId,
    },

    /// Attaching the child would make a node its own ancestor.
    #[error("attaching {child:?} under {container:?} would create a cycle")]
    WouldCycle {
        /// The container named by the caller.
        container: NodeId,
        /// The node that was being attached.
        child: NodeId,
    },

    /// Lighting layers only accept light sprites.
    #[error("{child:?} is not a light and cannot be added to lighting layer {lighting:?}")]
    NotALight {
        /// The lighting layer.
        lighting: NodeId,
        /// The rejected child.
        child: NodeId,
    },

    /// Shadow layers only accept shadow-caster sprites.
    #[error("{child:?} is not a shadow caster and cannot be added to shadow layer {shadow:?}")]
    NotAShadowCaster {
        /// The shadow layer.
        shadow: NodeId,
        /// The rejected child.
        child: NodeId,
    },

    /// The operation needs a lighting or shadow layer.
    #[error("{node:?} is not a lighting or shadow layer")]
    NotACompositor {
        /// The offending node.
        node: NodeId,
    },

    /// Grid cells are fixed at construction.
    #[error("cells of grid {grid:?} cannot be added or removed")]
    FixedGrid {
        /// The grid.
        grid: NodeId,
    },

    /// The operation needs a grid node.
    #[error("{node:?} is not a grid")]
    NotAGrid {
        /// The offending node.
        node: NodeId,
    },

    /// A cell coordinate lies outside the grid.
    #[error("cell ({col}, {row}) is outside grid {grid:?}")]
    CellOutOfRange {
        /// The grid.
        grid: NodeId,
        /// Requested column.
        col: u32,
        /// Requested row.
        row: u32,
    },

    /// The operation needs a leaf entity (sprite or shape).
    #[error("{node:?} is not a leaf entity")]
    NotAnEntity {
        /// The offending node.
        node: NodeId,
    },

    /// The operation needs a sprite.
    #[error("{node:?} is not a sprite")]
    NotASprite {
        /// The offending node.
        node: NodeId,
    },

    /// Only shadow casters can mirror another node.
    #[error("{node:?} is not a shadow caster and cannot track another node")]
    NotTrackable {
        /// The offending node.
        node: NodeId,
    },

    /// The scene root can neither be attached elsewhere nor destroyed.
    #[error("the scene root cannot be moved or destroyed")]
    RootIsFixed,

    /// The animator was never registered, or has already been removed.
    #[error("{id:?} is not registered in this queue")]
    AnimatorNotRegistered {
        /// The unknown animator handle.
        id: AnimatorId,
    },
}

/// Errors produced by factories that load textures.
///
/// Resource-manager failures are carried through unmodified.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError<E> {
    /// The resource manager failed to provide the texture.
    #[error(transparent)]
    Resource(E),
    /// The node could not be attached.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LIFO stack of offscreen draw destinations.
//!
//! Canvas-backed nodes build their content by pushing their texture, drawing
//! their children, and popping again. Nested canvases re-enter the stack
//! safely because it is strictly last-in first-out. Renderers embed a
//! [`RenderTargetStack`] and consult [`active`](RenderTargetStack::active)
//! for every draw.

use alloc::vec::Vec;

use crate::scene::TextureId;

/// A draw destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// The default on-screen target.
    #[default]
    Screen,
    /// An offscreen texture.
    Texture(TextureId),
}

/// The stack of active render targets for one renderer.
#[derive(Clone, Debug, Default)]
pub struct RenderTargetStack {
    stack: Vec<TextureId>,
    unmatched_pops: u64,
}

impl RenderTargetStack {
    /// Creates an empty stack; the screen is active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `texture` and makes it the active target.
    pub fn push(&mut self, texture: TextureId) -> Target {
        self.stack.push(texture);
        Target::Texture(texture)
    }

    /// Discards the top target and returns the newly active one.
    ///
    /// Popping an empty stack leaves the screen active. This is counted in
    /// [`unmatched_pops`](Self::unmatched_pops) but is not an error, so an
    /// unbalanced caller degrades to drawing on screen.
    pub fn pop(&mut self) -> Target {
        if self.stack.pop().is_none() {
            self.unmatched_pops += 1;
        }
        self.active()
    }

    /// Returns the active target.
    #[must_use]
    pub fn active(&self) -> Target {
        self.stack
            .last()
            .copied()
            .map_or(Target::Screen, Target::Texture)
    }

    /// Number of pushed targets.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether every push has been matched by a pop.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    /// Total pops performed on an empty stack.
    #[must_use]
    pub fn unmatched_pops(&self) -> u64 {
        self.unmatched_pops
    }

    /// Drops every pushed target, making the screen active.
    pub fn reset(&mut self) {
        self.stack.clear();
    }
}

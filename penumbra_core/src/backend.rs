// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator contracts for rendering and resource management.
//!
//! The core never touches pixels, windows, or files. It talks to two
//! collaborators:
//!
//! - **Renderer**: Implements [`Renderer`]: executes blits and rectangle
//!   draws, owns the render-target stack (see
//!   [`RenderTargetStack`](crate::target::RenderTargetStack)), and reports the
//!   frame id, the last frame's duration, and the active target size.
//!
//! - **Resource manager**: Implements [`ResourceManager`]: hands out
//!   reference-counted texture handles by name and takes them back when a
//!   node that held one is destroyed.
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_frame(cx: &mut Context) {
//!     // Mutate: game code moves nodes, toggles lights, adds sprites.
//!     cx.scene_mut().set_position(player, pos);
//!
//!     // Render + animate + release: one synchronous pass.
//!     let summary = cx.run_frame(&mut renderer, &mut resources, &camera, &mut tracer);
//! }
//! ```

use kurbo::{Point, Rect, Size};

use crate::color::{BlendMode, Color};
use crate::scene::TextureId;

/// A texture handed out by a [`ResourceManager`].
///
/// The handle is a plain value; the reference it represents is returned
/// through [`ResourceManager::release`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    /// Identity of the texture.
    pub id: TextureId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureHandle {
    /// Returns the texture size in pixels.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Loads, creates, and reference-counts textures by name.
pub trait ResourceManager {
    /// Load failure reported by this manager.
    type Error;

    /// Returns a handle to the named texture, loading it on first use.
    fn get_texture(&mut self, name: &str) -> Result<TextureHandle, Self::Error>;

    /// Creates (or reuses) a blank texture usable as a render target.
    fn create_blank_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, Self::Error>;

    /// Drops one reference to a texture.
    fn release(&mut self, texture: TextureHandle);
}

/// A single textured-rectangle draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blit {
    /// Texture to sample.
    pub texture: TextureId,
    /// Source rectangle in texels; `None` samples the whole texture.
    pub src: Option<Rect>,
    /// Destination rectangle in target pixels.
    pub dst: Rect,
    /// Blend operator.
    pub blend: BlendMode,
    /// Tint (alpha is opacity).
    pub color: Color,
    /// Rotation in degrees around `anchor`.
    pub rotation: f64,
    /// Rotation origin, normalized to `dst` (`0..1` on each axis).
    pub anchor: Point,
}

/// Executes draw calls against a LIFO stack of render targets.
///
/// Implementations must route every draw to the currently active target:
/// the top of the stack, or the screen when the stack is empty. An
/// unmatched [`pop_render_target`](Self::pop_render_target) resets to the
/// screen instead of failing.
pub trait Renderer {
    /// Makes `texture` the active draw destination.
    fn push_render_target(&mut self, texture: TextureId);

    /// Restores the previous draw destination.
    fn pop_render_target(&mut self);

    /// Draws a textured rectangle.
    fn blit(&mut self, blit: &Blit);

    /// Draws a solid or outlined rectangle.
    fn draw_rect(&mut self, rect: Rect, color: Color, filled: bool, blend: BlendMode);

    /// Monotonic frame counter.
    fn frame_id(&self) -> u64;

    /// Seconds elapsed during the previous frame.
    fn time_factor(&self) -> f64;

    /// Size of the active render target in pixels.
    fn target_size(&self) -> Size;

    /// Called before the scene is traversed.
    fn begin_frame(&mut self) {}

    /// Called after the frame completes (swap buffers, advance frame id).
    fn end_frame(&mut self) {}
}

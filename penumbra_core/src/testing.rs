// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-crate collaborators for unit tests.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::backend::{Blit, Renderer, ResourceManager, TextureHandle};
use crate::color::{BlendMode, Color};
use crate::scene::TextureId;
use crate::target::{RenderTargetStack, Target};

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Blit(Target, Blit),
    Rect(Target, Rect, Color, BlendMode),
}

/// Renderer that records draws against a screen of fixed size.
#[derive(Debug)]
pub(crate) struct Recorder {
    pub(crate) ops: Vec<Op>,
    pub(crate) frame: u64,
    targets: RenderTargetStack,
    screen: Size,
}

impl Recorder {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            ops: Vec::new(),
            frame: 0,
            targets: RenderTargetStack::new(),
            screen: Size::new(width, height),
        }
    }

    pub(crate) fn blits_of(&self, texture: TextureId) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Blit(_, b) if b.texture == texture))
            .count()
    }
}

impl Renderer for Recorder {
    fn push_render_target(&mut self, texture: TextureId) {
        self.targets.push(texture);
    }

    fn pop_render_target(&mut self) {
        self.targets.pop();
    }

    fn blit(&mut self, blit: &Blit) {
        self.ops.push(Op::Blit(self.targets.active(), *blit));
    }

    fn draw_rect(&mut self, rect: Rect, color: Color, _filled: bool, blend: BlendMode) {
        self.ops.push(Op::Rect(self.targets.active(), rect, color, blend));
    }

    fn frame_id(&self) -> u64 {
        self.frame
    }

    fn time_factor(&self) -> f64 {
        0.5
    }

    fn target_size(&self) -> Size {
        self.screen
    }

    fn end_frame(&mut self) {
        self.frame += 1;
    }
}

/// Resource manager handing out 16x16 textures for any name that does not
/// start with `missing`.
#[derive(Debug, Default)]
pub(crate) struct Resources {
    next: u32,
    pub(crate) released: Vec<TextureHandle>,
}

impl ResourceManager for Resources {
    type Error = String;

    fn get_texture(&mut self, name: &str) -> Result<TextureHandle, String> {
        if name.starts_with("missing") {
            return Err(name.to_string());
        }
        self.create_blank_texture(name, 16, 16)
    }

    fn create_blank_texture(
        &mut self,
        _name: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, String> {
        self.next += 1;
        Ok(TextureHandle {
            id: TextureId(self.next),
            width,
            height,
        })
    }

    fn release(&mut self, texture: TextureHandle) {
        self.released.push(texture);
    }
}

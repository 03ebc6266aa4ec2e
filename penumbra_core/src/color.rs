// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RGBA colors and blend operators.

use core::ops::Mul;

/// A linear RGBA color with `f32` channels nominally in `0.0..=1.0`.
///
/// Colors act as multiplicative tints: a node's resolved color is the
/// component-wise product of its own color and every ancestor's. The alpha
/// channel doubles as opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel (opacity).
    pub a: f32,
}

impl Color {
    /// Opaque white; the identity tint.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from its four channels.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Returns this color with its alpha replaced.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Component-wise product, including alpha.
    #[inline]
    #[must_use]
    pub fn modulate(self, other: Self) -> Self {
        Self::new(
            self.r * other.r,
            self.g * other.g,
            self.b * other.b,
            self.a * other.a,
        )
    }

    /// Clamps every channel into `0.0..=1.0`.
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Mul for Color {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.modulate(rhs)
    }
}

/// How a draw is combined with the pixels already in its target.
///
/// Variants are ordered: `None < Alpha < Additive < Multiplicative`. When a
/// child state is combined with its parent's, the resolved blend mode is the
/// greater of the two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlendMode {
    /// Source replaces destination.
    None,
    /// Standard source-over alpha compositing.
    #[default]
    Alpha,
    /// Per-channel sum, clamped at full brightness.
    Additive,
    /// Per-channel product.
    Multiplicative,
}

impl BlendMode {
    /// Combines `src` into `dst` for a single pixel.
    ///
    /// This is the arithmetic a renderer is expected to apply; the core never
    /// touches pixels itself.
    #[must_use]
    pub fn apply(self, dst: Color, src: Color) -> Color {
        match self {
            Self::None => src,
            Self::Alpha => {
                let inv = 1.0 - src.a;
                Color::new(
                    src.r * src.a + dst.r * inv,
                    src.g * src.a + dst.g * inv,
                    src.b * src.a + dst.b * inv,
                    src.a + dst.a * inv,
                )
            }
            Self::Additive => Color::new(
                dst.r + src.r * src.a,
                dst.g + src.g * src.a,
                dst.b + src.b * src.a,
                dst.a + src.a,
            )
            .clamped(),
            Self::Multiplicative => dst.modulate(src),
        }
    }
}

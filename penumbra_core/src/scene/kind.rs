// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of node variants and their per-variant data.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use crate::backend::TextureHandle;
use crate::color::Color;
use crate::compositor::Compositor;
use crate::grid::Grid;
use crate::zorder::Layering;

use super::id::NodeId;

/// Per-node boolean flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Whether the node (and its subtree) is drawn at all.
    pub visible: bool,
    /// Static nodes ignore the camera offset (HUD-like content). Inherited
    /// by descendants.
    pub is_static: bool,
    /// Atomic containers are never flattened into an ancestor's
    /// group-breaking render list.
    pub atomic: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            visible: true,
            is_static: false,
            atomic: false,
        }
    }
}

/// Capabilities reported by a [`NodeKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Caps {
    /// Holds children.
    pub container: bool,
    /// Orders its children through a render list.
    pub z_sortable: bool,
    /// Draws its children into an owned texture.
    pub target_backed: bool,
    /// Children are fixed at construction.
    pub fixed_grid: bool,
}

/// Size and rotation origin shared by leaf entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    /// Unscaled size in pixels.
    pub size: Size,
    /// Origin for placement and rotation, normalized to the size.
    pub anchor: Point,
}

impl Entity {
    /// Computes the pixel-space rectangle for a resolved position and scale.
    #[must_use]
    pub fn target_rect(&self, position: Vec2, scale: Vec2) -> Rect {
        let w = self.size.width * scale.x;
        let h = self.size.height * scale.y;
        let origin = Point::new(position.x - self.anchor.x * w, position.y - self.anchor.y * h);
        Rect::from_origin_size(origin, Size::new(w, h)).abs()
    }
}

/// What a sprite is for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpriteRole {
    /// Ordinary scene content.
    #[default]
    Plain,
    /// A light, accepted only by lighting layers.
    Light,
    /// A shadow caster, accepted only by shadow layers.
    ShadowCaster,
}

/// Makes a shadow caster mirror another node each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tracking {
    /// The node whose position and depth are mirrored.
    pub target: NodeId,
    /// Extra offset applied to the mirrored position.
    pub offset: Vec2,
}

/// A textured leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub(crate) entity: Entity,
    pub(crate) texture: TextureHandle,
    pub(crate) src: Option<Rect>,
    pub(crate) role: SpriteRole,
    pub(crate) tracking: Option<Tracking>,
}

impl Sprite {
    /// Returns the texture this sprite samples.
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Returns the source rectangle, if the sprite samples a sub-region.
    #[must_use]
    pub fn src(&self) -> Option<Rect> {
        self.src
    }

    /// Returns the sprite's role.
    #[must_use]
    pub fn role(&self) -> SpriteRole {
        self.role
    }

    /// Returns the tracked node, if any.
    #[must_use]
    pub fn tracking(&self) -> Option<Tracking> {
        self.tracking
    }
}

/// A rectangle leaf drawn with `draw_rect`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub(crate) entity: Entity,
    pub(crate) filled: bool,
}

/// A container that draws its children into an owned texture.
#[derive(Clone, Debug)]
pub struct Canvas {
    pub(crate) texture: TextureHandle,
    pub(crate) clear: Option<Color>,
    pub(crate) composite: bool,
    pub(crate) layering: Layering,
}

impl Canvas {
    /// Returns the backing texture.
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

/// The variant data of a node.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A plain or z-sorted container.
    Group(Layering),
    /// A textured leaf.
    Sprite(Sprite),
    /// A rectangle leaf.
    Shape(Shape),
    /// A container rendered to a texture, then composited.
    Canvas(Canvas),
    /// Additive light accumulation, composited multiplicatively.
    Lighting(Compositor),
    /// Shadow accumulation, composited multiplicatively.
    Shadow(Compositor),
    /// A fixed grid of cells.
    Grid(Grid),
}

impl NodeKind {
    /// Returns the capability flags of this variant.
    #[must_use]
    pub fn caps(&self) -> Caps {
        match self {
            Self::Group(_) => Caps {
                container: true,
                z_sortable: true,
                ..Caps::default()
            },
            Self::Sprite(_) | Self::Shape(_) => Caps::default(),
            Self::Canvas(_) | Self::Lighting(_) | Self::Shadow(_) => Caps {
                container: true,
                z_sortable: true,
                target_backed: true,
                fixed_grid: false,
            },
            Self::Grid(_) => Caps {
                container: true,
                fixed_grid: true,
                ..Caps::default()
            },
        }
    }

    /// Whether this is a leaf entity.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Sprite(_) | Self::Shape(_))
    }

    /// Returns the entity geometry of a leaf.
    #[must_use]
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Self::Sprite(s) => Some(&s.entity),
            Self::Shape(s) => Some(&s.entity),
            _ => None,
        }
    }

    pub(crate) fn entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Self::Sprite(s) => Some(&mut s.entity),
            Self::Shape(s) => Some(&mut s.entity),
            _ => None,
        }
    }

    /// Returns the sprite data, if this is a sprite.
    #[must_use]
    pub fn sprite(&self) -> Option<&Sprite> {
        match self {
            Self::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            Self::Sprite(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the render-list state of a z-sortable container.
    #[must_use]
    pub fn layering(&self) -> Option<&Layering> {
        match self {
            Self::Group(l) => Some(l),
            Self::Canvas(c) => Some(&c.layering),
            Self::Lighting(c) | Self::Shadow(c) => Some(&c.layering),
            _ => None,
        }
    }

    pub(crate) fn layering_mut(&mut self) -> Option<&mut Layering> {
        match self {
            Self::Group(l) => Some(l),
            Self::Canvas(c) => Some(&mut c.layering),
            Self::Lighting(c) | Self::Shadow(c) => Some(&mut c.layering),
            _ => None,
        }
    }

    /// Returns the compositor state of a lighting or shadow layer.
    #[must_use]
    pub fn compositor(&self) -> Option<&Compositor> {
        match self {
            Self::Lighting(c) | Self::Shadow(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn compositor_mut(&mut self) -> Option<&mut Compositor> {
        match self {
            Self::Lighting(c) | Self::Shadow(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the grid data, if this is a grid.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Self::Grid(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn grid_mut(&mut self) -> Option<&mut Grid> {
        match self {
            Self::Grid(g) => Some(g),
            _ => None,
        }
    }

    /// Appends every texture this node holds a reference to.
    pub(crate) fn collect_textures(&self, out: &mut Vec<TextureHandle>) {
        match self {
            Self::Sprite(s) => out.push(s.texture),
            Self::Canvas(c) => out.push(c.texture),
            Self::Lighting(c) | Self::Shadow(c) => out.push(c.canvas),
            Self::Group(_) | Self::Shape(_) | Self::Grid(_) => {}
        }
    }
}

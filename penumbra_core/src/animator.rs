// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame animators.
//!
//! An [`Animator`] is advanced once per frame, after the render traversal,
//! with the renderer's time factor (seconds elapsed during the previous
//! frame). Animators mutate the scene through its ordinary setters, so the
//! next render sees their changes through the usual invalidation path.
//!
//! [`AnimatorQueue`] owns the registered animators and retires those that
//! report [`AnimatorStatus::Finished`]. Two animators are built in:
//!
//! - [`Tween`] interpolates one property of one node with an [`Easing`]
//!   curve.
//! - [`SheetAnimator`] steps a sprite through the frames of a
//!   [`SpriteSheet`] at a fixed rate.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size, Vec2};

use crate::backend::TextureHandle;
use crate::error::SceneError;
use crate::scene::{NodeId, Scene};

/// Whether an animator wants to keep running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatorStatus {
    /// Update again next frame.
    Running,
    /// Remove from the queue.
    Finished,
}

/// Something advanced once per frame.
pub trait Animator {
    /// Advances by `dt` seconds.
    fn update(&mut self, scene: &mut Scene, dt: f64) -> AnimatorStatus;
}

/// Handle to a registered animator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimatorId(u64);

/// Registered animators, updated in registration order.
#[derive(Default)]
pub struct AnimatorQueue {
    entries: Vec<(AnimatorId, Box<dyn Animator>)>,
    next_id: u64,
}

impl fmt::Debug for AnimatorQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorQueue")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl AnimatorQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an animator and returns its handle.
    pub fn register(&mut self, animator: impl Animator + 'static) -> AnimatorId {
        let id = AnimatorId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(animator)));
        id
    }

    /// Removes an animator before it finishes.
    ///
    /// # Errors
    ///
    /// [`SceneError::AnimatorNotRegistered`] if `id` is not in this queue.
    pub fn remove(&mut self, id: AnimatorId) -> Result<Box<dyn Animator>, SceneError> {
        let Some(pos) = self.entries.iter().position(|(e, _)| *e == id) else {
            return Err(SceneError::AnimatorNotRegistered { id });
        };
        Ok(self.entries.remove(pos).1)
    }

    /// Whether `id` is still registered.
    #[must_use]
    pub fn contains(&self, id: AnimatorId) -> bool {
        self.entries.iter().any(|(e, _)| *e == id)
    }

    /// Number of registered animators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no animators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Updates every animator once and retires the finished ones.
    ///
    /// Returns the number of animators retired.
    pub fn run(&mut self, scene: &mut Scene, dt: f64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain_mut(|(_, animator)| animator.update(scene, dt) == AnimatorStatus::Running);
        before - self.entries.len()
    }
}

/// Easing curves mapping linear progress to eased progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Constant speed.
    #[default]
    Linear,
    /// Starts slow, ends fast.
    EaseIn,
    /// Starts fast, ends slow.
    EaseOut,
    /// Slow start and end, fast middle.
    EaseInOut,
}

impl Easing {
    /// Evaluates the curve at `t` in `0..=1`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// The property a [`Tween`] drives, with its start and end values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TweenProperty {
    /// Local position.
    Position {
        /// Value at progress 0.
        from: Vec2,
        /// Value at progress 1.
        to: Vec2,
    },
    /// Local scale.
    Scale {
        /// Value at progress 0.
        from: Vec2,
        /// Value at progress 1.
        to: Vec2,
    },
    /// Local rotation in degrees.
    Rotation {
        /// Value at progress 0.
        from: f64,
        /// Value at progress 1.
        to: f64,
    },
    /// Alpha of the local tint.
    Opacity {
        /// Value at progress 0.
        from: f32,
        /// Value at progress 1.
        to: f32,
    },
}

/// Interpolates one property of one node over a fixed duration.
///
/// Finishes early if the node is destroyed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    node: NodeId,
    property: TweenProperty,
    duration: f64,
    elapsed: f64,
    easing: Easing,
}

impl Tween {
    /// Creates a linear tween lasting `duration` seconds.
    #[must_use]
    pub fn new(node: NodeId, property: TweenProperty, duration: f64) -> Self {
        Self {
            node,
            property,
            duration,
            elapsed: 0.0,
            easing: Easing::Linear,
        }
    }

    /// Returns this tween with a different easing curve.
    #[must_use]
    pub fn with_easing(self, easing: Easing) -> Self {
        Self { easing, ..self }
    }

    /// Linear progress in `0..=1`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

impl Animator for Tween {
    fn update(&mut self, scene: &mut Scene, dt: f64) -> AnimatorStatus {
        if !scene.is_alive(self.node) {
            return AnimatorStatus::Finished;
        }
        self.elapsed += dt;
        let t = self.progress();
        let k = self.easing.apply(t);
        match self.property {
            TweenProperty::Position { from, to } => scene.set_position(self.node, from.lerp(to, k)),
            TweenProperty::Scale { from, to } => scene.set_scale(self.node, from.lerp(to, k)),
            TweenProperty::Rotation { from, to } => {
                scene.set_rotation(self.node, from + (to - from) * k);
            }
            TweenProperty::Opacity { from, to } => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "opacity API is f32 and the eased factor is in 0.0..=1.0"
                )]
                let k = k as f32;
                scene.set_opacity(self.node, from + (to - from) * k);
            }
        }
        if t >= 1.0 {
            AnimatorStatus::Finished
        } else {
            AnimatorStatus::Running
        }
    }
}

// -- Sprite sheets --

/// A texture divided into a uniform grid of animation frames.
///
/// Frames are numbered row-major from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteSheet {
    /// Frames per row.
    pub columns: u32,
    /// Frames per column.
    pub rows: u32,
}

impl SpriteSheet {
    /// Creates a sheet of `columns` by `rows` frames.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Pixel size of one frame, rounded down to whole pixels.
    #[must_use]
    pub fn frame_size(&self, texture: TextureHandle) -> Size {
        Size::new(
            f64::from(texture.width / self.columns.max(1)),
            f64::from(texture.height / self.rows.max(1)),
        )
    }

    /// Source rectangle of `frame` within `texture`.
    #[must_use]
    pub fn frame_rect(&self, texture: TextureHandle, frame: u32) -> Rect {
        let columns = self.columns.max(1);
        let size = self.frame_size(texture);
        let col = f64::from(frame % columns);
        let row = f64::from(frame / columns);
        Rect::from_origin_size((col * size.width, row * size.height), size)
    }
}

impl Scene {
    /// Creates a detached sprite showing frame 0 of a sprite sheet, sized to
    /// one frame.
    pub fn create_sheet_sprite(&mut self, texture: TextureHandle, sheet: SpriteSheet) -> NodeId {
        self.create_sprite_region(texture, sheet.frame_rect(texture, 0))
    }
}

/// What a [`SheetAnimator`] does after its last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SheetEnd {
    /// Keep showing the last frame and finish.
    #[default]
    Stop,
    /// Start over from the first frame.
    Repeat,
    /// Destroy the sprite and finish.
    DestroySprite,
}

/// Plays a run of consecutive sprite-sheet frames on one sprite.
///
/// Each update shows the current frame, then advances by `speed * dt`
/// frames. Optional holds keep the first or last frame on screen for a
/// number of seconds each cycle. Finishes early if the sprite is destroyed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SheetAnimator {
    node: NodeId,
    sheet: SpriteSheet,
    first: u32,
    count: u32,
    speed: f64,
    end: SheetEnd,
    hold_first: f64,
    hold_last: f64,
    current: f64,
    delay: f64,
    held_first: bool,
    held_last: bool,
}

impl SheetAnimator {
    /// Plays `count` frames starting at `first`, at `speed` frames per
    /// second, then stops on the last one.
    #[must_use]
    pub fn new(node: NodeId, sheet: SpriteSheet, first: u32, count: u32, speed: f64) -> Self {
        Self {
            node,
            sheet,
            first,
            count: count.max(1),
            speed,
            end: SheetEnd::Stop,
            hold_first: 0.0,
            hold_last: 0.0,
            current: f64::from(first),
            delay: 0.0,
            held_first: false,
            held_last: false,
        }
    }

    /// Returns this animator with a different end action.
    #[must_use]
    pub fn with_end(self, end: SheetEnd) -> Self {
        Self { end, ..self }
    }

    /// Returns this animator holding the first frame for `seconds` each
    /// cycle.
    #[must_use]
    pub fn with_hold_first(self, seconds: f64) -> Self {
        Self {
            hold_first: seconds,
            ..self
        }
    }

    /// Returns this animator holding the last frame for `seconds` each
    /// cycle.
    #[must_use]
    pub fn with_hold_last(self, seconds: f64) -> Self {
        Self {
            hold_last: seconds,
            ..self
        }
    }

    /// Frame currently shown.
    #[must_use]
    pub fn frame(&self) -> u32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "clamped to the animated frame run, which fits in u32"
        )]
        let frame = self.current.max(0.0) as u32;
        frame.clamp(self.first, self.first + self.count - 1)
    }

    fn past_end(&self) -> bool {
        self.current >= f64::from(self.first + self.count)
    }

    fn show(&self, scene: &mut Scene) -> Result<(), SceneError> {
        let Some(sprite) = scene.kind(self.node).sprite() else {
            return Err(SceneError::NotASprite { node: self.node });
        };
        let rect = self.sheet.frame_rect(sprite.texture(), self.frame());
        scene.set_source(self.node, Some(rect))
    }
}

impl Animator for SheetAnimator {
    fn update(&mut self, scene: &mut Scene, dt: f64) -> AnimatorStatus {
        if !scene.is_alive(self.node) {
            return AnimatorStatus::Finished;
        }
        if self.delay > 0.0 {
            self.delay -= dt;
            return AnimatorStatus::Running;
        }
        if self.show(scene).is_err() {
            return AnimatorStatus::Finished;
        }
        if self.hold_first > 0.0 && !self.held_first {
            self.delay = self.hold_first;
            self.held_first = true;
            return AnimatorStatus::Running;
        }

        self.current += dt * self.speed;
        if !self.past_end() {
            return AnimatorStatus::Running;
        }
        if self.hold_last > 0.0 && !self.held_last {
            self.delay = self.hold_last;
            self.held_last = true;
            return AnimatorStatus::Running;
        }
        self.held_first = false;
        self.held_last = false;
        match self.end {
            SheetEnd::Repeat => {
                self.current = f64::from(self.first);
                AnimatorStatus::Running
            }
            SheetEnd::Stop => AnimatorStatus::Finished,
            SheetEnd::DestroySprite => {
                // Grid cells cannot be destroyed; they simply stop.
                let _ = scene.destroy(self.node);
                AnimatorStatus::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TextureId;

    const STRIP: TextureHandle = TextureHandle {
        id: TextureId(3),
        width: 64,
        height: 16,
    };

    fn src(scene: &Scene, node: NodeId) -> Option<Rect> {
        scene.kind(node).sprite().unwrap().src()
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert_eq!(Easing::EaseIn.apply(0.5), 0.25);
        assert_eq!(Easing::EaseOut.apply(0.5), 0.75);
        assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn tween_reaches_target_and_finishes() {
        let mut scene = Scene::new();
        let node = scene.create_group();
        let mut queue = AnimatorQueue::new();
        queue.register(Tween::new(
            node,
            TweenProperty::Position {
                from: Vec2::ZERO,
                to: Vec2::new(10.0, 0.0),
            },
            1.0,
        ));

        assert_eq!(queue.run(&mut scene, 0.5), 0);
        assert_eq!(scene.local(node).position, Vec2::new(5.0, 0.0));
        assert_eq!(queue.run(&mut scene, 0.5), 1);
        assert_eq!(scene.local(node).position, Vec2::new(10.0, 0.0));
        assert!(queue.is_empty());
    }

    #[test]
    fn tween_on_destroyed_node_finishes() {
        let mut scene = Scene::new();
        let node = scene.create_group();
        let mut queue = AnimatorQueue::new();
        queue.register(Tween::new(
            node,
            TweenProperty::Opacity { from: 1.0, to: 0.0 },
            2.0,
        ));
        scene.destroy(node).unwrap();
        assert_eq!(queue.run(&mut scene, 0.1), 1);
    }

    #[test]
    fn sheet_frames_are_row_major() {
        let sheet = SpriteSheet::new(4, 2);
        let texture = TextureHandle {
            height: 32,
            ..STRIP
        };
        assert_eq!(sheet.frame_size(texture), Size::new(16.0, 16.0));
        assert_eq!(sheet.frame_rect(texture, 5), Rect::new(16.0, 16.0, 32.0, 32.0));
    }

    #[test]
    fn sheet_animator_steps_then_stops_on_last_frame() {
        let mut scene = Scene::new();
        let sheet = SpriteSheet::new(4, 1);
        let node = scene.create_sheet_sprite(STRIP, sheet);
        assert_eq!(src(&scene, node), Some(Rect::new(0.0, 0.0, 16.0, 16.0)));
        let mut queue = AnimatorQueue::new();
        queue.register(SheetAnimator::new(node, sheet, 0, 4, 2.0));

        let mut shown = Vec::new();
        let mut finished = 0;
        while finished == 0 {
            finished = queue.run(&mut scene, 0.5);
            shown.push(src(&scene, node).unwrap().x0);
        }
        assert_eq!(shown, [0.0, 16.0, 32.0, 48.0]);
    }

    #[test]
    fn sheet_animator_repeats_from_first_frame() {
        let mut scene = Scene::new();
        let sheet = SpriteSheet::new(4, 1);
        let node = scene.create_sheet_sprite(STRIP, sheet);
        let mut anim = SheetAnimator::new(node, sheet, 1, 2, 2.0).with_end(SheetEnd::Repeat);

        let mut shown = Vec::new();
        for _ in 0..5 {
            assert_eq!(anim.update(&mut scene, 0.5), AnimatorStatus::Running);
            shown.push(src(&scene, node).unwrap().x0);
        }
        assert_eq!(shown, [16.0, 32.0, 16.0, 32.0, 16.0]);
    }

    #[test]
    fn sheet_animator_holds_first_and_last_frames() {
        let mut scene = Scene::new();
        let sheet = SpriteSheet::new(4, 1);
        let node = scene.create_sheet_sprite(STRIP, sheet);
        let mut anim = SheetAnimator::new(node, sheet, 2, 2, 2.0)
            .with_hold_first(1.0)
            .with_hold_last(0.5);

        let mut frames = Vec::new();
        let mut status = AnimatorStatus::Running;
        while status == AnimatorStatus::Running {
            status = anim.update(&mut scene, 0.5);
            frames.push(anim.frame());
        }
        // Two holding updates after the first frame, one after the last.
        assert_eq!(frames, [2, 2, 2, 3, 3, 3, 3]);
        assert_eq!(src(&scene, node).unwrap().x0, 48.0);
    }

    #[test]
    fn sheet_animator_can_destroy_its_sprite() {
        let mut scene = Scene::new();
        let sheet = SpriteSheet::new(4, 1);
        let node = scene.create_sheet_sprite(STRIP, sheet);
        let mut queue = AnimatorQueue::new();
        queue.register(
            SheetAnimator::new(node, sheet, 0, 1, 4.0).with_end(SheetEnd::DestroySprite),
        );

        assert_eq!(queue.run(&mut scene, 0.25), 1);
        assert!(!scene.is_alive(node));
        assert_eq!(scene.pending_releases(), &[STRIP]);
    }

    #[test]
    fn sheet_animator_needs_a_sprite() {
        let mut scene = Scene::new();
        let group = scene.create_group();
        let mut anim = SheetAnimator::new(group, SpriteSheet::new(2, 2), 0, 4, 1.0);
        assert_eq!(anim.update(&mut scene, 0.1), AnimatorStatus::Finished);
    }

    #[test]
    fn removing_unknown_animator_fails() {
        let mut scene = Scene::new();
        let node = scene.create_group();
        let mut queue = AnimatorQueue::new();
        let id = queue.register(Tween::new(
            node,
            TweenProperty::Rotation { from: 0.0, to: 90.0 },
            1.0,
        ));
        assert!(queue.remove(id).is_ok());
        assert!(!queue.contains(id));
        assert!(matches!(
            queue.remove(id),
            Err(SceneError::AnimatorNotRegistered { id: missing }) if missing == id
        ));
    }
}

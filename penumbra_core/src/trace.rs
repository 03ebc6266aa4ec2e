// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the scene and [`Context`](crate::context::Context) call at each stage of
//! a frame. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: Enables the `Tracer` method bodies (one branch per call).

use crate::scene::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame loop is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Scene traversal: resolve, cull, sort, draw.
    Render,
    /// Animator queue update.
    Animate,
    /// Returning released textures to the resource manager.
    Release,
}

/// Which compositor rebuilt its canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositorKind {
    /// Additive light accumulation.
    Lighting,
    /// Shadow accumulation.
    Shadow,
}

/// Why a compositor rebuilt its canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RebuildReason {
    /// Children, ambient color, or transforms under the layer changed.
    Content,
    /// The camera moved since the previous render.
    CameraMoved,
    /// The layer rebuilds every frame.
    AlwaysRefresh,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// Seconds elapsed during the previous frame.
    pub time_factor: f64,
}

/// Marks the beginning of a frame-loop phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a frame-loop phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted when a lighting or shadow layer rebuilds its canvas.
#[derive(Clone, Copy, Debug)]
pub struct CanvasRebuildEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// The compositing layer.
    pub node: NodeId,
    /// Lighting or shadow.
    pub kind: CompositorKind,
    /// What triggered the rebuild.
    pub reason: RebuildReason,
}

/// Emitted when a container rebuilds its render list.
#[derive(Clone, Copy, Debug)]
pub struct RenderListEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// The container.
    pub node: NodeId,
    /// Number of entries in the new list.
    pub len: usize,
    /// Whether nested groups were flattened into the list.
    pub flattened: bool,
}

/// Emitted when a tracked shadow is removed because its target left the
/// scene.
#[derive(Clone, Copy, Debug)]
pub struct ShadowDetachedEvent {
    /// Renderer frame id.
    pub frame_index: u64,
    /// The shadow layer that owned the caster.
    pub layer: NodeId,
    /// The destroyed caster.
    pub caster: NodeId,
}

/// Counters accumulated during one scene traversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls issued (blits and rectangles, canvas composites included).
    pub drawn: u32,
    /// Leaves skipped by visibility culling.
    pub culled: u32,
    /// Lighting and shadow canvases rebuilt.
    pub canvas_rebuilds: u32,
    /// Render lists rebuilt.
    pub lists_rebuilt: u32,
    /// Tracked shadows removed because their target left the scene.
    pub shadows_detached: u32,
}

/// Per-frame summary emitted by [`Context::run_frame`](crate::context::Context::run_frame).
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Renderer frame id.
    pub frame_index: u64,
    /// Traversal counters.
    pub stats: FrameStats,
    /// Animators that finished and were retired this frame.
    pub animators_finished: usize,
    /// Texture references handed back to the resource manager.
    pub textures_released: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame-loop phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame-loop phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a compositor rebuilds its canvas.
    fn on_canvas_rebuild(&mut self, e: &CanvasRebuildEvent) {
        _ = e;
    }

    /// Called when a container rebuilds its render list.
    fn on_render_list(&mut self, e: &RenderListEvent) {
        _ = e;
    }

    /// Called when a tracked shadow is removed.
    fn on_shadow_detached(&mut self, e: &ShadowDetachedEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CanvasRebuildEvent`].
    #[inline]
    pub fn canvas_rebuild(&mut self, e: &CanvasRebuildEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_canvas_rebuild(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderListEvent`].
    #[inline]
    pub fn render_list(&mut self, e: &RenderListEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_list(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ShadowDetachedEvent`].
    #[inline]
    pub fn shadow_detached(&mut self, e: &ShadowDetachedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_shadow_detached(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 3,
            stats: FrameStats {
                drawn: 10,
                culled: 2,
                canvas_rebuilds: 1,
                lists_rebuilt: 4,
                shadows_detached: 0,
            },
            animators_finished: 1,
            textures_released: 0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            time_factor: 1.0 / 60.0,
        });
        sink.on_frame_summary(&sample_summary());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: PhaseKind::Render,
        });
        tracer.frame_summary(&sample_summary());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_summary(&mut self, s: &FrameSummary) {
                self.frames.push(s.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_summary(&sample_summary());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.frames, &[3]);
    }
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Frame time
//! factors are printed in milliseconds.

use std::io::Write;

use penumbra_core::trace::{
    CanvasRebuildEvent, CompositorKind, FrameBeginEvent, FrameSummary, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, RebuildReason, RenderListEvent, ShadowDetachedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    lines: u64,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer, lines: 0 }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if writeln!(self.writer, "{args}").is_ok() {
            self.lines += 1;
        }
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Render => "render",
        PhaseKind::Animate => "animate",
        PhaseKind::Release => "release",
    }
}

fn compositor_name(kind: CompositorKind) -> &'static str {
    match kind {
        CompositorKind::Lighting => "lighting",
        CompositorKind::Shadow => "shadow",
    }
}

fn reason_name(reason: RebuildReason) -> &'static str {
    match reason {
        RebuildReason::Content => "content",
        RebuildReason::CameraMoved => "camera",
        RebuildReason::AlwaysRefresh => "always",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.line(format_args!(
            "[frame] frame={} dt={:.2}ms",
            e.frame_index,
            e.time_factor * 1000.0,
        ));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.line(format_args!(
            "[phase:begin] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        ));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.line(format_args!(
            "[phase:end] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        ));
    }

    fn on_canvas_rebuild(&mut self, e: &CanvasRebuildEvent) {
        self.line(format_args!(
            "[canvas] frame={} {} {:?} reason={}",
            e.frame_index,
            compositor_name(e.kind),
            e.node,
            reason_name(e.reason),
        ));
    }

    fn on_render_list(&mut self, e: &RenderListEvent) {
        let mode = if e.flattened { "flat" } else { "nested" };
        self.line(format_args!(
            "[list] frame={} {:?} len={} {mode}",
            e.frame_index, e.node, e.len,
        ));
    }

    fn on_shadow_detached(&mut self, e: &ShadowDetachedEvent) {
        self.line(format_args!(
            "[shadow:detach] frame={} layer={:?} caster={:?}",
            e.frame_index, e.layer, e.caster,
        ));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.line(format_args!(
            "[summary] frame={} drawn={} culled={} canvases={} lists={} \
             detached={} animators_done={} released={}",
            s.frame_index,
            s.stats.drawn,
            s.stats.culled,
            s.stats.canvas_rebuilds,
            s.stats.lists_rebuilt,
            s.stats.shadows_detached,
            s.animators_finished,
            s.textures_released,
        ));
    }
}

// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing diagnostics for penumbra.
//!
//! This crate provides a [`TraceSink`](penumbra_core::trace::TraceSink)
//! implementation for development: [`pretty::PrettyPrintSink`] writes one
//! human-readable line per frame-loop event.

pub mod pretty;

// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core reactor, dirty tracking, and resource bookkeeping for the stratabar
//! panel daemon.
//!
//! `stratabar_core` contains every piece of the daemon with real ordering and
//! resource-lifetime hazards, kept free of Wayland protocol types so the whole
//! crate is unit-testable without a compositor. The backend crate supplies the
//! protocol glue; the binary crate supplies sources, configuration, and
//! built-in widgets.
//!
//! # Architecture
//!
//! One wakeup of the event loop flows through the crate like this:
//!
//! ```text
//!   fd readiness ──► Reactor ──► IoHandler::on_read()   (per ready fd)
//!                       │
//!                       └─► BatchHandler::on_batch_processed()
//!                           (once per wakeup, only if any on_read changed state)
//!                               │
//!   Sources::take_dirty() ──► RedrawPlanner ──► pending (panel, output) pairs
//!                               │
//!   BufferPool::acquire() ──► Renderable::draw() ──► present, or defer when
//!                                                    the pool is exhausted
//! ```
//!
//! **[`reactor`]** — fd multiplexing with batch-completion notification. N
//! simultaneous source updates coalesce into exactly one redraw pass.
//!
//! **[`source`]** — named producers of external state with per-name dirty
//! flags, consumed once per batch.
//!
//! **[`pool`]** — `Free`/`InUse` bookkeeping for a fixed set of reusable
//! drawing buffers. Acquisition never blocks; a buffer only returns to `Free`
//! on an explicit release event.
//!
//! **[`output`]** — the `Unnamed → Named` display lifecycle. Outputs become
//! addressable for drawing only after their one-shot naming event.
//!
//! **[`panel`]** — panel and widget configuration, dependency-set dirty
//! checking, and widget layout along a row or column.
//!
//! **[`paint`]** — pixel-buffer drawing context and the [`Renderable`]
//! contract consumed from widget render factories.
//!
//! **[`plan`]** — the pending-draw set and process-wide visibility flag.
//! Failed draws stay pending until one succeeds.
//!
//! [`Renderable`]: paint::Renderable

pub mod output;
pub mod paint;
pub mod panel;
pub mod plan;
pub mod pool;
pub mod reactor;
pub mod source;

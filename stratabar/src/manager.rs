// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The redraw orchestrator.
//!
//! Once per reactor batch the manager drains the dirty-source set and the
//! output add/remove queues, feeds them to the planner, and draws whatever
//! came out pending. A draw that cannot get a buffer is deferred, not
//! dropped; a draw whose output disappeared is dropped. Protocol requests
//! are flushed once at the end of the batch, so however many sources fired
//! in one wakeup the compositor sees one burst.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use stratabar_backend_wayland::Shell;
use stratabar_core::paint::Rgba;
use stratabar_core::panel::PanelConfig;
use stratabar_core::plan::RedrawPlanner;
use stratabar_core::reactor::BatchHandler;
use stratabar_core::source::Sources;

enum DrawOutcome {
    Drawn,
    NoBuffer,
    OutputGone,
}

/// Owns the panel set and drives draws from batch notifications.
pub(crate) struct Manager {
    shell: Rc<RefCell<Shell>>,
    sources: Rc<RefCell<Sources>>,
    panels: Vec<PanelConfig>,
    planner: RedrawPlanner,
}

impl Manager {
    pub(crate) fn new(
        shell: Rc<RefCell<Shell>>,
        sources: Rc<RefCell<Sources>>,
        panels: Vec<PanelConfig>,
    ) -> Self {
        Self {
            shell,
            sources,
            panels,
            planner: RedrawPlanner::new(),
        }
    }

    /// Shows every panel on every matching output and draws immediately.
    pub(crate) fn show(&mut self) {
        let outputs = self.shell.borrow().output_names();
        self.planner.show(&self.panels, &outputs);
        self.flush_draws();
        self.shell.borrow().flush();
    }

    /// Unmaps every panel surface. Idempotent.
    pub(crate) fn hide(&mut self) {
        if !self.planner.hide() {
            return;
        }
        let mut shell = self.shell.borrow_mut();
        shell.hide_all();
        shell.flush();
    }

    /// Show if hidden, hide if shown.
    pub(crate) fn toggle(&mut self) {
        if self.planner.is_visible() {
            self.hide();
        } else {
            self.show();
        }
    }

    fn flush_draws(&mut self) {
        for (panel, output) in self.planner.take_pending() {
            match self.draw_one(panel, &output) {
                DrawOutcome::Drawn => {}
                DrawOutcome::NoBuffer => {
                    debug!(panel, %output, "buffer pool exhausted, deferring draw");
                    self.planner.defer(panel, &output);
                }
                DrawOutcome::OutputGone => {
                    trace!(panel, %output, "skipping draw for a vanished output");
                }
            }
        }
    }

    fn draw_one(&mut self, index: usize, output: &str) -> DrawOutcome {
        let Some(panel) = self.panels.get(index) else {
            warn!(index, "pending draw for an unknown panel");
            return DrawOutcome::OutputGone;
        };
        let mut shell = self.shell.borrow_mut();
        if !shell.has_output(output) {
            return DrawOutcome::OutputGone;
        }
        let Some(surface_size) = shell.slot_size() else {
            return DrawOutcome::OutputGone;
        };
        let Some(slot) = shell.acquire() else {
            return DrawOutcome::NoBuffer;
        };

        let sources = self.sources.borrow();
        let content = {
            let Some(mut ctx) = shell.canvas(slot) else {
                warn!(?slot, "acquired slot has no canvas");
                shell.release(slot);
                return DrawOutcome::OutputGone;
            };
            ctx.clear(Rgba::TRANSPARENT);
            panel.render(output, &sources, &mut ctx)
        };
        if content.is_empty() {
            // Nothing to show; keep the surface as-is and free the slot.
            shell.release(slot);
            return DrawOutcome::Drawn;
        }

        if shell.present(slot, index, panel.anchor, output, surface_size) {
            DrawOutcome::Drawn
        } else {
            shell.release(slot);
            DrawOutcome::OutputGone
        }
    }
}

impl BatchHandler for Manager {
    fn on_batch_processed(&mut self) {
        let dirty = self.sources.borrow_mut().take_dirty();
        let (added, removed, outputs) = {
            let mut shell = self.shell.borrow_mut();
            (shell.drain_added(), shell.drain_removed(), shell.output_names())
        };

        for name in &removed {
            self.planner.note_output_removed(name);
        }
        self.planner.note_dirty_sources(&self.panels, &dirty, &outputs);
        for name in &added {
            self.planner.note_output_added(&self.panels, name);
        }

        if self.planner.pending_len() > 0 {
            trace!(
                dirty = dirty.len(),
                pending = self.planner.pending_len(),
                "batch produced draws"
            );
        }
        self.flush_draws();
        self.shell.borrow().flush();
    }
}

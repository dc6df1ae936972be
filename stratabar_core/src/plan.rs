// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw planning: the pending-draw set and workspace visibility.
//!
//! The planner turns a batch's dirty-source set into pending
//! `(panel, output)` draw pairs and owns the process-wide `Show`/`Hide`
//! state. Two rules shape it:
//!
//! - While hidden, dirty notifications produce no pending draws. Source
//!   state keeps updating underneath, and [`show`](RedrawPlanner::show)
//!   unconditionally marks every panel on every known output so the first
//!   frame after showing reflects current values, not stale ones.
//! - A pair stays pending until a draw actually succeeds. When the buffer
//!   pool is exhausted the caller defers the pair, and it is retried on the
//!   next batch even if its panel did not go dirty again. (The alternative —
//!   clearing dirtiness pipeline-wide regardless of draw outcome — can drop
//!   a one-shot update that coincides with pool exhaustion.)

use std::collections::BTreeSet;

use crate::panel::PanelConfig;

/// Pending-draw bookkeeping for the redraw pipeline.
#[derive(Debug, Default)]
pub struct RedrawPlanner {
    pending: BTreeSet<(usize, String)>,
    visible: bool,
}

impl RedrawPlanner {
    /// Creates a planner; the workspace starts hidden until the first
    /// [`show`](Self::show).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the workspace is currently shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of draws waiting to happen.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feeds one batch's dirty-source set: every panel whose dependency set
    /// intersects `dirty` goes pending on every matching output.
    ///
    /// No-op while hidden; the dirty flags were already consumed by the
    /// caller, and `show` re-establishes a full baseline anyway.
    pub fn note_dirty_sources(
        &mut self,
        panels: &[PanelConfig],
        dirty: &BTreeSet<String>,
        outputs: &[String],
    ) {
        if !self.visible || dirty.is_empty() {
            return;
        }
        for panel in panels {
            if !panel.is_dirty(dirty) {
                continue;
            }
            for output in outputs {
                if panel.matches_output(output) {
                    self.pending.insert((panel.index, output.clone()));
                }
            }
        }
    }

    /// A new output was named: every matching panel goes pending on it.
    pub fn note_output_added(&mut self, panels: &[PanelConfig], output: &str) {
        if !self.visible {
            return;
        }
        for panel in panels {
            if panel.matches_output(output) {
                self.pending.insert((panel.index, output.to_owned()));
            }
        }
    }

    /// An output went away: nothing further to draw on it.
    pub fn note_output_removed(&mut self, output: &str) {
        self.pending.retain(|(_, name)| name != output);
    }

    /// Hides the workspace, dropping pending draws. Returns whether the
    /// visibility actually changed; repeated calls are safe.
    pub fn hide(&mut self) -> bool {
        let was_visible = self.visible;
        self.visible = false;
        self.pending.clear();
        was_visible
    }

    /// Shows the workspace: every panel goes pending once on every matching
    /// known output, establishing a consistent baseline. Safe to call
    /// repeatedly; each call re-marks the full set.
    pub fn show(&mut self, panels: &[PanelConfig], outputs: &[String]) {
        self.visible = true;
        for panel in panels {
            for output in outputs {
                if panel.matches_output(output) {
                    self.pending.insert((panel.index, output.clone()));
                }
            }
        }
    }

    /// Drains the pending set for this batch. Pairs whose draw fails must be
    /// put back with [`defer`](Self::defer).
    pub fn take_pending(&mut self) -> Vec<(usize, String)> {
        let drained = std::mem::take(&mut self.pending);
        drained.into_iter().collect()
    }

    /// Re-queues a pair whose draw was skipped (e.g. pool exhaustion).
    pub fn defer(&mut self, panel: usize, output: &str) {
        self.pending.insert((panel, output.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{Anchor, Direction, WidgetConfig};
    use crate::paint::{DrawContext, Renderable, Size};

    struct Nothing;

    impl Renderable for Nothing {
        fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
            Size::default()
        }

        fn draw(&self, _ctx: &mut DrawContext<'_>, _x: i32, _y: i32) {}
    }

    fn panel(index: usize, deps: &[&str], outputs: &'static [&'static str]) -> PanelConfig {
        PanelConfig {
            index,
            anchor: Anchor::Top,
            direction: Direction::Row,
            widgets: vec![WidgetConfig {
                render: Box::new(|_, _| Box::new(Nothing)),
                on_click: None,
                sources: deps.iter().map(|name| (*name).to_owned()).collect(),
            }],
            check_display: Box::new(move |name| {
                outputs.contains(&"*") || outputs.contains(&name)
            }),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    fn dirty(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn hidden_workspace_produces_no_draws_until_show() {
        let panels = vec![panel(0, &["time"], &["*"])];
        let outputs = names(&["DP-1", "DP-2"]);
        let mut planner = RedrawPlanner::new();

        planner.note_dirty_sources(&panels, &dirty(&["time"]), &outputs);
        assert_eq!(planner.pending_len(), 0, "hidden: dirty event ignored");

        planner.show(&panels, &outputs);
        assert_eq!(
            planner.take_pending().len(),
            2,
            "show marks one draw per panel per known output"
        );
    }

    #[test]
    fn two_sources_in_one_batch_coalesce_into_one_draw_per_target() {
        let panels = vec![panel(0, &["power", "network"], &["*"])];
        let outputs = names(&["DP-1"]);
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &outputs);
        let _ = planner.take_pending();

        planner.note_dirty_sources(&panels, &dirty(&["power", "network"]), &outputs);
        assert_eq!(
            planner.take_pending(),
            vec![(0, "DP-1".to_owned())],
            "combined dirty set yields a single pending pair"
        );
    }

    #[test]
    fn deferred_draws_survive_into_the_next_batch() {
        let panels = vec![panel(0, &["time"], &["*"])];
        let outputs = names(&["DP-1", "DP-2", "DP-3"]);
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &outputs);

        // Pool of two: the third output's draw is skipped and deferred.
        let pending = planner.take_pending();
        assert_eq!(pending.len(), 3, "all three outputs pending");
        planner.defer(0, "DP-3");

        assert_eq!(
            planner.take_pending(),
            vec![(0, "DP-3".to_owned())],
            "the skipped draw is retried even without new dirtiness"
        );
    }

    #[test]
    fn output_predicate_limits_fanout() {
        let panels = vec![panel(0, &["time"], &["DP-1"]), panel(1, &["time"], &["*"])];
        let outputs = names(&["DP-1", "HDMI-A-1"]);
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &outputs);

        let pending = planner.take_pending();
        assert!(
            pending.contains(&(0, "DP-1".to_owned())),
            "panel 0 on its selected output"
        );
        assert!(
            !pending.contains(&(0, "HDMI-A-1".to_owned())),
            "panel 0 skips non-matching output"
        );
        assert_eq!(pending.len(), 3, "panel 1 fans out to both");
    }

    #[test]
    fn removed_output_is_forgotten() {
        let panels = vec![panel(0, &["time"], &["*"])];
        let outputs = names(&["DP-1", "DP-2"]);
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &outputs);

        planner.note_output_removed("DP-2");
        assert_eq!(
            planner.take_pending(),
            vec![(0, "DP-1".to_owned())],
            "pending draws for the removed output dropped"
        );
    }

    #[test]
    fn hide_is_idempotent_and_drops_pending() {
        let panels = vec![panel(0, &["time"], &["*"])];
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &names(&["DP-1"]));

        assert!(planner.hide(), "first hide changes state");
        assert!(!planner.hide(), "second hide is a no-op");
        assert_eq!(planner.pending_len(), 0, "pending dropped on hide");
    }

    #[test]
    fn newly_named_output_gets_a_baseline_draw() {
        let panels = vec![panel(0, &["time"], &["*"])];
        let mut planner = RedrawPlanner::new();
        planner.show(&panels, &[]);
        let _ = planner.take_pending();

        planner.note_output_added(&panels, "eDP-1");
        assert_eq!(
            planner.take_pending(),
            vec![(0, "eDP-1".to_owned())],
            "late output is painted as soon as it is named"
        );
    }
}

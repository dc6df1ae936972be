// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Panel and widget configuration, dirty checking, and widget layout.
//!
//! A panel declares its widgets, the screen edge it anchors to, a layout
//! direction, and an output-selection predicate. A widget declares a render
//! factory and the set of source names it depends on; that dependency set is
//! the unit of dirty-checking granularity. Configuration is immutable after
//! load and referenced, never owned, by the redraw machinery.

use std::collections::BTreeSet;
use std::fmt;

use crate::paint::{DrawContext, Renderable, Size};
use crate::source::Sources;

/// The screen edge a panel is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Pinned to the top edge.
    Top,
    /// Pinned to the bottom edge.
    Bottom,
    /// Pinned to the left edge.
    Left,
    /// Pinned to the right edge.
    Right,
}

/// Main-axis direction for widget layout within a panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Widgets side by side.
    Row,
    /// Widgets stacked vertically.
    Column,
}

/// Builds a widget's renderable tree for one output.
///
/// Called at draw time with the output name and the current source values, so
/// a widget can render per-output content without caching state of its own.
pub type RenderFactory = Box<dyn Fn(&str, &Sources) -> Box<dyn Renderable>>;

/// One widget in a panel.
pub struct WidgetConfig {
    /// Render factory producing the widget's tree.
    pub render: RenderFactory,
    /// Optional click handler. Pointer wiring lives outside the core.
    pub on_click: Option<Box<dyn Fn()>>,
    /// Source names this widget depends on.
    pub sources: BTreeSet<String>,
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("sources", &self.sources)
            .field("has_click", &self.on_click.is_some())
            .finish()
    }
}

/// One configured panel.
pub struct PanelConfig {
    /// Stable index; keys the per-output surface cache.
    pub index: usize,
    /// Anchored screen edge.
    pub anchor: Anchor,
    /// Widget layout direction.
    pub direction: Direction,
    /// The panel's widgets, in layout order.
    pub widgets: Vec<WidgetConfig>,
    /// Output-selection predicate over output names.
    pub check_display: Box<dyn Fn(&str) -> bool>,
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("index", &self.index)
            .field("anchor", &self.anchor)
            .field("direction", &self.direction)
            .field("widgets", &self.widgets)
            .finish()
    }
}

/// Gap between adjacent widgets, in pixels.
const WIDGET_GAP: u32 = 8;

impl PanelConfig {
    /// Whether this panel must be redrawn given the cycle's dirty names: true
    /// iff any widget's dependency set intersects `dirty`.
    #[must_use]
    pub fn is_dirty(&self, dirty: &BTreeSet<String>) -> bool {
        self.widgets
            .iter()
            .any(|widget| widget.sources.intersection(dirty).next().is_some())
    }

    /// Whether the panel wants to appear on the named output.
    #[must_use]
    pub fn matches_output(&self, output_name: &str) -> bool {
        (self.check_display)(output_name)
    }

    /// Renders every widget into `ctx`, laid out along [`Self::direction`],
    /// and returns the panel's overall size.
    ///
    /// Widgets that measure to an empty size are skipped entirely.
    pub fn render(&self, output_name: &str, sources: &Sources, ctx: &mut DrawContext<'_>) -> Size {
        let mut items: Vec<(Box<dyn Renderable>, Size)> = Vec::new();
        for widget in &self.widgets {
            let mut item = (widget.render)(output_name, sources);
            let size = item.compute(ctx);
            if !size.is_empty() {
                items.push((item, size));
            }
        }

        let mut main_offset = 0_u32;
        let mut cross_extent = 0_u32;
        for (index, (item, size)) in items.iter().enumerate() {
            if index > 0 {
                main_offset += WIDGET_GAP;
            }
            let (x, y) = match self.direction {
                Direction::Row => (main_offset, 0),
                Direction::Column => (0, main_offset),
            };
            item.draw(ctx, x.cast_signed(), y.cast_signed());
            match self.direction {
                Direction::Row => {
                    main_offset += size.width;
                    cross_extent = cross_extent.max(size.height);
                }
                Direction::Column => {
                    main_offset += size.height;
                    cross_extent = cross_extent.max(size.width);
                }
            }
        }

        if items.is_empty() {
            return Size::default();
        }
        match self.direction {
            Direction::Row => Size::new(main_offset, cross_extent),
            Direction::Column => Size::new(cross_extent, main_offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Rgba;

    struct FixedBlock {
        size: Size,
        color: Rgba,
    }

    impl Renderable for FixedBlock {
        fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
            self.size
        }

        fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
            ctx.fill_rect(x, y, self.size.width, self.size.height, self.color);
        }
    }

    fn block_widget(width: u32, height: u32, sources: &[&str]) -> WidgetConfig {
        WidgetConfig {
            render: Box::new(move |_, _| {
                Box::new(FixedBlock {
                    size: Size::new(width, height),
                    color: Rgba::rgb(255, 255, 255),
                })
            }),
            on_click: None,
            sources: sources.iter().map(|name| (*name).to_owned()).collect(),
        }
    }

    fn panel(widgets: Vec<WidgetConfig>, direction: Direction) -> PanelConfig {
        PanelConfig {
            index: 0,
            anchor: Anchor::Top,
            direction,
            widgets,
            check_display: Box::new(|_| true),
        }
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn dirtiness_is_dependency_set_intersection() {
        let panel = panel(
            vec![
                block_widget(1, 1, &["time", "date"]),
                block_widget(1, 1, &["power"]),
            ],
            Direction::Row,
        );

        assert!(panel.is_dirty(&names(&["power"])), "overlapping set");
        assert!(
            panel.is_dirty(&names(&["time", "date", "power", "network"])),
            "superset"
        );
        assert!(!panel.is_dirty(&names(&["network"])), "disjoint set");
        assert!(!panel.is_dirty(&names(&[])), "empty dirty set");
    }

    #[test]
    fn row_layout_sums_widths_and_takes_max_height() {
        let panel = panel(
            vec![block_widget(10, 4, &[]), block_widget(6, 8, &[])],
            Direction::Row,
        );
        let sources = Sources::new();
        let mut pixels = vec![0_u8; 32 * 16 * 4];
        let mut ctx = DrawContext::new(&mut pixels, 32, 16);

        let size = panel.render("DP-1", &sources, &mut ctx);

        assert_eq!(size, Size::new(10 + 8 + 6, 8), "widths + gap, max height");
        assert_eq!(
            ctx.pixel(0, 0),
            Some([255, 255, 255, 255]),
            "first widget drawn at origin"
        );
        assert_eq!(ctx.pixel(10, 0), Some([0, 0, 0, 0]), "gap left blank");
        assert_eq!(
            ctx.pixel(18, 7),
            Some([255, 255, 255, 255]),
            "second widget drawn after gap"
        );
    }

    #[test]
    fn column_layout_sums_heights() {
        let panel = panel(
            vec![block_widget(4, 10, &[]), block_widget(8, 6, &[])],
            Direction::Column,
        );
        let sources = Sources::new();
        let mut pixels = vec![0_u8; 16 * 32 * 4];
        let mut ctx = DrawContext::new(&mut pixels, 16, 32);

        let size = panel.render("DP-1", &sources, &mut ctx);
        assert_eq!(size, Size::new(8, 10 + 8 + 6), "max width, heights + gap");
    }

    #[test]
    fn empty_widgets_render_nothing() {
        let panel = panel(vec![block_widget(0, 0, &[])], Direction::Row);
        let sources = Sources::new();
        let mut pixels = vec![0_u8; 8 * 8 * 4];
        let mut ctx = DrawContext::new(&mut pixels, 8, 8);

        assert_eq!(
            panel.render("DP-1", &sources, &mut ctx),
            Size::default(),
            "panel with nothing to show reports empty"
        );
    }
}

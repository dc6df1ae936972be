// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in widget renderables.
//!
//! The daemon ships a deliberately small widget set drawn with plain
//! rectangles: a seven-segment clock, a battery gauge, and per-interface
//! network indicators. A widget renders whatever value its source last
//! published; a missing or mismatched value renders as empty, which the
//! panel layout then skips.

use stratabar_core::paint::{DrawContext, Renderable, Rgba, Size};
use stratabar_core::panel::RenderFactory;
use stratabar_core::source::{SourceValue, Sources};

/// Segment thickness in pixels; every glyph metric derives from it.
const SEG: u32 = 3;
const DIGIT_WIDTH: u32 = 5 * SEG;
const DIGIT_HEIGHT: u32 = 9 * SEG;
const GLYPH_GAP: u32 = SEG;

// Segment bits, top clockwise to middle: A B C D E F G.
const SEG_A: u8 = 1 << 0;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

fn segments_for(digit: u32) -> u8 {
    match digit {
        0 => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
        1 => SEG_B | SEG_C,
        2 => SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
        3 => SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
        4 => SEG_F | SEG_G | SEG_B | SEG_C,
        5 => SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
        6 => SEG_A | SEG_F | SEG_G | SEG_E | SEG_C | SEG_D,
        7 => SEG_A | SEG_B | SEG_C,
        8 => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        _ => SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
    }
}

/// Seven-segment rendering of a digit string; `:` and space pass through as
/// narrow glyphs, anything else renders as a blank digit cell.
pub(crate) struct SevenSegment {
    text: String,
    color: Rgba,
}

impl SevenSegment {
    pub(crate) fn new(text: impl Into<String>, color: Rgba) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    fn glyph_width(ch: char) -> u32 {
        match ch {
            ':' | ' ' => 2 * SEG,
            _ => DIGIT_WIDTH,
        }
    }

    fn draw_digit(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32, digit: u32) {
        let lit = segments_for(digit);
        let w = DIGIT_WIDTH;
        let h = DIGIT_HEIGHT;
        let mid = (h - SEG) / 2;
        if lit & SEG_A != 0 {
            ctx.fill_rect(x, y, w, SEG, self.color);
        }
        if lit & SEG_B != 0 {
            ctx.fill_rect(x + (w - SEG).cast_signed(), y, SEG, mid + SEG, self.color);
        }
        if lit & SEG_C != 0 {
            ctx.fill_rect(
                x + (w - SEG).cast_signed(),
                y + mid.cast_signed(),
                SEG,
                h - mid,
                self.color,
            );
        }
        if lit & SEG_D != 0 {
            ctx.fill_rect(x, y + (h - SEG).cast_signed(), w, SEG, self.color);
        }
        if lit & SEG_E != 0 {
            ctx.fill_rect(x, y + mid.cast_signed(), SEG, h - mid, self.color);
        }
        if lit & SEG_F != 0 {
            ctx.fill_rect(x, y, SEG, mid + SEG, self.color);
        }
        if lit & SEG_G != 0 {
            ctx.fill_rect(x, y + mid.cast_signed(), w, SEG, self.color);
        }
    }

    fn draw_colon(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
        let third = (DIGIT_HEIGHT / 3).cast_signed();
        ctx.fill_rect(x, y + third, SEG, SEG, self.color);
        ctx.fill_rect(x, y + 2 * third, SEG, SEG, self.color);
    }
}

impl Renderable for SevenSegment {
    fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
        let mut width = 0_u32;
        let mut count = 0_u32;
        for ch in self.text.chars() {
            width += Self::glyph_width(ch);
            count += 1;
        }
        if count == 0 {
            return Size::default();
        }
        Size::new(width + GLYPH_GAP * (count - 1), DIGIT_HEIGHT)
    }

    fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
        let mut cursor = x;
        for ch in self.text.chars() {
            match ch {
                ':' => self.draw_colon(ctx, cursor, y),
                ' ' => {}
                _ => {
                    if let Some(digit) = ch.to_digit(10) {
                        self.draw_digit(ctx, cursor, y, digit);
                    }
                }
            }
            cursor += (Self::glyph_width(ch) + GLYPH_GAP).cast_signed();
        }
    }
}

const GAUGE_WIDTH: u32 = 30;
const GAUGE_HEIGHT: u32 = 14;
const GAUGE_BORDER: u32 = 2;

/// Horizontal battery gauge; the fill tracks capacity, the fill color flips
/// while charging.
pub(crate) struct Gauge {
    capacity: u8,
    charging: bool,
    color: Rgba,
    charge_color: Rgba,
}

impl Gauge {
    pub(crate) fn new(capacity: u8, charging: bool, color: Rgba) -> Self {
        Self {
            capacity: capacity.min(100),
            charging,
            color,
            charge_color: Rgba::rgb(240, 200, 60),
        }
    }

    pub(crate) fn fill_width(capacity: u8) -> u32 {
        let inner = GAUGE_WIDTH - 2 * GAUGE_BORDER;
        inner * u32::from(capacity.min(100)) / 100
    }
}

impl Renderable for Gauge {
    fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
        Size::new(GAUGE_WIDTH + GAUGE_BORDER, GAUGE_HEIGHT)
    }

    fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
        let border = GAUGE_BORDER.cast_signed();
        // Outline.
        ctx.fill_rect(x, y, GAUGE_WIDTH, GAUGE_BORDER, self.color);
        ctx.fill_rect(
            x,
            y + (GAUGE_HEIGHT - GAUGE_BORDER).cast_signed(),
            GAUGE_WIDTH,
            GAUGE_BORDER,
            self.color,
        );
        ctx.fill_rect(x, y, GAUGE_BORDER, GAUGE_HEIGHT, self.color);
        ctx.fill_rect(
            x + (GAUGE_WIDTH - GAUGE_BORDER).cast_signed(),
            y,
            GAUGE_BORDER,
            GAUGE_HEIGHT,
            self.color,
        );
        // Terminal nub.
        ctx.fill_rect(
            x + GAUGE_WIDTH.cast_signed(),
            y + (GAUGE_HEIGHT / 3).cast_signed(),
            GAUGE_BORDER,
            GAUGE_HEIGHT / 3,
            self.color,
        );
        let fill = if self.charging {
            self.charge_color
        } else {
            self.color
        };
        ctx.fill_rect(
            x + border,
            y + border,
            Self::fill_width(self.capacity),
            GAUGE_HEIGHT - 2 * GAUGE_BORDER,
            fill,
        );
    }
}

const DOT: u32 = 8;
const DOT_GAP: u32 = 4;

/// One filled square per active item, e.g. network interfaces.
pub(crate) struct Indicator {
    count: u32,
    color: Rgba,
}

impl Indicator {
    pub(crate) fn new(count: usize, color: Rgba) -> Self {
        Self {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            color,
        }
    }
}

impl Renderable for Indicator {
    fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
        if self.count == 0 {
            return Size::default();
        }
        Size::new(self.count * DOT + (self.count - 1) * DOT_GAP, DOT)
    }

    fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
        for index in 0..self.count {
            let dx = (index * (DOT + DOT_GAP)).cast_signed();
            ctx.fill_rect(x + dx, y, DOT, DOT, self.color);
        }
    }
}

/// Fixed colored block, usable as a separator or marker.
pub(crate) struct Block {
    size: Size,
    color: Rgba,
}

impl Renderable for Block {
    fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
        self.size
    }

    fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32) {
        ctx.fill_rect(x, y, self.size.width, self.size.height, self.color);
    }
}

struct Blank;

impl Renderable for Blank {
    fn compute(&mut self, _ctx: &DrawContext<'_>) -> Size {
        Size::default()
    }

    fn draw(&self, _ctx: &mut DrawContext<'_>, _x: i32, _y: i32) {}
}

fn text_of(sources: &Sources, name: &str) -> Option<String> {
    match sources.get(name)? {
        SourceValue::Text(text) => Some(text.clone()),
        _ => None,
    }
}

/// Clock factory: renders the text the named source last published.
pub(crate) fn clock(source: String, color: Rgba) -> RenderFactory {
    Box::new(move |_, sources| match text_of(sources, &source) {
        Some(text) => Box::new(SevenSegment::new(text, color)),
        None => Box::new(Blank),
    })
}

/// Battery factory over a `Power` source value.
pub(crate) fn battery(source: String, color: Rgba) -> RenderFactory {
    Box::new(move |_, sources| match sources.get(&source) {
        Some(SourceValue::Power {
            charging, capacity, ..
        }) => Box::new(Gauge::new(*capacity, *charging, color)),
        _ => Box::new(Blank),
    })
}

/// Network factory: one indicator dot per active interface.
pub(crate) fn network(source: String, color: Rgba) -> RenderFactory {
    Box::new(move |_, sources| match sources.get(&source) {
        Some(SourceValue::Networks(names)) => Box::new(Indicator::new(names.len(), color)),
        _ => Box::new(Blank),
    })
}

/// Static block factory.
pub(crate) fn block(width: u32, height: u32, color: Rgba) -> RenderFactory {
    Box::new(move |_, _| {
        Box::new(Block {
            size: Size::new(width, height),
            color,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(width: u32, height: u32) -> Vec<u8> {
        vec![0_u8; width as usize * height as usize * 4]
    }

    #[test]
    fn digit_one_lights_only_the_right_side() {
        let mut pixels = canvas(DIGIT_WIDTH, DIGIT_HEIGHT);
        let mut ctx = DrawContext::new(&mut pixels, DIGIT_WIDTH, DIGIT_HEIGHT);
        let glyph = SevenSegment::new("1", Rgba::rgb(255, 255, 255));
        glyph.draw(&mut ctx, 0, 0);

        assert_eq!(
            ctx.pixel(DIGIT_WIDTH - 1, 0),
            Some([255, 255, 255, 255]),
            "top-right segment lit"
        );
        assert_eq!(ctx.pixel(0, 0), Some([0, 0, 0, 0]), "top-left dark");
        assert_eq!(
            ctx.pixel(DIGIT_WIDTH / 2, DIGIT_HEIGHT - 1),
            Some([0, 0, 0, 0]),
            "bottom bar dark"
        );
    }

    #[test]
    fn clock_width_counts_glyphs_and_gaps() {
        let mut pixels = canvas(128, DIGIT_HEIGHT);
        let ctx = DrawContext::new(&mut pixels, 128, DIGIT_HEIGHT);
        let mut glyph = SevenSegment::new("12:45", Rgba::rgb(255, 255, 255));

        let size = glyph.compute(&ctx);
        let expected = 4 * DIGIT_WIDTH + 2 * SEG + 4 * GLYPH_GAP;
        assert_eq!(size, Size::new(expected, DIGIT_HEIGHT), "four digits + colon");
    }

    #[test]
    fn gauge_fill_tracks_capacity() {
        assert_eq!(Gauge::fill_width(0), 0, "empty");
        assert_eq!(
            Gauge::fill_width(100),
            GAUGE_WIDTH - 2 * GAUGE_BORDER,
            "full"
        );
        assert_eq!(
            Gauge::fill_width(50),
            (GAUGE_WIDTH - 2 * GAUGE_BORDER) / 2,
            "half"
        );
        assert_eq!(Gauge::fill_width(200), Gauge::fill_width(100), "clamped");
    }

    #[test]
    fn missing_source_value_renders_empty() {
        let sources = Sources::new();
        let factory = clock("time".to_owned(), Rgba::rgb(255, 255, 255));
        let mut pixels = canvas(8, 8);
        let ctx = DrawContext::new(&mut pixels, 8, 8);

        let mut widget = factory("DP-1", &sources);
        assert_eq!(widget.compute(&ctx), Size::default(), "blank until published");
    }

    #[test]
    fn indicator_size_scales_with_count() {
        let mut pixels = canvas(64, 8);
        let ctx = DrawContext::new(&mut pixels, 64, 8);
        assert_eq!(
            Indicator::new(2, Rgba::rgb(0, 255, 0)).compute(&ctx),
            Size::new(2 * DOT + DOT_GAP, DOT),
            "two dots, one gap"
        );
        assert_eq!(
            Indicator::new(0, Rgba::rgb(0, 255, 0)).compute(&ctx),
            Size::default(),
            "no active entries, no footprint"
        );
    }
}

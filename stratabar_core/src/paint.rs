// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-buffer paint primitives and the widget render contract.
//!
//! Rendering internals (text shaping, flex measurement) live outside the
//! daemon; widgets are consumed through [`Renderable`]: `compute` measures,
//! `draw` paints. Both are pure with respect to the reactor — no I/O.
//!
//! [`DrawContext`] wraps one buffer-pool slot: a tightly packed ARGB8888
//! little-endian pixel region (`[b, g, r, a]` byte order) with premultiplied
//! alpha, the format the shared-memory backend allocates.

/// Pixel dimensions of a drawn region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An RGBA color with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 255 is opaque.
    pub a: u8,
}

/// Color parsing failure.
#[derive(Debug, thiserror::Error)]
#[error("invalid color `{0}`, expected #rrggbb or #rrggbbaa")]
pub struct ColorParseError(String);

impl Rgba {
    /// Fully transparent black, the clear color for panel backgrounds.
    pub const TRANSPARENT: Self = Self::rgb(0, 0, 0).with_alpha(0);

    /// Opaque color from components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        let channel = |index: usize| -> Result<u8, ColorParseError> {
            let pair = digits
                .get(index * 2..index * 2 + 2)
                .ok_or_else(|| ColorParseError(text.to_owned()))?;
            u8::from_str_radix(pair, 16).map_err(|_| ColorParseError(text.to_owned()))
        };
        match digits.len() {
            6 => Ok(Self::rgb(channel(0)?, channel(1)?, channel(2)?)),
            8 => Ok(Self::rgb(channel(0)?, channel(1)?, channel(2)?).with_alpha(channel(3)?)),
            _ => Err(ColorParseError(text.to_owned())),
        }
    }

    /// Premultiplied ARGB8888 little-endian bytes: `[b, g, r, a]`.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        let premultiply = |channel: u8| -> u8 {
            let scaled = u16::from(channel) * u16::from(self.a) / 255;
            // scaled <= 255 by construction
            scaled as u8
        };
        [
            premultiply(self.b),
            premultiply(self.g),
            premultiply(self.r),
            self.a,
        ]
    }
}

const BYTES_PER_PIXEL: usize = 4;

/// Drawing target over one pool slot's pixel memory.
pub struct DrawContext<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<'a> DrawContext<'a> {
    /// Wraps a tightly packed `width × height` ARGB8888 region.
    ///
    /// # Panics
    ///
    /// Panics if the slice length does not match the dimensions; slot
    /// geometry is computed by the same backend that maps the memory, so a
    /// mismatch is a programming error.
    #[must_use]
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * BYTES_PER_PIXEL,
            "pixel slice must match dimensions"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Buffer width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fills the whole buffer with `color`.
    pub fn clear(&mut self, color: Rgba) {
        let bytes = color.to_bytes();
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Fills an axis-aligned rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
        let bytes = color.to_bytes();
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = x
            .saturating_add_unsigned(width)
            .clamp(0, self.width as i32) as u32;
        let y1 = y
            .saturating_add_unsigned(height)
            .clamp(0, self.height as i32) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for row in y0..y1 {
            let start = (row * self.width + x0) as usize * BYTES_PER_PIXEL;
            let end = (row * self.width + x1) as usize * BYTES_PER_PIXEL;
            for pixel in self.pixels[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&bytes);
            }
        }
    }

    /// Reads back one pixel; test support.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) as usize * BYTES_PER_PIXEL;
        self.pixels[start..start + BYTES_PER_PIXEL]
            .try_into()
            .ok()
    }
}

/// A drawable widget tree, supplied by widget render factories.
///
/// `compute` measures the tree against the target buffer and may cache
/// layout; `draw` paints at the given origin. Neither performs I/O.
pub trait Renderable {
    /// Measures the tree; returns its size.
    fn compute(&mut self, ctx: &DrawContext<'_>) -> Size;

    /// Draws the tree with its top-left corner at `(x, y)`.
    fn draw(&self, ctx: &mut DrawContext<'_>, x: i32, y: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_and_eight_digit_colors() {
        assert_eq!(Rgba::parse("#10a0ff").expect("rgb"), Rgba::rgb(16, 160, 255));
        assert_eq!(
            Rgba::parse("10a0ff80").expect("rgba"),
            Rgba::rgb(16, 160, 255).with_alpha(128)
        );
        assert!(Rgba::parse("#123").is_err(), "short form rejected");
        assert!(Rgba::parse("#zzzzzz").is_err(), "non-hex rejected");
    }

    #[test]
    fn color_bytes_are_premultiplied_little_endian_argb() {
        assert_eq!(Rgba::rgb(1, 2, 3).to_bytes(), [3, 2, 1, 255]);
        assert_eq!(
            Rgba::rgb(200, 100, 50).with_alpha(0).to_bytes(),
            [0, 0, 0, 0],
            "zero alpha premultiplies all channels to zero"
        );
    }

    #[test]
    fn fill_rect_clips_to_the_buffer() {
        let mut pixels = vec![0_u8; 4 * 4 * 4];
        let mut ctx = DrawContext::new(&mut pixels, 4, 4);
        ctx.fill_rect(-2, -2, 4, 4, Rgba::rgb(255, 0, 0));

        assert_eq!(ctx.pixel(0, 0), Some([0, 0, 255, 255]), "inside painted");
        assert_eq!(ctx.pixel(2, 2), Some([0, 0, 0, 0]), "outside untouched");
        // Entirely out of bounds must not panic.
        ctx.fill_rect(10, 10, 5, 5, Rgba::rgb(0, 255, 0));
    }

    #[test]
    fn clear_covers_every_pixel() {
        let mut pixels = vec![7_u8; 2 * 2 * 4];
        let mut ctx = DrawContext::new(&mut pixels, 2, 2);
        ctx.clear(Rgba::TRANSPARENT);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(ctx.pixel(x, y), Some([0, 0, 0, 0]), "cleared");
            }
        }
    }
}

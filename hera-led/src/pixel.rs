use serde::{Deserialize, Serialize};

use crate::error::{HeraError, Result};

/// A single 24-bit colour sample. There is no alpha channel.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Running per-channel sum. Wide enough for any block a `u32` sized image can
/// produce.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RgbSum {
    red: u64,
    green: u64,
    blue: u64,
}

impl RgbSum {
    #[inline]
    pub(crate) fn add(&mut self, px: Rgb) {
        self.red += px.red as u64;
        self.green += px.green as u64;
        self.blue += px.blue as u64;
    }

    /// Truncating average. `count` must be non-zero.
    #[inline]
    pub(crate) fn average(&self, count: u64) -> Rgb {
        Rgb {
            red: (self.red / count) as u8,
            green: (self.green / count) as u8,
            blue: (self.blue / count) as u8,
        }
    }
}

/// A dense, row-major image. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Wrap a pixel buffer. The buffer length must be exactly `width * height`
    /// and neither dimension may be zero.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(HeraError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A grid of a single colour
    pub fn filled(width: usize, height: usize, colour: Rgb) -> Result<Self> {
        Self::new(width, height, vec![colour; width * height])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Get the pixel at `x`, `y`, or `None` if outside the image
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Iterate rows from the top of the image down
    pub fn rows(&self) -> std::slice::Chunks<'_, Rgb> {
        self.pixels.chunks(self.width)
    }

    pub fn into_pixels(self) -> Vec<Rgb> {
        self.pixels
    }
}

//! Turn a 24-bit bitmap into per-LED colours for the HERA display.
//!
//! The image is averaged down to a fixed grid, then each LED takes the mean of
//! the grid cells it sits over.

use std::io::Read;

use log::{debug, info};

/// 24-bit uncompressed BMP reading and writing
pub mod bitmap;
pub use bitmap::{Bitmap, BitmapInfo, RowOrder};

mod pixel;
pub use pixel::*;

mod downscale;
pub use downscale::*;

/// Where each LED sits on the downscaled grid
pub mod layout;
pub use layout::{LedFootprint, LedIndex, LedLayout};

mod aggregate;
pub use aggregate::*;

pub mod csv;

/// Base errors that are possible
pub mod error;
use error::Result;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything produced by one run of the pipeline
#[derive(Debug, Clone)]
pub struct Conversion {
    downscaled: Bitmap,
    leds: LedColours,
}

impl Conversion {
    #[inline]
    pub fn leds(&self) -> &LedColours {
        &self.leds
    }

    /// The intermediate grid, with header fields carried over from the source
    #[inline]
    pub fn downscaled(&self) -> &Bitmap {
        &self.downscaled
    }

    /// The intermediate grid encoded as a bitmap file
    pub fn downscaled_bmp(&self) -> Vec<u8> {
        self.downscaled.to_bytes()
    }

    pub fn csv(&self) -> String {
        self.leds.to_csv()
    }
}

/// Run the whole pipeline on an in-memory bitmap using the HERA layout
pub fn convert(source: &[u8]) -> Result<Conversion> {
    let layout = LedLayout::hera()?;
    convert_with(&mut std::io::Cursor::new(source), &layout)
}

/// Run the whole pipeline reading the bitmap from `reader`. Each stage is
/// complete before the next starts and any failure discards everything.
pub fn convert_with<R: Read>(reader: &mut R, layout: &LedLayout) -> Result<Conversion> {
    let source = Bitmap::read_from(reader)?;
    let info = *source.info();
    info!(
        "Read {}x{} bitmap",
        source.pixels().width(),
        source.pixels().height()
    );

    let grid = downscale(source.into_pixels())?;
    let leds = aggregate(&grid, layout)?;
    debug!("Averaged {} LEDs", leds.as_slice().len());

    Ok(Conversion {
        downscaled: Bitmap::from_grid(grid, Some(&info)),
        leds,
    })
}

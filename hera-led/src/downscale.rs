use log::{debug, warn};

use crate::error::{HeraError, Result};
use crate::layout::{GRID_HEIGHT, GRID_WIDTH};
use crate::pixel::{PixelGrid, RgbSum};

/// Reduce `source` to the `GRID_WIDTH` x `GRID_HEIGHT` grid the LED layout is
/// defined on
#[inline]
pub fn downscale(source: PixelGrid) -> Result<PixelGrid> {
    downscale_to(source, GRID_WIDTH, GRID_HEIGHT)
}

/// Reduce `source` to `width` x `height` by averaging equal sized blocks.
///
/// Each output pixel is the truncated mean of a `source.width() / width` by
/// `source.height() / height` block. When the source is not an exact multiple
/// of the target the leftover columns on the right and rows at the bottom are
/// not sampled at all. Rows are in image order (top first) whatever order the
/// source file stored them in, so a bottom-up file also loses its visual
/// bottom rows, not the first rows stored.
pub fn downscale_to(source: PixelGrid, width: usize, height: usize) -> Result<PixelGrid> {
    let invalid = HeraError::InvalidDimensions {
        width: source.width() as i64,
        height: source.height() as i64,
    };
    if width == 0 || height == 0 {
        return Err(invalid);
    }
    let px_columns = source.width() / width;
    let px_rows = source.height() / height;
    if px_columns == 0 || px_rows == 0 {
        return Err(invalid);
    }

    let dropped_x = source.width() % width;
    let dropped_y = source.height() % height;
    if dropped_x != 0 || dropped_y != 0 {
        warn!(
            "{}x{} is not a multiple of {width}x{height}, ignoring {dropped_x} columns and \
             {dropped_y} rows",
            source.width(),
            source.height()
        );
    }
    debug!("downscale blocks of {px_columns}x{px_rows}");

    let block_len = (px_columns * px_rows) as u64;
    let mut out = Vec::with_capacity(width * height);
    let mut sums = vec![RgbSum::default(); width];

    for band in source.rows().take(px_rows * height).collect::<Vec<_>>().chunks(px_rows) {
        for row in band {
            for (column, px) in row[..px_columns * width].iter().enumerate() {
                sums[column / px_columns].add(*px);
            }
        }
        out.extend(sums.iter().map(|sum| sum.average(block_len)));
        sums.iter_mut().for_each(|sum| *sum = RgbSum::default());
    }

    PixelGrid::new(width, height, out)
}

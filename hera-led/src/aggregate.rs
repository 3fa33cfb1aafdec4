use std::io::Write;

use crate::error::{HeraError, Result, TableIssue};
use crate::layout::{LedIndex, LedLayout, CELLS_PER_LED, GRID_HEIGHT, GRID_WIDTH, LED_COUNT};
use crate::pixel::{PixelGrid, Rgb, RgbSum};

/// Final colour of every LED, addressed by LED index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedColours([Rgb; LED_COUNT]);

impl LedColours {
    #[inline]
    pub fn get(&self, led: LedIndex) -> Option<Rgb> {
        self.0.get(led as usize).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.0
    }

    /// `(index, colour)` in ascending LED order
    pub fn iter(&self) -> impl Iterator<Item = (LedIndex, Rgb)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(led, colour)| (led as LedIndex, *colour))
    }

    /// Render as CSV text, see [`crate::csv::write_csv`]
    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        if crate::csv::write_csv(self, &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        crate::csv::write_csv(self, writer)
    }
}

/// Average the downscaled grid under each LED.
///
/// The divisor is always `CELLS_PER_LED`. A layout that hands any LED a
/// different number of samples is reported instead of producing skewed
/// colours.
pub fn aggregate(grid: &PixelGrid, layout: &LedLayout) -> Result<LedColours> {
    if grid.width() != GRID_WIDTH || grid.height() != GRID_HEIGHT {
        return Err(HeraError::InvalidDimensions {
            width: grid.width() as i64,
            height: grid.height() as i64,
        });
    }

    let mut sums = [RgbSum::default(); LED_COUNT];
    let mut samples = [0usize; LED_COUNT];
    for (y, row) in grid.rows().enumerate() {
        for (x, px) in row.iter().enumerate() {
            if let Some(led) = layout.map_cell(x, y) {
                sums[led as usize].add(*px);
                samples[led as usize] += 1;
            }
        }
    }

    if let Some((led, count)) = samples
        .iter()
        .enumerate()
        .find(|(_, count)| **count != CELLS_PER_LED)
    {
        return Err(TableIssue::CellCount(led as LedIndex, *count).into());
    }

    let mut colours = [Rgb::BLACK; LED_COUNT];
    for (colour, sum) in colours.iter_mut().zip(sums.iter()) {
        *colour = sum.average(CELLS_PER_LED as u64);
    }
    Ok(LedColours(colours))
}

//! Placement of the HERA display LEDs on the downscaled image grid.
//!
//! Each LED covers a small footprint of grid cells, most cells are not under
//! any LED. The mapping is plain data so that alternative layouts can be
//! loaded from a RON file and checked before use.

use std::path::Path;

use log::{debug, warn};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HeraError, Result, TableIssue};

/// Width of the logical grid the source image is reduced to
pub const GRID_WIDTH: usize = 43;
/// Height of the logical grid the source image is reduced to
pub const GRID_HEIGHT: usize = 42;
/// Physical LEDs on the display
pub const LED_COUNT: usize = 320;
/// Every LED is the average of exactly this many grid cells
pub const CELLS_PER_LED: usize = 4;

pub type LedIndex = u16;

/// One LED and the grid cells `(x, y)` it covers. `y == 0` is the top row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedFootprint {
    pub led: LedIndex,
    pub cells: Vec<(usize, usize)>,
}

/// On-disk form of a layout
#[derive(Debug, Deserialize, Serialize)]
struct LayoutFile {
    footprints: Vec<LedFootprint>,
}

/// Lookup from grid cell to LED. Only constructed through validation, so every
/// LED in `0..LED_COUNT` is guaranteed to cover exactly `CELLS_PER_LED` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedLayout {
    cells: [[Option<LedIndex>; GRID_WIDTH]; GRID_HEIGHT],
}

impl LedLayout {
    /// The layout of the HERA display
    pub fn hera() -> Result<Self> {
        let footprints: Vec<LedFootprint> = HERA_ROW_PAIRS
            .iter()
            .enumerate()
            .flat_map(|(pair, leds)| {
                let y = pair * 2;
                leds.iter().map(move |&(x, led)| LedFootprint {
                    led,
                    cells: vec![(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)],
                })
            })
            .collect();
        Self::from_footprints(&footprints)
    }

    /// Build a layout, rejecting anything that would make the fixed divisor
    /// in the aggregation wrong
    pub fn from_footprints(footprints: &[LedFootprint]) -> Result<Self> {
        let mut cells = [[None; GRID_WIDTH]; GRID_HEIGHT];
        let mut counts = [0usize; LED_COUNT];

        for print in footprints {
            if print.led as usize >= LED_COUNT {
                return Err(TableIssue::LedOutOfRange(print.led).into());
            }
            for &(x, y) in &print.cells {
                if x >= GRID_WIDTH || y >= GRID_HEIGHT {
                    return Err(TableIssue::CellOutOfGrid(x, y).into());
                }
                let cell: &mut Option<LedIndex> = &mut cells[y][x];
                if let Some(other) = *cell {
                    return Err(TableIssue::CellMappedTwice(x, y, other, print.led).into());
                }
                *cell = Some(print.led);
                counts[print.led as usize] += 1;
            }
        }

        if let Some((led, count)) = counts
            .iter()
            .enumerate()
            .find(|(_, count)| **count != CELLS_PER_LED)
        {
            return Err(TableIssue::CellCount(led as LedIndex, *count).into());
        }

        debug!(
            "LED layout with {} mapped cells",
            counts.iter().sum::<usize>()
        );
        Ok(Self { cells })
    }

    pub fn from_ron(data: &str) -> Result<Self> {
        let file: LayoutFile = ron::from_str(data)?;
        Self::from_footprints(&file.footprints)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let buf = std::fs::read_to_string(path)
            .map_err(|e| HeraError::IoPath(path.to_string_lossy().to_string(), e))?;
        if buf.is_empty() {
            warn!("Layout file {path:?} is empty");
            return Err(HeraError::IoPath(
                path.to_string_lossy().to_string(),
                std::io::ErrorKind::InvalidData.into(),
            ));
        }
        Self::from_ron(&buf)
    }

    /// The LED under grid cell `x`, `y`. Cells outside the grid are unmapped.
    #[inline]
    pub fn map_cell(&self, x: usize, y: usize) -> Option<LedIndex> {
        self.cells.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    /// All cells covered by `led`, in row-major order
    pub fn cells_of(&self, led: LedIndex) -> Vec<(usize, usize)> {
        let mut found = Vec::with_capacity(CELLS_PER_LED);
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == Some(led) {
                    found.push((x, y));
                }
            }
        }
        found
    }

    /// Inverse of the lookup, ordered by LED index
    pub fn footprints(&self) -> Vec<LedFootprint> {
        let mut prints: Vec<LedFootprint> = (0..LED_COUNT as LedIndex)
            .map(|led| LedFootprint {
                led,
                cells: Vec::with_capacity(CELLS_PER_LED),
            })
            .collect();
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(led) = cell {
                    prints[*led as usize].cells.push((x, y));
                }
            }
        }
        prints
    }

    /// Serialise to the same RON format `from_ron` accepts
    pub fn to_ron(&self) -> Result<String> {
        let file = LayoutFile {
            footprints: self.footprints(),
        };
        Ok(ron::ser::to_string_pretty(
            &file,
            PrettyConfig::new().depth_limit(2),
        )?)
    }
}


/// HERA LED positions. Each entry of a row pair is `(x, led)` where the LED
/// covers cells `x` and `x + 1` on both rows of the pair.
///
/// `y == 0` is the top of the image.
const HERA_ROW_PAIRS: [&[(usize, LedIndex)]; GRID_HEIGHT / 2] = [
    // rows 0 and 1
    &[
        (9, 220), (11, 219), (13, 218), (15, 217), (17, 216), (19, 215), (21, 214), (23, 213),
        (25, 212), (27, 211), (29, 210),
    ],
    // rows 2 and 3
    &[
        (8, 221), (10, 222), (12, 223), (14, 224), (16, 225), (18, 226), (20, 227), (22, 228),
        (24, 229), (26, 230), (28, 231), (32, 209),
    ],
    // rows 4 and 5
    &[
        (7, 242), (9, 241), (11, 240), (13, 239), (15, 238), (17, 237), (19, 236), (21, 235),
        (23, 234), (25, 233), (27, 232), (31, 190), (33, 208),
    ],
    // rows 6 and 7
    &[
        (6, 243), (8, 244), (10, 245), (12, 246), (14, 247), (16, 248), (18, 249), (20, 250),
        (22, 251), (24, 252), (26, 253), (30, 189), (32, 191), (34, 207),
    ],
    // rows 8 and 9
    &[
        (5, 264), (7, 263), (9, 262), (11, 261), (13, 260), (15, 259), (17, 258), (19, 257),
        (21, 256), (23, 255), (25, 254), (29, 170), (31, 188), (33, 192), (35, 206),
    ],
    // rows 10 and 11
    &[
        (4, 265), (6, 266), (8, 267), (10, 268), (12, 269), (14, 270), (16, 271), (18, 272),
        (20, 273), (22, 274), (24, 275), (28, 169), (30, 171), (32, 187), (34, 193), (36, 205),
    ],
    // rows 12 and 13
    &[
        (3, 286), (5, 285), (7, 284), (9, 283), (11, 282), (13, 281), (15, 280), (17, 279),
        (19, 278), (21, 277), (23, 276), (27, 150), (29, 168), (31, 172), (33, 186), (35, 194),
        (37, 204),
    ],
    // rows 14 and 15
    &[
        (2, 287), (4, 288), (6, 289), (8, 290), (10, 291), (12, 292), (14, 293), (16, 294),
        (18, 295), (20, 296), (22, 297), (26, 149), (28, 151), (30, 167), (32, 173), (34, 185),
        (36, 195), (38, 203),
    ],
    // rows 16 and 17
    &[
        (1, 308), (3, 307), (5, 306), (7, 305), (9, 304), (11, 303), (13, 302), (15, 301),
        (17, 300), (19, 299), (21, 298), (25, 130), (27, 148), (29, 152), (31, 166), (33, 174),
        (35, 184), (37, 196), (39, 202),
    ],
    // rows 18 and 19
    &[
        (0, 309), (2, 310), (4, 311), (6, 312), (8, 313), (10, 314), (12, 315), (14, 316),
        (16, 317), (18, 318), (20, 319), (24, 129), (26, 131), (28, 147), (30, 153), (32, 165),
        (34, 175), (36, 183), (38, 197), (40, 201),
    ],
    // rows 20 and 21
    &[
        (23, 110), (25, 128), (27, 132), (29, 146), (31, 154), (33, 164), (35, 176), (37, 182),
        (39, 198), (41, 200),
    ],
    // rows 22 and 23
    &[
        (0, 99), (2, 100), (4, 101), (6, 102), (8, 103), (10, 104), (12, 105), (14, 106),
        (16, 107), (18, 108), (20, 109), (24, 111), (26, 127), (28, 133), (30, 145), (32, 155),
        (34, 163), (36, 177), (38, 181), (40, 199),
    ],
    // rows 24 and 25
    &[
        (1, 98), (3, 97), (5, 96), (7, 95), (9, 94), (11, 93), (13, 92), (15, 91), (17, 90),
        (19, 89), (21, 88), (25, 112), (27, 126), (29, 134), (31, 144), (33, 156), (35, 162),
        (37, 178), (39, 180),
    ],
    // rows 26 and 27
    &[
        (2, 77), (4, 78), (6, 79), (8, 80), (10, 81), (12, 82), (14, 83), (16, 84), (18, 85),
        (20, 86), (22, 87), (26, 113), (28, 125), (30, 135), (32, 143), (34, 157), (36, 161),
        (38, 179),
    ],
    // rows 28 and 29
    &[
        (3, 76), (5, 75), (7, 74), (9, 73), (11, 72), (13, 71), (15, 70), (17, 69), (19, 68),
        (21, 67), (23, 66), (27, 114), (29, 124), (31, 136), (33, 142), (35, 158), (37, 160),
    ],
    // rows 30 and 31
    &[
        (4, 55), (6, 56), (8, 57), (10, 58), (12, 59), (14, 60), (16, 61), (18, 62), (20, 63),
        (22, 64), (24, 65), (28, 115), (30, 123), (32, 137), (34, 141), (36, 159),
    ],
    // rows 32 and 33
    &[
        (5, 54), (7, 53), (9, 52), (11, 51), (13, 50), (15, 49), (17, 48), (19, 47), (21, 46),
        (23, 45), (25, 44), (29, 116), (31, 122), (33, 138), (35, 140),
    ],
    // rows 34 and 35
    &[
        (6, 33), (8, 34), (10, 35), (12, 36), (14, 37), (16, 38), (18, 39), (20, 40), (22, 41),
        (24, 42), (26, 43), (30, 117), (32, 121), (34, 139),
    ],
    // rows 36 and 37
    &[
        (7, 32), (9, 31), (11, 30), (13, 29), (15, 28), (17, 27), (19, 26), (21, 25), (23, 24),
        (25, 23), (27, 22), (31, 118), (33, 120),
    ],
    // rows 38 and 39
    &[
        (8, 11), (10, 12), (12, 13), (14, 14), (16, 15), (18, 16), (20, 17), (22, 18), (24, 19),
        (26, 20), (28, 21), (32, 119),
    ],
    // rows 40 and 41
    &[
        (9, 10), (11, 9), (13, 8), (15, 7), (17, 6), (19, 5), (21, 4), (23, 3), (25, 2),
        (27, 1), (29, 0),
    ],
];

use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, HeraError>;

/// The header check that rejected a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// File header magic was not `BM`
    Signature(u16),
    /// Pixel data did not start directly after the two headers
    PixelOffset(u32),
    /// Info header was not a 40 byte BITMAPINFOHEADER
    InfoHeaderSize(u32),
    BitDepth(u16),
    Compression(u32),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Signature(sig) => write!(f, "bad signature {sig:#06x}"),
            FormatError::PixelOffset(off) => write!(f, "pixel data offset {off} is not 54"),
            FormatError::InfoHeaderSize(size) => write!(f, "info header size {size} is not 40"),
            FormatError::BitDepth(bits) => write!(f, "bit depth {bits} is not 24"),
            FormatError::Compression(comp) => write!(f, "compression {comp} is not none"),
        }
    }
}

/// What is wrong with an LED layout table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    /// (led, number of cells found)
    CellCount(u16, usize),
    LedOutOfRange(u16),
    /// (x, y)
    CellOutOfGrid(usize, usize),
    /// (x, y, first led, second led)
    CellMappedTwice(usize, usize, u16, u16),
}

impl fmt::Display for TableIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableIssue::CellCount(led, count) => {
                write!(f, "LED {led} covers {count} cells, expected 4")
            }
            TableIssue::LedOutOfRange(led) => write!(f, "LED index {led} is out of range"),
            TableIssue::CellOutOfGrid(x, y) => write!(f, "cell ({x}, {y}) is outside the grid"),
            TableIssue::CellMappedTwice(x, y, a, b) => {
                write!(f, "cell ({x}, {y}) is mapped to both LED {a} and LED {b}")
            }
        }
    }
}

#[derive(Debug)]
pub enum HeraError {
    Format(FormatError),
    InvalidDimensions { width: i64, height: i64 },
    TableIntegrity(TableIssue),
    Io(std::io::Error),
    IoPath(String, std::io::Error),
    Ron(ron::Error),
    RonParse(ron::error::SpannedError),
}

impl fmt::Display for HeraError {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeraError::Format(e) => write!(
                f,
                "Unsupported input file format ({e}). Needs to be a 24-bit uncompressed bitmap"
            ),
            HeraError::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions {width}x{height}")
            }
            HeraError::TableIntegrity(e) => write!(f, "LED layout is malformed: {e}"),
            HeraError::Io(e) => write!(f, "IO Error: {e}"),
            HeraError::IoPath(path, e) => write!(f, "IO Error: {path}, {e}"),
            HeraError::Ron(e) => write!(f, "RON Error: {e}"),
            HeraError::RonParse(e) => write!(f, "RON Parse Error: {e}"),
        }
    }
}

impl Error for HeraError {}

impl From<std::io::Error> for HeraError {
    fn from(err: std::io::Error) -> Self {
        HeraError::Io(err)
    }
}

impl From<FormatError> for HeraError {
    fn from(err: FormatError) -> Self {
        HeraError::Format(err)
    }
}

impl From<TableIssue> for HeraError {
    fn from(err: TableIssue) -> Self {
        HeraError::TableIntegrity(err)
    }
}

impl From<ron::Error> for HeraError {
    fn from(err: ron::Error) -> Self {
        HeraError::Ron(err)
    }
}

impl From<ron::error::SpannedError> for HeraError {
    fn from(err: ron::error::SpannedError) -> Self {
        HeraError::RonParse(err)
    }
}

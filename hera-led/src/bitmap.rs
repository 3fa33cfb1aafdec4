//! Reading and writing of 24-bit uncompressed bitmaps: a 14 byte
//! BITMAPFILEHEADER followed directly by a 40 byte BITMAPINFOHEADER and the
//! pixel rows. Nothing else in the BMP family is supported.

use std::io::{self, Cursor, ErrorKind, Read, Write};

use log::debug;

use crate::error::{FormatError, HeraError, Result};
use crate::pixel::{PixelGrid, Rgb};

/// `BM`, little-endian
const SIGNATURE: u16 = 0x4d42;
const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;
/// Pixel rows must begin straight after the headers
pub const HEADERS_LEN: usize = FILE_HEADER_LEN + INFO_HEADER_LEN;
const BITS_PER_PIXEL: u16 = 24;
const BYTES_PER_PIXEL: usize = 3;
/// BI_RGB
const COMPRESSION_NONE: u32 = 0;

/// Number of zero bytes that pad a stored row of `width` pixels out to a
/// multiple of 4 bytes
#[inline]
pub const fn row_padding(width: usize) -> usize {
    (4 - (width * BYTES_PER_PIXEL) % 4) % 4
}

/// Length in bytes of one stored row including padding
#[inline]
pub const fn row_stride(width: usize) -> usize {
    width * BYTES_PER_PIXEL + row_padding(width)
}

/// `row_stride` for widths taken from an untrusted header
fn checked_row_stride(width: usize) -> Option<usize> {
    let bytes = width.checked_mul(BYTES_PER_PIXEL)?;
    bytes.checked_add((4 - bytes % 4) % 4)
}

/// `biWidth`, unsigned `biHeight` and `biSizeImage` for a grid, if they fit
/// the header fields
fn header_geometry(width: usize, height: usize) -> Result<(i32, i32, u32)> {
    let invalid = || HeraError::InvalidDimensions {
        width: width as i64,
        height: height as i64,
    };
    let header_width = i32::try_from(width).map_err(|_| invalid())?;
    let header_height = i32::try_from(height).map_err(|_| invalid())?;
    let image_size = checked_row_stride(width)
        .and_then(|stride| stride.checked_mul(height))
        .ok_or_else(invalid)?;
    let image_size = u32::try_from(image_size).map_err(|_| invalid())?;
    Ok((header_width, header_height, image_size))
}

/// The order rows are stored in. The sign of the header height decides it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Positive height, the first stored row is the bottom of the image
    #[default]
    BottomUp,
    /// Negative height
    TopDown,
}

/// Fields of the info header that describe the image but not its geometry.
/// These are carried over when a resized image is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    pub planes: u16,
    pub x_pixels_per_metre: i32,
    pub y_pixels_per_metre: i32,
    pub colours_used: u32,
    pub colours_important: u32,
    pub row_order: RowOrder,
}

impl Default for BitmapInfo {
    fn default() -> Self {
        Self {
            planes: 1,
            // 72 DPI
            x_pixels_per_metre: 2835,
            y_pixels_per_metre: 2835,
            colours_used: 0,
            colours_important: 0,
            row_order: RowOrder::BottomUp,
        }
    }
}

#[inline]
fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[inline]
fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline]
fn i32_at(buf: &[u8], at: usize) -> i32 {
    u32_at(buf, at) as i32
}

/// A decoded 24-bit bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    info: BitmapInfo,
    pixels: PixelGrid,
}

impl Bitmap {
    /// Build a bitmap for writing out `pixels`. Non-geometry header fields
    /// are copied from `template` if there is one. Rows are always stored
    /// bottom-up.
    pub fn from_grid(pixels: PixelGrid, template: Option<&BitmapInfo>) -> Self {
        let mut info = template.copied().unwrap_or_default();
        info.row_order = RowOrder::BottomUp;
        Self { info, pixels }
    }

    #[inline]
    pub fn info(&self) -> &BitmapInfo {
        &self.info
    }

    #[inline]
    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    #[inline]
    pub fn into_pixels(self) -> PixelGrid {
        self.pixels
    }

    /// `biSizeImage` for this image
    pub fn image_size(&self) -> usize {
        row_stride(self.pixels.width()) * self.pixels.height()
    }

    /// `bfSize` for this image
    pub fn file_size(&self) -> usize {
        self.image_size() + HEADERS_LEN
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(data))
    }

    /// Decode a bitmap from the current position of `reader`. On success the
    /// reader is left directly after the last pixel row.
    ///
    /// A stream that ends early is an `Io` error; missing pixels are never
    /// filled in.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = [0u8; HEADERS_LEN];
        reader.read_exact(&mut header)?;

        let signature = u16_at(&header, 0);
        if signature != SIGNATURE {
            return Err(FormatError::Signature(signature).into());
        }
        let offset = u32_at(&header, 10);
        if offset as usize != HEADERS_LEN {
            return Err(FormatError::PixelOffset(offset).into());
        }
        let info_len = u32_at(&header, 14);
        if info_len as usize != INFO_HEADER_LEN {
            return Err(FormatError::InfoHeaderSize(info_len).into());
        }
        let bits = u16_at(&header, 28);
        if bits != BITS_PER_PIXEL {
            return Err(FormatError::BitDepth(bits).into());
        }
        let compression = u32_at(&header, 30);
        if compression != COMPRESSION_NONE {
            return Err(FormatError::Compression(compression).into());
        }

        let raw_width = i32_at(&header, 18);
        let raw_height = i32_at(&header, 22);
        if raw_width <= 0 || raw_height == 0 {
            return Err(HeraError::InvalidDimensions {
                width: raw_width as i64,
                height: raw_height as i64,
            });
        }
        let row_order = if raw_height < 0 {
            RowOrder::TopDown
        } else {
            RowOrder::BottomUp
        };
        let width = raw_width as usize;
        let height = raw_height.unsigned_abs() as usize;
        let invalid = || HeraError::InvalidDimensions {
            width: raw_width as i64,
            height: raw_height as i64,
        };
        let stride = checked_row_stride(width).ok_or_else(invalid)?;
        width
            .checked_mul(height)
            .and_then(|len| len.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(invalid)?;

        let info = BitmapInfo {
            planes: u16_at(&header, 26),
            x_pixels_per_metre: i32_at(&header, 38),
            y_pixels_per_metre: i32_at(&header, 42),
            colours_used: u32_at(&header, 46),
            colours_important: u32_at(&header, 50),
            row_order,
        };
        debug!("bitmap {width}x{height} {row_order:?}");

        // Buffers only grow as rows arrive, a short stream fails before the
        // header's claimed size is ever allocated
        let mut stored: Vec<Rgb> = Vec::new();
        let mut row: Vec<u8> = Vec::new();
        for _ in 0..height {
            row.clear();
            let got = Read::take(&mut *reader, stride as u64).read_to_end(&mut row)?;
            if got != stride {
                return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
            }
            stored.reserve(width);
            stored.extend(
                row[..width * BYTES_PER_PIXEL]
                    .chunks_exact(BYTES_PER_PIXEL)
                    .map(|bgr| Rgb::new(bgr[2], bgr[1], bgr[0])),
            );
        }
        let pixels = match row_order {
            RowOrder::TopDown => stored,
            RowOrder::BottomUp => stored.chunks_exact(width).rev().flatten().copied().collect(),
        };

        Ok(Self {
            info,
            pixels: PixelGrid::new(width, height, pixels)?,
        })
    }

    /// Encode headers and pixel rows to `writer`. Header sizes are computed
    /// from the pixel grid.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let width = self.pixels.width();
        let height = self.pixels.height();
        let (header_width, header_height, image_size_field) = header_geometry(width, height)?;
        let stored_height = match self.info.row_order {
            RowOrder::BottomUp => header_height,
            RowOrder::TopDown => -header_height,
        };
        let file_size_field = image_size_field
            .checked_add(HEADERS_LEN as u32)
            .ok_or(HeraError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            })?;

        let mut header = Vec::with_capacity(HEADERS_LEN);
        // BITMAPFILEHEADER
        header.extend_from_slice(&SIGNATURE.to_le_bytes());
        header.extend_from_slice(&file_size_field.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&0u16.to_le_bytes());
        header.extend_from_slice(&(HEADERS_LEN as u32).to_le_bytes());
        // BITMAPINFOHEADER
        header.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
        header.extend_from_slice(&header_width.to_le_bytes());
        header.extend_from_slice(&stored_height.to_le_bytes());
        header.extend_from_slice(&self.info.planes.to_le_bytes());
        header.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
        header.extend_from_slice(&COMPRESSION_NONE.to_le_bytes());
        header.extend_from_slice(&image_size_field.to_le_bytes());
        header.extend_from_slice(&self.info.x_pixels_per_metre.to_le_bytes());
        header.extend_from_slice(&self.info.y_pixels_per_metre.to_le_bytes());
        header.extend_from_slice(&self.info.colours_used.to_le_bytes());
        header.extend_from_slice(&self.info.colours_important.to_le_bytes());
        writer.write_all(&header)?;

        let mut row = Vec::with_capacity(row_stride(width));
        let mut write_row = |pixels: &[Rgb]| -> Result<()> {
            row.clear();
            for px in pixels {
                row.extend_from_slice(&[px.blue, px.green, px.red]);
            }
            row.resize(row_stride(width), 0);
            writer.write_all(&row)?;
            Ok(())
        };
        match self.info.row_order {
            RowOrder::BottomUp => {
                for pixels in self.pixels.rows().rev() {
                    write_row(pixels)?;
                }
            }
            RowOrder::TopDown => {
                for pixels in self.pixels.rows() {
                    write_row(pixels)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.file_size());
        // Only fails for grids too large for the header fields
        if let Err(e) = self.write_to(&mut buf) {
            log::error!("bitmap encode failed: {e}");
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand assemble a bitmap so the decoder is not only tested against the
    /// encoder
    fn raw_bmp(width: i32, height: i32, rows_as_stored: &[Vec<[u8; 3]>]) -> Vec<u8> {
        let pad = row_padding(width as usize);
        let image_size = (width as usize * 3 + pad) * height.unsigned_abs() as usize;
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BM");
        buf.extend_from_slice(&((image_size + 54) as u32).to_le_bytes());
        buf.extend_from_slice(&[0; 4]);
        buf.extend_from_slice(&54u32.to_le_bytes());
        buf.extend_from_slice(&40u32.to_le_bytes());
        buf.extend_from_slice(&width.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&24u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(image_size as u32).to_le_bytes());
        buf.extend_from_slice(&[0; 16]);
        for row in rows_as_stored {
            for bgr in row {
                buf.extend_from_slice(bgr);
            }
            buf.extend(std::iter::repeat(0xAA).take(pad));
        }
        buf
    }

    #[test]
    fn padding() {
        assert_eq!(row_padding(1), 1);
        assert_eq!(row_padding(2), 2);
        assert_eq!(row_padding(3), 3);
        assert_eq!(row_padding(4), 0);
        assert_eq!(row_padding(43), 3);
        assert_eq!(row_stride(43), 132);
    }

    #[test]
    fn decode_bottom_up_with_padding() {
        // stored bottom row first, bytes are BGR
        let data = raw_bmp(2, 2, &[
            vec![[3, 2, 1], [6, 5, 4]],
            vec![[9, 8, 7], [12, 11, 10]],
        ]);
        let bmp = Bitmap::from_bytes(&data).unwrap();
        let grid = bmp.pixels();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 0), Some(Rgb::new(7, 8, 9)));
        assert_eq!(grid.get(1, 0), Some(Rgb::new(10, 11, 12)));
        assert_eq!(grid.get(0, 1), Some(Rgb::new(1, 2, 3)));
        assert_eq!(grid.get(1, 1), Some(Rgb::new(4, 5, 6)));
        assert_eq!(bmp.info().row_order, RowOrder::BottomUp);
    }

    #[test]
    fn decode_top_down_matches_bottom_up() {
        let top = vec![[1, 1, 1], [2, 2, 2], [3, 3, 3]];
        let bottom = vec![[4, 4, 4], [5, 5, 5], [6, 6, 6]];
        let up = Bitmap::from_bytes(&raw_bmp(3, 2, &[bottom.clone(), top.clone()])).unwrap();
        let down = Bitmap::from_bytes(&raw_bmp(3, -2, &[top, bottom])).unwrap();
        assert_eq!(up.pixels(), down.pixels());
        assert_eq!(down.info().row_order, RowOrder::TopDown);
    }

    #[test]
    fn reader_left_after_pixels() {
        let mut data = raw_bmp(1, 1, &[vec![[0, 0, 0]]]);
        data.extend_from_slice(b"trailer");
        let mut cursor = Cursor::new(data);
        Bitmap::read_from(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, 54 + 4);
    }

    #[test]
    fn header_checks() {
        let good = raw_bmp(1, 1, &[vec![[0, 0, 0]]]);

        let mut bad = good.clone();
        bad[0] = b'X';
        assert!(matches!(
            Bitmap::from_bytes(&bad),
            Err(HeraError::Format(FormatError::Signature(_)))
        ));

        let mut bad = good.clone();
        bad[10] = 60;
        assert!(matches!(
            Bitmap::from_bytes(&bad),
            Err(HeraError::Format(FormatError::PixelOffset(60)))
        ));

        let mut bad = good.clone();
        bad[14] = 124;
        assert!(matches!(
            Bitmap::from_bytes(&bad),
            Err(HeraError::Format(FormatError::InfoHeaderSize(124)))
        ));

        let mut bad = good.clone();
        bad[28] = 32;
        assert!(matches!(
            Bitmap::from_bytes(&bad),
            Err(HeraError::Format(FormatError::BitDepth(32)))
        ));

        let mut bad = good;
        bad[30] = 1;
        assert!(matches!(
            Bitmap::from_bytes(&bad),
            Err(HeraError::Format(FormatError::Compression(1)))
        ));
    }

    #[test]
    fn truncated_is_io_error() {
        let data = raw_bmp(4, 4, &vec![vec![[9, 9, 9]; 4]; 4]);
        match Bitmap::from_bytes(&data[..data.len() - 5]) {
            Err(HeraError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }
        match Bitmap::from_bytes(&data[..20]) {
            Err(HeraError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn huge_header_on_short_stream() {
        let mut data = raw_bmp(1, 1, &[]);
        data[18..22].copy_from_slice(&i32::MAX.to_le_bytes());
        data[22..26].copy_from_slice(&i32::MAX.to_le_bytes());
        assert_eq!(data.len(), HEADERS_LEN);
        match Bitmap::from_bytes(&data) {
            Err(HeraError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }

        data[22..26].copy_from_slice(&(-60000i32).to_le_bytes());
        data.extend_from_slice(&[0; 100]);
        match Bitmap::from_bytes(&data) {
            Err(HeraError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn checked_stride() {
        assert_eq!(checked_row_stride(43), Some(row_stride(43)));
        assert_eq!(checked_row_stride(5), Some(16));
        assert_eq!(checked_row_stride(usize::MAX / 2), None);
    }

    #[test]
    fn header_geometry_limits() {
        assert_eq!(header_geometry(43, 42).unwrap(), (43, 42, 132 * 42));
        // fits i32 but the image size does not fit u32
        assert!(matches!(
            header_geometry(40_000, 40_000),
            Err(HeraError::InvalidDimensions { width: 40_000, height: 40_000 })
        ));
        assert!(matches!(
            header_geometry(i32::MAX as usize + 1, 1),
            Err(HeraError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            header_geometry(1, i32::MAX as usize + 1),
            Err(HeraError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn bad_dimensions() {
        let mut data = raw_bmp(1, 1, &[vec![[0, 0, 0]]]);
        data[22..26].copy_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            Bitmap::from_bytes(&data),
            Err(HeraError::InvalidDimensions { width: 1, height: 0 })
        ));
        data[18..22].copy_from_slice(&(-3i32).to_le_bytes());
        assert!(matches!(
            Bitmap::from_bytes(&data),
            Err(HeraError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn encode_round_trip() {
        let pixels = (0..43 * 42)
            .map(|i| Rgb::new(i as u8, (i / 7) as u8, (i % 13) as u8))
            .collect();
        let grid = PixelGrid::new(43, 42, pixels).unwrap();
        let bmp = Bitmap::from_grid(grid.clone(), None);
        let bytes = bmp.to_bytes();

        assert_eq!(bytes.len(), 54 + 132 * 42);
        assert_eq!(u32_at(&bytes, 2) as usize, bytes.len());
        assert_eq!(u32_at(&bytes, 34), 132 * 42);
        assert_eq!(i32_at(&bytes, 22), 42);

        let back = Bitmap::from_bytes(&bytes).unwrap();
        assert_eq!(back.pixels(), &grid);
    }

    #[test]
    fn encode_keeps_template_fields() {
        let mut info = BitmapInfo {
            x_pixels_per_metre: 3780,
            y_pixels_per_metre: 3779,
            row_order: RowOrder::TopDown,
            ..Default::default()
        };
        info.colours_important = 3;
        let grid = PixelGrid::filled(2, 3, Rgb::new(1, 2, 3)).unwrap();
        let bmp = Bitmap::from_grid(grid, Some(&info));
        assert_eq!(bmp.info().row_order, RowOrder::BottomUp);
        let back = Bitmap::from_bytes(&bmp.to_bytes()).unwrap();
        assert_eq!(back.info().x_pixels_per_metre, 3780);
        assert_eq!(back.info().y_pixels_per_metre, 3779);
        assert_eq!(back.info().colours_important, 3);
    }

    #[test]
    fn top_down_written_back_as_read() {
        let data = raw_bmp(1, -2, &[vec![[1, 1, 1]], vec![[2, 2, 2]]]);
        let bmp = Bitmap::from_bytes(&data).unwrap();
        let bytes = bmp.to_bytes();
        assert_eq!(i32_at(&bytes, 22), -2);
        assert_eq!(Bitmap::from_bytes(&bytes).unwrap(), bmp);
    }
}

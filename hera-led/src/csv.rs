use std::io::Write;

use crate::aggregate::LedColours;
use crate::error::Result;

/// Write one `index, red, green, blue` record per LED in ascending order.
/// Records are separated by `\n` and there is no newline after the last one.
pub fn write_csv<W: Write>(colours: &LedColours, writer: &mut W) -> Result<()> {
    for (led, colour) in colours.iter() {
        if led != 0 {
            writer.write_all(b"\n")?;
        }
        write!(
            writer,
            "{}, {}, {}, {}",
            led, colour.red, colour.green, colour.blue
        )?;
    }
    writer.flush()?;
    Ok(())
}

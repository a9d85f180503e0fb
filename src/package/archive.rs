use crate::error::Result;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Wraps `bytes` in a zip archive holding a single deflated entry named `entry_name`
pub fn archive(entry_name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(entry_name, options)?;
    writer.write_all(bytes)?;
    Ok(writer.finish()?.into_inner())
}

//! File formats for loading and saving sheets.

pub mod csv;
pub mod parser;
pub mod writer;

pub use csv::parse_csv;
pub use parser::{parse_grd, parse_grd_content};
pub use writer::{write_grd, write_grd_content};

/// Largest sheet file read into memory (16 MiB).
pub const MAX_SHEET_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Read a sheet file, refusing anything over [`MAX_SHEET_FILE_BYTES`].
pub(crate) fn read_sheet_file(path: &std::path::Path) -> crate::error::Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_SHEET_FILE_BYTES {
        return Err(crate::error::SheetlexError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_SHEET_FILE_BYTES
            ),
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

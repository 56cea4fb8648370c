//! Container decompression for `.acl.zip` clips

use crate::error::DecompressError;

/// Turns a compressed container into the clip text payload
pub trait Decompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError>;
}

impl<F> Decompressor for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, DecompressError>,
{
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        self(bytes)
    }
}

/// Reads clip text out of a zip archive.
///
/// Picks the first entry whose name ends in `.acl.js`, or the first entry
/// when none does.
#[cfg(feature = "zip")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipDecompressor;

#[cfg(feature = "zip")]
impl Decompressor for ZipDecompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        use std::io::{Cursor, Read};

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DecompressError::InvalidArchive(e.to_string()))?;
        if archive.len() == 0 {
            return Err(DecompressError::EmptyArchive);
        }

        let mut chosen = 0;
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| DecompressError::InvalidArchive(e.to_string()))?;
            if entry.name().ends_with(".acl.js") {
                chosen = index;
                break;
            }
        }

        let mut entry = archive
            .by_index(chosen)
            .map_err(|e| DecompressError::InvalidArchive(e.to_string()))?;
        let mut payload = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut payload)
            .map_err(|e| DecompressError::Io(e.to_string()))?;
        Ok(payload)
    }
}

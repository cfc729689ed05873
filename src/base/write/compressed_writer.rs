// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::io::Result;

/// A byte-to-byte transform which the writer drives to compress an entry's data.
///
/// The writer only ever observes the bytes appended to `output`, never the compressor's internal state. Output may
/// be buffered internally and released on a later call, or at [`Compressor::finish`].
pub trait Compressor {
    /// Compresses `input`, appending any output which is ready to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Completes the compressed stream, appending all remaining output to `output`.
    fn finish(&mut self, output: &mut Vec<u8>) -> Result<()>;
}

/// A raw DEFLATE compressor, for entries using [`crate::Compression::Deflate`].
#[cfg(feature = "deflate")]
pub struct DeflateCompressor {
    encoder: flate2::write::DeflateEncoder<Vec<u8>>,
}

#[cfg(feature = "deflate")]
impl DeflateCompressor {
    /// Constructs a new compressor at the default compression level.
    pub fn new() -> Self {
        Self::with_level(flate2::Compression::default())
    }

    /// Constructs a new compressor at the given compression level.
    pub fn with_level(level: flate2::Compression) -> Self {
        Self { encoder: flate2::write::DeflateEncoder::new(Vec::new(), level) }
    }
}

#[cfg(feature = "deflate")]
impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "deflate")]
impl Compressor for DeflateCompressor {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        use std::io::Write;

        self.encoder.write_all(input)?;
        output.append(self.encoder.get_mut());
        Ok(())
    }

    fn finish(&mut self, output: &mut Vec<u8>) -> Result<()> {
        self.encoder.try_finish()?;
        output.append(self.encoder.get_mut());
        Ok(())
    }
}

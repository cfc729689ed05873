// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

/// A compression method identifier.
///
/// The codec itself is never applied by this crate's reader; identifiers it doesn't name are carried as
/// [`Compression::Other`] so that raw entry data can still be streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    Stored,
    Deflate,
    Bz,
    Lzma,
    Zstd,
    Xz,
    Other(u16),
}

impl From<u16> for Compression {
    // Convert a u16 stored with little endianness into a compression method.
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#445
    fn from(value: u16) -> Self {
        match value {
            0 => Compression::Stored,
            8 => Compression::Deflate,
            12 => Compression::Bz,
            14 => Compression::Lzma,
            93 => Compression::Zstd,
            95 => Compression::Xz,
            other => Compression::Other(other),
        }
    }
}

impl From<&Compression> for u16 {
    // Convert a compression method into its relevant u16 stored with little endianness.
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#445
    fn from(compression: &Compression) -> u16 {
        match compression {
            Compression::Stored => 0,
            Compression::Deflate => 8,
            Compression::Bz => 12,
            Compression::Lzma => 14,
            Compression::Zstd => 93,
            Compression::Xz => 95,
            Compression::Other(other) => *other,
        }
    }
}

impl From<Compression> for u16 {
    fn from(compression: Compression) -> u16 {
        (&compression).into()
    }
}

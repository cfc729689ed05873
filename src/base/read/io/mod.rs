// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

pub(crate) mod combined_record;
pub(crate) mod locator;

use std::io::Read;

/// Read and return a dynamic length vector of bytes from a reader which impls Read.
///
/// A short read is surfaced as [`std::io::ErrorKind::UnexpectedEof`].
pub(crate) fn read_bytes<R>(reader: R, length: usize) -> std::io::Result<Vec<u8>>
where
    R: Read,
{
    let mut buffer = Vec::with_capacity(length);
    reader.take(length as u64).read_to_end(&mut buffer)?;

    if buffer.len() != length {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }

    Ok(buffer)
}

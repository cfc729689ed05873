// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::io::{Error, IoSlice, Seek, SeekFrom, Write};

/// A wrapper around a [`Write`] implementation which tracks the current byte offset.
///
/// The inner writer is assumed to be positioned at its start when wrapped, so offsets are absolute positions within
/// the underlying stream.
pub struct OffsetWriter<W> {
    inner: W,
    offset: u64,
}

impl<W> OffsetWriter<W>
where
    W: Write + Seek,
{
    /// Constructs a new wrapper from an inner [`Write`] writer.
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    /// Returns the current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Moves the inner writer to an absolute offset, which subsequent writes continue from.
    pub fn seek_to(&mut self, offset: u64) -> Result<(), Error> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        Ok(())
    }

    /// Consumes this wrapper and returns the inner [`Write`] writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W> Write for OffsetWriter<W>
where
    W: Write + Seek,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let written = self.inner.write(buf)?;
        self.offset += written as u64;
        Ok(written)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> Result<usize, Error> {
        let written = self.inner.write_vectored(bufs)?;
        self.offset += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()
    }
}

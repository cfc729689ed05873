// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A ZIP reader which acts over a seekable source.
//!
//! ### Example
//! ```no_run
//! # use sync_zip::base::read::seek::ZipFileReader;
//! # use sync_zip::error::Result;
//! # use std::fs::File;
//! # use std::io::Read;
//! #
//! fn run() -> Result<()> {
//!     let data = File::open("./foo.zip")?;
//!     let mut reader = ZipFileReader::new(data)?;
//!
//!     while reader.next_entry()? {
//!         let mut data = Vec::new();
//!         reader.read_to_end(&mut data)?;
//!
//!         // Use data within current scope.
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::io::{Read, Seek, SeekFrom};

use crate::entry::{StoredZipEntry, ZipEntry};
use crate::error::{Result, ZipError};
use crate::file::ZipFile;

#[derive(Clone, Debug)]
enum ReaderState {
    DirectoryLoaded,
    Selected { index: usize, entry: ZipEntry, remaining: u64 },
    Exhausted,
}

/// A ZIP reader which acts over a seekable source.
///
/// The central directory is parsed once on construction. Entries are then selected one at a time, after which the
/// reader yields that entry's raw (possibly compressed) data via [`Read`].
#[derive(Clone)]
pub struct ZipFileReader<R> {
    reader: R,
    file: ZipFile,
    state: ReaderState,
}

impl<R> ZipFileReader<R>
where
    R: Read + Seek,
{
    /// Constructs a new ZIP reader from a seekable source.
    pub fn new(mut reader: R) -> Result<ZipFileReader<R>> {
        let file = crate::base::read::file(&mut reader)?;
        Ok(ZipFileReader::from_raw_parts(reader, file))
    }

    /// Constructs a ZIP reader from a seekable source and ZIP file information derived from that source.
    ///
    /// Providing a [`ZipFile`] that wasn't derived from that source may lead to inaccurate parsing.
    pub fn from_raw_parts(reader: R, file: ZipFile) -> ZipFileReader<R> {
        ZipFileReader { reader, file, state: ReaderState::DirectoryLoaded }
    }

    /// Returns this ZIP file's information.
    pub fn file(&self) -> &ZipFile {
        &self.file
    }

    /// Returns this ZIP file's entries as recorded by the central directory.
    pub fn entries(&self) -> &[StoredZipEntry] {
        self.file.entries()
    }

    /// Returns this ZIP file's trailing comment.
    pub fn comment(&self) -> &[u8] {
        self.file.comment()
    }

    /// Selects the entry following the current one, in central directory order.
    ///
    /// Returns false once every entry has been visited.
    pub fn next_entry(&mut self) -> Result<bool> {
        let next = match &self.state {
            ReaderState::DirectoryLoaded => 0,
            ReaderState::Selected { index, .. } => index + 1,
            ReaderState::Exhausted => return Ok(false),
        };

        if next >= self.file.entries.len() {
            self.state = ReaderState::Exhausted;
            return Ok(false);
        }

        self.select_index(next)?;
        Ok(true)
    }

    /// Selects the first entry with the given filename.
    ///
    /// Returns false, leaving any current selection untouched, if no such entry exists.
    pub fn select_entry(&mut self, filename: impl AsRef<[u8]>) -> Result<bool> {
        let filename = filename.as_ref();

        match self.file.entries.iter().position(|stored| stored.entry.filename() == filename) {
            Some(index) => {
                self.select_index(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Selects the entry at the given index.
    ///
    /// The local file header is validated and merged into the central directory's copy of the entry, after which
    /// the source is positioned at the start of the entry's data.
    #[tracing::instrument(skip(self))]
    pub fn select_index(&mut self, index: usize) -> Result<()> {
        let stored = self.file.entries.get(index).ok_or(ZipError::EntryIndexOutOfBounds)?;

        self.reader.seek(SeekFrom::Start(stored.file_offset))?;
        let (entry, header_length) = crate::base::read::lfh(&mut self.reader, &stored.entry)?;

        let data_offset = stored.file_offset + header_length;
        self.reader.seek(SeekFrom::Start(data_offset))?;

        let remaining = entry.compressed_size.unwrap_or(0);
        tracing::debug!(data_offset, remaining, "selected entry");

        self.state = ReaderState::Selected { index, entry, remaining };
        Ok(())
    }

    /// Returns the currently selected entry's header, merged from its central and local records.
    pub fn header(&self) -> Option<&ZipEntry> {
        match &self.state {
            ReaderState::Selected { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Returns a mutable reference to the inner seekable source.
    ///
    /// Swapping the source (eg. via std::mem operations) may lead to inaccurate parsing.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Returns the inner seekable source by consuming self.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> Read for ZipFileReader<R>
where
    R: Read + Seek,
{
    /// Reads the selected entry's raw data, returning 0 once its compressed size has been consumed or the source
    /// has ended.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let ReaderState::Selected { remaining, .. } = &mut self.state else {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, ZipError::NoEntrySelected));
        };

        let limit = std::cmp::min(buf.len() as u64, *remaining) as usize;
        if limit == 0 {
            return Ok(0);
        }

        let read = self.reader.read(&mut buf[..limit])?;
        if read == 0 {
            // The source ended before the declared size was consumed.
            tracing::debug!(remaining = *remaining, "entry data truncated by end of source");
            *remaining = 0;
            return Ok(0);
        }

        *remaining -= read as u64;
        Ok(read)
    }
}

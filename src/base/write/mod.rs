// Copyright (c) 2021-2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A module which supports writing ZIP files.
//!
//! # Example
//! ### Known size
//! ```no_run
//! # use sync_zip::{Compression, ZipEntryBuilder, base::write::ZipFileWriter};
//! # use sync_zip::error::ZipError;
//! # use std::io::Cursor;
//! #
//! # fn run() -> Result<(), ZipError> {
//! let mut writer = ZipFileWriter::new(Cursor::new(Vec::<u8>::new()));
//!
//! let data = b"This is an example file.";
//! let opts = ZipEntryBuilder::new("foo.txt", Compression::Stored).file_size(data.len() as u64);
//!
//! writer.create_entry(opts)?;
//! writer.write(data)?;
//! writer.close()?;
//! writer.close_archive()?;
//! #   Ok(())
//! # }
//! ```
//! ### Compressed, falling back to store
//! ```no_run
//! # #[cfg(feature = "deflate")]
//! # {
//! # use sync_zip::{Compression, ZipEntryBuilder, WriteOutcome, base::write::ZipFileWriter};
//! # use sync_zip::base::write::DeflateCompressor;
//! # use sync_zip::error::ZipError;
//! # use std::io::Cursor;
//! #
//! # fn run() -> Result<(), ZipError> {
//! let mut writer = ZipFileWriter::new(Cursor::new(Vec::<u8>::new()));
//!
//! let data = b"This is an example file.";
//! let opts = ZipEntryBuilder::new("bar.txt", Compression::Deflate).file_size(data.len() as u64);
//!
//! writer.create_entry_with(opts, DeflateCompressor::new())?;
//! let outcome = match writer.write(data)? {
//!     WriteOutcome::Written(_) => writer.finish()?,
//!     overflow => overflow,
//! };
//!
//! if outcome == WriteOutcome::Overflow {
//!     writer.rewind_entry()?;
//!     writer.write(data)?;
//! }
//!
//! writer.close()?;
//! writer.close_archive()?;
//! #   Ok(())
//! # }
//! # }
//! ```

pub(crate) mod compressed_writer;
pub(crate) mod entry_stream;
pub(crate) mod io;

pub use compressed_writer::Compressor;
#[cfg(feature = "deflate")]
pub use compressed_writer::DeflateCompressor;

use std::io::{Seek, Write};

use crate::date::ZipDateTime;
use crate::entry::ZipEntry;
use crate::error::{Result, Zip64ErrorCase, ZipError};
use crate::spec::attribute::AttributeCompatibility;
use crate::spec::codec::Record;
use crate::spec::compression::Compression;
use crate::spec::consts::{
    CDH_SIGNATURE, EOCDR_SIGNATURE, NON_ZIP64_MAX_NUM_FILES, NON_ZIP64_MAX_SIZE, ZIP64_EOCDL_SIGNATURE,
    ZIP64_EOCDR_REMAINING_SIZE, ZIP64_EOCDR_SIGNATURE, ZIP64_VERSION_NEEDED,
};
use crate::spec::extra_field::{encode_chain, ExtraFieldVariant, Zip64ExtendedInformationExtraField};
use crate::spec::header::{
    CentralDirectoryRecord, EndOfCentralDirectoryHeader, GeneralPurposeFlag, Zip64EndOfCentralDirectoryLocator,
    Zip64EndOfCentralDirectoryRecord,
};

use entry_stream::{build_local_header, entry_extra_fields, requires_zip64, OverflowState, PendingEntry};
use io::offset::OffsetWriter;

/// The outcome of writing data to an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The given number of input bytes were accepted.
    Written(usize),
    /// The entry's data would exceed its declared size, and nothing was written.
    ///
    /// The entry must be rewound with [`ZipFileWriter::rewind_entry()`] and its data replayed, now stored as-is.
    Overflow,
}

pub(crate) struct CentralDirectoryEntry {
    pub entry: ZipEntry,
    pub flags: GeneralPurposeFlag,
    pub lh_offset: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArchiveState {
    Open,
    Closed,
}

/// A ZIP file writer which acts over seekable [`Write`] implementers.
///
/// Entries are written one at a time: [`ZipFileWriter::create_entry()`] writes the local file header, the entry's
/// data is then passed to [`ZipFileWriter::write()`], and [`ZipFileWriter::close()`] finalises it. Any header
/// values which weren't known up front are patched in place once the entry is closed.
///
/// # Note
/// - The inner writer must be positioned at the start of its stream.
/// - [`ZipFileWriter::close_archive()`] must be called before the writer goes out of scope.
pub struct ZipFileWriter<W> {
    pub(crate) writer: OffsetWriter<W>,
    pub(crate) cd_entries: Vec<CentralDirectoryEntry>,
    pending: Option<PendingEntry>,
    state: ArchiveState,
    /// If true, will error if a Zip64 struct must be written.
    force_no_zip64: bool,
    /// Whether to write Zip64 end of directory structs.
    pub(crate) is_zip64: bool,
    comment_opt: Option<Vec<u8>>,
}

impl<W: Write + Seek> ZipFileWriter<W> {
    /// Construct a new ZIP file writer from a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: OffsetWriter::new(writer),
            cd_entries: Vec::new(),
            pending: None,
            state: ArchiveState::Open,
            comment_opt: None,
            is_zip64: false,
            force_no_zip64: false,
        }
    }

    /// Force the ZIP writer to operate in non-ZIP64 mode.
    /// If any files would need ZIP64, an error will be raised.
    pub fn force_no_zip64(mut self) -> Self {
        self.force_no_zip64 = true;
        self
    }

    /// Force the ZIP writer to emit Zip64 structs at the end of the archive.
    /// Zip64 extended fields will only be written if needed.
    pub fn force_zip64(mut self) -> Self {
        self.is_zip64 = true;
        self
    }

    /// Set the ZIP file comment.
    pub fn comment(&mut self, comment: impl Into<Vec<u8>>) {
        self.comment_opt = Some(comment.into());
    }

    /// Writes the local file header of a new entry whose data the caller writes as-is.
    ///
    /// For stored entries the writer computes the CRC and size itself and [`ZipFileWriter::close()`] may be used.
    /// Any other method requires the caller to close with [`ZipFileWriter::close_with()`].
    ///
    /// Directory entries (those whose filename ends with a `/`) are closed immediately.
    pub fn create_entry<E: Into<ZipEntry>>(&mut self, entry: E) -> Result<()> {
        self.start_entry(entry.into(), None)
    }

    /// Writes the local file header of a new entry whose data is compressed by the given compressor.
    ///
    /// The writer tracks the CRC and size of the uncompressed data, so [`ZipFileWriter::close()`] may be used.
    pub fn create_entry_with<E, C>(&mut self, entry: E, compressor: C) -> Result<()>
    where
        E: Into<ZipEntry>,
        C: Compressor + 'static,
    {
        self.start_entry(entry.into(), Some(Box::new(compressor)))
    }

    #[tracing::instrument(skip_all)]
    fn start_entry(&mut self, mut entry: ZipEntry, compressor: Option<Box<dyn Compressor>>) -> Result<()> {
        self.assert_open()?;
        if self.pending.is_some() {
            return Err(ZipError::EntryStillOpen);
        }

        if entry.comment.len() > u16::MAX as usize {
            return Err(ZipError::CommentTooLarge);
        }
        if self.force_no_zip64 && requires_zip64(&entry) {
            return Err(ZipError::Zip64Needed(Zip64ErrorCase::LargeFile));
        }

        let directory = entry.dir();
        if directory {
            entry.compression = Compression::Stored;
            entry.uncompressed_size = Some(0);
            entry.compressed_size = Some(0);
            entry.crc32 = 0;
        }

        let sizes_pending = entry.compressed_size.is_none() || entry.uncompressed_size.is_none();
        let reserve_zip64 = !self.force_no_zip64 && (sizes_pending || requires_zip64(&entry));

        let lfh_offset = self.writer.offset();
        let (lfh, extra_field) = build_local_header(&entry, reserve_zip64)?;

        lfh.write_to(&mut self.writer)?;
        self.writer.write_all(&entry.filename)?;
        self.writer.write_all(&extra_field)?;

        let data_offset = self.writer.offset();
        tracing::debug!(filename = ?entry.filename_str(), lfh_offset, reserve_zip64, "wrote local file header");

        let compressor = if directory { None } else { compressor };
        self.pending =
            Some(PendingEntry::new(entry, lfh, extra_field, lfh_offset, data_offset, reserve_zip64, compressor));

        if directory {
            self.close_with(0, 0)?;
        }

        Ok(())
    }

    /// Writes data to the open entry.
    ///
    /// If the data would take the entry past its declared compressed size, nothing is written and
    /// [`WriteOutcome::Overflow`] is returned. This happens at most once per entry, after which further writes fail
    /// until the entry is rewound. A stored entry can't be rewound, so exceeding its size is an error instead.
    pub fn write(&mut self, data: &[u8]) -> Result<WriteOutcome> {
        self.assert_open()?;
        let pending = self.pending.as_mut().ok_or(ZipError::NoEntryOpen)?;

        if pending.overflow == OverflowState::Signalled {
            return Err(ZipError::RewindRequired);
        }
        if pending.finished {
            return Err(ZipError::NoEntryOpen);
        }

        let compressed = match pending.compressor.as_mut() {
            Some(compressor) => {
                let mut output = Vec::new();
                compressor.compress(data, &mut output)?;
                Some(output)
            }
            None => None,
        };
        let output = compressed.as_deref().unwrap_or(data);

        if let Some(outcome) = Self::check_bound(pending, output.len())? {
            return Ok(outcome);
        }

        self.writer.write_all(output)?;
        pending.written += output.len() as u64;

        if pending.checksummed {
            pending.hasher.update(data);
            pending.consumed += data.len() as u64;
        }

        Ok(WriteOutcome::Written(data.len()))
    }

    /// Completes the open entry's compressed stream, writing any output still held by its compressor.
    ///
    /// As with [`ZipFileWriter::write()`], [`WriteOutcome::Overflow`] is returned if this output would exceed the
    /// entry's declared compressed size. Calling this is only necessary to observe that outcome;
    /// [`ZipFileWriter::close()`] will otherwise do so itself.
    pub fn finish(&mut self) -> Result<WriteOutcome> {
        self.assert_open()?;
        let pending = self.pending.as_mut().ok_or(ZipError::NoEntryOpen)?;

        if pending.overflow == OverflowState::Signalled {
            return Err(ZipError::RewindRequired);
        }
        if pending.finished {
            return Ok(WriteOutcome::Written(0));
        }

        let mut output = Vec::new();
        if let Some(compressor) = pending.compressor.as_mut() {
            compressor.finish(&mut output)?;
        }

        if let Some(outcome) = Self::check_bound(pending, output.len())? {
            return Ok(outcome);
        }

        self.writer.write_all(&output)?;
        pending.written += output.len() as u64;
        pending.finished = true;

        Ok(WriteOutcome::Written(0))
    }

    fn check_bound(pending: &mut PendingEntry, length: usize) -> Result<Option<WriteOutcome>> {
        if !pending.exceeds_bound(length as u64) {
            return Ok(None);
        }

        let declared = pending.bound().unwrap_or_default();
        if pending.entry.compression == Compression::Stored {
            return Err(ZipError::SizeMismatch { declared, actual: pending.written + length as u64 });
        }

        tracing::debug!(declared, written = pending.written, "entry overflowed its declared size");
        pending.overflow = OverflowState::Signalled;
        Ok(Some(WriteOutcome::Overflow))
    }

    /// Rewinds an entry which has overflowed, so that its data can be replayed using the store method.
    ///
    /// The local file header is rewritten in place with the entry's original uncompressed size, and the stream is
    /// left positioned at the start of the entry's data.
    #[tracing::instrument(skip(self))]
    pub fn rewind_entry(&mut self) -> Result<()> {
        self.assert_open()?;
        let pending = self.pending.as_mut().ok_or(ZipError::NoEntryOpen)?;

        if pending.overflow != OverflowState::Signalled {
            return Err(ZipError::RewindWithoutOverflow);
        }

        pending.into_stored()?;

        self.writer.seek_to(pending.lfh_offset)?;
        pending.lfh.write_to(&mut self.writer)?;
        self.writer.write_all(&pending.entry.filename)?;
        self.writer.write_all(&pending.extra_field)?;

        debug_assert_eq!(self.writer.offset(), pending.data_offset);
        tracing::debug!(lfh_offset = pending.lfh_offset, "rewound entry to the store method");

        Ok(())
    }

    /// Closes the open entry using the CRC and size computed by the writer.
    ///
    /// This is only possible for stored entries and entries written through a compressor; for other entries
    /// [`ZipFileWriter::close_with()`] must be used.
    pub fn close(&mut self) -> Result<()> {
        if self.finish()? == WriteOutcome::Overflow {
            return Err(ZipError::RewindRequired);
        }

        let (crc, size) = match &self.pending {
            Some(pending) if pending.checksummed => (pending.hasher.clone().finalize(), pending.consumed),
            Some(_) => return Err(ZipError::EntrySizesRequired),
            None => return Err(ZipError::NoEntryOpen),
        };

        self.close_with(crc, size)
    }

    /// Closes the open entry using the given CRC and uncompressed size.
    ///
    /// If these (or the compressed size) differ from those in the local file header, the header is patched in place.
    /// The stream is left positioned at the end of the entry's data.
    #[tracing::instrument(skip(self))]
    pub fn close_with(&mut self, crc32: u32, uncompressed_size: u64) -> Result<()> {
        if self.finish()? == WriteOutcome::Overflow {
            return Err(ZipError::RewindRequired);
        }

        let pending = self.pending.as_ref().ok_or(ZipError::NoEntryOpen)?;
        let compressed_size = pending.written;

        if let Some(declared) = pending.entry.uncompressed_size {
            if declared != uncompressed_size {
                return Err(ZipError::SizeMismatch { declared, actual: uncompressed_size });
            }
        }
        if pending.entry.compression == Compression::Stored {
            if let Some(declared) = pending.entry.compressed_size {
                if declared != compressed_size {
                    return Err(ZipError::SizeMismatch { declared, actual: compressed_size });
                }
            }
            if uncompressed_size != compressed_size {
                return Err(ZipError::SizeMismatch { declared: uncompressed_size, actual: compressed_size });
            }
        }

        let mut pending = self.pending.take().ok_or(ZipError::NoEntryOpen)?;
        pending.entry.crc32 = crc32;
        pending.entry.uncompressed_size = Some(uncompressed_size);
        pending.entry.compressed_size = Some(compressed_size);

        if self.force_no_zip64 && requires_zip64(&pending.entry) {
            return Err(ZipError::Zip64Needed(Zip64ErrorCase::LargeFile));
        }

        let (lfh, extra_field) = build_local_header(&pending.entry, pending.reserve_zip64)?;

        if lfh != pending.lfh || extra_field != pending.extra_field {
            if extra_field.len() != pending.extra_field.len() {
                return Err(ZipError::Zip64Needed(Zip64ErrorCase::LargeFile));
            }

            let end_offset = self.writer.offset();
            self.writer.seek_to(pending.lfh_offset)?;
            lfh.write_to(&mut self.writer)?;
            self.writer.write_all(&pending.entry.filename)?;
            self.writer.write_all(&extra_field)?;
            self.writer.seek_to(end_offset)?;

            tracing::debug!(lfh_offset = pending.lfh_offset, "patched local file header");
        }

        self.cd_entries.push(CentralDirectoryEntry {
            flags: lfh.flags,
            lh_offset: pending.lfh_offset,
            entry: pending.entry,
        });

        // Ensure that we can fit this many files in this archive if forcing no zip64
        if self.cd_entries.len() >= NON_ZIP64_MAX_NUM_FILES as usize {
            if self.force_no_zip64 {
                return Err(ZipError::Zip64Needed(Zip64ErrorCase::TooManyFiles));
            }
            if !self.is_zip64 {
                self.is_zip64 = true;
            }
        }

        Ok(())
    }

    /// Completes all closing tasks.
    ///
    /// This includes:
    /// - Writing all central directory headers.
    /// - Writing the ZIP64 end of central directory record and locator, if needed.
    /// - Writing the end of central directory header.
    /// - Writing the file comment.
    ///
    /// Failure to call this function before going out of scope would result in a corrupted ZIP file. Calling it a
    /// second time is an error.
    #[tracing::instrument(skip(self))]
    pub fn close_archive(&mut self) -> Result<()> {
        self.assert_open()?;
        if self.pending.is_some() {
            return Err(ZipError::EntryStillOpen);
        }

        let comment = self.comment_opt.take().unwrap_or_default();
        let comment_length: u16 = comment.len().try_into().map_err(|_| ZipError::CommentTooLarge)?;

        let cd_offset = self.writer.offset();

        for entry in &self.cd_entries {
            let (header, extra_field) = central_directory_record(entry)?;

            header.write_to(&mut self.writer)?;
            self.writer.write_all(&entry.entry.filename)?;
            self.writer.write_all(&extra_field)?;
            self.writer.write_all(&entry.entry.comment)?;
        }

        let central_directory_size = self.writer.offset() - cd_offset;
        let num_entries_in_directory = self.cd_entries.len() as u64;

        if num_entries_in_directory >= NON_ZIP64_MAX_NUM_FILES as u64
            || central_directory_size >= NON_ZIP64_MAX_SIZE as u64
            || cd_offset >= NON_ZIP64_MAX_SIZE as u64
        {
            if self.force_no_zip64 {
                return Err(ZipError::Zip64Needed(match num_entries_in_directory >= NON_ZIP64_MAX_NUM_FILES as u64 {
                    true => Zip64ErrorCase::TooManyFiles,
                    false => Zip64ErrorCase::LargeFile,
                }));
            }
            self.is_zip64 = true;
        }

        // Add the zip64 EOCDR and EOCDL if we are in zip64 mode.
        let header = if self.is_zip64 {
            let eocdr_offset = self.writer.offset();

            let eocdr = Zip64EndOfCentralDirectoryRecord {
                signature: ZIP64_EOCDR_SIGNATURE,
                size_of_zip64_end_of_cd_record: ZIP64_EOCDR_REMAINING_SIZE,
                version_made_by: crate::spec::version::as_made_by(AttributeCompatibility::Unix),
                version_needed_to_extract: ZIP64_VERSION_NEEDED,
                disk_number: 0,
                disk_number_start_of_cd: 0,
                num_entries_in_directory_on_disk: num_entries_in_directory,
                num_entries_in_directory,
                directory_size: central_directory_size,
                offset_of_start_of_directory: cd_offset,
            };
            eocdr.write_to(&mut self.writer)?;

            let eocdl = Zip64EndOfCentralDirectoryLocator {
                signature: ZIP64_EOCDL_SIGNATURE,
                number_of_disk_with_start_of_zip64_end_of_central_directory: 0,
                relative_offset: eocdr_offset,
                total_number_of_disks: 1,
            };
            eocdl.write_to(&mut self.writer)?;

            EndOfCentralDirectoryHeader {
                signature: EOCDR_SIGNATURE,
                disk_num: 0,
                start_cent_dir_disk: 0,
                num_of_entries_disk: NON_ZIP64_MAX_NUM_FILES,
                num_of_entries: NON_ZIP64_MAX_NUM_FILES,
                size_cent_dir: NON_ZIP64_MAX_SIZE,
                cent_dir_offset: NON_ZIP64_MAX_SIZE,
                file_comm_length: comment_length,
            }
        } else {
            EndOfCentralDirectoryHeader {
                signature: EOCDR_SIGNATURE,
                disk_num: 0,
                start_cent_dir_disk: 0,
                num_of_entries_disk: num_entries_in_directory as u16,
                num_of_entries: num_entries_in_directory as u16,
                size_cent_dir: central_directory_size as u32,
                cent_dir_offset: cd_offset as u32,
                file_comm_length: comment_length,
            }
        };

        header.write_to(&mut self.writer)?;
        self.writer.write_all(&comment)?;
        self.writer.flush()?;

        tracing::debug!(entries = num_entries_in_directory, zip64 = self.is_zip64, "closed archive");
        self.state = ArchiveState::Closed;
        Ok(())
    }

    /// Returns a mutable reference to the inner writer.
    ///
    /// Care should be taken when using this inner writer as doing so may invalidate internal state of this writer.
    pub fn inner_mut(&mut self) -> &mut W {
        self.writer.inner_mut()
    }

    /// Consumes this ZIP writer and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn assert_open(&self) -> Result<()> {
        match self.state {
            ArchiveState::Open => Ok(()),
            ArchiveState::Closed => Err(ZipError::ArchiveClosed),
        }
    }
}

/// Builds an entry's central directory record and extra field.
///
/// Values are moved into a ZIP64 extra field only if they don't fit within their 32-bit field.
fn central_directory_record(entry: &CentralDirectoryEntry) -> Result<(CentralDirectoryRecord, Vec<u8>)> {
    let mut zip64 = Zip64ExtendedInformationExtraField::default();
    let narrow = |value: u64, slot: &mut Option<u64>| match value >= NON_ZIP64_MAX_SIZE as u64 {
        true => {
            *slot = Some(value);
            NON_ZIP64_MAX_SIZE
        }
        false => value as u32,
    };

    let uncompressed_size = narrow(entry.entry.uncompressed_size.unwrap_or(0), &mut zip64.uncompressed_size);
    let compressed_size = narrow(entry.entry.compressed_size.unwrap_or(0), &mut zip64.compressed_size);
    let lh_offset = narrow(entry.lh_offset, &mut zip64.relative_header_offset);

    let zip64 = match zip64 != Zip64ExtendedInformationExtraField::default() {
        true => Some(zip64),
        false => None,
    };
    let is_zip64 = zip64.is_some();

    let extra_field = encode_chain(&entry_extra_fields(&entry.entry, zip64), ExtraFieldVariant::Central)?;

    let header = CentralDirectoryRecord {
        signature: CDH_SIGNATURE,
        v_made_by: crate::spec::version::as_made_by(entry.entry.attribute_compatibility),
        v_needed: crate::spec::version::as_needed_to_extract(&entry.entry, is_zip64),
        flags: entry.flags,
        compression: entry.entry.compression.into(),
        date_time: ZipDateTime::from_chrono(&entry.entry.last_modification_date),
        crc: entry.entry.crc32,
        compressed_size,
        uncompressed_size,
        file_name_length: entry.entry.filename.len().try_into().map_err(|_| ZipError::FileNameTooLarge)?,
        extra_field_length: extra_field.len().try_into().map_err(|_| ZipError::ExtraFieldTooLarge)?,
        file_comment_length: entry.entry.comment.len().try_into().map_err(|_| ZipError::CommentTooLarge)?,
        disk_start: 0,
        inter_attr: entry.entry.internal_file_attribute,
        exter_attr: entry.entry.external_file_attribute,
        lh_offset,
    };

    Ok((header, extra_field))
}

// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! The state of an entry between its local file header being written and it being closed.

use chrono::{DateTime, Utc};
use crc32fast::Hasher;

use crate::base::write::compressed_writer::Compressor;
use crate::date::ZipDateTime;
use crate::entry::ZipEntry;
use crate::error::{Result, Zip64ErrorCase, ZipError};
use crate::spec::compression::Compression;
use crate::spec::consts::{LFH_SIGNATURE, NON_ZIP64_MAX_SIZE};
use crate::spec::extra_field::{
    encode_chain, ExtendedTimestampExtraField, ExtraField, ExtraFieldVariant, InfoZipUnixExtraField,
    Zip64ExtendedInformationExtraField,
};
use crate::spec::header::{GeneralPurposeFlag, LocalFileHeader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OverflowState {
    None,
    /// The declared bound was exceeded and the entry must be rewound before anything else.
    Signalled,
    /// The entry has been rewound to the store method and is being replayed.
    Rewound,
}

/// An entry whose local file header has been written but which hasn't yet been closed.
pub(crate) struct PendingEntry {
    pub(crate) entry: ZipEntry,
    pub(crate) lfh: LocalFileHeader,
    pub(crate) extra_field: Vec<u8>,
    pub(crate) lfh_offset: u64,
    pub(crate) data_offset: u64,
    /// Whether the local header carries a ZIP64 extra field. Fixed for the entry's lifetime so that the header
    /// length never changes when patched.
    pub(crate) reserve_zip64: bool,
    /// Bytes written to the stream as the entry's data.
    pub(crate) written: u64,
    /// Uncompressed bytes seen by the writer.
    pub(crate) consumed: u64,
    pub(crate) hasher: Hasher,
    pub(crate) compressor: Option<Box<dyn Compressor>>,
    pub(crate) overflow: OverflowState,
    /// Whether the writer sees the uncompressed data, and so can compute the CRC and size itself.
    pub(crate) checksummed: bool,
    pub(crate) finished: bool,
}

impl PendingEntry {
    pub(crate) fn new(
        entry: ZipEntry,
        lfh: LocalFileHeader,
        extra_field: Vec<u8>,
        lfh_offset: u64,
        data_offset: u64,
        reserve_zip64: bool,
        compressor: Option<Box<dyn Compressor>>,
    ) -> Self {
        let checksummed = compressor.is_some() || entry.compression == Compression::Stored;

        Self {
            entry,
            lfh,
            extra_field,
            lfh_offset,
            data_offset,
            reserve_zip64,
            written: 0,
            consumed: 0,
            hasher: Hasher::new(),
            compressor,
            overflow: OverflowState::None,
            checksummed,
            finished: false,
        }
    }

    /// Returns how many bytes may be written for this entry, if bounded.
    pub(crate) fn bound(&self) -> Option<u64> {
        self.entry.compressed_size
    }

    /// Returns whether writing `length` more bytes would exceed the entry's declared bound.
    pub(crate) fn exceeds_bound(&self, length: u64) -> bool {
        matches!(self.bound(), Some(bound) if self.written + length > bound)
    }

    /// Switches the entry to the store method with its original uncompressed size, discarding all progress.
    pub(crate) fn into_stored(&mut self) -> Result<()> {
        // An undeclared size stays pending and is patched back once the replay is closed.
        let size = self.entry.uncompressed_size;

        self.entry.compression = Compression::Stored;
        self.entry.uncompressed_size = size;
        self.entry.compressed_size = size;
        self.entry.crc32 = 0;

        self.compressor = None;
        self.checksummed = true;
        self.hasher = Hasher::new();
        self.consumed = 0;
        self.written = 0;
        self.finished = false;
        self.overflow = OverflowState::Rewound;

        let (lfh, extra_field) = build_local_header(&self.entry, self.reserve_zip64)?;
        if extra_field.len() != self.extra_field.len() {
            return Err(ZipError::Zip64Needed(Zip64ErrorCase::LargeFile));
        }

        self.lfh = lfh;
        self.extra_field = extra_field;
        Ok(())
    }
}

/// Returns whether an entry with the given sizes must carry them in a ZIP64 extra field.
pub(crate) fn requires_zip64(entry: &ZipEntry) -> bool {
    let large = |size: Option<u64>| matches!(size, Some(size) if size >= NON_ZIP64_MAX_SIZE as u64);
    large(entry.compressed_size) || large(entry.uncompressed_size)
}

/// Builds an entry's local file header and extra field.
///
/// Unknown sizes are written as zero. When `reserve_zip64` is set a ZIP64 extra field always carries both sizes,
/// and the 32-bit fields hold the sentinel only if either size needs it.
pub(crate) fn build_local_header(entry: &ZipEntry, reserve_zip64: bool) -> Result<(LocalFileHeader, Vec<u8>)> {
    let compressed = entry.compressed_size.unwrap_or(0);
    let uncompressed = entry.uncompressed_size.unwrap_or(0);

    let (compressed_size, uncompressed_size, zip64) = if reserve_zip64 {
        let field = Zip64ExtendedInformationExtraField {
            uncompressed_size: Some(uncompressed),
            compressed_size: Some(compressed),
            ..Default::default()
        };

        if requires_zip64(entry) {
            (NON_ZIP64_MAX_SIZE, NON_ZIP64_MAX_SIZE, Some(field))
        } else {
            (compressed as u32, uncompressed as u32, Some(field))
        }
    } else {
        if requires_zip64(entry) {
            return Err(ZipError::Zip64Needed(Zip64ErrorCase::LargeFile));
        }

        (compressed as u32, uncompressed as u32, None)
    };

    let extra_field = encode_chain(&entry_extra_fields(entry, zip64), ExtraFieldVariant::Local)?;

    let lfh = LocalFileHeader {
        signature: LFH_SIGNATURE,
        version: crate::spec::version::as_needed_to_extract(entry, reserve_zip64),
        flags: flags(entry),
        compression: entry.compression.into(),
        date_time: ZipDateTime::from_chrono(&entry.last_modification_date),
        crc: entry.crc32,
        compressed_size,
        uncompressed_size,
        file_name_length: entry.filename.len().try_into().map_err(|_| ZipError::FileNameTooLarge)?,
        extra_field_length: extra_field.len().try_into().map_err(|_| ZipError::ExtraFieldTooLarge)?,
    };

    Ok((lfh, extra_field))
}

pub(crate) fn flags(entry: &ZipEntry) -> GeneralPurposeFlag {
    let filename_unicode = matches!(entry.filename_str(), Some(filename) if !filename.is_ascii());

    GeneralPurposeFlag { encrypted: entry.encrypted, data_descriptor: false, filename_unicode, other: 0 }
}

/// Synthesises an entry's extra fields in the order ZIP64, extended timestamp, Info-ZIP Unix.
pub(crate) fn entry_extra_fields(
    entry: &ZipEntry,
    zip64: Option<Zip64ExtendedInformationExtraField>,
) -> Vec<ExtraField> {
    let mut fields = Vec::with_capacity(3);

    if let Some(zip64) = zip64 {
        fields.push(ExtraField::Zip64ExtendedInformation(zip64));
    }

    let timestamp = ExtendedTimestampExtraField {
        modification_time: unix_seconds(&entry.last_modification_date),
        access_time: entry.last_access_date.as_ref().and_then(unix_seconds),
        creation_time: entry.creation_date.as_ref().and_then(unix_seconds),
    };
    if timestamp.modification_time.is_some() || timestamp.access_time.is_some() || timestamp.creation_time.is_some()
    {
        fields.push(ExtraField::ExtendedTimestamp(timestamp));
    }

    if let Some(owner) = entry.owner {
        fields.push(ExtraField::InfoZipUnix(InfoZipUnixExtraField { ids: Some((owner.uid, owner.gid)) }));
    }

    fields
}

fn unix_seconds(date: &DateTime<Utc>) -> Option<i32> {
    date.timestamp().try_into().ok()
}

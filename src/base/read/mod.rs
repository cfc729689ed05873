// Copyright (c) 2022-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A module which supports reading ZIP files.

pub mod seek;

pub(crate) mod io;

use std::io::{BufReader, Read, Seek, SeekFrom};

use chrono::{DateTime, Utc};

use crate::date::ZipDateTime;
use crate::entry::{StoredZipEntry, UnixOwner, ZipEntry};
use crate::error::{Result, ZipError};
use crate::file::ZipFile;
use crate::spec::attribute::AttributeCompatibility;
use crate::spec::codec::Record;
use crate::spec::consts::{CDH_SIGNATURE, LFH_LENGTH, LFH_SIGNATURE};
use crate::spec::extra_field::{
    parse_extra_fields, ExtendedTimestampExtraField, ExtraField, Zip64ExtendedInformationExtraField, Zip64Sentinels,
};
use crate::spec::header::{assert_signature, CentralDirectoryRecord, LocalFileHeader};

/// The max buffer size used when parsing the central directory, equal to 20MiB.
const MAX_CD_BUFFER_SIZE: usize = 20 * 1024 * 1024;

/// The most entries preallocated for ahead of parsing, as the declared count is untrusted.
const MAX_PREALLOCATED_ENTRIES: usize = 4096;

#[tracing::instrument(skip(reader))]
pub(crate) fn file<R>(mut reader: R) -> Result<ZipFile>
where
    R: Read + Seek,
{
    // First find and parse the EOCDR, along with any ZIP64 EOCDR it defers to.
    let (eocdr, comment) = io::locator::central_directory(&mut reader)?;

    // Outdated feature so unlikely to ever make it into this crate.
    if eocdr.disk_number != eocdr.disk_number_start_of_cd
        || eocdr.num_entries_in_directory != eocdr.num_entries_in_directory_on_disk
    {
        return Err(ZipError::FeatureNotSupported("Spanned/split files"));
    }

    // Find and parse the central directory.
    reader.seek(SeekFrom::Start(eocdr.offset_of_start_of_directory))?;

    // To avoid lots of small reads to `reader` when parsing the central directory, we use a BufReader that can read the
    // whole central directory at once. Because `eocdr.directory_size` is a u64, we use MAX_CD_BUFFER_SIZE to prevent
    // very large buffer sizes.
    let capacity = std::cmp::min(eocdr.directory_size.try_into().unwrap_or(MAX_CD_BUFFER_SIZE), MAX_CD_BUFFER_SIZE);
    let buf = BufReader::with_capacity(std::cmp::max(capacity, 1), reader);
    let entries = cd(buf, eocdr.num_entries_in_directory)?;

    tracing::debug!(entries = entries.len(), zip64 = eocdr.zip64, "parsed central directory");
    Ok(ZipFile { entries, comment, zip64: eocdr.zip64 })
}

pub(crate) fn cd<R>(mut reader: R, num_of_entries: u64) -> Result<Vec<StoredZipEntry>>
where
    R: Read,
{
    let num_of_entries: usize = num_of_entries.try_into().map_err(|_| ZipError::TargetZip64NotSupported)?;
    let mut entries = Vec::with_capacity(std::cmp::min(num_of_entries, MAX_PREALLOCATED_ENTRIES));

    for index in 0..num_of_entries {
        match cd_record(&mut reader)? {
            Some(entry) => entries.push(entry),
            None => {
                return Err(ZipError::EntryCountMismatch { expected: num_of_entries as u64, actual: index as u64 })
            }
        }
    }

    Ok(entries)
}

/// Parses a single central directory record, or returns None if the data at the cursor isn't one.
pub(crate) fn cd_record<R>(mut reader: R) -> Result<Option<StoredZipEntry>>
where
    R: Read,
{
    let header = match CentralDirectoryRecord::read_from(&mut reader) {
        Ok(header) if header.signature == CDH_SIGNATURE => header,
        Ok(_) | Err(ZipError::TruncatedHeader { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };

    let filename = io::read_bytes(&mut reader, header.file_name_length.into())?;
    let extra_field = io::read_bytes(&mut reader, header.extra_field_length.into())?;
    let comment = io::read_bytes(&mut reader, header.file_comment_length.into())?;

    let sentinels = Zip64Sentinels::new(header.uncompressed_size, header.compressed_size)
        .with_offset(header.lh_offset, header.disk_start);
    let extra_fields = parse_extra_fields(&extra_field, sentinels)?;

    let zip64_extra_field = get_zip64_extra_field(&extra_fields);
    let (uncompressed_size, compressed_size) =
        get_combined_sizes(header.uncompressed_size, header.compressed_size, zip64_extra_field);

    let file_offset = zip64_extra_field
        .and_then(|field| field.relative_header_offset)
        .unwrap_or(header.lh_offset as u64);

    let mut entry = ZipEntry {
        filename,
        compression: header.compression.into(),
        attribute_compatibility: AttributeCompatibility::from((header.v_made_by >> 8) as u8),
        crc32: header.crc,
        uncompressed_size: Some(uncompressed_size),
        compressed_size: Some(compressed_size),
        last_modification_date: dos_date_or_epoch(header.date_time),
        last_access_date: None,
        creation_date: None,
        internal_file_attribute: header.inter_attr,
        external_file_attribute: header.exter_attr,
        owner: None,
        comment,
        encrypted: header.flags.encrypted,
    };
    apply_extra_fields(&mut entry, &extra_fields);

    tracing::trace!(filename = ?entry.filename_str(), file_offset, "parsed central directory record");
    Ok(Some(StoredZipEntry { entry, file_offset }))
}

/// Parses the local file header at the cursor and merges it into the entry's central directory copy.
///
/// Returns the merged entry and the length of the local header, including its filename and extra field.
pub(crate) fn lfh<R>(mut reader: R, central: &ZipEntry) -> Result<(ZipEntry, u64)>
where
    R: Read,
{
    let header = LocalFileHeader::read_from(&mut reader)?;
    assert_signature(header.signature, LFH_SIGNATURE)?;

    // The filename is re-read only to advance past it.
    io::read_bytes(&mut reader, header.file_name_length.into())?;
    let extra_field = io::read_bytes(&mut reader, header.extra_field_length.into())?;
    let extra_fields =
        parse_extra_fields(&extra_field, Zip64Sentinels::new(header.uncompressed_size, header.compressed_size))?;

    let mut entry = central.clone();
    entry.compression = header.compression.into();
    entry.encrypted = header.flags.encrypted;

    if header.date_time != Default::default() {
        if let Some(date) = header.date_time.as_chrono().single() {
            entry.last_modification_date = date;
        }
    }

    // Sizes following a data descriptor are only known to the central directory.
    if !header.flags.data_descriptor {
        let (uncompressed_size, compressed_size) = get_combined_sizes(
            header.uncompressed_size,
            header.compressed_size,
            get_zip64_extra_field(&extra_fields),
        );
        entry.uncompressed_size = Some(uncompressed_size);
        entry.compressed_size = Some(compressed_size);
        entry.crc32 = header.crc;
    }

    apply_extra_fields(&mut entry, &extra_fields);

    let header_length = (LFH_LENGTH + header.file_name_length as usize + header.extra_field_length as usize) as u64;
    Ok((entry, header_length))
}

/// Converts a central record's DOS date, falling back to the Unix epoch if it doesn't name a real date.
///
/// An extended timestamp field, or a valid local header date, replaces the fallback later on.
fn dos_date_or_epoch(date_time: ZipDateTime) -> DateTime<Utc> {
    match date_time.as_chrono().single() {
        Some(date) => date,
        None => {
            tracing::trace!(?date_time, "invalid DOS date in central directory record, using the Unix epoch");
            DateTime::default()
        }
    }
}

pub(crate) fn get_zip64_extra_field(extra_fields: &[ExtraField]) -> Option<&Zip64ExtendedInformationExtraField> {
    for field in extra_fields {
        if let ExtraField::Zip64ExtendedInformation(zip64field) = field {
            return Some(zip64field);
        }
    }
    None
}

fn get_combined_sizes(
    uncompressed_size: u32,
    compressed_size: u32,
    extra_field: Option<&Zip64ExtendedInformationExtraField>,
) -> (u64, u64) {
    let mut uncompressed_size = uncompressed_size as u64;
    let mut compressed_size = compressed_size as u64;

    if let Some(extra_field) = extra_field {
        if let Some(s) = extra_field.uncompressed_size {
            uncompressed_size = s;
        }
        if let Some(s) = extra_field.compressed_size {
            compressed_size = s;
        }
    }

    (uncompressed_size, compressed_size)
}

/// Applies the timestamp and owner extra fields to an entry, leaving values they don't carry untouched.
fn apply_extra_fields(entry: &mut ZipEntry, extra_fields: &[ExtraField]) {
    for field in extra_fields {
        match field {
            ExtraField::ExtendedTimestamp(timestamp) => apply_timestamps(entry, timestamp),
            ExtraField::InfoZipUnix(unix) => {
                if let Some((uid, gid)) = unix.ids {
                    entry.owner = Some(UnixOwner { uid, gid });
                }
            }
            _ => (),
        }
    }
}

fn apply_timestamps(entry: &mut ZipEntry, timestamp: &ExtendedTimestampExtraField) {
    let to_date = |seconds: i32| DateTime::<Utc>::from_timestamp(seconds as i64, 0);

    if let Some(date) = timestamp.modification_time.and_then(to_date) {
        entry.last_modification_date = date;
    }
    if let Some(date) = timestamp.access_time.and_then(to_date) {
        entry.last_access_date = Some(date);
    }
    if let Some(date) = timestamp.creation_time.and_then(to_date) {
        entry.creation_date = Some(date);
    }
}

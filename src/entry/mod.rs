// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

pub mod builder;

use chrono::{DateTime, Utc};

use crate::entry::builder::ZipEntryBuilder;
use crate::spec::attribute::AttributeCompatibility;
use crate::spec::compression::Compression;

/// A Unix owner stored within the Info-ZIP Unix extra field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnixOwner {
    pub uid: u16,
    pub gid: u16,
}

/// An immutable store of data about a ZIP entry.
///
/// This type cannot be directly constructed so instead, the [`ZipEntryBuilder`] must be used. Internally this builder
/// stores a [`ZipEntry`] so conversions between these two types via the [`From`] implementations will be
/// non-allocating.
#[derive(Clone, Debug, PartialEq)]
pub struct ZipEntry {
    pub(crate) filename: Vec<u8>,
    pub(crate) compression: Compression,
    pub(crate) attribute_compatibility: AttributeCompatibility,
    pub(crate) crc32: u32,
    pub(crate) uncompressed_size: Option<u64>,
    pub(crate) compressed_size: Option<u64>,
    pub(crate) last_modification_date: DateTime<Utc>,
    pub(crate) last_access_date: Option<DateTime<Utc>>,
    pub(crate) creation_date: Option<DateTime<Utc>>,
    pub(crate) internal_file_attribute: u16,
    pub(crate) external_file_attribute: u32,
    pub(crate) owner: Option<UnixOwner>,
    pub(crate) comment: Vec<u8>,
    pub(crate) encrypted: bool,
}

impl From<ZipEntryBuilder> for ZipEntry {
    fn from(builder: ZipEntryBuilder) -> Self {
        builder.0
    }
}

impl ZipEntry {
    pub(crate) fn new(filename: Vec<u8>, compression: Compression) -> Self {
        ZipEntry {
            filename,
            compression,
            attribute_compatibility: AttributeCompatibility::Unix,
            crc32: 0,
            uncompressed_size: None,
            compressed_size: None,
            last_modification_date: whole_seconds(Utc::now()),
            last_access_date: None,
            creation_date: None,
            internal_file_attribute: 0,
            external_file_attribute: 0,
            owner: None,
            comment: Vec::new(),
            encrypted: false,
        }
    }

    /// Returns the entry's raw filename.
    ///
    /// ## Note
    /// This will return the raw filename stored during ZIP creation. If calling this method on entries retrieved from
    /// untrusted ZIP files, the filename should be sanitised before being used as a path to prevent [directory
    /// traversal attacks](https://en.wikipedia.org/wiki/Directory_traversal_attack).
    pub fn filename(&self) -> &[u8] {
        &self.filename
    }

    /// Returns the entry's filename as a string, if it is valid UTF-8.
    pub fn filename_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.filename).ok()
    }

    /// Returns the entry's compression method.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the entry's attribute host compatibility.
    pub fn attribute_compatibility(&self) -> AttributeCompatibility {
        self.attribute_compatibility
    }

    /// Returns the entry's CRC32 value.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Returns the entry's uncompressed size, if known.
    pub fn uncompressed_size(&self) -> Option<u64> {
        self.uncompressed_size
    }

    /// Returns the entry's compressed size, if known.
    pub fn compressed_size(&self) -> Option<u64> {
        self.compressed_size
    }

    /// Returns the entry's last modification time & date.
    pub fn last_modification_date(&self) -> &DateTime<Utc> {
        &self.last_modification_date
    }

    /// Returns the entry's last access time & date, if recorded.
    pub fn last_access_date(&self) -> Option<&DateTime<Utc>> {
        self.last_access_date.as_ref()
    }

    /// Returns the entry's creation time & date, if recorded.
    pub fn creation_date(&self) -> Option<&DateTime<Utc>> {
        self.creation_date.as_ref()
    }

    /// Returns the entry's internal file attribute.
    pub fn internal_file_attribute(&self) -> u16 {
        self.internal_file_attribute
    }

    /// Returns the entry's external file attribute
    pub fn external_file_attribute(&self) -> u32 {
        self.external_file_attribute
    }

    /// Returns the entry's Unix owner, if recorded.
    pub fn owner(&self) -> Option<UnixOwner> {
        self.owner
    }

    /// Returns the entry's file comment.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Returns whether or not the entry is flagged as encrypted.
    pub fn encrypted(&self) -> bool {
        self.encrypted
    }

    /// Returns the entry's Unix permissions mode, or None if the entry isn't Unix-compatible.
    pub fn unix_permissions(&self) -> Option<u16> {
        if !matches!(self.attribute_compatibility, AttributeCompatibility::Unix) {
            return None;
        }

        Some((self.external_file_attribute >> 16) as u16)
    }

    /// Returns whether or not the entry represents a directory.
    pub fn dir(&self) -> bool {
        self.filename.ends_with(b"/")
    }
}

/// An entry returned by the reader alongside the offset of its local file header.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredZipEntry {
    pub(crate) entry: ZipEntry,
    pub(crate) file_offset: u64,
}

impl StoredZipEntry {
    /// Returns the offset in bytes to where the header of the entry starts.
    pub fn header_offset(&self) -> u64 {
        self.file_offset
    }

    /// Returns the entry itself.
    pub fn entry(&self) -> &ZipEntry {
        &self.entry
    }
}

impl std::ops::Deref for StoredZipEntry {
    type Target = ZipEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// Drops any sub-second precision, which no ZIP timestamp can carry.
pub(crate) fn whole_seconds(date: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(date.timestamp(), 0).unwrap_or(date)
}

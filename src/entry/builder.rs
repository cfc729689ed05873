// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use chrono::{DateTime, Utc};

use crate::entry::{whole_seconds, UnixOwner, ZipEntry};
use crate::spec::attribute::AttributeCompatibility;
use crate::spec::compression::Compression;

/// A builder for [`ZipEntry`].
pub struct ZipEntryBuilder(pub(crate) ZipEntry);

impl From<ZipEntry> for ZipEntryBuilder {
    fn from(entry: ZipEntry) -> Self {
        Self(entry)
    }
}

impl ZipEntryBuilder {
    /// Constructs a new builder which defines the raw underlying data of a ZIP entry.
    ///
    /// A filename and compression method are needed to construct the builder as minimal parameters. The last
    /// modification date defaults to the current time.
    pub fn new(filename: impl Into<Vec<u8>>, compression: Compression) -> Self {
        Self(ZipEntry::new(filename.into(), compression))
    }

    /// Sets the entry's filename.
    pub fn filename(mut self, filename: impl Into<Vec<u8>>) -> Self {
        self.0.filename = filename.into();
        self
    }

    /// Sets the entry's compression method.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.0.compression = compression;
        self
    }

    /// Declares the entry's uncompressed and compressed sizes up front.
    ///
    /// The compressed size bounds the number of bytes which may be written for the entry.
    pub fn size(mut self, uncompressed_size: u64, compressed_size: u64) -> Self {
        self.0.uncompressed_size = Some(uncompressed_size);
        self.0.compressed_size = Some(compressed_size);
        self
    }

    /// Declares the entry's size for data which is expected to be no larger once written.
    ///
    /// This is equivalent to `size(size, size)`.
    pub fn file_size(self, size: u64) -> Self {
        self.size(size, size)
    }

    /// Sets the entry's CRC32 value.
    pub fn crc32(mut self, crc32: u32) -> Self {
        self.0.crc32 = crc32;
        self
    }

    /// Sets the entry's attribute host compatibility.
    pub fn attribute_compatibility(mut self, compatibility: AttributeCompatibility) -> Self {
        self.0.attribute_compatibility = compatibility;
        self
    }

    /// Sets the entry's last modification date.
    pub fn last_modification_date(mut self, date: DateTime<Utc>) -> Self {
        self.0.last_modification_date = whole_seconds(date);
        self
    }

    /// Sets the entry's last access date.
    pub fn last_access_date(mut self, date: DateTime<Utc>) -> Self {
        self.0.last_access_date = Some(whole_seconds(date));
        self
    }

    /// Sets the entry's creation date.
    pub fn creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.0.creation_date = Some(whole_seconds(date));
        self
    }

    /// Sets the entry's internal file attribute.
    pub fn internal_file_attribute(mut self, attribute: u16) -> Self {
        self.0.internal_file_attribute = attribute;
        self
    }

    /// Sets the entry's external file attribute.
    pub fn external_file_attribute(mut self, attribute: u32) -> Self {
        self.0.external_file_attribute = attribute;
        self
    }

    /// Sets the entry's Unix owner.
    pub fn owner(mut self, uid: u16, gid: u16) -> Self {
        self.0.owner = Some(UnixOwner { uid, gid });
        self
    }

    /// Sets the entry's file comment.
    pub fn comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.0.comment = comment.into();
        self
    }

    /// Sets whether the entry is flagged as encrypted.
    ///
    /// Only the flag is written. The entry's data must already be encrypted by the caller.
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.0.encrypted = encrypted;
        self
    }

    /// Sets the entry's Unix permissions mode.
    ///
    /// If the attribute host compatibility isn't set to Unix, this will have no effect.
    pub fn unix_permissions(mut self, mode: u16) -> Self {
        if matches!(self.0.attribute_compatibility, AttributeCompatibility::Unix) {
            self.0.external_file_attribute = (self.0.external_file_attribute & 0xFFFF) | (mode as u32) << 16;
        }
        self
    }

    /// Consumes this builder and returns a final [`ZipEntry`].
    ///
    /// This is equivalent to:
    /// ```
    /// # use sync_zip::{ZipEntry, ZipEntryBuilder, Compression};
    /// #
    /// # let builder = ZipEntryBuilder::new("foo.bar", Compression::Stored);
    /// let entry: ZipEntry = builder.into();
    /// ```
    pub fn build(self) -> ZipEntry {
        self.into()
    }
}

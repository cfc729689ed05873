// Copyright (c) 2021-2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! # sync_zip
//!
//! A synchronous ZIP archive reading/writing crate, built on a generic codec for fixed-layout binary headers.
//!
//! ## Features
//! - Blocking design over any [`std::io::Read`]/[`std::io::Write`] + [`std::io::Seek`] stream.
//! - Reliable location of the central directory, even behind comments containing false signatures.
//! - ZIP64 support for archives and entries beyond 32-bit limits.
//! - Entries whose sizes are only known once written, with local headers patched in place afterwards.
//! - Pluggable compression, falling back to the store method when compressed data outgrows its declared size.
//! - Aims for reasonable [specification](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT) compliance.
//!
//! ## Feature flags
//! - `deflate` - Provides a [`DeflateCompressor`] backed by `flate2`.
//! - `full` - Enables all features.

pub mod base;
pub mod error;
pub mod spec;

pub(crate) mod date;
pub(crate) mod entry;
pub(crate) mod file;

pub use crate::spec::attribute::AttributeCompatibility;
pub use crate::spec::compression::Compression;

pub use crate::date::{builder::ZipDateTimeBuilder, ZipDateTime};
pub use crate::entry::{builder::ZipEntryBuilder, StoredZipEntry, UnixOwner, ZipEntry};
pub use crate::file::ZipFile;

pub use crate::base::read::seek::ZipFileReader;
#[cfg(feature = "deflate")]
pub use crate::base::write::DeflateCompressor;
pub use crate::base::write::{Compressor, WriteOutcome, ZipFileWriter};

#[cfg(test)]
pub(crate) mod tests;

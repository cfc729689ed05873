// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! A module which holds relevant error reporting structures/types.

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A Result type alias over ZipError to minimise repetition.
pub type Result<V> = std::result::Result<V, ZipError>;

#[derive(Debug, PartialEq, Eq)]
pub enum Zip64ErrorCase {
    TooManyFiles,
    LargeFile,
}

impl Display for Zip64ErrorCase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyFiles => write!(f, "More than 65536 files in archive"),
            Self::LargeFile => write!(f, "File is larger than 4 GiB"),
        }
    }
}

/// An enum of possible errors and their descriptions.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("feature not supported: '{0}'")]
    FeatureNotSupported(&'static str),
    #[error("attempted to read a ZIP64 file whilst on a 32-bit target")]
    TargetZip64NotSupported,
    #[error("attempted to write a ZIP file with force_no_zip64 when ZIP64 is needed: {0}")]
    Zip64Needed(Zip64ErrorCase),
    #[error("extra fields exceeded maximum size")]
    ExtraFieldTooLarge,
    #[error("comment exceeded maximum size")]
    CommentTooLarge,
    #[error("filename exceeded maximum size")]
    FileNameTooLarge,

    #[error("unable to locate the end of central directory record")]
    UnableToLocateEOCDR,
    #[error("header truncated (expected {expected} bytes, found {actual})")]
    TruncatedHeader { expected: usize, actual: usize },
    #[error("extra field record overruns its containing buffer")]
    TruncatedExtraField,
    #[error("zip64 extended information field was incomplete")]
    Zip64ExtendedFieldIncomplete,
    #[error("central directory declared {expected} entries but only {actual} were present")]
    EntryCountMismatch { expected: u64, actual: u64 },

    #[error("an upstream reader returned an error: {0}")]
    UpstreamReadError(#[from] std::io::Error),
    #[error("entry index was out of bounds")]
    EntryIndexOutOfBounds,
    #[error("no entry has been selected for reading")]
    NoEntrySelected,
    #[error("Encountered an unexpected header (actual: {0:#x}, expected: {1:#x}).")]
    UnexpectedHeaderError(u32, u32),

    #[error("the previous entry has not been closed")]
    EntryStillOpen,
    #[error("no entry is open for writing")]
    NoEntryOpen,
    #[error("the archive has already been closed")]
    ArchiveClosed,
    #[error("entry exceeded its declared size and must be rewound before further writes")]
    RewindRequired,
    #[error("entry can only be rewound after it has overflowed its declared size")]
    RewindWithoutOverflow,
    #[error("compressed entries written raw must be closed with an explicit CRC and size")]
    EntrySizesRequired,
    #[error("entry size mismatch (declared: {declared}, actual: {actual})")]
    SizeMismatch { declared: u64, actual: u64 },
}

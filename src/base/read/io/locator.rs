// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! <https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#4316>
//!
//! As with other ZIP libraries, we face the predicament that the end of central directory record may contain a
//! variable-length file comment. As a result, we cannot just make the assumption that the start of this record is
//! 22 bytes offset from the end of the data - we must locate it ourselves.
//!
//! The common case of an empty comment is checked directly. Otherwise we read in reverse from the end of the data in
//! fixed-size blocks, searching each block from its end for the EOCDR signature. Successive blocks overlap by one
//! byte less than the signature length so a signature split across two blocks is still seen whole in one of them.
//!
//! A comment may itself contain bytes which look like a signature, so every match is only a candidate. A candidate
//! whose comment length reaches exactly the end of the data and whose central directory lies before it is accepted
//! immediately. Failing that, the first candidate found from the end whose central directory is at least plausible
//! is used.

use std::io::{Read, Seek, SeekFrom};

use crate::base::read::io::combined_record::{has_sentinel, CombinedCentralDirectoryRecord};
use crate::base::read::io::read_bytes;
use crate::error::{Result as ZipResult, ZipError};
use crate::spec::codec::Record;
use crate::spec::consts::{
    EOCDR_LENGTH, EOCDR_SIGNATURE, NON_ZIP64_MAX_SIZE, SIGNATURE_LENGTH, ZIP64_EOCDL_LENGTH, ZIP64_EOCDL_SIGNATURE,
    ZIP64_EOCDR_SIGNATURE,
};
use crate::spec::header::{
    assert_signature, EndOfCentralDirectoryHeader, Zip64EndOfCentralDirectoryLocator,
    Zip64EndOfCentralDirectoryRecord,
};

/// The buffer size used when locating the EOCDR, equal to 1KiB.
pub(crate) const BUFFER_SIZE: usize = 1024;

/// The furthest distance from the end of the data at which the EOCDR may start.
const EOCDR_LOWER_BOUND: u64 = EOCDR_LENGTH as u64 + u16::MAX as u64;

/// How well a candidate EOCDR agrees with the data around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidate {
    /// The comment reaches exactly the end of the data and the directory lies before the record.
    Exact,
    /// The directory lies before the record (or is deferred to ZIP64), but the comment length disagrees.
    Plausible,
    Invalid,
}

/// Locate the `end of central directory record` offset, if one exists.
/// The returned offset includes the signature (4 bytes).
#[tracing::instrument(skip(reader))]
pub fn eocdr<R>(mut reader: R) -> ZipResult<u64>
where
    R: Read + Seek,
{
    let length = reader.seek(SeekFrom::End(0))?;
    let tail = length.checked_sub(EOCDR_LENGTH as u64).ok_or(ZipError::UnableToLocateEOCDR)?;

    reader.seek(SeekFrom::Start(tail))?;
    let header = EndOfCentralDirectoryHeader::read_from(&mut reader)?;

    if header.signature == EOCDR_SIGNATURE && header.file_comm_length == 0 {
        tracing::debug!(offset = tail, "located EOCDR at the end of the data");
        return Ok(tail);
    }

    let signature = &EOCDR_SIGNATURE.to_le_bytes();
    let lower_bound = length.saturating_sub(EOCDR_LOWER_BOUND);
    let mut buffer = [0; BUFFER_SIZE];
    let mut fallback = None;

    // The exclusive end of the region searched for the next block. A signature may start no later than `tail`.
    let mut end = tail + SIGNATURE_LENGTH as u64;

    loop {
        let start = std::cmp::max(end.saturating_sub(BUFFER_SIZE as u64), lower_bound);
        let block = &mut buffer[..(end - start) as usize];

        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(block)?;

        let mut limit = block.len();
        while let Some(match_index) = reverse_search_buffer(&block[..limit], signature) {
            let candidate = start + (match_index + 1 - SIGNATURE_LENGTH) as u64;

            match validate(&mut reader, candidate, length)? {
                Candidate::Exact => {
                    tracing::debug!(offset = candidate, "located EOCDR by reverse search");
                    return Ok(candidate);
                }
                Candidate::Plausible if fallback.is_none() => fallback = Some(candidate),
                _ => tracing::trace!(offset = candidate, "skipping EOCDR candidate"),
            }

            limit = match_index;
        }

        if start == lower_bound {
            break;
        }

        end = start + (SIGNATURE_LENGTH - 1) as u64;
    }

    match fallback {
        Some(offset) => {
            tracing::debug!(offset, "no exact EOCDR candidate, falling back to the last plausible one");
            Ok(offset)
        }
        None => Err(ZipError::UnableToLocateEOCDR),
    }
}

fn validate<R>(mut reader: R, candidate: u64, length: u64) -> ZipResult<Candidate>
where
    R: Read + Seek,
{
    reader.seek(SeekFrom::Start(candidate))?;
    let header = EndOfCentralDirectoryHeader::read_from(&mut reader)?;

    let deferred = header.cent_dir_offset == NON_ZIP64_MAX_SIZE || header.size_cent_dir == NON_ZIP64_MAX_SIZE;
    let directory_end = header.cent_dir_offset as u64 + header.size_cent_dir as u64;

    if !deferred && directory_end > candidate {
        return Ok(Candidate::Invalid);
    }
    if candidate + EOCDR_LENGTH as u64 + header.file_comm_length as u64 == length {
        return Ok(Candidate::Exact);
    }

    Ok(Candidate::Plausible)
}

/// A naive reverse linear search along the buffer for the specified signature bytes.
///
/// Returns the index of the last byte of the match closest to the end of the buffer.
pub(crate) fn reverse_search_buffer(buffer: &[u8], signature: &[u8]) -> Option<usize> {
    'outer: for index in (0..buffer.len()).rev() {
        for (signature_index, signature_byte) in signature.iter().rev().enumerate() {
            if let Some(next_index) = index.checked_sub(signature_index) {
                if buffer[next_index] != *signature_byte {
                    continue 'outer;
                }
            } else {
                break 'outer;
            }
        }
        return Some(index);
    }
    None
}

/// Locates and parses the end of central directory, resolving any ZIP64 values it defers to.
///
/// Returns the combined record alongside the archive's comment.
pub(crate) fn central_directory<R>(mut reader: R) -> ZipResult<(CombinedCentralDirectoryRecord, Vec<u8>)>
where
    R: Read + Seek,
{
    let eocdr_offset = eocdr(&mut reader)?;

    reader.seek(SeekFrom::Start(eocdr_offset))?;
    let eocdr = EndOfCentralDirectoryHeader::read_from(&mut reader)?;
    assert_signature(eocdr.signature, EOCDR_SIGNATURE)?;

    let comment = read_bytes(&mut reader, eocdr.file_comm_length.into())?;

    if !has_sentinel(&eocdr) {
        return Ok((CombinedCentralDirectoryRecord::from(&eocdr), comment));
    }

    // The locator sits directly before the EOCDR.
    let Some(locator_offset) = eocdr_offset.checked_sub(ZIP64_EOCDL_LENGTH) else {
        tracing::debug!("EOCDR holds a ZIP64 sentinel but there is no room for a locator");
        return Ok((CombinedCentralDirectoryRecord::from(&eocdr), comment));
    };

    reader.seek(SeekFrom::Start(locator_offset))?;
    let locator = Zip64EndOfCentralDirectoryLocator::read_from(&mut reader)?;

    if locator.signature != ZIP64_EOCDL_SIGNATURE {
        tracing::debug!(signature = locator.signature, "no ZIP64 locator found, using literal EOCDR values");
        return Ok((CombinedCentralDirectoryRecord::from(&eocdr), comment));
    }

    reader.seek(SeekFrom::Start(locator.relative_offset))?;
    let zip64_eocdr = Zip64EndOfCentralDirectoryRecord::read_from(&mut reader)?;
    assert_signature(zip64_eocdr.signature, ZIP64_EOCDR_SIGNATURE)?;

    tracing::debug!(offset = locator.relative_offset, "resolved ZIP64 EOCDR");
    Ok((CombinedCentralDirectoryRecord::combine(&eocdr, &zip64_eocdr), comment))
}

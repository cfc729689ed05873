// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

//! On-disk ZIP records. Every record includes its leading signature, which callers validate after decoding.

use crate::date::ZipDateTime;
use crate::error::{Result, ZipError};
use crate::spec::codec::{raw, Codec};

raw! {
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#437
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    LocalFileHeader {
        signature: u32,
        version: u16,
        flags: GeneralPurposeFlag,
        compression: u16,
        date_time: ZipDateTime,
        crc: u32,
        compressed_size: u32,
        uncompressed_size: u32,
        file_name_length: u16,
        extra_field_length: u16
    }
}

raw! {
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#4312
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    CentralDirectoryRecord {
        signature: u32,
        v_made_by: u16,
        v_needed: u16,
        flags: GeneralPurposeFlag,
        compression: u16,
        date_time: ZipDateTime,
        crc: u32,
        compressed_size: u32,
        uncompressed_size: u32,
        file_name_length: u16,
        extra_field_length: u16,
        file_comment_length: u16,
        disk_start: u16,
        inter_attr: u16,
        exter_attr: u32,
        lh_offset: u32
    }
}

raw! {
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#4316
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    EndOfCentralDirectoryHeader {
        signature: u32,
        disk_num: u16,
        start_cent_dir_disk: u16,
        num_of_entries_disk: u16,
        num_of_entries: u16,
        size_cent_dir: u32,
        cent_dir_offset: u32,
        file_comm_length: u16
    }
}

raw! {
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#4314
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    Zip64EndOfCentralDirectoryRecord {
        signature: u32,
        /// The size of this record excluding the leading 12 bytes.
        ///
        /// A variable-length extensible data sector may follow the fixed fields. It is reserved for use by PKWare
        /// and is ignored.
        size_of_zip64_end_of_cd_record: u64,
        version_made_by: u16,
        version_needed_to_extract: u16,
        disk_number: u32,
        disk_number_start_of_cd: u32,
        num_entries_in_directory_on_disk: u64,
        num_entries_in_directory: u64,
        directory_size: u64,
        offset_of_start_of_directory: u64
    }
}

raw! {
    // https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#4315
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    Zip64EndOfCentralDirectoryLocator {
        signature: u32,
        number_of_disk_with_start_of_zip64_end_of_central_directory: u32,
        relative_offset: u64,
        total_number_of_disks: u32
    }
}

// https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#444
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneralPurposeFlag {
    pub encrypted: bool,
    pub data_descriptor: bool,
    pub filename_unicode: bool,
    /// Any bits not interpreted above, carried through untouched.
    pub other: u16,
}

const ENCRYPTED_BIT: u16 = 0x1;
const DATA_DESCRIPTOR_BIT: u16 = 0x8;
const FILENAME_UNICODE_BIT: u16 = 0x800;

impl From<u16> for GeneralPurposeFlag {
    fn from(value: u16) -> GeneralPurposeFlag {
        let encrypted = value & ENCRYPTED_BIT != 0;
        let data_descriptor = value & DATA_DESCRIPTOR_BIT != 0;
        let filename_unicode = value & FILENAME_UNICODE_BIT != 0;
        let other = value & !(ENCRYPTED_BIT | DATA_DESCRIPTOR_BIT | FILENAME_UNICODE_BIT);

        GeneralPurposeFlag { encrypted, data_descriptor, filename_unicode, other }
    }
}

impl From<GeneralPurposeFlag> for u16 {
    fn from(flags: GeneralPurposeFlag) -> u16 {
        let mut value = flags.other;

        if flags.encrypted {
            value |= ENCRYPTED_BIT;
        }
        if flags.data_descriptor {
            value |= DATA_DESCRIPTOR_BIT;
        }
        if flags.filename_unicode {
            value |= FILENAME_UNICODE_BIT;
        }

        value
    }
}

impl Codec for GeneralPurposeFlag {
    const WIDTH: usize = 2;

    fn decode(buf: &[u8]) -> Self {
        u16::decode(buf).into()
    }

    fn encode(&self, buf: &mut [u8]) {
        u16::from(*self).encode(buf);
    }
}

/// Returns an error if a decoded signature doesn't match the one expected.
pub(crate) fn assert_signature(actual: u32, expected: u32) -> Result<()> {
    match actual {
        actual if actual == expected => Ok(()),
        actual => Err(ZipError::UnexpectedHeaderError(actual, expected)),
    }
}

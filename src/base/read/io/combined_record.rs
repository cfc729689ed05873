// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::spec::consts::{NON_ZIP64_MAX_NUM_FILES, NON_ZIP64_MAX_SIZE};
use crate::spec::header::{EndOfCentralDirectoryHeader, Zip64EndOfCentralDirectoryRecord};

/// Combines all the fields in EOCDR and Zip64EOCDR into one struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedCentralDirectoryRecord {
    pub disk_number: u32,
    pub disk_number_start_of_cd: u32,
    pub num_entries_in_directory_on_disk: u64,
    pub num_entries_in_directory: u64,
    pub directory_size: u64,
    pub offset_of_start_of_directory: u64,
    pub zip64: bool,
}

impl CombinedCentralDirectoryRecord {
    /// Combine an EOCDR with a Zip64EOCDR.
    ///
    /// Fields that are set to their max value in the EOCDR will be overwritten by the contents of
    /// the corresponding Zip64EOCDR field.
    pub fn combine(eocdr: &EndOfCentralDirectoryHeader, zip64eocdr: &Zip64EndOfCentralDirectoryRecord) -> Self {
        let mut combined = Self::from(eocdr);

        if eocdr.disk_num == NON_ZIP64_MAX_NUM_FILES {
            combined.disk_number = zip64eocdr.disk_number;
        }
        if eocdr.start_cent_dir_disk == NON_ZIP64_MAX_NUM_FILES {
            combined.disk_number_start_of_cd = zip64eocdr.disk_number_start_of_cd;
        }
        if eocdr.num_of_entries_disk == NON_ZIP64_MAX_NUM_FILES {
            combined.num_entries_in_directory_on_disk = zip64eocdr.num_entries_in_directory_on_disk;
        }
        if eocdr.num_of_entries == NON_ZIP64_MAX_NUM_FILES {
            combined.num_entries_in_directory = zip64eocdr.num_entries_in_directory;
        }
        if eocdr.size_cent_dir == NON_ZIP64_MAX_SIZE {
            combined.directory_size = zip64eocdr.directory_size;
        }
        if eocdr.cent_dir_offset == NON_ZIP64_MAX_SIZE {
            combined.offset_of_start_of_directory = zip64eocdr.offset_of_start_of_directory;
        }

        combined.zip64 = true;
        combined
    }
}

/// Returns whether any field of the EOCDR holds its sentinel and so defers to a ZIP64 EOCDR.
pub(crate) fn has_sentinel(eocdr: &EndOfCentralDirectoryHeader) -> bool {
    eocdr.disk_num == NON_ZIP64_MAX_NUM_FILES
        || eocdr.start_cent_dir_disk == NON_ZIP64_MAX_NUM_FILES
        || eocdr.num_of_entries_disk == NON_ZIP64_MAX_NUM_FILES
        || eocdr.num_of_entries == NON_ZIP64_MAX_NUM_FILES
        || eocdr.size_cent_dir == NON_ZIP64_MAX_SIZE
        || eocdr.cent_dir_offset == NON_ZIP64_MAX_SIZE
}

// An implementation for the case of no zip64EOCDR.
impl From<&EndOfCentralDirectoryHeader> for CombinedCentralDirectoryRecord {
    fn from(header: &EndOfCentralDirectoryHeader) -> Self {
        Self {
            disk_number: header.disk_num as u32,
            disk_number_start_of_cd: header.start_cent_dir_disk as u32,
            num_entries_in_directory_on_disk: header.num_of_entries_disk as u64,
            num_entries_in_directory: header.num_of_entries as u64,
            directory_size: header.size_cent_dir as u64,
            offset_of_start_of_directory: header.cent_dir_offset as u64,
            zip64: false,
        }
    }
}

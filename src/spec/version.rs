// Copyright (c) 2021 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::entry::ZipEntry;
use crate::spec::attribute::AttributeCompatibility;
use crate::spec::compression::Compression;
use crate::spec::consts::ZIP64_VERSION_NEEDED;

// https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#443
const SPEC_VERSION_MADE_BY: u16 = 63;

// https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#443
pub fn as_needed_to_extract(entry: &ZipEntry, zip64: bool) -> u16 {
    let mut version = match entry.compression() {
        Compression::Deflate => 20,
        Compression::Bz => 46,
        Compression::Lzma => 63,
        _ => 10,
    };

    if entry.dir() {
        version = std::cmp::max(version, 20);
    }
    if zip64 {
        version = std::cmp::max(version, ZIP64_VERSION_NEEDED);
    }

    version
}

// https://github.com/Majored/rs-async-zip/blob/main/SPECIFICATION.md#442
pub fn as_made_by(compatibility: AttributeCompatibility) -> u16 {
    (u16::from(u8::from(compatibility)) << 8) | SPEC_VERSION_MADE_BY
}

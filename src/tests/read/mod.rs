// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

pub(crate) mod zip64;

use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};

use crate::base::read::seek::ZipFileReader;
use crate::base::write::ZipFileWriter;
use crate::error::ZipError;
use crate::spec::codec::Record;
use crate::spec::consts::LFH_LENGTH;
use crate::spec::header::LocalFileHeader;
use crate::tests::write::write_archive;
use crate::{Compression, ZipEntryBuilder};

fn archive() -> Vec<u8> {
    write_archive(&[("one.txt", b"first".as_slice()), ("two.txt", b"second".as_slice())], Some("comment"))
}

#[test]
fn read_without_selection() {
    let mut reader = ZipFileReader::new(Cursor::new(archive())).expect("failed to open archive");
    assert!(reader.header().is_none());

    let err = reader.read(&mut [0u8; 8]).expect_err("read without a selected entry");
    assert_eq!(err.kind(), std::io::ErrorKind::Other);
    let inner = err.into_inner().and_then(|inner| inner.downcast::<ZipError>().ok());
    assert!(matches!(inner.as_deref(), Some(ZipError::NoEntrySelected)));
}

#[test]
fn select_by_name_and_index() {
    let mut reader = ZipFileReader::new(Cursor::new(archive())).expect("failed to open archive");
    assert_eq!(reader.comment(), b"comment");

    assert!(!reader.select_entry("three.txt").expect("failed to search entries"));
    assert!(reader.header().is_none());

    assert!(reader.select_entry("two.txt").expect("failed to select entry"));
    let mut data = String::new();
    reader.read_to_string(&mut data).expect("failed to read entry");
    assert_eq!(data, "second");

    // Reading is bounded by the entry's compressed size.
    assert_eq!(reader.read(&mut [0u8; 8]).expect("failed to read entry"), 0);

    reader.select_index(0).expect("failed to select entry");
    let mut data = String::new();
    reader.read_to_string(&mut data).expect("failed to read entry");
    assert_eq!(data, "first");

    assert!(matches!(reader.select_index(2), Err(ZipError::EntryIndexOutOfBounds)));
}

#[test]
fn next_entry_continues_from_selection() {
    let mut reader = ZipFileReader::new(Cursor::new(archive())).expect("failed to open archive");

    reader.select_index(0).expect("failed to select entry");
    assert!(reader.next_entry().expect("failed to select entry"));
    assert_eq!(reader.header().map(|entry| entry.filename()), Some(b"two.txt".as_slice()));

    assert!(!reader.next_entry().expect("failed to select entry"));
    assert!(!reader.next_entry().expect("failed to select entry"));
    assert!(reader.header().is_none());
}

#[test]
fn truncated_central_directory() {
    let mut data = archive();

    // Claim a third entry which the central directory doesn't hold.
    let eocdr = data.len() - 22 - "comment".len();
    data[eocdr + 8..eocdr + 10].copy_from_slice(&3u16.to_le_bytes());
    data[eocdr + 10..eocdr + 12].copy_from_slice(&3u16.to_le_bytes());

    let result = ZipFileReader::new(Cursor::new(data));
    assert!(matches!(result, Err(ZipError::EntryCountMismatch { expected: 3, actual: 2 })));
}

#[test]
fn spanned_archives_are_rejected() {
    let mut data = archive();

    let eocdr = data.len() - 22 - "comment".len();
    data[eocdr + 4..eocdr + 6].copy_from_slice(&1u16.to_le_bytes());

    let result = ZipFileReader::new(Cursor::new(data));
    assert!(matches!(result, Err(ZipError::FeatureNotSupported(_))));
}

#[test]
fn entry_data_truncated_by_end_of_source() {
    let mut data = write_archive(&[("a.txt", b"Hello, World".as_slice())], None);

    let header = LocalFileHeader::decode_from(&data).expect("failed to decode local file header");
    let data_offset = LFH_LENGTH + header.file_name_length as usize + header.extra_field_length as usize;
    let cdh_offset = data.windows(4).position(|window| window == b"PK\x01\x02").expect("no central directory record");

    // Declare far more compressed data than the source holds.
    data[18..22].copy_from_slice(&100_000u32.to_le_bytes());
    data[cdh_offset + 20..cdh_offset + 24].copy_from_slice(&100_000u32.to_le_bytes());

    let mut reader = ZipFileReader::new(Cursor::new(data.clone())).expect("failed to open archive");
    assert!(reader.next_entry().expect("failed to select entry"));
    assert_eq!(reader.header().and_then(|entry| entry.compressed_size()), Some(100_000));

    let mut read = Vec::new();
    reader.read_to_end(&mut read).expect("failed to read truncated entry");
    assert_eq!(read.len(), data.len() - data_offset);
    assert!(read.starts_with(b"Hello, World"));

    // Further reads keep returning nothing.
    assert_eq!(reader.read(&mut [0u8; 8]).expect("failed to read entry"), 0);
}

#[test]
fn bad_local_header_signature() {
    let mut data = archive();
    data[0] = b'X';

    let mut reader = ZipFileReader::new(Cursor::new(data)).expect("failed to open archive");
    let result = reader.select_entry("one.txt");
    assert!(matches!(result, Err(ZipError::UnexpectedHeaderError(0x04034b58, 0x04034b50))));
    assert!(reader.header().is_none());
}

#[test]
fn invalid_central_dos_date_defers_to_extended_timestamp() {
    let modified = Utc.with_ymd_and_hms(2022, 5, 6, 7, 8, 10).unwrap();

    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    let entry = ZipEntryBuilder::new("dated.txt", Compression::Stored).file_size(4).last_modification_date(modified);
    writer.create_entry(entry).expect("failed to create entry");
    writer.write(b"date").expect("failed to write data");
    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let mut data = writer.into_inner().into_inner();
    let cdh_offset = data.windows(4).position(|window| window == b"PK\x01\x02").expect("no central directory record");

    // Month 13 of 1980.
    data[cdh_offset + 14..cdh_offset + 16].copy_from_slice(&0x01A1u16.to_le_bytes());

    let reader = ZipFileReader::new(Cursor::new(data)).expect("failed to open archive");
    assert_eq!(reader.entries()[0].last_modification_date(), &modified);
}

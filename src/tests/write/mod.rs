// Copyright (c) 2022 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};

use crate::base::read::seek::ZipFileReader;
use crate::base::write::ZipFileWriter;
use crate::error::ZipError;
use crate::spec::codec::Record;
use crate::spec::header::LocalFileHeader;
use crate::tests::init_logger;
use crate::{Compression, WriteOutcome, ZipEntry, ZipEntryBuilder};

mod overflow;

/// Writes a stored archive from `(filename, data)` pairs. Filenames ending in `/` are written as directories.
pub(crate) fn write_archive(entries: &[(&str, &[u8])], comment: Option<&str>) -> Vec<u8> {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    for (filename, data) in entries {
        let builder = ZipEntryBuilder::new(*filename, Compression::Stored).file_size(data.len() as u64);
        writer.create_entry(builder).expect("failed to create entry");

        if filename.ends_with('/') {
            continue;
        }

        assert_eq!(writer.write(data).expect("failed to write data"), WriteOutcome::Written(data.len()));
        writer.close().expect("failed to close entry");
    }

    if let Some(comment) = comment {
        writer.comment(comment);
    }

    writer.close_archive().expect("failed to close archive");
    writer.into_inner().into_inner()
}

/// Reads every entry of an archive in central directory order, alongside its raw data.
pub(crate) fn read_entries(data: Vec<u8>) -> Vec<(ZipEntry, Vec<u8>)> {
    let mut reader = ZipFileReader::new(Cursor::new(data)).expect("failed to open archive");
    let mut entries = Vec::new();

    while reader.next_entry().expect("failed to select entry") {
        let entry = reader.header().cloned().expect("no entry selected");
        let mut data = Vec::new();
        reader.read_to_end(&mut data).expect("failed to read entry data");
        entries.push((entry, data));
    }

    entries
}

#[test]
fn file_and_directory_in_write_order() {
    init_logger();

    let archive = write_archive(&[("a.txt", b"Hello, World".as_slice()), ("dir/", b"".as_slice())], None);

    let reader = ZipFileReader::new(Cursor::new(archive.clone())).expect("failed to open archive");
    assert_eq!(reader.entries().len(), 2);
    assert!(!reader.file().zip64());

    let entries = read_entries(archive);
    let names: Vec<_> = entries.iter().map(|(entry, _)| entry.filename().to_vec()).collect();
    assert_eq!(names, vec![b"a.txt".to_vec(), b"dir/".to_vec()]);

    let (file, data) = &entries[0];
    assert!(!file.dir());
    assert_eq!(data, b"Hello, World");
    assert_eq!(file.crc32(), crc32fast::hash(b"Hello, World"));
    assert_eq!(file.uncompressed_size(), Some(12));

    let (dir, data) = &entries[1];
    assert!(dir.dir());
    assert!(data.is_empty());
    assert_eq!(dir.compressed_size(), Some(0));
}

#[test]
fn entry_fields_round_trip() {
    init_logger();

    let modified = Utc.with_ymd_and_hms(2023, 7, 14, 9, 30, 17).unwrap();
    let accessed = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let created = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap();
    let data = b"some entry data";

    let entry = ZipEntryBuilder::new("nested/file.bin", Compression::Stored)
        .file_size(data.len() as u64)
        .last_modification_date(modified)
        .last_access_date(accessed)
        .creation_date(created)
        .owner(1000, 100)
        .unix_permissions(0o100644)
        .internal_file_attribute(1)
        .comment("an entry comment")
        .encrypted(true)
        .build();

    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    writer.create_entry(entry.clone()).expect("failed to create entry");
    writer.write(data).expect("failed to write data");
    writer.close().expect("failed to close entry");
    writer.comment("an archive comment");
    writer.close_archive().expect("failed to close archive");

    let archive = writer.into_inner().into_inner();
    let mut reader = ZipFileReader::new(Cursor::new(archive)).expect("failed to open archive");
    assert_eq!(reader.comment(), b"an archive comment");

    assert!(reader.select_entry("nested/file.bin").expect("failed to select entry"));
    let header = reader.header().expect("no entry selected");

    let mut expected = entry;
    expected.crc32 = crc32fast::hash(data);
    assert_eq!(header, &expected);
    assert_eq!(header.unix_permissions(), Some(0o100644));
    assert_eq!(header.last_access_date(), Some(&accessed));
    assert!(header.encrypted());

    // The central directory carries only the modification time, and no owner ids.
    let central = &reader.entries()[0];
    assert_eq!(central.last_modification_date(), &modified);
    assert_eq!(central.last_access_date(), None);
    assert_eq!(central.owner(), None);
    assert_eq!(central.comment(), b"an entry comment");
    assert!(central.encrypted());

    let local = LocalFileHeader::decode_from(&reader.into_inner().into_inner()).expect("failed to decode header");
    assert!(local.flags.encrypted);
}

#[test]
fn pending_sizes_are_patched_back() {
    init_logger();

    let data = b"written without declared sizes";
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    writer.create_entry(ZipEntryBuilder::new("unsized.txt", Compression::Stored)).expect("failed to create entry");
    writer.write(&data[..10]).expect("failed to write data");
    writer.write(&data[10..]).expect("failed to write data");
    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let archive = writer.into_inner().into_inner();
    let header = LocalFileHeader::decode_from(&archive).expect("failed to decode local file header");
    assert_eq!(header.crc, crc32fast::hash(data));
    assert_eq!(header.compressed_size, data.len() as u32);
    assert_eq!(header.uncompressed_size, data.len() as u32);

    let entries = read_entries(archive);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.uncompressed_size(), Some(data.len() as u64));
    assert_eq!(entries[0].1, data);
}

#[test]
fn raw_entry_closed_with_given_values() {
    init_logger();

    // Data compressed elsewhere, written as-is.
    let raw = [0x4Bu8, 0x4C, 0x4A, 0x06, 0x00];
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    writer.create_entry(ZipEntryBuilder::new("raw.bin", Compression::Deflate)).expect("failed to create entry");
    writer.write(&raw).expect("failed to write data");
    assert!(matches!(writer.close(), Err(ZipError::EntrySizesRequired)));
    writer.close_with(crc32fast::hash(b"abc"), 3).expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let entries = read_entries(writer.into_inner().into_inner());
    let (entry, data) = &entries[0];
    assert_eq!(entry.compression(), Compression::Deflate);
    assert_eq!(entry.crc32(), crc32fast::hash(b"abc"));
    assert_eq!(entry.uncompressed_size(), Some(3));
    assert_eq!(entry.compressed_size(), Some(raw.len() as u64));
    assert_eq!(data, &raw);
}

#[test]
fn close_archive_twice() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    writer.close_archive().expect("failed to close archive");

    assert!(matches!(writer.close_archive(), Err(ZipError::ArchiveClosed)));
    assert!(matches!(
        writer.create_entry(ZipEntryBuilder::new("late.txt", Compression::Stored)),
        Err(ZipError::ArchiveClosed)
    ));

    let entries = read_entries(writer.into_inner().into_inner());
    assert!(entries.is_empty());
}

#[test]
fn entry_still_open() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    writer.create_entry(ZipEntryBuilder::new("first.txt", Compression::Stored)).expect("failed to create entry");

    let second = ZipEntryBuilder::new("second.txt", Compression::Stored);
    assert!(matches!(writer.create_entry(second), Err(ZipError::EntryStillOpen)));
    assert!(matches!(writer.close_archive(), Err(ZipError::EntryStillOpen)));

    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");
}

#[test]
fn no_entry_open() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    assert!(matches!(writer.write(b"data"), Err(ZipError::NoEntryOpen)));
    assert!(matches!(writer.close(), Err(ZipError::NoEntryOpen)));
    assert!(matches!(writer.rewind_entry(), Err(ZipError::NoEntryOpen)));
}

#[test]
fn stored_write_past_declared_size() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    let entry = ZipEntryBuilder::new("small.txt", Compression::Stored).file_size(5);
    writer.create_entry(entry).expect("failed to create entry");

    assert_eq!(writer.write(b"abc").expect("failed to write data"), WriteOutcome::Written(3));
    assert!(matches!(writer.write(b"def"), Err(ZipError::SizeMismatch { declared: 5, actual: 6 })));
}

#[test]
fn stored_close_short_of_declared_size() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    let entry = ZipEntryBuilder::new("small.txt", Compression::Stored).file_size(5);
    writer.create_entry(entry).expect("failed to create entry");

    writer.write(b"abc").expect("failed to write data");
    assert!(matches!(writer.close(), Err(ZipError::SizeMismatch { declared: 5, actual: 3 })));
}

#[test]
fn close_with_wrong_uncompressed_size() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    let entry = ZipEntryBuilder::new("raw.bin", Compression::Deflate).size(10, 4);
    writer.create_entry(entry).expect("failed to create entry");

    writer.write(&[1, 2, 3, 4]).expect("failed to write data");
    assert!(matches!(writer.close_with(0, 11), Err(ZipError::SizeMismatch { declared: 10, actual: 11 })));
}

#[test]
fn rewind_without_overflow() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));
    writer.create_entry(ZipEntryBuilder::new("a.txt", Compression::Stored)).expect("failed to create entry");

    assert!(matches!(writer.rewind_entry(), Err(ZipError::RewindWithoutOverflow)));
}

#[test]
fn non_ascii_filename_sets_unicode_flag() {
    let archive = write_archive(&[("café.txt", b"coffee".as_slice())], None);

    let header = LocalFileHeader::decode_from(&archive).expect("failed to decode local file header");
    assert!(header.flags.filename_unicode);

    let entries = read_entries(archive);
    assert_eq!(entries[0].0.filename_str(), Some("café.txt"));
}

// Copyright (c) 2024 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use std::io::Cursor;

use crate::base::write::{Compressor, ZipFileWriter};
use crate::error::ZipError;
use crate::tests::init_logger;
use crate::tests::write::read_entries;
use crate::{Compression, WriteOutcome, ZipEntryBuilder};

/// A compressor whose output is always twice the size of its input.
struct Doubling;

impl Compressor for Doubling {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> std::io::Result<()> {
        for byte in input {
            output.extend_from_slice(&[*byte, *byte]);
        }
        Ok(())
    }

    fn finish(&mut self, _: &mut Vec<u8>) -> std::io::Result<()> {
        Ok(())
    }
}

/// A compressor which passes data through but emits a trailer once finished.
struct Trailer;

impl Compressor for Trailer {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> std::io::Result<()> {
        output.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, output: &mut Vec<u8>) -> std::io::Result<()> {
        output.extend_from_slice(b"END");
        Ok(())
    }
}

#[test]
fn overflow_rewinds_to_store() {
    init_logger();

    let data = b"abcdefgh";
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    let entry = ZipEntryBuilder::new("expanding.txt", Compression::Deflate).file_size(data.len() as u64);
    writer.create_entry_with(entry, Doubling).expect("failed to create entry");

    assert_eq!(writer.write(&data[..4]).expect("failed to write data"), WriteOutcome::Written(4));
    assert_eq!(writer.write(&data[4..]).expect("failed to write data"), WriteOutcome::Overflow);

    // Overflow is only signalled once. Everything but a rewind is refused until then.
    assert!(matches!(writer.write(&data[4..]), Err(ZipError::RewindRequired)));
    assert!(matches!(writer.finish(), Err(ZipError::RewindRequired)));
    assert!(matches!(writer.close(), Err(ZipError::RewindRequired)));

    writer.rewind_entry().expect("failed to rewind entry");
    assert!(matches!(writer.rewind_entry(), Err(ZipError::RewindWithoutOverflow)));

    assert_eq!(writer.write(data).expect("failed to write data"), WriteOutcome::Written(data.len()));
    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let entries = read_entries(writer.into_inner().into_inner());
    assert_eq!(entries.len(), 1);

    let (entry, raw) = &entries[0];
    assert_eq!(entry.compression(), Compression::Stored);
    assert_eq!(entry.compressed_size(), Some(data.len() as u64));
    assert_eq!(entry.uncompressed_size(), Some(data.len() as u64));
    assert_eq!(entry.crc32(), crc32fast::hash(data));
    assert_eq!(raw, data);
}

#[test]
fn overflow_on_finish() {
    init_logger();

    let data = b"1234";
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    let entry = ZipEntryBuilder::new("trailer.txt", Compression::Deflate).file_size(data.len() as u64);
    writer.create_entry_with(entry, Trailer).expect("failed to create entry");

    assert_eq!(writer.write(data).expect("failed to write data"), WriteOutcome::Written(4));
    assert_eq!(writer.finish().expect("failed to finish entry"), WriteOutcome::Overflow);

    writer.rewind_entry().expect("failed to rewind entry");
    writer.write(data).expect("failed to write data");
    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let entries = read_entries(writer.into_inner().into_inner());
    assert_eq!(entries[0].0.compression(), Compression::Stored);
    assert_eq!(entries[0].1, data);
}

#[test]
fn replay_past_declared_size_is_an_error() {
    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    let entry = ZipEntryBuilder::new("expanding.txt", Compression::Deflate).file_size(2);
    writer.create_entry_with(entry, Doubling).expect("failed to create entry");

    assert_eq!(writer.write(b"abc").expect("failed to write data"), WriteOutcome::Overflow);
    writer.rewind_entry().expect("failed to rewind entry");

    assert!(matches!(writer.write(b"abc"), Err(ZipError::SizeMismatch { declared: 2, actual: 3 })));
}

#[test]
fn compressed_output_within_bound() {
    init_logger();

    let mut writer = ZipFileWriter::new(Cursor::new(Vec::new()));

    let entry = ZipEntryBuilder::new("doubled.bin", Compression::Deflate).size(4, 8);
    writer.create_entry_with(entry, Doubling).expect("failed to create entry");

    assert_eq!(writer.write(b"wxyz").expect("failed to write data"), WriteOutcome::Written(4));
    writer.close().expect("failed to close entry");
    writer.close_archive().expect("failed to close archive");

    let entries = read_entries(writer.into_inner().into_inner());
    let (entry, raw) = &entries[0];
    assert_eq!(entry.compression(), Compression::Deflate);
    assert_eq!(entry.crc32(), crc32fast::hash(b"wxyz"));
    assert_eq!(entry.uncompressed_size(), Some(4));
    assert_eq!(raw, b"wwxxyyzz");
}
